//! Provider event feeds and their normalization into [`Event`]s
//!
//! Each provider module owns the raw record shapes of its feed and a pure
//! mapping from those records into the common event schema. Nothing outside
//! this module knows about provider field names.

pub mod opta;
pub mod statsperform;
pub mod wyscout;

use super::identity::{IdentityResolver, Roster};
use crate::{Event, EventResult, EventType, MatchId, PlayerId, Point, Provider, TeamId};
use chrono::NaiveDate;
use regex::Regex;
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub use opta::OptaFeed;
pub use statsperform::StatsPerformFeed;
pub use wyscout::WyscoutFeed;

/// Trait for all provider feeds
pub trait FeedNormalizer {
    /// The provider this feed comes from
    fn provider(&self) -> Provider;

    /// The provider's own id for the match, if the feed carries one
    fn feed_id(&self) -> Option<&str>;

    /// Roster metadata carried by the feed
    fn roster(&self) -> Roster;

    /// Map the raw records into events, preserving feed order
    fn normalize(&self, match_id: &MatchId, identity: &IdentityResolver) -> NormalizedFeed;
}

/// A parsed feed from any supported provider
#[derive(Debug, Clone)]
pub enum RawFeed {
    Opta(OptaFeed),
    StatsPerform(StatsPerformFeed),
    Wyscout(WyscoutFeed),
}

impl RawFeed {
    fn normalizer(&self) -> &dyn FeedNormalizer {
        match self {
            RawFeed::Opta(feed) => feed,
            RawFeed::StatsPerform(feed) => feed,
            RawFeed::Wyscout(feed) => feed,
        }
    }

    pub fn provider(&self) -> Provider {
        self.normalizer().provider()
    }

    pub fn feed_id(&self) -> Option<&str> {
        self.normalizer().feed_id()
    }

    pub fn roster(&self) -> Roster {
        self.normalizer().roster()
    }

    pub fn normalize(&self, match_id: &MatchId, identity: &IdentityResolver) -> NormalizedFeed {
        self.normalizer().normalize(match_id, identity)
    }
}

/// Events of one feed plus the number of records that could not be read
#[derive(Debug, Clone, Default)]
pub struct NormalizedFeed {
    pub events: Vec<Event>,
    pub skipped: usize,
}

/// Provider-neutral event before ids are resolved to names
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EventDraft {
    pub event_type: EventType,
    pub period: Option<u8>,
    pub timestamp: Duration,
    pub team_id: Option<TeamId>,
    pub player_id: Option<PlayerId>,
    pub coordinates: Option<Point>,
    pub end_coordinates: Option<Point>,
    pub receiver_id: Option<PlayerId>,
    pub result: Option<EventResult>,
}

impl EventDraft {
    pub fn new(event_type: EventType, timestamp: Duration) -> Self {
        EventDraft {
            event_type,
            period: None,
            timestamp,
            team_id: None,
            player_id: None,
            coordinates: None,
            end_coordinates: None,
            receiver_id: None,
            result: None,
        }
    }
}

/// Deserialize each record on its own so one bad record never sinks the feed.
///
/// `map` returns `None` for records that deserialize but lack what an event
/// needs; those count as skipped too.
pub(crate) fn map_records<R, F>(
    records: &[serde_json::Value],
    provider: Provider,
    map: F,
) -> (Vec<EventDraft>, usize)
where
    R: DeserializeOwned,
    F: Fn(R) -> Option<EventDraft>,
{
    let mut drafts = Vec::with_capacity(records.len());
    let mut skipped = 0;

    for (index, value) in records.iter().enumerate() {
        match R::deserialize(value) {
            Ok(record) => match map(record) {
                Some(draft) => drafts.push(draft),
                None => {
                    log::debug!("{} record {} has no usable event", provider, index);
                    skipped += 1;
                }
            },
            Err(e) => {
                log::debug!("Skipping unparseable {} record {}: {}", provider, index, e);
                skipped += 1;
            }
        }
    }

    (drafts, skipped)
}

/// Fill receivers for successful passes from the next event carrying a player.
///
/// The next actor must belong to the passer's team and be someone else;
/// otherwise the pass keeps no receiver.
pub(crate) fn infer_receivers(drafts: &mut [EventDraft]) {
    for i in 0..drafts.len() {
        let current = &drafts[i];
        if current.event_type != EventType::Pass
            || current.result != Some(EventResult::Success)
            || current.receiver_id.is_some()
        {
            continue;
        }
        let (Some(team), Some(passer)) = (current.team_id.clone(), current.player_id.clone())
        else {
            continue;
        };

        let next = drafts[i + 1..].iter().find(|d| d.player_id.is_some());
        let receiver = next
            .filter(|d| d.team_id.as_ref() == Some(&team))
            .and_then(|d| d.player_id.clone())
            .filter(|p| *p != passer);

        drafts[i].receiver_id = receiver;
    }
}

/// Attach match id, row index and resolved names to the drafts
pub(crate) fn finish(
    drafts: Vec<EventDraft>,
    match_id: &MatchId,
    identity: &IdentityResolver,
) -> Vec<Event> {
    drafts
        .into_iter()
        .enumerate()
        .map(|(event_id, d)| {
            let team_id = d.team_id.or_else(|| {
                d.player_id
                    .as_ref()
                    .and_then(|p| identity.team_of(p))
                    .cloned()
            });
            let player_name = d
                .player_id
                .as_ref()
                .and_then(|p| identity.player_name(p))
                .map(str::to_string);
            let team_name = team_id
                .as_ref()
                .and_then(|t| identity.team_name(t))
                .map(str::to_string);
            let receiver_name = d
                .receiver_id
                .as_ref()
                .and_then(|p| identity.player_name(p))
                .map(str::to_string);

            Event {
                event_id,
                match_id: match_id.clone(),
                event_type: d.event_type,
                period: d.period,
                timestamp: d.timestamp,
                team_id,
                team_name,
                player_id: d.player_id,
                player_name,
                coordinates: d.coordinates,
                end_coordinates: d.end_coordinates,
                receiver_id: d.receiver_id,
                receiver_name,
                result: d.result,
            }
        })
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Int(i64),
    Str(String),
}

impl IdRepr {
    fn into_string(self) -> String {
        match self {
            IdRepr::Int(n) => n.to_string(),
            IdRepr::Str(s) => s.trim().to_string(),
        }
    }
}

/// Ids arrive as JSON numbers or strings depending on the provider
pub(crate) fn de_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    IdRepr::deserialize(deserializer).map(IdRepr::into_string)
}

pub(crate) fn de_opt_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<IdRepr>::deserialize(deserializer)?
        .map(IdRepr::into_string)
        .filter(|s| !s.is_empty()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumRepr<T> {
    Num(T),
    Str(String),
}

fn parse_num<T, E>(s: &str) -> std::result::Result<T, E>
where
    T: FromStr,
    T::Err: fmt::Display,
    E: de::Error,
{
    s.trim()
        .parse()
        .map_err(|e| E::custom(format!("invalid number '{}': {}", s, e)))
}

/// Numeric attributes arrive as JSON numbers or, from converted XML, strings
pub(crate) fn de_num<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Deserialize<'de>,
    T::Err: fmt::Display,
{
    match NumRepr::<T>::deserialize(deserializer)? {
        NumRepr::Num(n) => Ok(n),
        NumRepr::Str(s) => parse_num(&s),
    }
}

/// Like [`de_num`], with blank strings read as absent
pub(crate) fn de_opt_num<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Deserialize<'de>,
    T::Err: fmt::Display,
{
    match Option::<NumRepr<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumRepr::Num(n)) => Ok(Some(n)),
        Some(NumRepr::Str(s)) if s.trim().is_empty() => Ok(None),
        Some(NumRepr::Str(s)) => parse_num(&s).map(Some),
    }
}

/// Join name parts, skipping blanks
pub(crate) fn full_name(parts: &[Option<&str>]) -> String {
    parts
        .iter()
        .flatten()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse the date part of a provider kickoff string
pub(crate) fn parse_match_date(s: &str) -> Option<NaiveDate> {
    let patterns = [r"(\d{4})-(\d{2})-(\d{2})", r"^(\d{4})(\d{2})(\d{2})"];

    for pattern in patterns {
        if let Ok(re) = Regex::new(pattern) {
            if let Some(caps) = re.captures(s.trim()) {
                let year: i32 = caps.get(1)?.as_str().parse().ok()?;
                let month: u32 = caps.get(2)?.as_str().parse().ok()?;
                let day: u32 = caps.get(3)?.as_str().parse().ok()?;
                return NaiveDate::from_ymd_opt(year, month, day);
            }
        }
    }

    log::debug!("Unrecognized match date: {}", s);
    None
}
