//! Opta F7 (lineups) and F24 (events) feeds
//!
//! Both files are consumed in their parsed form. F7 ids carry `p`/`t`
//! prefixes that F24 omits, so they are stripped on read.

use super::{
    de_id, de_num, de_opt_id, de_opt_num, finish, full_name, infer_receivers, map_records,
    parse_match_date, EventDraft, FeedNormalizer, NormalizedFeed,
};
use crate::data::identity::{IdentityResolver, Roster, RosterEntry, TeamEntry};
use crate::{EventResult, EventType, MatchId, PlayerId, Point, Provider, TeamId};
use serde::Deserialize;
use std::time::Duration;

/// Qualifier holding the pass end x coordinate
pub(crate) const QUALIFIER_END_X: u32 = 140;
/// Qualifier holding the pass end y coordinate
pub(crate) const QUALIFIER_END_Y: u32 = 141;

/// Paired F7 + F24 feed of one match
#[derive(Debug, Clone)]
pub struct OptaFeed {
    pub roster: OptaRosterFile,
    pub events: OptaEventsFile,
}

/// Parsed F7 lineup file
#[derive(Debug, Clone, Deserialize)]
pub struct OptaRosterFile {
    #[serde(default)]
    pub match_date: Option<String>,
    #[serde(default)]
    pub teams: Vec<OptaTeam>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptaTeam {
    #[serde(deserialize_with = "de_id")]
    pub team_id: String,
    pub name: String,
    #[serde(default)]
    pub players: Vec<OptaPlayer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptaPlayer {
    #[serde(deserialize_with = "de_id")]
    pub player_id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub known_name: Option<String>,
}

/// Parsed F24 event file; records are kept raw and read one by one
#[derive(Debug, Clone, Deserialize)]
pub struct OptaEventsFile {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub game_id: Option<String>,
    pub events: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct OptaEvent {
    #[serde(deserialize_with = "de_num")]
    type_id: u32,
    #[serde(default, deserialize_with = "de_opt_num")]
    period_id: Option<u8>,
    #[serde(deserialize_with = "de_num")]
    min: u32,
    #[serde(default, deserialize_with = "de_num")]
    sec: u32,
    #[serde(default, deserialize_with = "de_opt_id")]
    team_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    player_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_num")]
    outcome: Option<u8>,
    #[serde(default, deserialize_with = "de_opt_num")]
    x: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_num")]
    y: Option<f64>,
    #[serde(default)]
    qualifiers: Vec<OptaQualifier>,
}

/// Qualifier entry shared by Opta and StatsPerform records
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OptaQualifier {
    #[serde(alias = "qualifier_id", deserialize_with = "de_num")]
    pub qualifier_id: u32,
    #[serde(default)]
    pub value: Option<String>,
}

/// Map an Opta event type id onto the common vocabulary
pub(crate) fn event_type_for(type_id: u32) -> EventType {
    match type_id {
        1 | 2 => EventType::Pass,
        13..=16 => EventType::Shot,
        3 => EventType::TakeOn,
        44 => EventType::Duel,
        7 => EventType::Tackle,
        8 => EventType::Interception,
        12 => EventType::Clearance,
        49 => EventType::BallRecovery,
        4 => EventType::Foul,
        _ => EventType::Generic,
    }
}

/// Shots succeed only as goals (type 16); everything else uses the outcome flag
pub(crate) fn result_for(type_id: u32, outcome: Option<u8>) -> Option<EventResult> {
    match event_type_for(type_id) {
        EventType::Shot => Some(if type_id == 16 {
            EventResult::Success
        } else {
            EventResult::Fail
        }),
        _ => outcome.map(|o| {
            if o == 1 {
                EventResult::Success
            } else {
                EventResult::Fail
            }
        }),
    }
}

/// Pass end point from the 140/141 qualifiers
pub(crate) fn end_point(qualifiers: &[OptaQualifier]) -> Option<Point> {
    let value = |id: u32| {
        qualifiers
            .iter()
            .find(|q| q.qualifier_id == id)
            .and_then(|q| q.value.as_deref())
            .and_then(|v| v.trim().parse::<f64>().ok())
    };
    Point::on_pitch(value(QUALIFIER_END_X)?, value(QUALIFIER_END_Y)?)
}

/// Drop an F7-style letter prefix from a numeric id
fn strip_prefix(id: &str, prefix: char) -> String {
    match id.strip_prefix(prefix) {
        Some(rest) if !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()) => {
            rest.to_string()
        }
        _ => id.to_string(),
    }
}

fn to_draft(event: OptaEvent) -> Option<EventDraft> {
    let event_type = event_type_for(event.type_id);
    let timestamp = Duration::from_secs(u64::from(event.min) * 60 + u64::from(event.sec));

    let mut draft = EventDraft::new(event_type, timestamp);
    draft.period = event.period_id;
    draft.team_id = event.team_id.map(|t| TeamId(strip_prefix(&t, 't')));
    draft.player_id = event.player_id.map(|p| PlayerId(strip_prefix(&p, 'p')));
    draft.coordinates = match (event.x, event.y) {
        (Some(x), Some(y)) => Point::on_pitch(x, y),
        _ => None,
    };
    if event_type == EventType::Pass {
        draft.end_coordinates = end_point(&event.qualifiers);
    }
    draft.result = result_for(event.type_id, event.outcome);

    Some(draft)
}

impl FeedNormalizer for OptaFeed {
    fn provider(&self) -> Provider {
        Provider::Opta
    }

    fn feed_id(&self) -> Option<&str> {
        self.events.game_id.as_deref()
    }

    fn roster(&self) -> Roster {
        let teams = self
            .roster
            .teams
            .iter()
            .map(|team| {
                let team_id = TeamId(strip_prefix(&team.team_id, 't'));
                let players = team
                    .players
                    .iter()
                    .map(|p| RosterEntry {
                        player_id: PlayerId(strip_prefix(&p.player_id, 'p')),
                        full_name: match p.known_name.as_deref() {
                            Some(known) if !known.trim().is_empty() => known.trim().to_string(),
                            _ => full_name(&[p.first_name.as_deref(), p.last_name.as_deref()]),
                        },
                        team_id: team_id.clone(),
                    })
                    .collect();

                TeamEntry {
                    team_id,
                    name: team.name.clone(),
                    players,
                }
            })
            .collect();

        Roster {
            teams,
            date: self
                .roster
                .match_date
                .as_deref()
                .and_then(parse_match_date),
        }
    }

    fn normalize(&self, match_id: &MatchId, identity: &IdentityResolver) -> NormalizedFeed {
        let (mut drafts, skipped) =
            map_records::<OptaEvent, _>(&self.events.events, Provider::Opta, to_draft);
        infer_receivers(&mut drafts);

        log::debug!(
            "Opta match {}: {} events, {} skipped",
            match_id,
            drafts.len(),
            skipped
        );

        NormalizedFeed {
            events: finish(drafts, match_id, identity),
            skipped,
        }
    }
}
