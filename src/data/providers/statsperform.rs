//! StatsPerform MA1 (match metadata) and MA3 (match events) feeds
//!
//! MA3 shares the Opta event vocabulary: type ids, outcomes and the 140/141
//! end point qualifiers mean the same thing.

use super::opta::{end_point, event_type_for, result_for, OptaQualifier};
use super::{
    de_id, de_num, de_opt_id, de_opt_num, finish, full_name, infer_receivers, map_records,
    parse_match_date, EventDraft, FeedNormalizer, NormalizedFeed,
};
use crate::data::identity::{IdentityResolver, Roster, RosterEntry, TeamEntry};
use crate::{EventType, MatchId, PlayerId, Point, Provider, TeamId};
use serde::Deserialize;
use std::time::Duration;

/// Paired MA1 + MA3 feed of one match
#[derive(Debug, Clone)]
pub struct StatsPerformFeed {
    pub metadata: MatchMetadataFile,
    pub events: MatchEventsFile,
}

/// Parsed MA1 file
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchMetadataFile {
    pub match_info: MatchInfo,
    #[serde(default)]
    pub live_data: MetadataLiveData,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchInfo {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub contestant: Vec<Contestant>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contestant {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataLiveData {
    #[serde(default)]
    pub line_up: Vec<LineUp>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineUp {
    #[serde(deserialize_with = "de_id")]
    pub contestant_id: String,
    #[serde(default)]
    pub player: Vec<LineUpPlayer>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineUpPlayer {
    #[serde(deserialize_with = "de_id")]
    pub player_id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub match_name: Option<String>,
}

/// Parsed MA3 file; records are kept raw and read one by one
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchEventsFile {
    pub live_data: EventsLiveData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventsLiveData {
    #[serde(default)]
    pub event: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchEvent {
    #[serde(deserialize_with = "de_num")]
    type_id: u32,
    #[serde(default, deserialize_with = "de_opt_num")]
    period_id: Option<u8>,
    #[serde(deserialize_with = "de_num")]
    time_min: u32,
    #[serde(default, deserialize_with = "de_num")]
    time_sec: u32,
    #[serde(default, deserialize_with = "de_opt_id")]
    contestant_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    player_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_num")]
    outcome: Option<u8>,
    #[serde(default, deserialize_with = "de_opt_num")]
    x: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_num")]
    y: Option<f64>,
    #[serde(default)]
    qualifier: Vec<OptaQualifier>,
}

fn to_draft(event: MatchEvent) -> Option<EventDraft> {
    let event_type = event_type_for(event.type_id);
    let timestamp =
        Duration::from_secs(u64::from(event.time_min) * 60 + u64::from(event.time_sec));

    let mut draft = EventDraft::new(event_type, timestamp);
    draft.period = event.period_id;
    draft.team_id = event.contestant_id.map(TeamId);
    draft.player_id = event.player_id.map(PlayerId);
    draft.coordinates = match (event.x, event.y) {
        (Some(x), Some(y)) => Point::on_pitch(x, y),
        _ => None,
    };
    if event_type == EventType::Pass {
        draft.end_coordinates = end_point(&event.qualifier);
    }
    draft.result = result_for(event.type_id, event.outcome);

    Some(draft)
}

impl FeedNormalizer for StatsPerformFeed {
    fn provider(&self) -> Provider {
        Provider::StatsPerform
    }

    fn feed_id(&self) -> Option<&str> {
        self.metadata.match_info.id.as_deref()
    }

    fn roster(&self) -> Roster {
        let info = &self.metadata.match_info;
        let teams = info
            .contestant
            .iter()
            .map(|c| {
                let team_id = TeamId(c.id.clone());
                let players = self
                    .metadata
                    .live_data
                    .line_up
                    .iter()
                    .filter(|l| l.contestant_id == c.id)
                    .flat_map(|l| &l.player)
                    .map(|p| {
                        let name = full_name(&[p.first_name.as_deref(), p.last_name.as_deref()]);
                        RosterEntry {
                            player_id: PlayerId(p.player_id.clone()),
                            full_name: if name.is_empty() {
                                p.match_name.clone().unwrap_or_default()
                            } else {
                                name
                            },
                            team_id: team_id.clone(),
                        }
                    })
                    .collect();

                TeamEntry {
                    team_id,
                    name: c.name.clone(),
                    players,
                }
            })
            .collect();

        Roster {
            teams,
            date: info.date.as_deref().and_then(parse_match_date),
        }
    }

    fn normalize(&self, match_id: &MatchId, identity: &IdentityResolver) -> NormalizedFeed {
        let (mut drafts, skipped) = map_records::<MatchEvent, _>(
            &self.events.live_data.event,
            Provider::StatsPerform,
            to_draft,
        );
        infer_receivers(&mut drafts);

        log::debug!(
            "StatsPerform match {}: {} events, {} skipped",
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
