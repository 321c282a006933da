//! Wyscout combined match file (teams, players and events in one document)
//!
//! Wyscout measures y from the top touchline, so y is flipped into the
//! canonical bottom-up frame.

use super::{
    de_id, de_opt_id, finish, full_name, map_records, parse_match_date, EventDraft,
    FeedNormalizer, NormalizedFeed,
};
use crate::data::identity::{IdentityResolver, Roster, RosterEntry, TeamEntry};
use crate::{EventResult, EventType, MatchId, PlayerId, Point, Provider, TeamId};
use regex::Regex;
use serde::Deserialize;
use std::time::Duration;

const CLOCK_PATTERN: &str = r"^(\d+):(\d{2}):(\d{2})(?:\.(\d{1,3}))?$";

/// Parsed combined Wyscout file
#[derive(Debug, Clone, Deserialize)]
pub struct WyscoutFeed {
    #[serde(default)]
    pub r#match: Option<WyscoutMatch>,
    #[serde(default)]
    pub teams: Vec<WyscoutTeam>,
    #[serde(default)]
    pub players: Vec<WyscoutPlayer>,
    pub events: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WyscoutMatch {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub wy_id: Option<String>,
    #[serde(default)]
    pub dateutc: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WyscoutTeam {
    #[serde(deserialize_with = "de_id")]
    pub wy_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WyscoutPlayer {
    #[serde(deserialize_with = "de_id")]
    pub wy_id: String,
    #[serde(deserialize_with = "de_id")]
    pub team_id: String,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WyscoutEvent {
    r#type: WyscoutType,
    #[serde(default)]
    match_period: Option<String>,
    #[serde(default)]
    minute: u32,
    #[serde(default)]
    second: u32,
    #[serde(default)]
    match_timestamp: Option<String>,
    #[serde(default)]
    location: Option<Location>,
    #[serde(default)]
    team: Option<Ref>,
    #[serde(default)]
    player: Option<Ref>,
    #[serde(default)]
    pass: Option<PassDetail>,
    #[serde(default)]
    shot: Option<ShotDetail>,
}

#[derive(Debug, Deserialize)]
struct WyscoutType {
    primary: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct Location {
    x: f64,
    y: f64,
}

#[derive(Debug, Deserialize)]
struct Ref {
    #[serde(default, deserialize_with = "de_opt_id")]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PassDetail {
    #[serde(default)]
    accurate: Option<bool>,
    #[serde(default)]
    recipient: Option<Ref>,
    #[serde(default)]
    end_location: Option<Location>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShotDetail {
    #[serde(default)]
    is_goal: Option<bool>,
}

/// Map a Wyscout primary type onto the common vocabulary
fn event_type_for(primary: &str) -> EventType {
    match primary.trim().to_lowercase().as_str() {
        "pass" | "throw_in" | "goal_kick" | "corner" | "free_kick" => EventType::Pass,
        "shot" | "penalty" => EventType::Shot,
        "duel" => EventType::Duel,
        "interception" => EventType::Interception,
        "clearance" => EventType::Clearance,
        "infraction" => EventType::Foul,
        _ => EventType::Generic,
    }
}

fn period_for(period: &str) -> Option<u8> {
    match period {
        "1H" => Some(1),
        "2H" => Some(2),
        "E1" => Some(3),
        "E2" => Some(4),
        "P" => Some(5),
        _ => None,
    }
}

/// Parse an `HH:MM:SS.mmm` match clock
fn parse_clock(clock: &Regex, s: &str) -> Option<Duration> {
    let caps = clock.captures(s.trim())?;
    let hours: u64 = caps.get(1)?.as_str().parse().ok()?;
    let minutes: u64 = caps.get(2)?.as_str().parse().ok()?;
    let seconds: u64 = caps.get(3)?.as_str().parse().ok()?;
    let millis: u64 = match caps.get(4) {
        // Right-pad so ".5" means 500 ms
        Some(m) => format!("{:0<3}", m.as_str()).parse().ok()?,
        None => 0,
    };
    Some(Duration::from_millis(
        ((hours * 60 + minutes) * 60 + seconds) * 1000 + millis,
    ))
}

/// Flip the y axis into the canonical frame
fn to_point(location: Location) -> Option<Point> {
    Point::on_pitch(location.x, 100.0 - location.y)
}

fn to_draft(event: WyscoutEvent, clock: Option<&Regex>) -> Option<EventDraft> {
    let primary = event.r#type.primary.trim();
    if primary.is_empty() {
        return None;
    }
    let event_type = event_type_for(primary);

    let timestamp = clock
        .zip(event.match_timestamp.as_deref())
        .and_then(|(re, s)| parse_clock(re, s))
        .unwrap_or_else(|| {
            Duration::from_secs(u64::from(event.minute) * 60 + u64::from(event.second))
        });

    let mut draft = EventDraft::new(event_type, timestamp);
    draft.period = event.match_period.as_deref().and_then(period_for);
    draft.team_id = event.team.and_then(|t| t.id).map(TeamId);
    draft.player_id = event.player.and_then(|p| p.id).map(PlayerId);
    draft.coordinates = event.location.and_then(to_point);

    match event_type {
        EventType::Pass => {
            if let Some(pass) = event.pass {
                draft.end_coordinates = pass.end_location.and_then(to_point);
                draft.result = pass.accurate.map(|ok| {
                    if ok {
                        EventResult::Success
                    } else {
                        EventResult::Fail
                    }
                });
                // Recipients are only meaningful for completed passes
                if draft.result == Some(EventResult::Success) {
                    draft.receiver_id = pass.recipient.and_then(|r| r.id).map(PlayerId);
                }
            }
        }
        EventType::Shot => {
            draft.result = event.shot.and_then(|s| s.is_goal).map(|goal| {
                if goal {
                    EventResult::Success
                } else {
                    EventResult::Fail
                }
            });
        }
        _ => {}
    }

    Some(draft)
}

impl FeedNormalizer for WyscoutFeed {
    fn provider(&self) -> Provider {
        Provider::Wyscout
    }

    fn feed_id(&self) -> Option<&str> {
        self.r#match.as_ref().and_then(|m| m.wy_id.as_deref())
    }

    fn roster(&self) -> Roster {
        let teams = self
            .teams
            .iter()
            .map(|team| {
                let team_id = TeamId(team.wy_id.clone());
                let players = self
                    .players
                    .iter()
                    .filter(|p| p.team_id == team.wy_id)
                    .map(|p| {
                        let name = full_name(&[p.first_name.as_deref(), p.last_name.as_deref()]);
                        RosterEntry {
                            player_id: PlayerId(p.wy_id.clone()),
                            full_name: if name.is_empty() {
                                p.short_name.clone().unwrap_or_default()
                            } else {
                                name
                            },
                            team_id: team_id.clone(),
                        }
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
                .r#match
                .as_ref()
                .and_then(|m| m.dateutc.as_deref())
                .and_then(parse_match_date),
        }
    }

    fn normalize(&self, match_id: &MatchId, identity: &IdentityResolver) -> NormalizedFeed {
        let clock = Regex::new(CLOCK_PATTERN).ok();
        let (drafts, skipped) =
            map_records::<WyscoutEvent, _>(&self.events, Provider::Wyscout, |event| {
                to_draft(event, clock.as_ref())
            });

        log::debug!(
            "Wyscout match {}: {} events, {} skipped",
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_feed(events: Vec<serde_json::Value>) -> WyscoutFeed {
        serde_json::from_value(json!({
            "match": {"wyId": 5001, "dateutc": "2023-10-01 18:30:00"},
            "teams": [{"wyId": 1, "name": "Home FC"}, {"wyId": 2, "name": "Away United"}],
            "players": [
                {"wyId": 11, "teamId": 1, "firstName": "Ann", "lastName": "Able"},
                {"wyId": 12, "teamId": 1, "shortName": "B. Best"},
                {"wyId": 21, "teamId": 2, "firstName": "Cy", "lastName": "Cole"}
            ],
            "events": events
        }))
        .unwrap()
    }

    #[test]
    fn test_roster() {
        let roster = make_feed(vec![]).roster();

        assert_eq!(roster.teams.len(), 2);
        assert_eq!(roster.teams[0].players.len(), 2);
        assert_eq!(roster.teams[0].players[1].full_name, "B. Best");
        assert_eq!(roster.teams[1].players[0].player_id, PlayerId::from("21"));
        assert_eq!(roster.date, chrono::NaiveDate::from_ymd_opt(2023, 10, 1));
        assert_eq!(make_feed(vec![]).feed_id(), Some("5001"));
    }

    #[test]
    fn test_pass_flips_y_and_uses_recipient() {
        let feed = make_feed(vec![json!({
            "type": {"primary": "pass"},
            "matchPeriod": "1H",
            "minute": 12, "second": 34,
            "matchTimestamp": "00:12:34.5",
            "location": {"x": 40, "y": 20},
            "team": {"id": 1},
            "player": {"id": 11},
            "pass": {"accurate": true, "recipient": {"id": 12}, "endLocation": {"x": 55, "y": 70}}
        })]);
        let identity = IdentityResolver::from_roster(&feed.roster());
        let events = feed.normalize(&MatchId::from("w1"), &identity).events;

        let pass = &events[0];
        assert_eq!(pass.event_type, EventType::Pass);
        assert_eq!(pass.period, Some(1));
        assert_eq!(pass.timestamp, Duration::from_millis(754_500));
        assert_eq!(pass.coordinates, Some(Point::new(40.0, 80.0)));
        assert_eq!(pass.end_coordinates, Some(Point::new(55.0, 30.0)));
        assert_eq!(pass.receiver_name.as_deref(), Some("B. Best"));
        assert_eq!(pass.player_name.as_deref(), Some("Ann Able"));
        assert_eq!(pass.result, Some(EventResult::Success));
    }

    #[test]
    fn test_inaccurate_pass_has_no_receiver() {
        let feed = make_feed(vec![json!({
            "type": {"primary": "pass"},
            "minute": 1,
            "team": {"id": 1},
            "player": {"id": 11},
            "pass": {"accurate": false, "recipient": {"id": 12}}
        })]);
        let events = feed
            .normalize(&MatchId::from("w1"), &IdentityResolver::default())
            .events;

        assert_eq!(events[0].receiver_id, None);
        assert_eq!(events[0].result, Some(EventResult::Fail));
        assert_eq!(events[0].timestamp, Duration::from_secs(60));
    }

    #[test]
    fn test_clock_falls_back_and_bad_records_skip() {
        let feed = make_feed(vec![
            json!({"type": {"primary": "shot"}, "minute": 80, "second": 5,
                   "matchTimestamp": "garbage", "shot": {"isGoal": true},
                   "location": {"x": 90, "y": 50}}),
            json!({"minute": 81}),
            json!({"type": {"primary": ""}, "minute": 82}),
        ]);
        let normalized = feed.normalize(&MatchId::from("w1"), &IdentityResolver::default());

        assert_eq!(normalized.skipped, 2);
        let shot = &normalized.events[0];
        assert_eq!(shot.timestamp, Duration::from_secs(80 * 60 + 5));
        assert_eq!(shot.result, Some(EventResult::Success));
        assert_eq!(shot.player_name, None);
    }

    #[test]
    fn test_clock_parsing() {
        let re = Regex::new(CLOCK_PATTERN).unwrap();
        assert_eq!(
            parse_clock(&re, "01:02:03.040"),
            Some(Duration::from_millis(3_723_040))
        );
        assert_eq!(parse_clock(&re, "00:45:00"), Some(Duration::from_secs(2700)));
        assert_eq!(parse_clock(&re, "45:00"), None);
    }
}
