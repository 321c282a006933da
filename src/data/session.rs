//! The loaded dataset of one exploration session

use super::aggregate::{discover, load_feed, Aggregator, LoadWarning, MatchSource};
use super::identity::IdentityResolver;
use super::providers::RawFeed;
use crate::analysis::counts::{CountTable, GroupBy};
use crate::analysis::filter::FilterSpec;
use crate::analysis::sequence::{self, SequenceCount, SequenceQuery};
use crate::present::{plot_points, PlotPoint};
use crate::{Config, Event, EventType, MatchId, Provider, Result};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::time::Duration;

/// Summary of one loaded match
#[derive(Debug, Clone)]
pub struct LoadedMatch {
    pub match_id: MatchId,
    pub provider: Provider,
    /// The provider's own match id, when the feed carries one
    pub feed_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub event_count: usize,
    /// Records dropped because they could not be read
    pub skipped: usize,
}

/// Session-scoped context: identity tables, events and load report.
///
/// Built once per dataset and read-only afterwards; every query returns a
/// fresh view.
#[derive(Debug, Default)]
pub struct Session {
    identities: BTreeMap<MatchId, IdentityResolver>,
    events: Vec<Event>,
    matches: Vec<LoadedMatch>,
    warnings: Vec<LoadWarning>,
}

impl Session {
    /// Discover, pair and load every match feed in a directory
    pub fn load_dir<P: AsRef<Path>>(dir: P, config: &Config) -> Result<Self> {
        let discovery = discover(dir, &config.pairing)?;
        let mut warnings = discovery.warnings;
        for warning in &warnings {
            log::warn!("{}", warning);
        }

        let mut feeds = Vec::new();
        for source in &discovery.sources {
            match load_feed(source) {
                Ok(feed) => feeds.push((source.match_id.clone(), feed)),
                Err(e) => {
                    log::warn!("{}", e);
                    warnings.push(failed(source, e.to_string()));
                }
            }
        }

        let mut session = Self::from_feeds(feeds);
        warnings.append(&mut session.warnings);
        session.warnings = warnings;
        Ok(session)
    }

    /// Build a session from already-parsed feeds, in the order given
    pub fn from_feeds<I>(feeds: I) -> Self
    where
        I: IntoIterator<Item = (MatchId, RawFeed)>,
    {
        let mut aggregator = Aggregator::new();
        let mut session = Session::default();

        for (match_id, feed) in feeds {
            if session.identities.contains_key(&match_id) {
                session
                    .warnings
                    .push(LoadWarning::DuplicateMatch(match_id.clone()));
                log::warn!("Duplicate match {} ignored", match_id);
                continue;
            }

            let roster = feed.roster();
            let identity = IdentityResolver::from_roster(&roster);
            let normalized = feed.normalize(&match_id, &identity);
            let event_count = normalized.events.len();

            if normalized.skipped > 0 {
                log::warn!(
                    "Match {}: skipped {} unreadable records",
                    match_id,
                    normalized.skipped
                );
            }
            log::info!(
                "Loaded {} match {} ({} events)",
                feed.provider(),
                match_id,
                event_count
            );

            aggregator.push(&match_id, normalized.events);
            session.matches.push(LoadedMatch {
                match_id: match_id.clone(),
                provider: feed.provider(),
                feed_id: feed.feed_id().map(str::to_string),
                date: roster.date,
                event_count,
                skipped: normalized.skipped,
            });
            session.identities.insert(match_id, identity);
        }

        session.events = aggregator.into_events();
        session
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn matches(&self) -> &[LoadedMatch] {
        &self.matches
    }

    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    /// Identity tables of a loaded match
    pub fn identity(&self, match_id: &MatchId) -> Option<&IdentityResolver> {
        self.identities.get(match_id)
    }

    pub fn match_ids(&self) -> Vec<MatchId> {
        self.matches.iter().map(|m| m.match_id.clone()).collect()
    }

    /// Event types present in the data, in vocabulary order
    pub fn event_types(&self) -> Vec<EventType> {
        let present: BTreeSet<EventType> = self.events.iter().map(|e| e.event_type).collect();
        present.into_iter().collect()
    }

    /// Sorted names of every rostered player across matches
    pub fn player_names(&self) -> Vec<String> {
        self.collect_names(IdentityResolver::player_names)
    }

    /// Sorted names of every rostered team across matches
    pub fn team_names(&self) -> Vec<String> {
        self.collect_names(IdentityResolver::team_names)
    }

    fn collect_names(&self, names: fn(&IdentityResolver) -> Vec<String>) -> Vec<String> {
        let all: BTreeSet<String> = self.identities.values().flat_map(names).collect();
        all.into_iter().collect()
    }

    /// Earliest and latest event timestamps, if any events are loaded
    pub fn time_bounds(&self) -> Option<(Duration, Duration)> {
        let min = self.events.iter().map(|e| e.timestamp).min()?;
        let max = self.events.iter().map(|e| e.timestamp).max()?;
        Some((min, max))
    }

    pub fn filter(&self, spec: &FilterSpec) -> Vec<&Event> {
        spec.apply(&self.events)
    }

    pub fn counts(&self, spec: &FilterSpec, group_by: GroupBy) -> CountTable {
        CountTable::build(self.filter(spec), group_by)
    }

    pub fn plot_points(&self, spec: &FilterSpec) -> Vec<PlotPoint> {
        plot_points(self.filter(spec))
    }

    /// Reception-to-pass sequence counts, optionally limited to some matches
    pub fn sequences(
        &self,
        matches: Option<&BTreeSet<MatchId>>,
        query: &SequenceQuery,
    ) -> Vec<SequenceCount> {
        let scoped = self
            .events
            .iter()
            .filter(|e| matches.map_or(true, |m| m.contains(&e.match_id)));
        sequence::count_sequences(scoped, query)
    }
}

fn failed(source: &MatchSource, message: String) -> LoadWarning {
    LoadWarning::MatchFailed {
        match_id: source.match_id.clone(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::filter::{Selection, Zone};
    use crate::data::providers::OptaFeed;
    use crate::data::providers::opta::{OptaEventsFile, OptaRosterFile};
    use serde_json::json;

    fn opta_feed(team: &str, events: Vec<serde_json::Value>) -> RawFeed {
        let roster: OptaRosterFile = serde_json::from_value(json!({
            "teams": [{"team_id": team, "name": format!("Team {}", team), "players": [
                {"player_id": "1", "first_name": "A"},
                {"player_id": "2", "first_name": "B"}
            ]}]
        }))
        .unwrap();

        RawFeed::Opta(OptaFeed {
            roster,
            events: OptaEventsFile {
                game_id: None,
                events,
            },
        })
    }

    fn two_match_session() -> Session {
        Session::from_feeds(vec![
            (
                MatchId::from("M1"),
                opta_feed(
                    "10",
                    vec![
                        json!({"type_id": 1, "min": 1, "team_id": 10, "player_id": 1, "x": 40.0, "y": 50.0}),
                        json!({"type_id": 13, "min": 2, "team_id": 10, "player_id": 2, "x": 90.0, "y": 50.0}),
                    ],
                ),
            ),
            (
                MatchId::from("M2"),
                opta_feed(
                    "30",
                    vec![json!({"type_id": 13, "min": 5, "team_id": 30, "player_id": 2, "x": 85.0, "y": 40.0})],
                ),
            ),
        ])
    }

    #[test]
    fn test_from_feeds_aggregates_in_order() {
        let session = two_match_session();

        assert_eq!(session.events().len(), 3);
        assert_eq!(session.match_ids(), vec![MatchId::from("M1"), MatchId::from("M2")]);
        assert_eq!(session.events()[2].event_id, 2);
        assert_eq!(session.events()[2].match_id, MatchId::from("M2"));
        assert_eq!(session.event_types(), vec![EventType::Pass, EventType::Shot]);
        assert_eq!(session.team_names(), vec!["Team 10", "Team 30"]);
        assert_eq!(session.player_names(), vec!["A", "B"]);
        assert_eq!(
            session.time_bounds(),
            Some((Duration::from_secs(60), Duration::from_secs(300)))
        );
    }

    #[test]
    fn test_match_filter_excludes_other_matches() {
        let session = two_match_session();
        let spec = FilterSpec {
            matches: Some([MatchId::from("M1")].into_iter().collect()),
            zone: Some(Zone::FULL),
            ..FilterSpec::new(EventType::Shot)
        };

        let result = session.filter(&spec);
        assert_eq!(result.len(), 1);
        assert!(result.iter().all(|e| e.match_id == MatchId::from("M1")));
        assert_eq!(session.plot_points(&spec).len(), 1);
    }

    #[test]
    fn test_counts_by_player_team() {
        let session = two_match_session();
        let spec = FilterSpec {
            player: Selection::Only("B".to_string()),
            ..FilterSpec::new(EventType::Shot)
        };

        let table = session.counts(&spec, GroupBy::PlayerTeam);
        assert_eq!(table.total(), 2);
        assert_eq!(table.rows().len(), 2);
        assert!(table.rows().iter().all(|r| r.count == 1));
    }

    #[test]
    fn test_shot_filter_and_count_table() {
        let roster: OptaRosterFile = serde_json::from_value(json!({
            "teams": [{"team_id": "10", "name": "10", "players": [
                {"player_id": "1", "known_name": "A"},
                {"player_id": "2", "known_name": "B"}
            ]}]
        }))
        .unwrap();
        let feed = RawFeed::Opta(OptaFeed {
            roster,
            events: OptaEventsFile {
                game_id: Some("g77".to_string()),
                events: vec![
                    json!({"type_id": 1, "min": 1, "team_id": 10, "player_id": 1, "x": 40.0, "y": 50.0}),
                    json!({"type_id": 13, "min": 2, "team_id": 10, "player_id": 2, "x": 90.0, "y": 50.0}),
                ],
            },
        });
        let session = Session::from_feeds(vec![(MatchId::from("M1"), feed)]);
        let spec = FilterSpec::new(EventType::Shot);

        let shots = session.filter(&spec);
        assert_eq!(shots.len(), 1);
        assert_eq!(shots[0].event_id, 1);

        let table = session.counts(&spec, GroupBy::PlayerTeam);
        assert_eq!(table.rows().len(), 1);
        let row = &table.rows()[0];
        assert_eq!(row.player.as_deref(), Some("B"));
        assert_eq!(row.team.as_deref(), Some("10"));
        assert_eq!(row.count, 1);

        assert_eq!(session.matches()[0].feed_id.as_deref(), Some("g77"));
        let identity = session.identity(&MatchId::from("M1")).unwrap();
        assert_eq!(identity.player_count(), 2);
        assert!(session.identity(&MatchId::from("M2")).is_none());
    }

    #[test]
    fn test_duplicate_match_ignored() {
        let session = Session::from_feeds(vec![
            (MatchId::from("M1"), opta_feed("10", vec![json!({"type_id": 1, "min": 1})])),
            (MatchId::from("M1"), opta_feed("10", vec![json!({"type_id": 1, "min": 2})])),
        ]);

        assert_eq!(session.events().len(), 1);
        assert_eq!(
            session.warnings(),
            &[LoadWarning::DuplicateMatch(MatchId::from("M1"))]
        );
    }

    #[test]
    fn test_load_dir_reports_bad_matches_and_keeps_good_ones() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("good_f7.json"),
            r#"{"teams": [{"team_id": "t1", "name": "Home", "players": [{"player_id": "p5", "last_name": "Five"}]}]}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("good_f24.json"),
            r#"{"events": [{"type_id": 1, "min": 3, "team_id": 1, "player_id": 5, "x": 10, "y": 10}, {"bad": true}]}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("broken_f7.json"), "{ truncated").unwrap();
        std::fs::write(dir.path().join("broken_f24.json"), r#"{"events": []}"#).unwrap();
        std::fs::write(dir.path().join("orphan_ma3.json"), "{}").unwrap();

        let session = Session::load_dir(dir.path(), &Config::default()).unwrap();

        assert_eq!(session.matches().len(), 1);
        assert_eq!(session.matches()[0].match_id, MatchId::from("good"));
        assert_eq!(session.matches()[0].skipped, 1);
        assert_eq!(session.events()[0].player_name.as_deref(), Some("Five"));
        assert_eq!(session.warnings().len(), 2);
        assert!(session
            .warnings()
            .iter()
            .any(|w| matches!(w, LoadWarning::MatchFailed { match_id, .. } if match_id.0 == "broken")));
        assert!(session
            .warnings()
            .iter()
            .any(|w| matches!(w, LoadWarning::Unpaired { .. })));
    }

    #[test]
    fn test_empty_session() {
        let session = Session::from_feeds(Vec::new());
        assert!(session.events().is_empty());
        assert_eq!(session.time_bounds(), None);
        assert!(session.filter(&FilterSpec::new(EventType::Pass)).is_empty());
    }
}
