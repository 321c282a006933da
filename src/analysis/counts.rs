//! Grouped event counts
//!
//! Count breakdowns over a filtered event view, keyed by player and team
//! and optionally by match or match minute.

use crate::{Event, MatchId, TouchlineError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Grouping keys for a count table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupBy {
    #[default]
    PlayerTeam,
    PlayerTeamMatch,
    PlayerTeamMinute,
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupBy::PlayerTeam => write!(f, "player-team"),
            GroupBy::PlayerTeamMatch => write!(f, "match"),
            GroupBy::PlayerTeamMinute => write!(f, "minute"),
        }
    }
}

impl FromStr for GroupBy {
    type Err = TouchlineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "player-team" | "player" | "team" => Ok(GroupBy::PlayerTeam),
            "match" | "player-team-match" => Ok(GroupBy::PlayerTeamMatch),
            "minute" | "player-team-minute" => Ok(GroupBy::PlayerTeamMinute),
            _ => Err(TouchlineError::Parse(format!(
                "Unknown grouping '{}'. Use player-team, match or minute",
                s
            ))),
        }
    }
}

/// One group of a count table. Unknown names form their own group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountRow {
    pub player: Option<String>,
    pub team: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_id: Option<MatchId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minute: Option<u32>,
    pub count: usize,
}

type GroupKey = (Option<String>, Option<String>, Option<MatchId>, Option<u32>);

/// Counts sorted by descending count, ties broken by ascending key
#[derive(Debug, Clone, PartialEq)]
pub struct CountTable {
    group_by: GroupBy,
    rows: Vec<CountRow>,
}

impl CountTable {
    pub fn build<'a, I>(events: I, group_by: GroupBy) -> Self
    where
        I: IntoIterator<Item = &'a Event>,
    {
        let mut groups: BTreeMap<GroupKey, usize> = BTreeMap::new();

        for event in events {
            let key = (
                event.player_name.clone(),
                event.team_name.clone(),
                match group_by {
                    GroupBy::PlayerTeamMatch => Some(event.match_id.clone()),
                    _ => None,
                },
                match group_by {
                    GroupBy::PlayerTeamMinute => Some(event.minute()),
                    _ => None,
                },
            );
            *groups.entry(key).or_insert(0) += 1;
        }

        let mut rows: Vec<CountRow> = groups
            .into_iter()
            .map(|((player, team, match_id, minute), count)| CountRow {
                player,
                team,
                match_id,
                minute,
                count,
            })
            .collect();
        // Stable, so equal counts keep the key order of the map
        rows.sort_by(|a, b| b.count.cmp(&a.count));

        CountTable { group_by, rows }
    }

    pub fn group_by(&self) -> GroupBy {
        self.group_by
    }

    pub fn rows(&self) -> &[CountRow] {
        &self.rows
    }

    /// Number of events counted
    pub fn total(&self) -> usize {
        self.rows.iter().map(|r| r.count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
