//! Player and team name resolution from roster metadata

use crate::{PlayerId, TeamId};
use chrono::NaiveDate;
use std::collections::HashMap;

/// A player listed in a match roster
#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub player_id: PlayerId,
    pub full_name: String,
    pub team_id: TeamId,
}

/// A team listed in a match roster, with its players
#[derive(Debug, Clone, PartialEq)]
pub struct TeamEntry {
    pub team_id: TeamId,
    pub name: String,
    pub players: Vec<RosterEntry>,
}

/// Roster metadata for one match
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    pub teams: Vec<TeamEntry>,
    pub date: Option<NaiveDate>,
}

/// Lookup tables from provider ids to display names
#[derive(Debug, Clone, Default)]
pub struct IdentityResolver {
    players: HashMap<PlayerId, String>,
    teams: HashMap<TeamId, String>,
    player_teams: HashMap<PlayerId, TeamId>,
}

impl IdentityResolver {
    /// Build the mappings for every team and player in the roster
    pub fn from_roster(roster: &Roster) -> Self {
        let mut resolver = IdentityResolver::default();

        for team in &roster.teams {
            resolver
                .teams
                .insert(team.team_id.clone(), team.name.clone());

            for player in &team.players {
                resolver
                    .players
                    .insert(player.player_id.clone(), player.full_name.clone());
                resolver
                    .player_teams
                    .insert(player.player_id.clone(), player.team_id.clone());
            }
        }

        resolver
    }

    pub fn player_name(&self, id: &PlayerId) -> Option<&str> {
        self.players.get(id).map(String::as_str)
    }

    pub fn team_name(&self, id: &TeamId) -> Option<&str> {
        self.teams.get(id).map(String::as_str)
    }

    /// Team a player was listed under in the roster
    pub fn team_of(&self, id: &PlayerId) -> Option<&TeamId> {
        self.player_teams.get(id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn team_count(&self) -> usize {
        self.teams.len()
    }

    /// Sorted, de-duplicated player names
    pub fn player_names(&self) -> Vec<String> {
        sorted_unique(self.players.values())
    }

    /// Sorted, de-duplicated team names
    pub fn team_names(&self) -> Vec<String> {
        sorted_unique(self.teams.values())
    }
}

fn sorted_unique<'a>(names: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut names: Vec<String> = names.cloned().collect();
    names.sort();
    names.dedup();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_roster() -> Roster {
        let team = |id: &str, name: &str, players: &[(&str, &str)]| TeamEntry {
            team_id: TeamId::from(id),
            name: name.to_string(),
            players: players
                .iter()
                .map(|(pid, pname)| RosterEntry {
                    player_id: PlayerId::from(*pid),
                    full_name: pname.to_string(),
                    team_id: TeamId::from(id),
                })
                .collect(),
        };

        Roster {
            teams: vec![
                team("10", "Home FC", &[("1", "A"), ("2", "B")]),
                team("20", "Away United", &[("3", "C")]),
            ],
            date: None,
        }
    }

    #[test]
    fn test_resolves_listed_ids() {
        let resolver = IdentityResolver::from_roster(&make_roster());

        assert_eq!(resolver.player_name(&PlayerId::from("1")), Some("A"));
        assert_eq!(resolver.player_name(&PlayerId::from("3")), Some("C"));
        assert_eq!(resolver.team_name(&TeamId::from("20")), Some("Away United"));
        assert_eq!(
            resolver.team_of(&PlayerId::from("2")),
            Some(&TeamId::from("10"))
        );
        assert_eq!(resolver.player_count(), 3);
        assert_eq!(resolver.team_count(), 2);
    }

    #[test]
    fn test_absent_ids_are_unknown() {
        let resolver = IdentityResolver::from_roster(&make_roster());

        assert_eq!(resolver.player_name(&PlayerId::from("99")), None);
        assert_eq!(resolver.team_name(&TeamId::from("1")), None);
        assert_eq!(resolver.team_of(&PlayerId::from("99")), None);
    }

    #[test]
    fn test_empty_roster() {
        let resolver = IdentityResolver::from_roster(&Roster::default());
        assert_eq!(resolver.player_count(), 0);
        assert!(resolver.player_names().is_empty());
    }

    #[test]
    fn test_name_listings_are_sorted() {
        let resolver = IdentityResolver::from_roster(&make_roster());
        assert_eq!(resolver.player_names(), vec!["A", "B", "C"]);
        assert_eq!(resolver.team_names(), vec!["Away United", "Home FC"]);
    }
}
