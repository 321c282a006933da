//! Reception-to-pass sequences
//!
//! A completed pass is a reception for its receiver. The receiver's next
//! pass in the same match, at or after the reception and within the
//! tolerance, completes the sequence.

use super::filter::Zone;
use crate::{Event, MatchId, PlayerId, Point, TeamId};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Longest gap between a reception and the receiver's next pass
pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(20);

/// Zones a sequence has to start and continue in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequenceQuery {
    pub reception_zone: Zone,
    pub next_pass_zone: Zone,
    pub tolerance: Duration,
}

impl Default for SequenceQuery {
    fn default() -> Self {
        SequenceQuery {
            reception_zone: Zone::FULL,
            next_pass_zone: Zone::FULL,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// The receiving end of a pass
#[derive(Debug, Clone, Copy)]
pub struct Reception<'a> {
    pub pass: &'a Event,
    pub receiver_id: &'a PlayerId,
    /// Where the ball arrived, if the feed says
    pub location: Option<Point>,
    pub timestamp: Duration,
}

#[derive(Debug, Clone, Copy)]
pub struct Sequence<'a> {
    pub reception: Reception<'a>,
    pub next_pass: &'a Event,
}

impl Sequence<'_> {
    pub fn gap(&self) -> Duration {
        self.next_pass.timestamp.saturating_sub(self.reception.timestamp)
    }

    fn within(&self, query: &SequenceQuery) -> bool {
        let received = self
            .reception
            .location
            .map_or(false, |p| query.reception_zone.contains(p));
        let released = self
            .next_pass
            .coordinates
            .map_or(false, |p| query.next_pass_zone.contains(p));
        received && released
    }
}

/// Qualifying sequences of one receiving player
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceCount {
    pub player_id: PlayerId,
    pub team_id: Option<TeamId>,
    /// Resolved names; `None` when the roster does not list them
    pub player: Option<String>,
    pub team: Option<String>,
    pub count: usize,
}

/// Pair every reception with the receiver's next pass.
///
/// Non-pass events are ignored. Receptions with no qualifying next pass
/// produce nothing.
pub fn reconstruct<'a, I>(events: I, tolerance: Duration) -> Vec<Sequence<'a>>
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut passes: Vec<&Event> = events.into_iter().filter(|e| e.is_pass()).collect();
    passes.sort_by_key(|e| e.timestamp);

    let mut by_player: HashMap<(&MatchId, &PlayerId), Vec<&Event>> = HashMap::new();
    for &pass in &passes {
        if let Some(player) = &pass.player_id {
            by_player.entry((&pass.match_id, player)).or_default().push(pass);
        }
    }

    let mut sequences = Vec::new();
    for &pass in &passes {
        let Some(receiver_id) = &pass.receiver_id else {
            continue;
        };
        let reception = Reception {
            pass,
            receiver_id,
            location: pass.end_coordinates,
            timestamp: pass.timestamp,
        };

        let Some(candidates) = by_player.get(&(&pass.match_id, receiver_id)) else {
            continue;
        };
        let start = candidates.partition_point(|c| c.timestamp < reception.timestamp);
        let next = candidates[start..]
            .iter()
            .find(|c| !std::ptr::eq(**c, pass))
            .copied();

        if let Some(next_pass) = next {
            if next_pass.timestamp - reception.timestamp <= tolerance {
                sequences.push(Sequence {
                    reception,
                    next_pass,
                });
            }
        }
    }

    sequences
}

/// Count the sequences that fall in both zones, per receiving player and team.
///
/// Groups are keyed on ids so unrostered players stay apart. Sorted by
/// descending count, ties by ascending player name, team name, then id.
pub fn count_sequences<'a, I>(events: I, query: &SequenceQuery) -> Vec<SequenceCount>
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut groups: BTreeMap<(&PlayerId, Option<&TeamId>), SequenceCount> = BTreeMap::new();

    for sequence in reconstruct(events, query.tolerance) {
        if !sequence.within(query) {
            continue;
        }
        let next_pass = sequence.next_pass;
        let key = (sequence.reception.receiver_id, next_pass.team_id.as_ref());

        groups
            .entry(key)
            .or_insert_with(|| SequenceCount {
                player_id: sequence.reception.receiver_id.clone(),
                team_id: next_pass.team_id.clone(),
                player: sequence
                    .reception
                    .pass
                    .receiver_name
                    .clone()
                    .or_else(|| next_pass.player_name.clone()),
                team: next_pass.team_name.clone(),
                count: 0,
            })
            .count += 1;
    }

    let mut counts: Vec<SequenceCount> = groups.into_values().collect();
    counts.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.player.cmp(&b.player))
            .then_with(|| a.team.cmp(&b.team))
            .then_with(|| a.player_id.cmp(&b.player_id))
    });

    log::debug!("{} receiving players with qualifying sequences", counts.len());
    counts
}
