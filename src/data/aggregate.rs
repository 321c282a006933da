//! Match file pairing and event aggregation
//!
//! The files of one match share a base name and differ only in a
//! provider-specific suffix, e.g. `derby_f7.json` + `derby_f24.json`.

use super::providers::opta::{OptaEventsFile, OptaFeed, OptaRosterFile};
use super::providers::statsperform::{MatchEventsFile, MatchMetadataFile, StatsPerformFeed};
use super::providers::wyscout::WyscoutFeed;
use super::providers::RawFeed;
use crate::{Event, MatchId, PairingConfig, Provider, Result, TouchlineError};
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

/// Files making up one match
#[derive(Debug, Clone, PartialEq)]
pub enum MatchFiles {
    /// Roster or metadata file plus an event file
    Paired { metadata: PathBuf, events: PathBuf },
    /// One file carrying both
    Combined(PathBuf),
}

/// A match ready to be loaded
#[derive(Debug, Clone, PartialEq)]
pub struct MatchSource {
    pub match_id: MatchId,
    pub provider: Provider,
    pub files: MatchFiles,
}

/// Non-fatal problems found while assembling the dataset
#[derive(Debug, Clone, PartialEq)]
pub enum LoadWarning {
    /// A paired file whose companion is missing
    Unpaired {
        match_id: MatchId,
        provider: Provider,
        present: PathBuf,
    },
    /// A file matching no known suffix
    Unrecognized(PathBuf),
    /// A match whose feed could not be loaded
    MatchFailed { match_id: MatchId, message: String },
    /// A match id seen more than once; later copies are ignored
    DuplicateMatch(MatchId),
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadWarning::Unpaired {
                match_id,
                provider,
                present,
            } => write!(
                f,
                "{} match {} has no companion for {}",
                provider,
                match_id,
                present.display()
            ),
            LoadWarning::Unrecognized(path) => {
                write!(f, "Ignoring unrecognized file {}", path.display())
            }
            LoadWarning::MatchFailed { match_id, message } => {
                write!(f, "Match {} skipped: {}", match_id, message)
            }
            LoadWarning::DuplicateMatch(match_id) => {
                write!(f, "Match {} appears more than once", match_id)
            }
        }
    }
}

/// Result of pairing a set of files
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub sources: Vec<MatchSource>,
    pub warnings: Vec<LoadWarning>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Metadata,
    Events,
    Combined,
}

/// Work out provider, role and base name from a file stem
fn classify<'a>(stem: &'a str, pairing: &PairingConfig) -> Option<(Provider, Role, &'a str)> {
    let suffixes = [
        (&pairing.opta_roster_suffix, Provider::Opta, Role::Metadata),
        (&pairing.opta_events_suffix, Provider::Opta, Role::Events),
        (
            &pairing.statsperform_metadata_suffix,
            Provider::StatsPerform,
            Role::Metadata,
        ),
        (
            &pairing.statsperform_events_suffix,
            Provider::StatsPerform,
            Role::Events,
        ),
        (&pairing.wyscout_suffix, Provider::Wyscout, Role::Combined),
    ];

    suffixes
        .into_iter()
        .filter(|(suffix, _, _)| !suffix.is_empty())
        .find_map(|(suffix, provider, role)| {
            stem.strip_suffix(suffix.as_str())
                .filter(|base| !base.is_empty())
                .map(|base| (provider, role, base))
        })
}

/// Pair files into match sources by exact base name after suffix stripping
pub fn pair_files<I>(paths: I, pairing: &PairingConfig) -> Discovery
where
    I: IntoIterator<Item = PathBuf>,
{
    #[derive(Default)]
    struct Halves {
        metadata: Option<PathBuf>,
        events: Option<PathBuf>,
    }

    let mut discovery = Discovery::default();
    let mut halves: BTreeMap<(String, &'static str), (Provider, Halves)> = BTreeMap::new();
    let mut combined: Vec<MatchSource> = Vec::new();

    for path in paths {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
            discovery.warnings.push(LoadWarning::Unrecognized(path));
            continue;
        };

        match classify(&stem, pairing) {
            Some((provider, Role::Combined, base)) => combined.push(MatchSource {
                match_id: MatchId::from(base),
                provider,
                files: MatchFiles::Combined(path),
            }),
            Some((provider, role, base)) => {
                let key = (base.to_string(), provider_key(provider));
                let entry = halves
                    .entry(key)
                    .or_insert_with(|| (provider, Halves::default()));
                let slot = if role == Role::Metadata {
                    &mut entry.1.metadata
                } else {
                    &mut entry.1.events
                };
                if slot.is_some() {
                    discovery
                        .warnings
                        .push(LoadWarning::DuplicateMatch(MatchId::from(base)));
                } else {
                    *slot = Some(path);
                }
            }
            None => discovery.warnings.push(LoadWarning::Unrecognized(path)),
        }
    }

    for ((base, _), (provider, h)) in halves {
        let match_id = MatchId(base);
        match (h.metadata, h.events) {
            (Some(metadata), Some(events)) => discovery.sources.push(MatchSource {
                match_id,
                provider,
                files: MatchFiles::Paired { metadata, events },
            }),
            (Some(present), None) | (None, Some(present)) => {
                discovery.warnings.push(LoadWarning::Unpaired {
                    match_id,
                    provider,
                    present,
                })
            }
            (None, None) => {}
        }
    }

    discovery.sources.extend(combined);
    discovery
        .sources
        .sort_by(|a, b| a.match_id.cmp(&b.match_id));

    discovery
}

fn provider_key(provider: Provider) -> &'static str {
    match provider {
        Provider::Opta => "opta",
        Provider::StatsPerform => "statsperform",
        Provider::Wyscout => "wyscout",
    }
}

/// List the JSON files of a directory and pair them
pub fn discover<P: AsRef<Path>>(dir: P, pairing: &PairingConfig) -> Result<Discovery> {
    let mut paths = Vec::new();

    for entry in std::fs::read_dir(dir.as_ref())? {
        let path = entry?.path();
        if path.is_file() && path.extension().map(|e| e == "json").unwrap_or(false) {
            paths.push(path);
        }
    }
    paths.sort();

    log::info!(
        "Found {} feed files in {}",
        paths.len(),
        dir.as_ref().display()
    );
    Ok(pair_files(paths, pairing))
}

fn read_json<T: DeserializeOwned>(match_id: &MatchId, path: &Path) -> Result<T> {
    let load_error = |message: String| TouchlineError::MatchLoad {
        match_id: match_id.clone(),
        message: format!("{}: {}", path.display(), message),
    };
    let content = std::fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
    serde_json::from_str(&content).map_err(|e| load_error(e.to_string()))
}

/// Read and deserialize the files of a match
pub fn load_feed(source: &MatchSource) -> Result<RawFeed> {
    let id = &source.match_id;

    match (&source.files, source.provider) {
        (MatchFiles::Paired { metadata, events }, Provider::Opta) => {
            let roster: OptaRosterFile = read_json(id, metadata)?;
            let events: OptaEventsFile = read_json(id, events)?;
            Ok(RawFeed::Opta(OptaFeed { roster, events }))
        }
        (MatchFiles::Paired { metadata, events }, Provider::StatsPerform) => {
            let metadata: MatchMetadataFile = read_json(id, metadata)?;
            let events: MatchEventsFile = read_json(id, events)?;
            Ok(RawFeed::StatsPerform(StatsPerformFeed { metadata, events }))
        }
        (MatchFiles::Combined(path), Provider::Wyscout) => {
            let feed: WyscoutFeed = read_json(id, path)?;
            Ok(RawFeed::Wyscout(feed))
        }
        (_, provider) => Err(TouchlineError::MatchLoad {
            match_id: id.clone(),
            message: format!("{} feeds do not come in this file layout", provider),
        }),
    }
}

/// Concatenates per-match events into one event set
#[derive(Debug, Default)]
pub struct Aggregator {
    events: Vec<Event>,
    matches: Vec<MatchId>,
    seen: HashSet<MatchId>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a match's events, tagging them and numbering rows globally.
    ///
    /// Returns false (and adds nothing) if the match was already pushed.
    pub fn push(&mut self, match_id: &MatchId, events: Vec<Event>) -> bool {
        if !self.seen.insert(match_id.clone()) {
            log::warn!("Match {} already aggregated, ignoring", match_id);
            return false;
        }

        let offset = self.events.len();
        self.events
            .extend(events.into_iter().enumerate().map(|(i, e)| Event {
                event_id: offset + i,
                match_id: match_id.clone(),
                ..e
            }));
        self.matches.push(match_id.clone());
        true
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn match_ids(&self) -> &[MatchId] {
        &self.matches
    }

    /// Finish aggregation, returning events in insertion order
    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}
