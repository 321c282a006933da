//! Soccer match event exploration
//!
//! Normalizes provider event feeds into one event model, filters the events
//! and reconstructs reception-to-pass sequences.

pub mod analysis;
pub mod data;
pub mod present;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Identifier of a player as given by the provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub String);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        PlayerId(s.to_string())
    }
}

/// Identifier of a team as given by the provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(pub String);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TeamId {
    fn from(s: &str) -> Self {
        TeamId(s.to_string())
    }
}

/// Identifier of a match, derived from the feed file base name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatchId(pub String);

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MatchId {
    fn from(s: &str) -> Self {
        MatchId(s.to_string())
    }
}

/// Provider family of an event feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    Opta,
    StatsPerform,
    Wyscout,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Opta => write!(f, "Opta"),
            Provider::StatsPerform => write!(f, "StatsPerform"),
            Provider::Wyscout => write!(f, "Wyscout"),
        }
    }
}

/// Kind of on-pitch action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Pass,
    Shot,
    TakeOn,
    Duel,
    Tackle,
    Interception,
    Clearance,
    BallRecovery,
    Foul,
    Generic,
}

impl EventType {
    pub const ALL: [EventType; 10] = [
        EventType::Pass,
        EventType::Shot,
        EventType::TakeOn,
        EventType::Duel,
        EventType::Tackle,
        EventType::Interception,
        EventType::Clearance,
        EventType::BallRecovery,
        EventType::Foul,
        EventType::Generic,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EventType::Pass => "PASS",
            EventType::Shot => "SHOT",
            EventType::TakeOn => "TAKE_ON",
            EventType::Duel => "DUEL",
            EventType::Tackle => "TACKLE",
            EventType::Interception => "INTERCEPTION",
            EventType::Clearance => "CLEARANCE",
            EventType::BallRecovery => "BALL_RECOVERY",
            EventType::Foul => "FOUL",
            EventType::Generic => "GENERIC",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for EventType {
    type Err = TouchlineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase().replace([' ', '-'], "_");
        EventType::ALL
            .iter()
            .copied()
            .find(|t| t.name() == wanted)
            .ok_or_else(|| TouchlineError::UnknownEventType(s.to_string()))
    }
}

/// Outcome of an event as reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventResult {
    Success,
    Fail,
}

/// A location on the normalized 0-100 pitch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Build a point only if both coordinates lie on the pitch
    pub fn on_pitch(x: f64, y: f64) -> Option<Self> {
        let valid = |v: f64| v.is_finite() && (0.0..=100.0).contains(&v);
        if valid(x) && valid(y) {
            Some(Point { x, y })
        } else {
            None
        }
    }
}

/// A single normalized event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Row index within the aggregated event set
    pub event_id: usize,
    pub match_id: MatchId,
    pub event_type: EventType,
    pub period: Option<u8>,
    /// Time since match start
    pub timestamp: Duration,
    pub team_id: Option<TeamId>,
    pub team_name: Option<String>,
    pub player_id: Option<PlayerId>,
    pub player_name: Option<String>,
    pub coordinates: Option<Point>,
    pub end_coordinates: Option<Point>,
    pub receiver_id: Option<PlayerId>,
    pub receiver_name: Option<String>,
    pub result: Option<EventResult>,
}

impl Event {
    /// Timestamp in fractional minutes
    pub fn minutes(&self) -> f64 {
        self.timestamp.as_secs_f64() / 60.0
    }

    /// Whole match minute the event falls in
    pub fn minute(&self) -> u32 {
        (self.timestamp.as_secs() / 60) as u32
    }

    pub fn is_pass(&self) -> bool {
        self.event_type == EventType::Pass
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum TouchlineError {
    #[error("Failed to load match {match_id}: {message}")]
    MatchLoad { match_id: MatchId, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unknown event type: {0}")]
    UnknownEventType(String),
}

pub type Result<T> = std::result::Result<T, TouchlineError>;

/// Application configuration loaded from touchline.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub pairing: PairingConfig,
    pub sequence: SequenceConfig,
    pub canvas: CanvasConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub feeds_dir: String,
}

/// File name suffixes used to pair the files of one match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairingConfig {
    pub opta_roster_suffix: String,
    pub opta_events_suffix: String,
    pub statsperform_metadata_suffix: String,
    pub statsperform_events_suffix: String,
    pub wyscout_suffix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceConfig {
    pub tolerance_secs: u64,
}

/// Size of the drawing canvas zones are selected on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for PairingConfig {
    fn default() -> Self {
        PairingConfig {
            opta_roster_suffix: "_f7".to_string(),
            opta_events_suffix: "_f24".to_string(),
            statsperform_metadata_suffix: "_ma1".to_string(),
            statsperform_events_suffix: "_ma3".to_string(),
            wyscout_suffix: "_wyscout".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data: DataConfig {
                feeds_dir: "feeds".to_string(),
            },
            pairing: PairingConfig::default(),
            sequence: SequenceConfig { tolerance_secs: 20 },
            canvas: CanvasConfig {
                width: 600.0,
                height: 400.0,
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TouchlineError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| TouchlineError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| TouchlineError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn tolerance(&self) -> Duration {
        Duration::from_secs(self.sequence.tolerance_secs)
    }
}
