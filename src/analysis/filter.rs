//! Event filtering
//!
//! A [`FilterSpec`] is a conjunction of independent predicates. An event
//! missing a field that an active predicate needs never matches.

use crate::{CanvasConfig, Event, EventType, MatchId, Point, TouchlineError};
use std::collections::BTreeSet;
use std::str::FromStr;

/// A player or team selection; `All` disables the predicate
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    /// Matches the resolved name or the raw provider id
    Only(String),
}

impl Selection {
    fn accepts(&self, name: Option<&str>, id: Option<&str>) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(wanted) => name == Some(wanted.as_str()) || id == Some(wanted.as_str()),
        }
    }
}

impl FromStr for Selection {
    type Err = TouchlineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Ok(Selection::All)
        } else {
            Ok(Selection::Only(s.to_string()))
        }
    }
}

/// Inclusive match-clock window in minutes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub start_min: f64,
    pub end_min: f64,
}

impl TimeWindow {
    pub fn new(start_min: f64, end_min: f64) -> Self {
        TimeWindow { start_min, end_min }
    }

    pub fn contains(&self, event: &Event) -> bool {
        let minutes = event.minutes();
        self.start_min <= minutes && minutes <= self.end_min
    }
}

/// Axis-aligned rectangle on the 0-100 pitch, bounds inclusive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zone {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Zone {
    /// The whole pitch
    pub const FULL: Zone = Zone {
        x_min: 0.0,
        x_max: 100.0,
        y_min: 0.0,
        y_max: 100.0,
    };

    pub fn new(x: (f64, f64), y: (f64, f64)) -> Self {
        Zone {
            x_min: x.0,
            x_max: x.1,
            y_min: y.0,
            y_max: y.1,
        }
    }

    /// Convert a rectangle drawn on the canvas (pixels, origin top-left)
    /// into pitch coordinates (origin bottom-left).
    ///
    /// The y axis is flipped: `top` measures down from the upper edge, so it
    /// becomes `y_max`. Mapping `top` straight onto `y_min` would select the
    /// mirror image of the drawn area.
    pub fn from_canvas_rect(
        left: f64,
        top: f64,
        width: f64,
        height: f64,
        canvas: &CanvasConfig,
    ) -> Self {
        let sx = |px: f64| px * 100.0 / canvas.width;
        let sy = |px: f64| px * 100.0 / canvas.height;
        let x_min = sx(left);
        let y_max = 100.0 - sy(top);
        Zone {
            x_min,
            x_max: x_min + sx(width),
            y_min: y_max - sy(height),
            y_max,
        }
    }

    pub fn contains(&self, point: Point) -> bool {
        !self.is_empty()
            && self.x_min <= point.x
            && point.x <= self.x_max
            && self.y_min <= point.y
            && point.y <= self.y_max
    }

    /// Inverted or zero-area zones contain nothing
    pub fn is_empty(&self) -> bool {
        !(self.x_min < self.x_max && self.y_min < self.y_max)
    }
}

/// Parses `x_min,x_max,y_min,y_max`
impl FromStr for Zone {
    type Err = TouchlineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|v| v.trim().parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| TouchlineError::Parse(format!("Invalid zone '{}': {}", s, e)))?;

        match values.as_slice() {
            [x_min, x_max, y_min, y_max] => Ok(Zone::new((*x_min, *x_max), (*y_min, *y_max))),
            _ => Err(TouchlineError::Parse(format!(
                "Zone '{}' needs four values: x_min,x_max,y_min,y_max",
                s
            ))),
        }
    }
}

/// The full set of filter predicates
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    /// Always applied
    pub event_type: EventType,
    pub player: Selection,
    pub team: Selection,
    /// `None` keeps every match
    pub matches: Option<BTreeSet<MatchId>>,
    pub time_range: Option<TimeWindow>,
    pub zone: Option<Zone>,
}

impl FilterSpec {
    /// Select one event type with every other predicate disabled
    pub fn new(event_type: EventType) -> Self {
        FilterSpec {
            event_type,
            player: Selection::All,
            team: Selection::All,
            matches: None,
            time_range: None,
            zone: None,
        }
    }

    pub fn matches(&self, event: &Event) -> bool {
        if event.event_type != self.event_type {
            return false;
        }

        if !self.player.accepts(
            event.player_name.as_deref(),
            event.player_id.as_ref().map(|p| p.0.as_str()),
        ) {
            return false;
        }

        if !self.team.accepts(
            event.team_name.as_deref(),
            event.team_id.as_ref().map(|t| t.0.as_str()),
        ) {
            return false;
        }

        if let Some(matches) = &self.matches {
            if !matches.contains(&event.match_id) {
                return false;
            }
        }

        if let Some(window) = &self.time_range {
            if !window.contains(event) {
                return false;
            }
        }

        if let Some(zone) = &self.zone {
            match event.coordinates {
                Some(point) if zone.contains(point) => {}
                _ => return false,
            }
        }

        true
    }

    /// Keep the matching events, preserving their order
    pub fn apply<'a, I>(&self, events: I) -> Vec<&'a Event>
    where
        I: IntoIterator<Item = &'a Event>,
    {
        events.into_iter().filter(|e| self.matches(e)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PlayerId, TeamId};
    use std::time::Duration;

    fn make_event(
        id: usize,
        event_type: EventType,
        player: (&str, Option<&str>),
        point: Option<(f64, f64)>,
        secs: u64,
    ) -> Event {
        Event {
            event_id: id,
            match_id: MatchId::from("M1"),
            event_type,
            period: Some(1),
            timestamp: Duration::from_secs(secs),
            team_id: Some(TeamId::from("10")),
            team_name: None,
            player_id: Some(PlayerId::from(player.0)),
            player_name: player.1.map(str::to_string),
            coordinates: point.map(|(x, y)| Point::new(x, y)),
            end_coordinates: None,
            receiver_id: None,
            receiver_name: None,
            result: None,
        }
    }

    fn sample() -> Vec<Event> {
        vec![
            make_event(0, EventType::Pass, ("1", Some("A")), Some((40.0, 50.0)), 60),
            make_event(1, EventType::Shot, ("2", Some("B")), Some((90.0, 50.0)), 600),
            make_event(2, EventType::Shot, ("3", None), None, 1200),
            make_event(3, EventType::Shot, ("1", Some("A")), Some((100.0, 0.0)), 2700),
        ]
    }

    fn ids(events: &[&Event]) -> Vec<usize> {
        events.iter().map(|e| e.event_id).collect()
    }

    #[test]
    fn test_event_type_always_applies() {
        let events = sample();
        let result = FilterSpec::new(EventType::Shot).apply(&events);
        assert_eq!(ids(&result), vec![1, 2, 3]);

        let result = FilterSpec::new(EventType::Foul).apply(&events);
        assert!(result.is_empty());
    }

    #[test]
    fn test_player_by_name_or_id() {
        let events = sample();
        let by_name = FilterSpec {
            player: "B".parse().unwrap(),
            ..FilterSpec::new(EventType::Shot)
        };
        assert_eq!(ids(&by_name.apply(&events)), vec![1]);

        let by_id = FilterSpec {
            player: Selection::Only("3".to_string()),
            ..FilterSpec::new(EventType::Shot)
        };
        assert_eq!(ids(&by_id.apply(&events)), vec![2]);

        let all = FilterSpec {
            player: "ALL".parse().unwrap(),
            ..FilterSpec::new(EventType::Shot)
        };
        assert_eq!(all.apply(&events).len(), 3);
    }

    #[test]
    fn test_team_without_name_matches_only_by_id() {
        let events = sample();
        let by_name = FilterSpec {
            team: Selection::Only("Home FC".to_string()),
            ..FilterSpec::new(EventType::Shot)
        };
        assert!(by_name.apply(&events).is_empty());

        let by_id = FilterSpec {
            team: Selection::Only("10".to_string()),
            ..FilterSpec::new(EventType::Shot)
        };
        assert_eq!(by_id.apply(&events).len(), 3);
    }

    #[test]
    fn test_time_window_inclusive() {
        let events = sample();
        let spec = FilterSpec {
            time_range: Some(TimeWindow::new(10.0, 20.0)),
            ..FilterSpec::new(EventType::Shot)
        };
        assert_eq!(ids(&spec.apply(&events)), vec![1, 2]);
    }

    #[test]
    fn test_zone_bounds_inclusive_and_missing_coordinates_excluded() {
        let events = sample();
        let spec = FilterSpec {
            zone: Some(Zone::FULL),
            ..FilterSpec::new(EventType::Shot)
        };
        // Event 2 has no coordinates even though the zone is the whole pitch
        assert_eq!(ids(&spec.apply(&events)), vec![1, 3]);

        let edge = FilterSpec {
            zone: Some(Zone::new((90.0, 95.0), (45.0, 50.0))),
            ..FilterSpec::new(EventType::Shot)
        };
        assert_eq!(ids(&edge.apply(&events)), vec![1]);
    }

    #[test]
    fn test_inverted_or_collapsed_zone_is_empty() {
        let events = sample();
        for zone in [
            Zone::new((60.0, 40.0), (0.0, 100.0)),
            Zone::new((0.0, 100.0), (70.0, 30.0)),
            Zone::new((90.0, 90.0), (0.0, 100.0)),
        ] {
            assert!(zone.is_empty());
            let spec = FilterSpec {
                zone: Some(zone),
                ..FilterSpec::new(EventType::Shot)
            };
            assert!(spec.apply(&events).is_empty());
        }
    }

    #[test]
    fn test_subset_and_idempotent() {
        let events = sample();
        let specs = [
            FilterSpec::new(EventType::Pass),
            FilterSpec {
                zone: Some(Zone::new((50.0, 100.0), (0.0, 100.0))),
                ..FilterSpec::new(EventType::Shot)
            },
            FilterSpec {
                player: Selection::Only("A".to_string()),
                time_range: Some(TimeWindow::new(0.0, 90.0)),
                ..FilterSpec::new(EventType::Shot)
            },
        ];

        for spec in &specs {
            let once = spec.apply(&events);
            assert!(once.iter().all(|e| events.iter().any(|s| std::ptr::eq(*e, s))));

            let twice = spec.apply(once.iter().copied());
            assert_eq!(ids(&once), ids(&twice));
        }
        // The source is untouched
        assert_eq!(events.len(), 4);
    }

    #[test]
    fn test_scenario_shot_filter() {
        let events = sample();
        let spec: FilterSpec = FilterSpec {
            player: Selection::All,
            ..FilterSpec::new("SHOT".parse().unwrap())
        };
        let result = spec.apply(&events[..2]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].player_name.as_deref(), Some("B"));
    }

    #[test]
    fn test_zone_parsing() {
        let zone: Zone = "10, 20,30,40".parse().unwrap();
        assert_eq!(zone, Zone::new((10.0, 20.0), (30.0, 40.0)));
        assert!("10,20,30".parse::<Zone>().is_err());
        assert!("a,b,c,d".parse::<Zone>().is_err());
    }

    #[test]
    fn test_zone_from_canvas_rect() {
        let canvas = CanvasConfig {
            width: 600.0,
            height: 400.0,
        };
        let zone = Zone::from_canvas_rect(60.0, 0.0, 120.0, 100.0, &canvas);
        assert_eq!(zone, Zone::new((10.0, 30.0), (75.0, 100.0)));

        // Drawn along the bottom edge of the canvas, selects the low-y band
        let bottom = Zone::from_canvas_rect(0.0, 300.0, 600.0, 100.0, &canvas);
        assert_eq!(bottom, Zone::new((0.0, 100.0), (0.0, 25.0)));
        assert!(bottom.contains(Point::new(50.0, 10.0)));
        assert!(!bottom.contains(Point::new(50.0, 90.0)));
    }
}
