//! Presentation helpers
//!
//! Plot points for the pitch overlay and text/CSV renderings of count
//! tables.

use crate::analysis::counts::{CountTable, GroupBy};
use crate::analysis::sequence::SequenceCount;
use crate::Event;
use serde::Serialize;

/// One event on the pitch overlay
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlotPoint {
    pub event_id: usize,
    pub x: f64,
    pub y: f64,
}

/// Start coordinates of the events that have them, in input order
pub fn plot_points<'a, I>(events: I) -> Vec<PlotPoint>
where
    I: IntoIterator<Item = &'a Event>,
{
    events
        .into_iter()
        .filter_map(|e| {
            e.coordinates.map(|p| PlotPoint {
                event_id: e.event_id,
                x: p.x,
                y: p.y,
            })
        })
        .collect()
}

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

fn count_headers(group_by: GroupBy) -> Vec<&'static str> {
    match group_by {
        GroupBy::PlayerTeam => vec!["Player", "Team", "Count"],
        GroupBy::PlayerTeamMatch => vec!["Player", "Team", "Match", "Count"],
        GroupBy::PlayerTeamMinute => vec!["Player", "Team", "Minute", "Count"],
    }
}

fn count_cells(table: &CountTable) -> Vec<Vec<String>> {
    table
        .rows()
        .iter()
        .map(|row| {
            let mut cells = vec![
                or_dash(row.player.as_deref()).to_string(),
                or_dash(row.team.as_deref()).to_string(),
            ];
            match table.group_by() {
                GroupBy::PlayerTeam => {}
                GroupBy::PlayerTeamMatch => cells.push(
                    row.match_id
                        .as_ref()
                        .map_or_else(|| "-".to_string(), |m| m.to_string()),
                ),
                GroupBy::PlayerTeamMinute => cells.push(
                    row.minute
                        .map_or_else(|| "-".to_string(), |m| m.to_string()),
                ),
            }
            cells.push(row.count.to_string());
            cells
        })
        .collect()
}

const SEQUENCE_HEADERS: &[&str] = &["Player", "Id", "Team", "Sequences"];

fn sequence_cells(counts: &[SequenceCount]) -> Vec<Vec<String>> {
    counts
        .iter()
        .map(|c| {
            vec![
                or_dash(c.player.as_deref()).to_string(),
                c.player_id.to_string(),
                or_dash(c.team.as_deref()).to_string(),
                c.count.to_string(),
            ]
        })
        .collect()
}

/// Render rows inside a box; the last column is right-aligned
fn boxed(title: &str, headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let last = widths.len().saturating_sub(1);
    let line = |cells: &[String]| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (cell, &w))| {
                if i == last {
                    format!("{:>w$}", cell, w = w)
                } else {
                    format!("{:<w$}", cell, w = w)
                }
            })
            .collect();
        format!("│  {}\n", padded.join("  "))
    };

    let rule_width = (widths.iter().sum::<usize>() + 2 * last + 4).max(title.chars().count() + 4);
    let rule = "─".repeat(rule_width);

    let mut out = String::new();
    out.push_str(&format!("┌{}┐\n", rule));
    out.push_str(&format!("│  {}\n", title));
    out.push_str(&format!("├{}┤\n", rule));
    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    out.push_str(&line(&header_cells));
    if rows.is_empty() {
        out.push_str("│  (no events)\n");
    }
    for row in rows {
        out.push_str(&line(row));
    }
    out.push_str(&format!("└{}┘\n", rule));
    out
}

pub fn format_count_table(table: &CountTable) -> String {
    let title = format!("{} events", table.total());
    boxed(&title, &count_headers(table.group_by()), &count_cells(table))
}

pub fn format_sequence_table(counts: &[SequenceCount]) -> String {
    let total: usize = counts.iter().map(|c| c.count).sum();
    let title = format!("{} reception-to-pass sequences", total);
    boxed(&title, SEQUENCE_HEADERS, &sequence_cells(counts))
}

/// Quote a CSV field when it holds a separator, quote or newline
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = headers.join(",").to_lowercase();
    out.push('\n');
    for row in rows {
        let fields: Vec<String> = row
            .iter()
            .map(|cell| if cell == "-" { String::new() } else { csv_field(cell) })
            .collect();
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

pub fn count_table_csv(table: &CountTable) -> String {
    csv(&count_headers(table.group_by()), &count_cells(table))
}

pub fn sequence_table_csv(counts: &[SequenceCount]) -> String {
    csv(SEQUENCE_HEADERS, &sequence_cells(counts))
}

pub fn plot_points_csv(points: &[PlotPoint]) -> String {
    let mut out = String::from("event_id,x,y\n");
    for p in points {
        out.push_str(&format!("{},{},{}\n", p.event_id, p.x, p.y));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventType, MatchId, PlayerId, Point, TeamId};
    use std::time::Duration;

    fn make_event(id: usize, player: Option<&str>, team: &str, point: Option<(f64, f64)>) -> Event {
        Event {
            event_id: id,
            match_id: MatchId::from("M1"),
            event_type: EventType::Shot,
            period: Some(1),
            timestamp: Duration::from_secs(90),
            team_id: None,
            team_name: Some(team.to_string()),
            player_id: None,
            player_name: player.map(str::to_string),
            coordinates: point.map(|(x, y)| Point::new(x, y)),
            end_coordinates: None,
            receiver_id: None,
            receiver_name: None,
            result: None,
        }
    }

    #[test]
    fn test_plot_points_skip_missing_coordinates() {
        let events = vec![
            make_event(0, Some("A"), "Home", Some((10.0, 20.0))),
            make_event(1, Some("B"), "Home", None),
            make_event(2, Some("C"), "Home", Some((90.0, 50.0))),
        ];
        let points = plot_points(&events);

        assert_eq!(
            points,
            vec![
                PlotPoint { event_id: 0, x: 10.0, y: 20.0 },
                PlotPoint { event_id: 2, x: 90.0, y: 50.0 },
            ]
        );
    }

    #[test]
    fn test_format_count_table() {
        let events = vec![
            make_event(0, Some("Bea Best"), "Home FC", None),
            make_event(1, None, "Home FC", None),
            make_event(2, Some("Bea Best"), "Home FC", None),
        ];
        let table = CountTable::build(&events, GroupBy::PlayerTeamMinute);
        let text = format_count_table(&table);

        assert!(text.starts_with('┌'));
        assert!(text.contains("3 events"));
        assert!(text.contains("Minute"));
        assert!(text.contains("│  Bea Best  Home FC  1           2\n"));
        assert!(text.contains("│  -         Home FC  1           1\n"));
    }

    #[test]
    fn test_format_empty_sequences() {
        let text = format_sequence_table(&[]);
        assert!(text.contains("0 reception-to-pass sequences"));
        assert!(text.contains("(no events)"));
    }

    #[test]
    fn test_csv_quoting_and_missing_values() {
        let counts = vec![
            SequenceCount {
                player_id: PlayerId::from("21"),
                team_id: Some(TeamId::from("2")),
                player: Some("Cole, Cy".to_string()),
                team: Some("Away \"United\"".to_string()),
                count: 3,
            },
            SequenceCount {
                player_id: PlayerId::from("8"),
                team_id: None,
                player: None,
                team: None,
                count: 1,
            },
        ];
        let text = sequence_table_csv(&counts);

        assert_eq!(
            text,
            "player,id,team,sequences\n\"Cole, Cy\",21,\"Away \"\"United\"\"\",3\n,8,,1\n"
        );
    }
}
