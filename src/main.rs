//! Touchline CLI
//!
//! Explore soccer match event feeds: filter events, count them per player
//! and find reception-to-pass sequences.

use clap::{Parser, Subcommand};
use touchline::{Config, Result};

#[derive(Parser)]
#[command(name = "touchline")]
#[command(about = "Soccer match event feed exploration", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "touchline.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Feed directory (overrides the config)
    #[arg(long, global = true)]
    feeds: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new project with default config
    Init,
    /// Show loaded matches and load warnings
    Status,
    /// List the values available to filter on
    Options,
    /// Filter events and count them
    Filter {
        /// Event type, e.g. PASS, SHOT, TAKE_ON
        #[arg(short = 't', long = "type", default_value = "PASS")]
        event_type: String,
        /// Player name or id, or "all"
        #[arg(long, default_value = "all")]
        player: String,
        /// Team name or id, or "all"
        #[arg(long, default_value = "all")]
        team: String,
        /// Only these matches (repeatable)
        #[arg(long = "match")]
        matches: Vec<String>,
        /// Start of the time window in minutes
        #[arg(long)]
        from_min: Option<f64>,
        /// End of the time window in minutes
        #[arg(long)]
        to_min: Option<f64>,
        /// Pitch zone as x_min,x_max,y_min,y_max
        #[arg(long, conflicts_with = "canvas_rect")]
        zone: Option<String>,
        /// Canvas rectangle as left,top,width,height in pixels
        #[arg(long)]
        canvas_rect: Option<String>,
        /// Grouping: player-team, match or minute
        #[arg(long, default_value = "player-team")]
        group: String,
        /// Print plot points instead of counts
        #[arg(long)]
        points: bool,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Count reception-to-pass sequences per receiving player
    Sequences {
        /// Reception zone as x_min,x_max,y_min,y_max
        #[arg(long)]
        reception_zone: Option<String>,
        /// Next pass zone as x_min,x_max,y_min,y_max
        #[arg(long)]
        next_zone: Option<String>,
        /// Only these matches (repeatable)
        #[arg(long = "match")]
        matches: Vec<String>,
        /// Override the tolerance in seconds
        #[arg(long)]
        tolerance: Option<u64>,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use table, json, or csv.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let mut config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };
    if let Some(feeds) = cli.feeds {
        config.data.feeds_dir = feeds;
    }

    // Run command
    let result = match cli.command {
        Commands::Init => commands::init(&cli.config, &config),
        Commands::Status => commands::status(&config),
        Commands::Options => commands::options(&config),
        Commands::Filter {
            event_type,
            player,
            team,
            matches,
            from_min,
            to_min,
            zone,
            canvas_rect,
            group,
            points,
            format,
        } => commands::filter(
            &config,
            commands::FilterArgs {
                event_type,
                player,
                team,
                matches,
                from_min,
                to_min,
                zone,
                canvas_rect,
                group,
                points,
            },
            format,
        ),
        Commands::Sequences {
            reception_zone,
            next_zone,
            matches,
            tolerance,
            format,
        } => commands::sequences(&config, reception_zone, next_zone, matches, tolerance, format),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use std::collections::BTreeSet;
    use touchline::analysis::{FilterSpec, GroupBy, SequenceQuery, TimeWindow, Zone};
    use touchline::data::Session;
    use touchline::present::{
        count_table_csv, format_count_table, format_sequence_table, plot_points_csv,
        sequence_table_csv,
    };
    use touchline::{EventType, MatchId, TouchlineError};

    pub struct FilterArgs {
        pub event_type: String,
        pub player: String,
        pub team: String,
        pub matches: Vec<String>,
        pub from_min: Option<f64>,
        pub to_min: Option<f64>,
        pub zone: Option<String>,
        pub canvas_rect: Option<String>,
        pub group: String,
        pub points: bool,
    }

    fn load_session(config: &Config) -> Result<Session> {
        let dir = &config.data.feeds_dir;
        if !std::path::Path::new(dir).is_dir() {
            return Err(TouchlineError::Config(format!(
                "Feed directory {} not found. Run 'touchline init' first.",
                dir
            )));
        }
        Session::load_dir(dir, config)
    }

    fn match_set(matches: Vec<String>) -> Option<BTreeSet<MatchId>> {
        if matches.is_empty() {
            None
        } else {
            Some(matches.into_iter().map(MatchId).collect())
        }
    }

    fn parse_canvas_rect(s: &str, config: &Config) -> Result<Zone> {
        let values = s
            .split(',')
            .map(|v| v.trim().parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| TouchlineError::Parse(format!("Invalid canvas rectangle '{}': {}", s, e)))?;

        match values.as_slice() {
            [left, top, width, height] => Ok(Zone::from_canvas_rect(
                *left,
                *top,
                *width,
                *height,
                &config.canvas,
            )),
            _ => Err(TouchlineError::Parse(format!(
                "Canvas rectangle '{}' needs four values: left,top,width,height",
                s
            ))),
        }
    }

    fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    pub fn init(config_path: &str, config: &Config) -> Result<()> {
        config.save(config_path)?;
        println!("Created config at {}", config_path);

        std::fs::create_dir_all(&config.data.feeds_dir)?;
        println!("Created {}/ directory", config.data.feeds_dir);

        println!("\nNext steps:");
        println!(
            "  1. Copy match feeds into {}/ (e.g. 123{}.json + 123{}.json)",
            config.data.feeds_dir, config.pairing.opta_roster_suffix, config.pairing.opta_events_suffix
        );
        println!("  2. Run 'touchline status' to check what loads");
        println!("  3. Run 'touchline filter --type SHOT' to count shots per player");

        Ok(())
    }

    pub fn status(config: &Config) -> Result<()> {
        let session = load_session(config)?;

        println!("Feed directory: {}", config.data.feeds_dir);
        println!("Matches loaded: {}", session.matches().len());
        println!("Events:         {}", session.events().len());

        if !session.matches().is_empty() {
            println!(
                "\n{:<20} {:<14} {:<14} {:<12} {:>8} {:>8} {:>8}",
                "Match", "Provider", "Feed id", "Date", "Players", "Events", "Skipped"
            );
            println!("{}", "-".repeat(90));
            for m in session.matches() {
                let date = m.date.map_or_else(|| "-".to_string(), |d| d.to_string());
                let players = session
                    .identity(&m.match_id)
                    .map_or(0, |identity| identity.player_count());
                println!(
                    "{:<20} {:<14} {:<14} {:<12} {:>8} {:>8} {:>8}",
                    m.match_id.to_string(),
                    m.provider.to_string(),
                    m.feed_id.as_deref().unwrap_or("-"),
                    date,
                    players,
                    m.event_count,
                    m.skipped
                );
            }
        }

        if !session.warnings().is_empty() {
            println!("\nWarnings:");
            for warning in session.warnings() {
                println!("  {}", warning);
            }
        }

        Ok(())
    }

    pub fn options(config: &Config) -> Result<()> {
        let session = load_session(config)?;

        let types: Vec<String> = session.event_types().iter().map(|t| t.to_string()).collect();
        println!("Event types: {}", types.join(", "));

        let matches: Vec<String> = session.match_ids().iter().map(|m| m.to_string()).collect();
        println!("Matches:     {}", matches.join(", "));

        match session.time_bounds() {
            Some((start, end)) => println!(
                "Time range:  {:.1} - {:.1} min",
                start.as_secs_f64() / 60.0,
                end.as_secs_f64() / 60.0
            ),
            None => println!("Time range:  -"),
        }

        println!("\nTeams ({}):", session.team_names().len());
        for name in session.team_names() {
            println!("  {}", name);
        }

        println!("\nPlayers ({}):", session.player_names().len());
        for name in session.player_names() {
            println!("  {}", name);
        }

        Ok(())
    }

    pub fn filter(config: &Config, args: FilterArgs, format: OutputFormat) -> Result<()> {
        let event_type: EventType = args.event_type.parse()?;
        let group_by: GroupBy = args.group.parse()?;

        let zone = match (&args.zone, &args.canvas_rect) {
            (Some(zone), _) => Some(zone.parse::<Zone>()?),
            (None, Some(rect)) => Some(parse_canvas_rect(rect, config)?),
            (None, None) => None,
        };
        let time_range = match (args.from_min, args.to_min) {
            (None, None) => None,
            (start, end) => Some(TimeWindow::new(
                start.unwrap_or(0.0),
                end.unwrap_or(f64::INFINITY),
            )),
        };

        let spec = FilterSpec {
            event_type,
            player: args.player.parse()?,
            team: args.team.parse()?,
            matches: match_set(args.matches),
            time_range,
            zone,
        };
        log::debug!("Filter: {:?}", spec);

        let session = load_session(config)?;

        if args.points {
            let points = session.plot_points(&spec);
            match format {
                OutputFormat::Json => print_json(&points)?,
                OutputFormat::Csv => print!("{}", plot_points_csv(&points)),
                OutputFormat::Table => {
                    println!("{} {} events with coordinates", points.len(), event_type);
                    for p in &points {
                        println!("  #{:<6} x={:>5.1}  y={:>5.1}", p.event_id, p.x, p.y);
                    }
                }
            }
            return Ok(());
        }

        let table = session.counts(&spec, group_by);
        match format {
            OutputFormat::Table => print!("{}", format_count_table(&table)),
            OutputFormat::Json => print_json(&table.rows())?,
            OutputFormat::Csv => print!("{}", count_table_csv(&table)),
        }

        Ok(())
    }

    pub fn sequences(
        config: &Config,
        reception_zone: Option<String>,
        next_zone: Option<String>,
        matches: Vec<String>,
        tolerance: Option<u64>,
        format: OutputFormat,
    ) -> Result<()> {
        let query = SequenceQuery {
            reception_zone: reception_zone
                .as_deref()
                .map(str::parse::<Zone>)
                .transpose()?
                .unwrap_or(Zone::FULL),
            next_pass_zone: next_zone
                .as_deref()
                .map(str::parse::<Zone>)
                .transpose()?
                .unwrap_or(Zone::FULL),
            tolerance: tolerance.map_or_else(|| config.tolerance(), std::time::Duration::from_secs),
        };

        let session = load_session(config)?;
        let matches = match_set(matches);
        let counts = session.sequences(matches.as_ref(), &query);

        match format {
            OutputFormat::Table => print!("{}", format_sequence_table(&counts)),
            OutputFormat::Json => print_json(&counts)?,
            OutputFormat::Csv => print!("{}", sequence_table_csv(&counts)),
        }

        Ok(())
    }
}
