//! Plan Analytics CLI
//!
//! Runs analyses over exported server snapshots and prints JSON.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use plan_analytics::{
    AnalysisConfig, Diagnosed, PlayersMutator, PlayersOnlineResolver, ReportBuilder,
    ServerSnapshot, VERSION,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "plan-analytics")]
#[command(version = VERSION)]
#[command(about = "Player analytics for game server snapshots", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the full analysis report of a snapshot
    Summary {
        /// Snapshot JSON file
        snapshot: PathBuf,

        /// Reference date in epoch milliseconds (defaults to now)
        #[arg(long)]
        date: Option<i64>,
    },

    /// Print weekly activity group membership
    Activity {
        /// Snapshot JSON file
        snapshot: PathBuf,

        /// Reference date in epoch milliseconds (defaults to now)
        #[arg(long)]
        date: Option<i64>,
    },

    /// Predict which players of another snapshot are likely to be retained
    Retention {
        /// Snapshot with the training population
        snapshot: PathBuf,

        /// Snapshot with the players to classify
        #[arg(long)]
        compare: PathBuf,

        /// Ignore training players registered after this date (epoch ms)
        #[arg(long)]
        date_limit: i64,
    },

    /// Show configuration
    Config,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => AnalysisConfig::load_from(path),
        None => AnalysisConfig::load(),
    }
    .context("Could not load configuration")?;

    match cli.command {
        Commands::Summary { snapshot, date } => cmd_summary(&config, &snapshot, date),
        Commands::Activity { snapshot, date } => cmd_activity(&config, &snapshot, date),
        Commands::Retention {
            snapshot,
            compare,
            date_limit,
        } => cmd_retention(&config, &snapshot, &compare, date_limit),
        Commands::Config => cmd_config(&config, cli.config.as_deref()),
    }
}

fn cmd_summary(config: &AnalysisConfig, path: &Path, date: Option<i64>) -> Result<()> {
    let (_, players) = load_players(config, path)?;
    let report = ReportBuilder::new()
        .with_warnings(players.warnings)
        .build(&players.value, date.unwrap_or_else(now));
    print_json(&report)
}

fn cmd_activity(config: &AnalysisConfig, path: &Path, date: Option<i64>) -> Result<()> {
    let (_, players) = load_players(config, path)?;
    print_json(&players.value.to_activity_data_map(date.unwrap_or_else(now)))
}

fn cmd_retention(
    config: &AnalysisConfig,
    path: &Path,
    compare: &Path,
    date_limit: i64,
) -> Result<()> {
    let (snapshot, players) = load_players(config, path)?;
    let (_, candidates) = load_players(config, compare)?;
    let resolver = PlayersOnlineResolver::new(snapshot.online_samples.iter().copied());

    let retained = players
        .value
        .compare_and_find_those_likely_to_be_retained(&candidates.value, date_limit, &resolver)
        .context("Not enough data to predict retention")?;

    print_json(&retained.uuids())
}

fn cmd_config(config: &AnalysisConfig, path: Option<&Path>) -> Result<()> {
    let path = path.map_or_else(AnalysisConfig::config_path, Path::to_path_buf);
    eprintln!("Config file: {}", path.display());
    print_json(config)
}

fn load_players(
    config: &AnalysisConfig,
    path: &Path,
) -> Result<(ServerSnapshot, Diagnosed<PlayersMutator>)> {
    let snapshot = ServerSnapshot::load(path)
        .with_context(|| format!("Could not read snapshot {}", path.display()))?;

    let players = PlayersMutator::for_container(&snapshot);
    let bucketer = config.day_bucketer()?;
    let players = Diagnosed {
        value: players
            .value
            .with_settings(config.activity)
            .with_day_bucketer(bucketer)
            .with_workers(config.workers()),
        warnings: players.warnings,
    };

    tracing::info!(
        players = players.value.count(),
        snapshot = %path.display(),
        "Loaded snapshot"
    );
    Ok((snapshot, players))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn now() -> i64 {
    Utc::now().timestamp_millis()
}
