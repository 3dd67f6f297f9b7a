//! boardpulse CLI - board productivity metrics from task history.

mod report;

use std::path::PathBuf;

use anyhow::{Context, Result};
use boardpulse_core::{Board, BoardConfig};
use boardpulse_engine::MetricsAggregator;
use boardpulse_source::{ConduitSource, JsonFileSource, TaskSource};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use report::{select_interval, Report};

#[derive(Parser)]
#[command(name = "boardpulse")]
#[command(about = "Productivity metrics for a task board", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Board configuration file
    #[arg(short, long, default_value = "boardpulse.json", global = true)]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute metrics for an interval
    Report {
        /// Interval start (YYYY-MM-DD or RFC 3339), defaults to --days before the end
        #[arg(long)]
        since: Option<String>,
        /// Interval end, exclusive (YYYY-MM-DD or RFC 3339), defaults to now
        #[arg(long)]
        until: Option<String>,
        /// Interval length in days when --since is omitted
        #[arg(long, default_value = "7")]
        days: u32,
        /// Read tasks from a JSON dump instead of the Conduit API
        #[arg(long)]
        input: Option<PathBuf>,
        /// Conduit API token (overrides the configuration file)
        #[arg(long, env = "BOARDPULSE_API_TOKEN", hide_env_values = true)]
        api_token: Option<String>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the configured pipeline
    Stages,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Logs go to stderr so report output can be piped
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = BoardConfig::load(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    let board = config.board().context("Invalid board configuration")?;

    match cli.command {
        Commands::Report { since, until, days, input, api_token, json } => {
            let interval = select_interval(
                since.as_deref(),
                until.as_deref(),
                days,
                chrono::Utc::now(),
            )?;

            let source: Box<dyn TaskSource> = match input {
                Some(path) => Box::new(JsonFileSource::new(path)),
                None => {
                    let mut conduit = config
                        .conduit
                        .take()
                        .context("No conduit section in configuration and no --input given")?;
                    if api_token.is_some() {
                        conduit.api_token = api_token;
                    }
                    Box::new(ConduitSource::new(&conduit)?)
                }
            };

            let tasks = source.fetch_tasks().await.context("Failed to fetch tasks")?;
            info!(tasks = tasks.len(), "Replaying task histories");

            let aggregator = MetricsAggregator::new(&board);
            let report = Report {
                interval,
                metrics: aggregator.compute_metrics(&tasks, &interval),
                resolved: aggregator.resolved_tasks(&tasks, &interval),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report);
            }
        }
        Commands::Stages => print_stages(&board),
    }

    Ok(())
}

fn print_stages(board: &Board) {
    println!("Pipeline ({} stages)", board.stages.stages().len());
    for stage in board.stages.stages() {
        println!("  {:>2} | {} | {}", stage.ordinal, stage.display_name, stage.identifier);
    }
    println!("Default points: {}", board.default_points);
    println!("Resolved status: {}", board.resolved_status);
}
