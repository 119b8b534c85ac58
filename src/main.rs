//! # Chainback: Option Strategy Backtester
//!
//! This is the main binary entrypoint for the Chainback application. It
//! replays an archived option-chain history one trading day at a time and
//! lets a set of strategy variants trade against it, each in its own
//! isolated portfolio.
//!
//! ## Responsibilities
//!
//! 1.  **CLI Parsing**: Defines and parses command-line arguments using `clap`.
//! 2.  **Configuration**: Loads the JSON run description and applies any
//!     command-line overrides on top of it.
//! 3.  **Orchestration**: Wires the data feed, the strategy roster, and the
//!     backtester together, then renders the ranked results.

use std::path::PathBuf;

use analyzer::{ParamBucket, bucket_by_parameter};
use anyhow::Context;
use backtester::{Backtester, StrategySummary, spawn_strategies};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use comfy_table::{Table, presets::UTF8_FULL};
use configuration::load_settings;
use datafeed::DbEventFeed;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Day-by-day option strategy backtesting over an archived quote history.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replays a run description against the quote archive.
    Run(RunArgs),
}

#[derive(Parser)]
struct RunArgs {
    /// Path to the JSON run description.
    #[arg(long, short, default_value = "sample.json")]
    config: PathBuf,

    /// Overrides the ticker named in the run description.
    #[arg(long)]
    ticker: Option<String>,

    /// Overrides the first replayed quote date. Format: YYYY-MM-DD
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Overrides the end of the replay window (exclusive). Format: YYYY-MM-DD
    #[arg(long)]
    to: Option<NaiveDate>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let _log_guard = init_logging();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => handle_run(args).await?,
    }

    Ok(())
}

/// Initializes a dual-sink subscriber: human-readable output on stdout and
/// the same stream, stripped of ANSI colors, appended to `session.log`.
///
/// The returned guard must stay alive for the duration of the program or the
/// tail of the log file is lost.
fn init_logging() -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::never(".", "session.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false),
        )
        .init();

    guard
}

async fn handle_run(args: RunArgs) -> anyhow::Result<()> {
    let mut settings =
        load_settings(&args.config).context("Failed to load the run description")?;

    // --- 1. Apply CLI Overrides ---
    if let Some(ticker) = args.ticker {
        settings.ticker = ticker;
    }
    if let Some(from) = args.from {
        settings.from_date = from;
    }
    if let Some(to) = args.to {
        settings.to_date = to;
    }

    // --- 2. Build the Strategy Roster ---
    let pairs = spawn_strategies(&settings).context("Failed to build the strategy roster")?;
    let mut backtester = Backtester::new(pairs);

    // --- 3. Load the Quote History ---
    let database_url = match settings.database_url.clone() {
        Some(url) => url,
        None => std::env::var("DATABASE_URL")
            .context("No databaseUrl in the run description and DATABASE_URL is not set")?,
    };
    let pool = datafeed::connect(&database_url)
        .await
        .context("Failed to connect to the quote archive")?;
    let mut feed = DbEventFeed::load(
        &pool,
        &settings.ticker,
        settings.from_date,
        settings.to_date,
    )
    .await
    .context("Failed to load the quote history")?;

    // --- 4. Replay and Report ---
    let summaries = backtester.run(&mut feed).await?;
    print_summary(&summaries);

    for spec in &settings.analyze {
        for parameter in &spec.params {
            match bucket_by_parameter(&summaries, &spec.strategy, parameter) {
                Ok(buckets) => print_buckets(&spec.strategy, parameter, &buckets),
                Err(error) => tracing::warn!("Skipping analysis: {}", error),
            }
        }
    }

    Ok(())
}

/// Renders the ranked run summaries as a terminal table, best run first.
fn print_summary(summaries: &[StrategySummary]) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        "#",
        "Strategy",
        "Performance %",
        "Max Drawdown %",
        "Net Value",
    ]);

    for (rank, summary) in summaries.iter().enumerate() {
        table.add_row(vec![
            (rank + 1).to_string(),
            summary.unique_id.clone(),
            format!("{:.2}", summary.performance_pct),
            format!("{:.2}", summary.max_drawdown_pct),
            format!("{:.2}", summary.net_value),
        ]);
    }

    println!("{table}");
}

/// Renders the per-value averages produced by the analyzer for one
/// strategy/parameter pair.
fn print_buckets(strategy: &str, parameter: &str, buckets: &[ParamBucket]) {
    println!("Average results for {strategy} by '{parameter}':");

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        parameter,
        "Avg Performance %",
        "Avg Max Drawdown %",
        "Runs",
    ]);

    for bucket in buckets {
        table.add_row(vec![
            bucket.value.to_string(),
            format!("{:.2}", bucket.mean_performance_pct),
            format!("{:.2}", bucket.mean_drawdown_pct),
            bucket.runs.to_string(),
        ]);
    }

    println!("{table}");
}
