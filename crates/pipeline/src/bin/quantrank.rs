//! `quantrank` command-line driver.

use anyhow::Context;
use clap::{Parser, Subcommand};
use quantrank_core::{Config, Error};
use quantrank_features::indicator_panel;
use quantrank_ingestion::{build_market_context, minutes_since_open, resolve_context, sanitize_history};
use quantrank_pipeline::{HistoryProvider, MarketSnapshot, Ranker, SnapshotProvider};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "quantrank", version, about = "Rank tickers by composite quality score")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rank tickers from a market snapshot and print JSON results.
    Rank {
        /// Snapshot JSON with benchmark bars, volatility snapshot and histories.
        #[arg(long)]
        snapshot: PathBuf,

        /// Optional configuration JSON; missing fields take defaults.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Minutes since the regular-session open. Defaults to the local clock.
        #[arg(long)]
        minutes_since_open: Option<f64>,

        /// Tickers to rank (comma separated). Defaults to every snapshot ticker,
        /// or the configured universe when the snapshot has none.
        #[arg(long, value_delimiter = ',')]
        tickers: Vec<String>,

        /// Print only the best N results.
        #[arg(long)]
        top: Option<usize>,
    },
    /// Print the chart indicator panel of one ticker as JSON.
    Panel {
        /// Snapshot JSON holding the ticker's history.
        #[arg(long)]
        snapshot: PathBuf,

        #[arg(long)]
        ticker: String,

        /// Print only the most recent N bars.
        #[arg(long)]
        last: Option<usize>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Rank {
            snapshot,
            config,
            minutes_since_open: minutes,
            tickers,
            top,
        } => rank(snapshot, config, minutes, tickers, top),
        Command::Panel { snapshot, ticker, last } => panel(snapshot, &ticker, last),
    }
}

fn rank(
    snapshot_path: PathBuf,
    config_path: Option<PathBuf>,
    minutes: Option<f64>,
    tickers: Vec<String>,
    top: Option<usize>,
) -> anyhow::Result<()> {
    let config = match &config_path {
        Some(path) => Config::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    let snapshot = MarketSnapshot::from_json_file(&snapshot_path)
        .with_context(|| format!("loading snapshot {}", snapshot_path.display()))?;

    let context = resolve_context(match snapshot.volatility {
        Some(vol) => build_market_context(snapshot.benchmark.clone(), vol),
        None => Err(Error::data("snapshot has no volatility snapshot")),
    });

    let minutes = minutes.unwrap_or_else(|| minutes_since_open(chrono::Local::now().naive_local()));
    let tickers = if !tickers.is_empty() {
        tickers
    } else if !snapshot.histories.is_empty() {
        snapshot.tickers()
    } else {
        config.pipeline.universe.clone()
    };

    tracing::info!(
        tickers = tickers.len(),
        minutes_since_open = minutes,
        fallback_context = context.is_fallback,
        "starting ranking run"
    );

    let provider = SnapshotProvider::from(&snapshot);
    let mut results = Ranker::new(&config).rank_universe(&provider, &tickers, &context, minutes);
    if let Some(n) = top {
        results.truncate(n);
    }

    let json = serde_json::to_string_pretty(&results).context("serializing results")?;
    println!("{}", json);
    Ok(())
}

fn panel(snapshot_path: PathBuf, ticker: &str, last: Option<usize>) -> anyhow::Result<()> {
    let snapshot = MarketSnapshot::from_json_file(&snapshot_path)
        .with_context(|| format!("loading snapshot {}", snapshot_path.display()))?;
    let bars = SnapshotProvider::from(&snapshot).daily_history(ticker)?;

    let mut points = indicator_panel(&sanitize_history(bars));
    if let Some(n) = last {
        let skip = points.len().saturating_sub(n);
        points.drain(..skip);
    }
    tracing::debug!(ticker, bars = points.len(), "indicator panel");

    let json = serde_json::to_string_pretty(&points).context("serializing panel")?;
    println!("{}", json);
    Ok(())
}
