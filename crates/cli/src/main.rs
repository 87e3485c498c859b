//! Surebet
//!
//! Reconciles scraped bookmaker odds across sites and flags arbitrage margins.

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use surebet_core::Config;
use surebet_reconcile::TeamKeyTable;
use surebet_report::{load_snapshot, opportunities, Pipeline, QuoteTableWriter, RunSummary};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "surebet")]
#[command(about = "Normalize scraped odds, join them across bookmakers and compute margins")]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Scraped quotes (competition -> site -> rows)
    #[arg(short, long, default_value = "all_quotes.json")]
    quotes: PathBuf,

    /// Team name correspondence table
    #[arg(short, long, default_value = "teams_correspondancy.csv")]
    keys: PathBuf,

    /// Output directory (overrides the config)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Only process these competitions
    #[arg(long = "competition")]
    competitions: Vec<String>,

    /// Also write the log to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_ref())?;

    let mut config = Config::load(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;
    if let Some(dir) = cli.output_dir {
        config.output.dir = dir;
    }

    let keys = TeamKeyTable::load(&cli.keys)
        .with_context(|| format!("loading team keys {}", cli.keys.display()))?;
    let snapshot = load_snapshot(&cli.quotes)
        .with_context(|| format!("loading quotes {}", cli.quotes.display()))?;

    tracing::info!(
        competitions = snapshot.len(),
        teams = keys.len(),
        reference = %config.reference_site,
        "starting reconciliation"
    );

    let writer = QuoteTableWriter::new(config.output.clone());
    let pipeline = Pipeline::new(config, &keys)?;

    let only = (!cli.competitions.is_empty()).then_some(cli.competitions.as_slice());
    let now = Local::now().naive_local();
    let report = pipeline.run(&snapshot, only, now)?;

    let quotes_path = writer.write_quotes(&report)?;
    let failures_path = writer.append_failures(report.failures())?;

    for (competition, anomaly) in report.anomalies() {
        tracing::warn!(competition, ?anomaly, "site anomaly");
    }

    let summary = RunSummary::calculate(&report);
    tracing::info!(
        competitions = summary.competitions,
        matches = summary.matches,
        overlap = %format!("{:.1}%", summary.overlap_rate() * 100.0),
        priced = summary.priced_matches,
        arbitrages = summary.arbitrage_opportunities,
        best_margin = ?summary.best_margin,
        failures = summary.failures,
        unresolved = summary.joins.unresolved,
        duplicates = summary.joins.duplicates,
        "run complete"
    );
    for (site, count) in &summary.site_coverage {
        tracing::info!(site = %site, matches = *count, "site coverage");
    }

    for opportunity in opportunities(&report) {
        let legs: Vec<String> = opportunity
            .legs
            .iter()
            .map(|leg| format!("{}@{} {}", leg.outcome.suffix(), leg.site, leg.odds))
            .collect();
        tracing::info!(
            competition = %opportunity.competition,
            home = opportunity.home.as_deref().unwrap_or("?"),
            away = opportunity.away.as_deref().unwrap_or("?"),
            margin = %format!("{:.4}", opportunity.margin),
            legs = %legs.join(", "),
            "arbitrage"
        );
    }

    println!("{}", quotes_path.display());
    println!("{}", failures_path.display());
    Ok(())
}
