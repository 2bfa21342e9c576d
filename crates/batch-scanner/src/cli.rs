use chrono::NaiveTime;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "batch-scanner",
    version,
    about = "Exchange-wide health audits and sector valuation stats",
    long_about = "Runs the health audit over every NSE-listed equity (or a given list) and \
streams the records to a JSON array, or computes per-sector median P/E.\n\
\n\
Tickers default to the NSE equity list; a built-in large-cap list is used when it \
cannot be downloaded."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Audit every ticker and write the records to a JSON file.
    Scan(ScanArgs),

    /// Compute median trailing P/E per sector.
    SectorMedians(SectorArgs),
}

/// Ticker selection shared by both commands.
#[derive(Debug, Args)]
pub struct TickerArgs {
    /// Explicit tickers (e.g. RELIANCE TCS). Defaults to the NSE equity list.
    #[arg(num_args = 0..)]
    pub tickers: Vec<String>,

    /// Only process the first N tickers.
    #[arg(long)]
    pub limit: Option<usize>,

    /// Sleep after each fetch, in milliseconds.
    #[arg(long, default_value_t = 0)]
    pub pause_ms: u64,
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    #[command(flatten)]
    pub tickers: TickerArgs,

    /// Output file for the JSON array of audit records.
    #[arg(short, long, default_value = "nse_full_audit.json")]
    pub output: PathBuf,

    /// Tickers audited concurrently.
    #[arg(short, long, env = "SCAN_CONCURRENCY", default_value_t = 4)]
    pub concurrency: usize,

    /// Also search headlines for every ticker.
    #[arg(long, default_value_t = false)]
    pub with_news: bool,
}

#[derive(Debug, Args)]
pub struct SectorArgs {
    #[command(flatten)]
    pub tickers: TickerArgs,

    /// Output file for `{sector: {median_pe}}`.
    #[arg(short, long, default_value = "sector_stats.json")]
    pub output: PathBuf,

    /// Keep running and recompute once a day.
    #[arg(long, default_value_t = false)]
    pub daily: bool,

    /// Local time of day for the daily run (HH:MM).
    #[arg(long, default_value = "08:00", value_parser = parse_time_of_day)]
    pub at: NaiveTime,
}

pub fn parse_time_of_day(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|e| format!("expected HH:MM, got {:?}: {}", value, e))
}
