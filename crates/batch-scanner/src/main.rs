//! batch-scanner: exchange-wide health audits and sector median P/E.
//!
//! Usage:
//!   batch-scanner scan                               # whole NSE list -> nse_full_audit.json
//!   batch-scanner scan RELIANCE TCS INFY -o top.json
//!   batch-scanner scan --limit 200 -c 8 --pause-ms 250
//!   batch-scanner sector-medians                     # once -> sector_stats.json
//!   batch-scanner sector-medians --daily --at 08:00

mod cli;
mod schedule;

use anyhow::Context;
use audit_orchestrator::{
    collect_sector_medians, run_batch, write_sector_stats, AuditorConfig, BatchOptions,
    HealthAuditor, JsonArrayWriter,
};
use clap::Parser;
use cli::{Cli, Command, ScanArgs, SectorArgs, TickerArgs};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use yahoo_client::{NseRoster, YahooClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    // Batch runs revisit each ticker once, so the record cache only costs memory
    let config = AuditorConfig {
        cache_ttl: Duration::ZERO,
        ..AuditorConfig::from_env()
    };

    match cli.command {
        Command::Scan(args) => scan(args, config).await,
        Command::SectorMedians(args) => sector_medians(args, config).await,
    }
}

fn init_tracing() {
    let json_logging = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "batch_scanner=info,audit_orchestrator=info,yahoo_client=info".into());

    if json_logging {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn resolve_tickers(args: &TickerArgs, suffix: &str) -> Vec<String> {
    let mut tickers = if args.tickers.is_empty() {
        NseRoster::new(suffix).tickers_or_fallback().await
    } else {
        args.tickers.clone()
    };

    if let Some(limit) = args.limit {
        tickers.truncate(limit);
    }
    tickers
}

async fn scan(args: ScanArgs, mut config: AuditorConfig) -> anyhow::Result<()> {
    if !args.with_news {
        config.news_count = 0;
    }

    let tickers = resolve_tickers(&args.tickers, &config.exchange_suffix).await;
    let auditor = Arc::new(HealthAuditor::new(Arc::new(YahooClient::new()), config));
    let options = BatchOptions {
        concurrency: args.concurrency,
        pause: Duration::from_millis(args.tickers.pause_ms),
    };

    let mut writer = JsonArrayWriter::create(&args.output)
        .with_context(|| format!("opening {}", args.output.display()))?;
    let summary = run_batch(auditor, tickers, &options, &mut writer).await?;
    writer.finish()?;

    tracing::info!(
        "Saved {} of {} audits to {} ({} failed)",
        summary.succeeded,
        summary.total,
        args.output.display(),
        summary.failed
    );
    Ok(())
}

async fn sector_medians(args: SectorArgs, config: AuditorConfig) -> anyhow::Result<()> {
    let suffix = config.exchange_suffix.clone();
    let auditor = HealthAuditor::new(Arc::new(YahooClient::new()), config);

    if !args.daily {
        return compute_and_write(&auditor, &args, &suffix).await;
    }

    tracing::info!("Sector stats scheduled daily at {}", args.at.format("%H:%M"));
    let (auditor, args, suffix) = (&auditor, &args, suffix.as_str());
    schedule::run_daily(args.at, move || compute_and_write(auditor, args, suffix)).await;
    Ok(())
}

async fn compute_and_write(
    auditor: &HealthAuditor,
    args: &SectorArgs,
    suffix: &str,
) -> anyhow::Result<()> {
    let started = Instant::now();
    let tickers = resolve_tickers(&args.tickers, suffix).await;
    let pause = Duration::from_millis(args.tickers.pause_ms);

    let stats = collect_sector_medians(auditor, &tickers, pause).await;
    write_sector_stats(&args.output, &stats)
        .with_context(|| format!("writing {}", args.output.display()))?;

    tracing::info!(
        "Sector stats for {} sectors done in {:.1}s",
        stats.len(),
        started.elapsed().as_secs_f64()
    );
    Ok(())
}
