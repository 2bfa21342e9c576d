use crate::HealthAuditor;
use audit_core::{AuditError, FundamentalSnapshot, SectorStats};
use fundamental_analysis::compute_sector_medians;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

/// Fetch fundamentals for each ticker in turn and reduce them to
/// per-sector median P/E. Tickers that fail are skipped.
pub async fn collect_sector_medians(
    auditor: &HealthAuditor,
    tickers: &[String],
    pause: Duration,
) -> BTreeMap<String, SectorStats> {
    let mut snapshots: Vec<FundamentalSnapshot> = Vec::with_capacity(tickers.len());

    for (i, ticker) in tickers.iter().enumerate() {
        match auditor.fundamentals(ticker).await {
            Ok(snapshot) => snapshots.push(snapshot),
            Err(e) => tracing::warn!("Skipping {} for sector stats: {}", ticker, e),
        }
        if !pause.is_zero() && i + 1 < tickers.len() {
            tokio::time::sleep(pause).await;
        }
    }

    let medians = compute_sector_medians(&snapshots);
    tracing::info!(
        "Computed median P/E for {} sectors from {}/{} tickers",
        medians.len(),
        snapshots.len(),
        tickers.len()
    );
    medians
}

/// Persist as `{"<sector>": {"median_pe": x}}`
pub fn write_sector_stats(
    path: impl AsRef<Path>,
    stats: &BTreeMap<String, SectorStats>,
) -> Result<(), AuditError> {
    let path = path.as_ref();
    let file = File::create(path)
        .map_err(|e| AuditError::Output(format!("Cannot create {}: {}", path.display(), e)))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, stats)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    tracing::info!("Wrote sector stats to {}", path.display());
    Ok(())
}
