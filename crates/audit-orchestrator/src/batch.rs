use crate::sink::RecordSink;
use crate::HealthAuditor;
use audit_core::{AuditError, AuditRecord};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Tickers audited at once
    pub concurrency: usize,
    /// Sleep after each fetch while still holding the worker slot
    pub pause: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            pause: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Audit every ticker, appending successes to `sink` as they complete.
///
/// Workers send results to this task over a channel; only this task touches
/// the sink. Per-ticker failures are logged and counted. A sink error stops
/// the run and is returned.
pub async fn run_batch<S: RecordSink + ?Sized>(
    auditor: Arc<HealthAuditor>,
    tickers: Vec<String>,
    options: &BatchOptions,
    sink: &mut S,
) -> Result<BatchSummary, AuditError> {
    let total = tickers.len();
    let started = Instant::now();
    tracing::info!(
        "Starting batch audit of {} tickers with {} workers",
        total,
        options.concurrency.max(1)
    );

    let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let (tx, mut rx) = mpsc::channel::<(String, Result<AuditRecord, AuditError>)>(
        options.concurrency.max(1) * 2,
    );
    let mut tasks = JoinSet::new();

    for ticker in tickers {
        let auditor = Arc::clone(&auditor);
        let semaphore = Arc::clone(&semaphore);
        let tx = tx.clone();
        let pause = options.pause;

        tasks.spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            };
            let result = auditor.audit(&ticker).await;
            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
            // Receiver gone means the coordinator already bailed out
            let _ = tx.send((ticker, result)).await;
        });
    }
    drop(tx);

    let mut summary = BatchSummary {
        total,
        ..Default::default()
    };

    while let Some((ticker, result)) = rx.recv().await {
        match result {
            Ok(record) => {
                if let Err(e) = sink.append(&record) {
                    tracing::error!("Batch aborted writing {}: {}", ticker, e);
                    tasks.abort_all();
                    return Err(e);
                }
                summary.succeeded += 1;
            }
            Err(e) => {
                tracing::warn!("Skipping {}: {}", ticker, e);
                summary.failed += 1;
            }
        }

        let done = summary.succeeded + summary.failed;
        if done % 50 == 0 {
            tracing::info!("Progress: {}/{} audited", done, total);
        }
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            tracing::error!("Audit task panicked: {}", e);
        }
    }

    // Tasks that died before sending count as failures
    summary.failed = total - summary.succeeded;

    tracing::info!(
        "Batch complete in {:.1}s: {} succeeded, {} failed",
        started.elapsed().as_secs_f64(),
        summary.succeeded,
        summary.failed
    );
    Ok(summary)
}
