use chrono::{DateTime, NaiveTime, TimeZone};
use std::future::Future;

/// Next instant strictly after `now` whose wall-clock time is `at`.
///
/// Days where `at` falls into a DST gap are skipped.
pub fn next_run<Tz: TimeZone>(now: &DateTime<Tz>, at: NaiveTime) -> DateTime<Tz> {
    let tz = now.timezone();
    let mut date = now.date_naive();

    loop {
        if let Some(candidate) = tz.from_local_datetime(&date.and_time(at)).earliest() {
            if candidate > *now {
                return candidate;
            }
        }
        date = match date.succ_opt() {
            Some(next) => next,
            None => return now.clone(),
        };
    }
}

/// Time to sleep from `now` until the next run.
pub fn until_next_run<Tz: TimeZone>(now: &DateTime<Tz>, at: NaiveTime) -> std::time::Duration {
    (next_run(now, at) - now.clone())
        .to_std()
        .unwrap_or_default()
}

/// Run `job` now, then every day at `at` local time. Never returns; a failed
/// run is logged and the schedule continues.
pub async fn run_daily<F, Fut>(at: NaiveTime, mut job: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    loop {
        if let Err(e) = job().await {
            tracing::error!("Scheduled run failed: {:#}", e);
        }

        let wait = until_next_run(&chrono::Local::now(), at);
        tracing::info!("Next scheduled run in {}m", wait.as_secs() / 60);
        tokio::time::sleep(wait).await;
    }
}
