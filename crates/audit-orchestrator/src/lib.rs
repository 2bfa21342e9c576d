use audit_core::{
    AuditError, AuditRecord, AuditResponse, FundamentalSnapshot, MarketDataProvider, NewsItem,
    PriceHistory,
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use fundamental_analysis::FundamentalScorer;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use technical_analysis::pivot_levels_or_flat;

pub mod batch;
pub mod sector;
pub mod sink;
pub mod synthesizer;

pub use batch::{run_batch, BatchOptions, BatchSummary};
pub use sector::{collect_sector_medians, write_sector_stats};
pub use sink::{JsonArrayWriter, RecordSink};
pub use synthesizer::synthesize;

#[cfg(test)]
pub(crate) mod test_support;

/// Internal cache entry with timestamp
struct CacheEntry<T> {
    data: T,
    cached_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AuditorConfig {
    /// Appended to bare tickers, `.NS` for the National Stock Exchange
    pub exchange_suffix: String,
    /// Upper bound on fetching one ticker's data
    pub fetch_timeout: Duration,
    /// Zero disables the record cache
    pub cache_ttl: Duration,
    /// Headlines to request per audit; zero skips the news search
    pub news_count: usize,
}

impl Default for AuditorConfig {
    fn default() -> Self {
        Self {
            exchange_suffix: ".NS".to_string(),
            fetch_timeout: Duration::from_secs(30),
            cache_ttl: Duration::from_secs(300),
            news_count: 4,
        }
    }
}

impl AuditorConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let secs = |key: &str, fallback: Duration| {
            std::env::var(key)
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(fallback)
        };

        Self {
            exchange_suffix: std::env::var("EXCHANGE_SUFFIX").unwrap_or(defaults.exchange_suffix),
            fetch_timeout: secs("FETCH_TIMEOUT_SECS", defaults.fetch_timeout),
            cache_ttl: secs("AUDIT_CACHE_TTL_SECS", defaults.cache_ttl),
            news_count: defaults.news_count,
        }
    }
}

/// Runs one audit end to end: fetch, score, pivot, synthesize.
pub struct HealthAuditor {
    provider: Arc<dyn MarketDataProvider>,
    scorer: FundamentalScorer,
    config: AuditorConfig,
    /// Completed records per exchange symbol
    record_cache: DashMap<String, CacheEntry<AuditRecord>>,
}

impl HealthAuditor {
    pub fn new(provider: Arc<dyn MarketDataProvider>, config: AuditorConfig) -> Self {
        Self {
            provider,
            scorer: FundamentalScorer::new(),
            config,
            record_cache: DashMap::new(),
        }
    }

    /// Split user input into the display ticker and the provider symbol.
    ///
    /// `reliance` and `RELIANCE.NS` both resolve to `("RELIANCE", "RELIANCE.NS")`;
    /// a ticker carrying some other suffix is passed through unchanged.
    /// Only `A-Z`, `0-9`, `&`, `.` and `-` are accepted (`M&M`, `BAJAJ-AUTO`).
    pub fn resolve_symbol(&self, ticker: &str) -> Result<(String, String), AuditError> {
        let ticker = ticker.trim().to_ascii_uppercase();
        if ticker.is_empty() {
            return Err(AuditError::InvalidInput("Ticker is empty".to_string()));
        }
        if let Some(bad) = ticker
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '&' | '.' | '-')))
        {
            return Err(AuditError::InvalidInput(format!(
                "Ticker {:?} contains invalid character {:?}",
                ticker, bad
            )));
        }

        let suffix = self.config.exchange_suffix.to_uppercase();
        if !suffix.is_empty() {
            if let Some(bare) = ticker.strip_suffix(&suffix).filter(|b| !b.is_empty()) {
                return Ok((bare.to_string(), ticker.clone()));
            }
        }
        if ticker.contains('.') {
            return Ok((ticker.clone(), ticker));
        }
        let symbol = format!("{}{}", ticker, self.config.exchange_suffix);
        Ok((ticker, symbol))
    }

    /// Audit a ticker, converting any failure into the error envelope.
    pub async fn audit_response(&self, ticker: &str) -> AuditResponse {
        match self.audit(ticker).await {
            Ok(record) => AuditResponse::Success(record),
            Err(e) => {
                tracing::warn!("Audit of {} failed: {}", ticker, e);
                AuditResponse::error(e.to_string())
            }
        }
    }

    pub async fn audit(&self, ticker: &str) -> Result<AuditRecord, AuditError> {
        let (display, symbol) = self.resolve_symbol(ticker)?;

        if let Some(record) = self.cached(&symbol) {
            tracing::debug!("Serving cached audit for {}", symbol);
            return Ok(record);
        }

        let deadline = Instant::now() + self.config.fetch_timeout;
        let (snapshot, history) = self.fetch_bundle(&symbol, deadline).await?;
        let price = snapshot.current_price.unwrap_or(0.0);

        let score = self.scorer.score(&snapshot, price);
        if tracing::enabled!(tracing::Level::DEBUG) {
            let passed: Vec<&str> = self
                .scorer
                .criteria(&snapshot)
                .iter()
                .filter(|c| c.passed)
                .map(|c| c.name)
                .collect();
            tracing::debug!("{} passed: {}", symbol, passed.join(", "));
        }

        if history.is_empty() {
            tracing::debug!("{} has no price history, pinning pivots to {}", symbol, price);
        }
        let pivots = pivot_levels_or_flat(&history, price);

        let company = snapshot.long_name.clone().unwrap_or_else(|| display.clone());
        let news = self.fetch_news(&company, deadline).await;

        let record = synthesize(&display, &snapshot, &score, &pivots, news);
        tracing::info!(
            "Audited {}: f_score={} mos={:.1} verdict={}",
            symbol,
            record.f_score,
            record.mos,
            record.verdict.to_label()
        );

        if !self.config.cache_ttl.is_zero() {
            self.record_cache.insert(
                symbol,
                CacheEntry {
                    data: record.clone(),
                    cached_at: Utc::now(),
                },
            );
        }
        Ok(record)
    }

    /// Fundamentals only, bounded by the fetch timeout
    pub async fn fundamentals(&self, ticker: &str) -> Result<FundamentalSnapshot, AuditError> {
        let (_, symbol) = self.resolve_symbol(ticker)?;
        match tokio::time::timeout(self.config.fetch_timeout, self.provider.fundamentals(&symbol)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(AuditError::Timeout(self.config.fetch_timeout.as_secs())),
        }
    }

    /// Snapshot and history fetched concurrently, bounded by `deadline`.
    /// A failed history fetch degrades to an empty window.
    async fn fetch_bundle(
        &self,
        symbol: &str,
        deadline: Instant,
    ) -> Result<(FundamentalSnapshot, PriceHistory), AuditError> {
        let fetch = async {
            tokio::join!(
                self.provider.fundamentals(symbol),
                self.provider.price_history(symbol),
            )
        };

        let (snapshot_result, history_result) = tokio::time::timeout_at(deadline, fetch)
            .await
            .map_err(|_| AuditError::Timeout(self.config.fetch_timeout.as_secs()))?;

        let snapshot = snapshot_result?;
        let history = history_result.unwrap_or_else(|e| {
            tracing::warn!("Price history unavailable for {}: {}", symbol, e);
            PriceHistory::default()
        });
        Ok((snapshot, history))
    }

    /// Whatever remains of the audit's deadline; running out yields no news.
    async fn fetch_news(&self, company: &str, deadline: Instant) -> Vec<NewsItem> {
        if self.config.news_count == 0 {
            return Vec::new();
        }

        let query = format!("{} stock", company);
        let search = self.provider.search_news(&query, self.config.news_count);
        match tokio::time::timeout_at(deadline, search).await {
            Ok(Ok(news)) => news,
            Ok(Err(e)) => {
                tracing::debug!("News search for {:?} failed: {}", query, e);
                Vec::new()
            }
            Err(_) => {
                tracing::debug!("News search for {:?} timed out", query);
                Vec::new()
            }
        }
    }

    fn cached(&self, symbol: &str) -> Option<AuditRecord> {
        let ttl = chrono::Duration::from_std(self.config.cache_ttl).ok()?;
        let entry = self.record_cache.get(symbol)?;
        if Utc::now() - entry.cached_at < ttl {
            Some(entry.data.clone())
        } else {
            drop(entry);
            self.record_cache.remove(symbol);
            None
        }
    }
}
