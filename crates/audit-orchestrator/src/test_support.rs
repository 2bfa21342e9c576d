//! In-memory provider for auditor, batch and sector tests.

use async_trait::async_trait;
use audit_core::{FetchError, FundamentalSnapshot, MarketDataProvider, NewsItem, PriceBar, PriceHistory};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Default)]
pub struct StaticProvider {
    snapshots: HashMap<String, FundamentalSnapshot>,
    histories: HashMap<String, PriceHistory>,
    failing: HashSet<String>,
    delay: Option<Duration>,
    news_delay: Option<Duration>,
    fundamentals_calls: AtomicUsize,
}

impl StaticProvider {
    pub fn with_snapshot(mut self, symbol: &str, snapshot: FundamentalSnapshot) -> Self {
        self.snapshots.insert(symbol.to_string(), snapshot);
        self
    }

    pub fn with_history(mut self, symbol: &str, history: PriceHistory) -> Self {
        self.histories.insert(symbol.to_string(), history);
        self
    }

    pub fn failing(mut self, symbol: &str) -> Self {
        self.failing.insert(symbol.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_news_delay(mut self, delay: Duration) -> Self {
        self.news_delay = Some(delay);
        self
    }

    pub fn fundamentals_calls(&self) -> usize {
        self.fundamentals_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataProvider for StaticProvider {
    async fn fundamentals(&self, symbol: &str) -> Result<FundamentalSnapshot, FetchError> {
        self.fundamentals_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(symbol) {
            return Err(FetchError::Network(format!("{} unreachable", symbol)));
        }
        self.snapshots
            .get(symbol)
            .cloned()
            .ok_or_else(|| FetchError::UnknownSymbol(symbol.to_string()))
    }

    async fn price_history(&self, symbol: &str) -> Result<PriceHistory, FetchError> {
        if self.failing.contains(symbol) {
            return Err(FetchError::Network(format!("{} unreachable", symbol)));
        }
        self.histories
            .get(symbol)
            .cloned()
            .ok_or_else(|| FetchError::UnknownSymbol(symbol.to_string()))
    }

    async fn search_news(&self, query: &str, count: usize) -> Result<Vec<NewsItem>, FetchError> {
        if let Some(delay) = self.news_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(vec![NewsItem {
            title: format!("{} climbs", query),
            link: "https://example.com/story".to_string(),
            source: "Wire".to_string(),
        }]
        .into_iter()
        .take(count)
        .collect())
    }
}

pub fn healthy_snapshot() -> FundamentalSnapshot {
    FundamentalSnapshot {
        trailing_eps: Some(10.0),
        book_value: Some(80.0),
        return_on_assets: Some(0.05),
        return_on_equity: Some(0.18),
        operating_cashflow: Some(1000.0),
        net_income_to_common: Some(800.0),
        debt_to_equity: Some(40.0),
        current_ratio: Some(1.5),
        gross_margins: Some(0.30),
        current_price: Some(500.0),
        trailing_pe: Some(50.0),
        long_name: Some("Sample Industries Limited".to_string()),
        sector: Some("Industrials".to_string()),
        ..Default::default()
    }
}

pub fn sample_history() -> PriceHistory {
    PriceHistory::new(vec![
        PriceBar::new(512.0, 488.0, 495.0),
        PriceBar::new(505.0, 490.0, 502.0),
        PriceBar::new(509.0, 494.5, 500.0),
    ])
}
