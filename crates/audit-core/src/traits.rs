use async_trait::async_trait;
use crate::{FetchError, FundamentalSnapshot, NewsItem, PriceHistory};

/// Source of per-symbol market data
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fundamentals(&self, symbol: &str) -> Result<FundamentalSnapshot, FetchError>;

    /// Trailing window of daily sessions, oldest first
    async fn price_history(&self, symbol: &str) -> Result<PriceHistory, FetchError>;

    async fn search_news(&self, query: &str, count: usize) -> Result<Vec<NewsItem>, FetchError>;
}

/// Source of an exchange's listed symbols
#[async_trait]
pub trait TickerRoster: Send + Sync {
    async fn tickers(&self) -> Result<Vec<String>, FetchError>;
}
