use audit_core::{FetchError, FundamentalSnapshot, MarketDataProvider, NewsItem, PriceHistory};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub mod parse;
pub mod roster;

pub use roster::{NseRoster, FALLBACK_TICKERS};

const QUERY_URL: &str = "https://query2.finance.yahoo.com";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

const SUMMARY_MODULES: &str =
    "financialData,defaultKeyStatistics,summaryDetail,price,assetProfile";
const MAX_ATTEMPTS: u32 = 3;
const BASE_BACKOFF_MS: u64 = 500;

/// Sliding-window rate limiter: at most `max_requests` per `window` duration.
#[derive(Clone)]
struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests: max_requests.max(1),
            window,
        }
    }

    async fn acquire(&self) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            if ts.len() < self.max_requests {
                ts.push_back(now);
                return;
            }

            // Wait until the oldest request falls out of the window
            let sleep_dur = match ts.front() {
                Some(&oldest) => (oldest + self.window).duration_since(now) + Duration::from_millis(50),
                None => Duration::from_millis(50),
            };
            drop(ts);
            tracing::debug!("Rate limiter: waiting {:.1}s for Yahoo slot", sleep_dur.as_secs_f64());
            tokio::time::sleep(sleep_dur).await;
        }
    }
}

/// Yahoo Finance client for fundamentals, daily bars and news.
#[derive(Clone)]
pub struct YahooClient {
    client: Client,
    rate_limiter: RateLimiter,
    crumb: Arc<Mutex<Option<String>>>,
    query_url: String,
    cookie_url: String,
    history_range: String,
}

impl YahooClient {
    pub fn new() -> Self {
        // Yahoo publishes no quota; stay well under the informal limit.
        let rate_limit: usize = std::env::var("YAHOO_RATE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        // Trailing window for pivots, in Yahoo range syntax (`1mo`, `3mo`, ...)
        let history_range = std::env::var("YAHOO_HISTORY_RANGE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "1mo".to_string());

        let yahoo = Self {
            client,
            rate_limiter: RateLimiter::new(rate_limit, Duration::from_secs(60)),
            crumb: Arc::new(Mutex::new(None)),
            query_url: QUERY_URL.to_string(),
            cookie_url: COOKIE_URL.to_string(),
            history_range,
        };

        match std::env::var("YAHOO_QUERY_URL") {
            Ok(url) if !url.trim().is_empty() => yahoo.with_base_url(url),
            _ => yahoo,
        }
    }

    /// Point every endpoint, including the session cookie, at another host.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into().trim_end_matches('/').to_string();
        self.cookie_url = url.clone();
        self.query_url = url;
        self
    }

    /// Send a request with rate limiting and bounded retry on transport
    /// errors, 429 and 5xx responses.
    async fn send_request(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, FetchError> {
        let request = builder.build().map_err(|e| FetchError::Network(e.to_string()))?;

        for attempt in 0..MAX_ATTEMPTS {
            self.rate_limiter.acquire().await;
            let req_clone = request
                .try_clone()
                .ok_or_else(|| FetchError::Network("Cannot clone request".to_string()))?;
            let last_attempt = attempt + 1 == MAX_ATTEMPTS;

            match self.client.execute(req_clone).await {
                Ok(response) => {
                    let status = response.status();
                    if status != StatusCode::TOO_MANY_REQUESTS && !status.is_server_error() {
                        return Ok(response);
                    }
                    if last_attempt {
                        if status == StatusCode::TOO_MANY_REQUESTS {
                            return Err(FetchError::RateLimited(format!(
                                "Rate limited by Yahoo after {} attempts",
                                MAX_ATTEMPTS
                            )));
                        }
                        return Err(FetchError::Http {
                            status: status.as_u16(),
                            body: response.text().await.unwrap_or_default(),
                        });
                    }
                    tracing::warn!(
                        "Yahoo returned {}, retry {}/{}",
                        status,
                        attempt + 1,
                        MAX_ATTEMPTS - 1
                    );
                }
                Err(e) => {
                    if last_attempt {
                        return Err(FetchError::Network(e.to_string()));
                    }
                    tracing::warn!("Yahoo request failed ({}), retry {}/{}", e, attempt + 1, MAX_ATTEMPTS - 1);
                }
            }

            tokio::time::sleep(backoff(attempt)).await;
        }

        Err(FetchError::Network("Retries exhausted".to_string()))
    }

    /// Session crumb required by quoteSummary; fetched once and reused.
    async fn crumb(&self) -> Result<String, FetchError> {
        let mut guard = self.crumb.lock().await;
        if let Some(crumb) = guard.as_ref() {
            return Ok(crumb.clone());
        }

        // Sets the consent cookie; the response itself is usually a 404.
        let _ = self.send_request(self.client.get(&self.cookie_url)).await;

        let response = self
            .send_request(self.client.get(format!("{}/v1/test/getcrumb", self.query_url)))
            .await?;
        if !response.status().is_success() {
            return Err(FetchError::Http {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let crumb = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?
            .trim()
            .to_string();
        if crumb.is_empty() {
            return Err(FetchError::Parse("Empty crumb".to_string()));
        }

        *guard = Some(crumb.clone());
        Ok(crumb)
    }

    async fn reset_crumb(&self) {
        *self.crumb.lock().await = None;
    }

    /// Get the fundamentals snapshot for an exchange symbol such as `RELIANCE.NS`
    pub async fn get_quote_summary(&self, symbol: &str) -> Result<FundamentalSnapshot, FetchError> {
        let url = format!("{}/v10/finance/quoteSummary/{}", self.query_url, symbol);

        for refreshed in [false, true] {
            let crumb = self.crumb().await?;
            let response = self
                .send_request(
                    self.client
                        .get(&url)
                        .query(&[("modules", SUMMARY_MODULES), ("crumb", crumb.as_str())]),
                )
                .await?;

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED && !refreshed {
                tracing::debug!("Yahoo crumb rejected, refreshing session");
                self.reset_crumb().await;
                continue;
            }

            // Unknown symbols come back as 404 with an error body
            if !status.is_success() && status != StatusCode::NOT_FOUND {
                return Err(FetchError::Http {
                    status: status.as_u16(),
                    body: response.text().await.unwrap_or_default(),
                });
            }

            let json: serde_json::Value = response
                .json()
                .await
                .map_err(|e| FetchError::Parse(e.to_string()))?;
            return parse::parse_quote_summary(symbol, &json);
        }

        Err(FetchError::Http {
            status: StatusCode::UNAUTHORIZED.as_u16(),
            body: "Yahoo session rejected".to_string(),
        })
    }

    /// Get daily bars over the configured trailing range
    pub async fn get_chart(&self, symbol: &str) -> Result<PriceHistory, FetchError> {
        let url = format!("{}/v8/finance/chart/{}", self.query_url, symbol);

        let response = self
            .send_request(
                self.client
                    .get(&url)
                    .query(&[("range", self.history_range.as_str()), ("interval", "1d")]),
            )
            .await?;

        let status = response.status();
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            return Err(FetchError::Http {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let chart: parse::ChartResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))?;
        parse::chart_to_history(symbol, chart)
    }

    /// Search company news headlines
    pub async fn get_news(&self, query: &str, count: usize) -> Result<Vec<NewsItem>, FetchError> {
        let url = format!("{}/v1/finance/search", self.query_url);
        let news_count = count.to_string();

        let response = self
            .send_request(self.client.get(&url).query(&[
                ("q", query),
                ("quotesCount", "0"),
                ("newsCount", news_count.as_str()),
            ]))
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Http {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let search: parse::SearchResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))?;
        Ok(parse::search_to_news(search, count))
    }
}

impl Default for YahooClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataProvider for YahooClient {
    async fn fundamentals(&self, symbol: &str) -> Result<FundamentalSnapshot, FetchError> {
        self.get_quote_summary(symbol).await
    }

    async fn price_history(&self, symbol: &str) -> Result<PriceHistory, FetchError> {
        self.get_chart(symbol).await
    }

    async fn search_news(&self, query: &str, count: usize) -> Result<Vec<NewsItem>, FetchError> {
        self.get_news(query, count).await
    }
}

/// Exponential backoff: 500ms, 1s, 2s, ...
fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(BASE_BACKOFF_MS.saturating_mul(1u64 << attempt.min(10)))
}
