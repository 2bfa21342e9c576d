//! NSE ticker roster
//!
//! Reads the exchange's published `EQUITY_L.csv` and maps each listed symbol
//! to its Yahoo form (`RELIANCE` -> `RELIANCE.NS`).

use audit_core::{FetchError, TickerRoster};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashSet;
use std::time::Duration;

const NSE_EQUITY_LIST_URL: &str = "https://archives.nseindia.com/content/equities/EQUITY_L.csv";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Well-known large caps used when the exchange list cannot be fetched
pub const FALLBACK_TICKERS: &[&str] = &[
    "RELIANCE", "TCS", "HDFCBANK", "INFY", "ICICIBANK", "HINDUNILVR", "ITC", "SBIN",
    "BHARTIARTL", "KOTAKBANK", "LT", "AXISBANK", "BAJFINANCE", "ASIANPAINT", "MARUTI",
    "SUNPHARMA", "TITAN", "WIPRO", "ULTRACEMCO", "NESTLEIND",
];

pub struct NseRoster {
    client: Client,
    url: String,
    suffix: String,
}

impl NseRoster {
    pub fn new(suffix: impl Into<String>) -> Self {
        let url = std::env::var("NSE_EQUITY_LIST_URL")
            .unwrap_or_else(|_| NSE_EQUITY_LIST_URL.to_string());

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            url,
            suffix: suffix.into(),
        }
    }

    /// Exchange list, or the fallback list if it cannot be fetched or parsed.
    pub async fn tickers_or_fallback(&self) -> Vec<String> {
        match self.tickers().await {
            Ok(tickers) => tickers,
            Err(e) => {
                tracing::warn!("NSE roster unavailable ({}), using {} fallback symbols", e, FALLBACK_TICKERS.len());
                fallback_tickers(&self.suffix)
            }
        }
    }
}

#[async_trait]
impl TickerRoster for NseRoster {
    async fn tickers(&self) -> Result<Vec<String>, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::Http {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        let tickers = parse_equity_list(&body, &self.suffix)?;
        tracing::info!("Loaded {} symbols from NSE equity list", tickers.len());
        Ok(tickers)
    }
}

pub fn fallback_tickers(suffix: &str) -> Vec<String> {
    FALLBACK_TICKERS
        .iter()
        .map(|t| format!("{}{}", t, suffix))
        .collect()
}

/// Extract the `SYMBOL` column, de-duplicated in file order.
pub fn parse_equity_list(csv_text: &str, suffix: &str) -> Result<Vec<String>, FetchError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(csv_text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| FetchError::Parse(e.to_string()))?
        .clone();
    let symbol_idx = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case("SYMBOL"))
        .ok_or_else(|| FetchError::Parse("Equity list has no SYMBOL column".to_string()))?;

    let mut seen = HashSet::new();
    let mut tickers = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| FetchError::Parse(e.to_string()))?;
        let symbol = match record.get(symbol_idx) {
            Some(s) if !s.is_empty() => s.to_uppercase(),
            _ => continue,
        };
        if seen.insert(symbol.clone()) {
            tickers.push(format!("{}{}", symbol, suffix));
        }
    }

    if tickers.is_empty() {
        return Err(FetchError::Parse("Equity list contained no symbols".to_string()));
    }
    Ok(tickers)
}
