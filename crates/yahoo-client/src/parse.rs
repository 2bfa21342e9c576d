//! Yahoo Finance payload parsing
//!
//! quoteSummary is walked as untyped JSON because every numeric field is
//! wrapped as `{"raw": .., "fmt": ..}` and absent values arrive as `{}`.
//! Chart and search responses are deserialized into typed structs.

use audit_core::{FetchError, FundamentalSnapshot, NewsItem, PriceBar, PriceHistory};
use serde::Deserialize;
use serde_json::Value;

const NEWS_BASE_URL: &str = "https://finance.yahoo.com";

#[derive(Debug, Deserialize)]
pub struct YahooErrorBody {
    pub code: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    pub chart: ChartBody,
}

#[derive(Debug, Deserialize)]
pub struct ChartBody {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<YahooErrorBody>,
}

#[derive(Debug, Deserialize)]
pub struct ChartResult {
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
pub struct ChartIndicators {
    #[serde(default)]
    pub quote: Vec<QuoteSeries>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QuoteSeries {
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub news: Vec<SearchNewsResult>,
}

#[derive(Debug, Deserialize)]
pub struct SearchNewsResult {
    pub title: Option<String>,
    pub link: Option<String>,
    pub publisher: Option<String>,
}

/// Numeric field of a quoteSummary module, unwrapping `{"raw": ..}`
fn raw_f64(module: Option<&Value>, key: &str) -> Option<f64> {
    let value = module?.get(key)?;
    value.get("raw").unwrap_or(value).as_f64()
}

fn text(module: Option<&Value>, key: &str) -> Option<String> {
    module?
        .get(key)?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Map a quoteSummary payload onto a snapshot.
pub fn parse_quote_summary(symbol: &str, json: &Value) -> Result<FundamentalSnapshot, FetchError> {
    let summary = json
        .get("quoteSummary")
        .ok_or_else(|| FetchError::Parse("Missing quoteSummary".to_string()))?;

    if let Some(error) = summary.get("error").filter(|e| !e.is_null()) {
        let description = error
            .get("description")
            .and_then(|d| d.as_str())
            .unwrap_or("no data");
        return Err(FetchError::UnknownSymbol(format!("{}: {}", symbol, description)));
    }

    let result = summary
        .get("result")
        .and_then(|r| r.as_array())
        .and_then(|arr| arr.first())
        .ok_or_else(|| FetchError::UnknownSymbol(symbol.to_string()))?;

    let financial = result.get("financialData");
    let stats = result.get("defaultKeyStatistics");
    let detail = result.get("summaryDetail");
    let price = result.get("price");
    let profile = result.get("assetProfile");

    let volume = raw_f64(price, "regularMarketVolume")
        .or_else(|| raw_f64(detail, "volume"))
        .filter(|v| *v >= 0.0)
        .map(|v| v as u64);

    Ok(FundamentalSnapshot {
        trailing_eps: raw_f64(stats, "trailingEps"),
        book_value: raw_f64(stats, "bookValue"),
        return_on_assets: raw_f64(financial, "returnOnAssets"),
        return_on_equity: raw_f64(financial, "returnOnEquity"),
        operating_cashflow: raw_f64(financial, "operatingCashflow"),
        net_income_to_common: raw_f64(stats, "netIncomeToCommon"),
        debt_to_equity: raw_f64(financial, "debtToEquity"),
        current_ratio: raw_f64(financial, "currentRatio"),
        gross_margins: raw_f64(financial, "grossMargins"),
        current_price: raw_f64(financial, "currentPrice")
            .or_else(|| raw_f64(price, "regularMarketPrice")),
        trailing_pe: raw_f64(detail, "trailingPE"),
        forward_pe: raw_f64(detail, "forwardPE").or_else(|| raw_f64(stats, "forwardPE")),
        market_cap: raw_f64(detail, "marketCap").or_else(|| raw_f64(price, "marketCap")),
        volume,
        long_name: text(price, "longName").or_else(|| text(price, "shortName")),
        sector: text(profile, "sector"),
    })
}

/// Flatten chart columns into bars, skipping sessions with any missing value.
pub fn chart_to_history(symbol: &str, response: ChartResponse) -> Result<PriceHistory, FetchError> {
    if let Some(error) = response.chart.error {
        return Err(FetchError::UnknownSymbol(format!(
            "{}: {}",
            symbol,
            error.description.or(error.code).unwrap_or_else(|| "no data".to_string())
        )));
    }

    let result = match response.chart.result.and_then(|r| r.into_iter().next()) {
        Some(result) => result,
        None => return Ok(PriceHistory::default()),
    };

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let bars = quote
        .high
        .iter()
        .zip(quote.low.iter())
        .zip(quote.close.iter())
        .filter_map(|((high, low), close)| match (high, low, close) {
            (Some(h), Some(l), Some(c)) => Some(PriceBar::new(*h, *l, *c)),
            _ => None,
        })
        .collect();

    Ok(PriceHistory::new(bars))
}

pub fn normalize_news_link(link: &str) -> String {
    if link.starts_with("http") {
        link.to_string()
    } else {
        format!("{}{}", NEWS_BASE_URL, link)
    }
}

pub fn search_to_news(response: SearchResponse, count: usize) -> Vec<NewsItem> {
    response
        .news
        .into_iter()
        .take(count)
        .map(|n| NewsItem {
            title: n.title.unwrap_or_else(|| "Company Update".to_string()),
            link: normalize_news_link(n.link.as_deref().unwrap_or("#")),
            source: n.publisher.unwrap_or_else(|| "Market Feed".to_string()),
        })
        .collect()
}
