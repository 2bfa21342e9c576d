use serde::{Deserialize, Serialize};

/// Raw fundamentals for one symbol as reported by the data provider.
///
/// Every field is optional; scoring resolves absent values to fixed defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundamentalSnapshot {
    pub trailing_eps: Option<f64>,
    pub book_value: Option<f64>,
    pub return_on_assets: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub operating_cashflow: Option<f64>,
    pub net_income_to_common: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub current_ratio: Option<f64>,
    pub gross_margins: Option<f64>,
    pub current_price: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub forward_pe: Option<f64>,
    pub market_cap: Option<f64>,
    pub volume: Option<u64>,
    pub long_name: Option<String>,
    pub sector: Option<String>,
}

/// One trading session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl PriceBar {
    pub fn new(high: f64, low: f64, close: f64) -> Self {
        Self { high, low, close }
    }
}

/// Chronological window of sessions; the last bar is the most recent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceHistory {
    bars: Vec<PriceBar>,
}

impl PriceHistory {
    pub fn new(bars: Vec<PriceBar>) -> Self {
        Self { bars }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn latest(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    pub fn window_high(&self) -> Option<f64> {
        self.bars.iter().map(|b| b.high).reduce(f64::max)
    }

    pub fn window_low(&self) -> Option<f64> {
        self.bars.iter().map(|b| b.low).reduce(f64::min)
    }
}

impl From<Vec<PriceBar>> for PriceHistory {
    fn from(bars: Vec<PriceBar>) -> Self {
        Self::new(bars)
    }
}

/// Output of the fundamental scorer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// 0 to 9
    pub health_score: u8,
    /// Margin of safety in percent; -100 when fair value is undefined
    pub valuation_margin_pct: f64,
    /// Graham number; 0 when EPS or book value is not positive
    pub graham_fair_value: f64,
}

/// Short-term levels come from the latest session, long-term from the window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PivotLevels {
    pub short_pivot: f64,
    pub short_resistance: f64,
    pub short_support: f64,
    pub long_pivot: f64,
    pub long_resistance: f64,
    pub long_support: f64,
}

impl PivotLevels {
    /// Every level pinned to one price, used when no history is available
    pub fn flat(price: f64) -> Self {
        Self {
            short_pivot: price,
            short_resistance: price,
            short_support: price,
            long_pivot: price,
            long_resistance: price,
            long_support: price,
        }
    }
}

/// Categorical outcome of an audit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "PRIME VALUE")]
    PrimeValue,
    #[serde(rename = "QUALITY GROWTH")]
    QualityGrowth,
    #[serde(rename = "RISK TRAP")]
    RiskTrap,
    #[serde(rename = "NEUTRAL HOLD")]
    NeutralHold,
}

impl Verdict {
    /// First matching rule wins: strong health splits on margin, weak health
    /// is a trap regardless of price, everything else is neutral.
    pub fn classify(health_score: u8, margin_pct: f64) -> Self {
        if health_score >= 7 {
            if margin_pct > 10.0 {
                Verdict::PrimeValue
            } else {
                Verdict::QualityGrowth
            }
        } else if health_score <= 3 {
            Verdict::RiskTrap
        } else {
            Verdict::NeutralHold
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            Verdict::PrimeValue => "STRONG BUY: High safety & low price.",
            Verdict::QualityGrowth => "EXPENSIVE: Elite health, wait for dip.",
            Verdict::RiskTrap => "DANGER: Failing financials. Stay away.",
            Verdict::NeutralHold => "AVERAGE: No clear edge currently.",
        }
    }

    pub fn to_label(&self) -> &'static str {
        match self {
            Verdict::PrimeValue => "PRIME VALUE",
            Verdict::QualityGrowth => "QUALITY GROWTH",
            Verdict::RiskTrap => "RISK TRAP",
            Verdict::NeutralHold => "NEUTRAL HOLD",
        }
    }
}

/// Company headline attached to an audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    pub source: String,
}

/// Display-ready result of one audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub ticker: String,
    pub company: String,
    pub price: f64,
    pub sector: String,
    pub volume: String,
    pub mcap: String,
    #[serde(with = "not_available")]
    pub pe: Option<f64>,
    pub sec_pe: f64,
    pub f_score: u8,
    pub mos: f64,
    pub verdict: Verdict,
    pub advice: String,
    pub graham: f64,
    pub short_res: f64,
    pub short_piv: f64,
    pub short_sup: f64,
    pub long_res: f64,
    pub long_piv: f64,
    pub long_sup: f64,
    #[serde(default)]
    pub news: Vec<NewsItem>,
}

/// Wire envelope: `{"status":"success", ...record}` or `{"status":"error","message":..}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AuditResponse {
    Success(AuditRecord),
    Error { message: String },
}

impl AuditResponse {
    pub fn error(message: impl Into<String>) -> Self {
        AuditResponse::Error {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AuditResponse::Success(_))
    }
}

/// Aggregated multiples for one sector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectorStats {
    pub median_pe: f64,
}

/// Trailing P/E is rendered as "N/A" when the provider has none.
mod not_available {
    use serde::{Deserialize, Deserializer, Serializer};

    const NOT_AVAILABLE: &str = "N/A";

    pub fn serialize<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_f64(*v),
            None => serializer.serialize_str(NOT_AVAILABLE),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(v) => Some(v),
            Raw::Text(_) => None,
        })
    }
}
