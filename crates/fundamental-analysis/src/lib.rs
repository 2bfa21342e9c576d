use audit_core::{FundamentalSnapshot, ScoreResult};
use serde::Serialize;

pub mod sector;
pub use sector::compute_sector_medians;

/// Graham's constant: P/E of 15 times P/B of 1.5
const GRAHAM_MULTIPLIER: f64 = 22.5;
/// Margin reported when no intrinsic value can be derived
pub const UNDEFINED_MARGIN_PCT: f64 = -100.0;

/// Outcome of one health check
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Criterion {
    pub name: &'static str,
    pub passed: bool,
}

/// Nine-point health scorer plus Graham-number valuation.
pub struct FundamentalScorer;

impl FundamentalScorer {
    pub fn new() -> Self {
        Self
    }

    /// Score a snapshot against the given current price.
    pub fn score(&self, snapshot: &FundamentalSnapshot, price: f64) -> ScoreResult {
        let graham_fair_value = self.graham_number(snapshot);

        ScoreResult {
            health_score: self.health_score(snapshot),
            valuation_margin_pct: self.margin_of_safety(graham_fair_value, price),
            graham_fair_value,
        }
    }

    pub fn health_score(&self, snapshot: &FundamentalSnapshot) -> u8 {
        self.criteria(snapshot).iter().filter(|c| c.passed).count() as u8
    }

    /// Per-check breakdown. Missing values take the documented default,
    /// which makes every check except the structural point fail.
    pub fn criteria(&self, snapshot: &FundamentalSnapshot) -> [Criterion; 9] {
        let eps = snapshot.trailing_eps.unwrap_or(0.0);
        let roa = snapshot.return_on_assets.unwrap_or(0.0);
        let ocf = snapshot.operating_cashflow.unwrap_or(0.0);
        let net_income = snapshot.net_income_to_common.unwrap_or(0.0);
        let d2e = snapshot.debt_to_equity.unwrap_or(100.0);
        let current_ratio = snapshot.current_ratio.unwrap_or(0.0);
        let gross_margin = snapshot.gross_margins.unwrap_or(0.0);
        let roe = snapshot.return_on_equity.unwrap_or(0.0);

        [
            Criterion { name: "Positive EPS", passed: eps > 0.0 },
            Criterion { name: "Positive ROA", passed: roa > 0.0 },
            Criterion { name: "Positive Operating Cash Flow", passed: ocf > 0.0 },
            Criterion { name: "Cash Flow Exceeds Net Income", passed: ocf > net_income },
            // Yahoo reports D/E in percent, so 100 means debt equals equity
            Criterion { name: "Debt Below Equity", passed: d2e < 100.0 },
            Criterion { name: "Current Ratio Above 1", passed: current_ratio > 1.0 },
            Criterion { name: "Structural Point", passed: true },
            Criterion { name: "Gross Margin Above 20%", passed: gross_margin > 0.20 },
            Criterion { name: "ROE Above 15%", passed: roe > 0.15 },
        ]
    }

    /// sqrt(22.5 * EPS * BVPS), or 0 unless both inputs are positive
    pub fn graham_number(&self, snapshot: &FundamentalSnapshot) -> f64 {
        let eps = snapshot.trailing_eps.unwrap_or(0.0);
        let bvps = snapshot.book_value.unwrap_or(0.0);

        if eps > 0.0 && bvps > 0.0 {
            (GRAHAM_MULTIPLIER * eps * bvps).sqrt()
        } else {
            0.0
        }
    }

    pub fn margin_of_safety(&self, fair_value: f64, price: f64) -> f64 {
        if fair_value > 0.0 {
            ((fair_value - price) / fair_value) * 100.0
        } else {
            UNDEFINED_MARGIN_PCT
        }
    }
}

impl Default for FundamentalScorer {
    fn default() -> Self {
        Self::new()
    }
}
