use audit_core::{AuditRecord, FundamentalSnapshot, NewsItem, PivotLevels, ScoreResult, Verdict};

/// Forward P/E shown when the provider has none
const DEFAULT_SECTOR_PE: f64 = 25.0;
/// 1 crore = 10 million
const CRORE: f64 = 10_000_000.0;
const MILLION: f64 = 1_000_000.0;
const MAX_NEWS_ITEMS: usize = 3;

/// Assemble the display record for one audited ticker.
pub fn synthesize(
    ticker: &str,
    snapshot: &FundamentalSnapshot,
    score: &ScoreResult,
    pivots: &PivotLevels,
    news: Vec<NewsItem>,
) -> AuditRecord {
    let verdict = Verdict::classify(score.health_score, score.valuation_margin_pct);

    AuditRecord {
        ticker: ticker.to_string(),
        company: snapshot
            .long_name
            .clone()
            .unwrap_or_else(|| ticker.to_string()),
        price: round_to(snapshot.current_price.unwrap_or(0.0), 2),
        sector: snapshot.sector.clone().unwrap_or_else(|| "N/A".to_string()),
        volume: format_volume(snapshot.volume.unwrap_or(0)),
        mcap: format_market_cap(snapshot.market_cap.unwrap_or(0.0)),
        pe: snapshot
            .trailing_pe
            .filter(|pe| *pe != 0.0)
            .map(|pe| round_to(pe, 1)),
        sec_pe: round_to(snapshot.forward_pe.unwrap_or(DEFAULT_SECTOR_PE), 1),
        f_score: score.health_score,
        mos: round_to(score.valuation_margin_pct, 1),
        verdict,
        advice: verdict.advice().to_string(),
        graham: round_to(score.graham_fair_value, 2),
        short_res: round_to(pivots.short_resistance, 2),
        short_piv: round_to(pivots.short_pivot, 2),
        short_sup: round_to(pivots.short_support, 2),
        long_res: round_to(pivots.long_resistance, 2),
        long_piv: round_to(pivots.long_pivot, 2),
        long_sup: round_to(pivots.long_support, 2),
        news: news.into_iter().take(MAX_NEWS_ITEMS).collect(),
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// `845,210` below a million, `12.35M` at or above.
pub fn format_volume(volume: u64) -> String {
    if volume as f64 >= MILLION {
        return format!("{:.2}M", volume as f64 / MILLION);
    }

    let digits = volume.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Market cap in crore, e.g. `196570.00 CR`
pub fn format_market_cap(market_cap: f64) -> String {
    format!("{:.2} CR", market_cap / CRORE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(health_score: u8, margin: f64) -> ScoreResult {
        ScoreResult {
            health_score,
            valuation_margin_pct: margin,
            graham_fair_value: 134.16407864998737,
        }
    }

    fn news(n: usize) -> Vec<NewsItem> {
        (0..n)
            .map(|i| NewsItem {
                title: format!("Headline {}", i),
                link: format!("https://example.com/{}", i),
                source: "Wire".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_defaults_for_empty_snapshot() {
        let record = synthesize(
            "XYZ",
            &FundamentalSnapshot::default(),
            &ScoreResult { health_score: 1, valuation_margin_pct: -100.0, graham_fair_value: 0.0 },
            &PivotLevels::flat(0.0),
            vec![],
        );

        assert_eq!(record.company, "XYZ");
        assert_eq!(record.sector, "N/A");
        assert_eq!(record.price, 0.0);
        assert_eq!(record.pe, None);
        assert_eq!(record.sec_pe, 25.0);
        assert_eq!(record.volume, "0");
        assert_eq!(record.mcap, "0.00 CR");
        assert_eq!(record.mos, -100.0);
        assert_eq!(record.verdict, Verdict::RiskTrap);
        assert_eq!(record.advice, "DANGER: Failing financials. Stay away.");
    }

    #[test]
    fn test_rounding_and_verdict() {
        let snapshot = FundamentalSnapshot {
            current_price: Some(500.0),
            trailing_pe: Some(28.237),
            forward_pe: Some(24.06),
            long_name: Some("Sample Industries".to_string()),
            sector: Some("Industrials".to_string()),
            ..Default::default()
        };
        let pivots = PivotLevels {
            short_pivot: 501.3333333,
            short_resistance: 510.6666666,
            short_support: 492.6666666,
            long_pivot: 498.005,
            long_resistance: 530.0,
            long_support: 470.0,
        };

        let record = synthesize("SAMPLE", &snapshot, &score(9, -272.6819), &pivots, vec![]);

        assert_eq!(record.pe, Some(28.2));
        assert_eq!(record.sec_pe, 24.1);
        assert_eq!(record.mos, -272.7);
        assert_eq!(record.graham, 134.16);
        assert_eq!(record.short_piv, 501.33);
        assert_eq!(record.short_res, 510.67);
        assert_eq!(record.verdict, Verdict::QualityGrowth);
        assert_eq!(record.advice, "EXPENSIVE: Elite health, wait for dip.");
        assert_eq!(record.company, "Sample Industries");
    }

    #[test]
    fn test_zero_pe_renders_as_missing() {
        let snapshot = FundamentalSnapshot {
            trailing_pe: Some(0.0),
            ..Default::default()
        };
        let record = synthesize("ZERO", &snapshot, &score(5, 0.0), &PivotLevels::flat(1.0), vec![]);

        assert_eq!(record.pe, None);
        assert_eq!(serde_json::to_value(&record).unwrap()["pe"], "N/A");
    }

    #[test]
    fn test_prime_value_verdict() {
        let record = synthesize(
            "CHEAP",
            &FundamentalSnapshot::default(),
            &score(8, 35.0),
            &PivotLevels::flat(10.0),
            vec![],
        );
        assert_eq!(record.verdict, Verdict::PrimeValue);
        assert_eq!(record.advice, "STRONG BUY: High safety & low price.");
    }

    #[test]
    fn test_news_truncated_to_three() {
        let record = synthesize(
            "NEWSY",
            &FundamentalSnapshot::default(),
            &score(5, 0.0),
            &PivotLevels::flat(1.0),
            news(5),
        );
        assert_eq!(record.news.len(), 3);
        assert_eq!(record.verdict, Verdict::NeutralHold);
    }

    #[test]
    fn test_format_volume() {
        assert_eq!(format_volume(0), "0");
        assert_eq!(format_volume(999), "999");
        assert_eq!(format_volume(1_000), "1,000");
        assert_eq!(format_volume(845_210), "845,210");
        assert_eq!(format_volume(1_000_000), "1.00M");
        assert_eq!(format_volume(12_345_678), "12.35M");
    }

    #[test]
    fn test_format_market_cap() {
        assert_eq!(format_market_cap(1.9657e13), "1965700.00 CR");
        assert_eq!(format_market_cap(123_456_789.0), "12.35 CR");
    }
}
