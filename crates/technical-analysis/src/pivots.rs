use audit_core::{AuditError, PivotLevels, PriceHistory};

/// Classic floor-trader pivot with its first resistance and support.
///
/// Returns `(pivot, resistance, support)`.
pub fn floor_pivot(high: f64, low: f64, close: f64) -> (f64, f64, f64) {
    let pivot = (high + low + close) / 3.0;
    (pivot, 2.0 * pivot - low, 2.0 * pivot - high)
}

/// Short-term levels from the latest session, long-term levels from the
/// whole window's high and low closed out at the latest close.
pub fn pivot_levels(history: &PriceHistory) -> Result<PivotLevels, AuditError> {
    let latest = history
        .latest()
        .ok_or_else(|| AuditError::InsufficientData("Empty price history".to_string()))?;

    let (short_pivot, short_resistance, short_support) =
        floor_pivot(latest.high, latest.low, latest.close);

    // Both extremes exist whenever a latest bar does
    let window_high = history.window_high().unwrap_or(latest.high);
    let window_low = history.window_low().unwrap_or(latest.low);
    let (long_pivot, long_resistance, long_support) =
        floor_pivot(window_high, window_low, latest.close);

    Ok(PivotLevels {
        short_pivot,
        short_resistance,
        short_support,
        long_pivot,
        long_resistance,
        long_support,
    })
}

/// Same as [`pivot_levels`], but an empty history pins every level to `price`.
pub fn pivot_levels_or_flat(history: &PriceHistory, price: f64) -> PivotLevels {
    pivot_levels(history).unwrap_or_else(|_| PivotLevels::flat(price))
}
