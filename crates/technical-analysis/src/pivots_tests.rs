#[cfg(test)]
mod tests {
    use super::super::pivots::*;
    use audit_core::{AuditError, PriceBar, PriceHistory};

    // One month of sessions, oldest first
    fn sample_history() -> PriceHistory {
        let bars = vec![
            (2410.0, 2365.0, 2398.0),
            (2425.0, 2380.0, 2417.5),
            (2440.0, 2402.0, 2431.0),
            (2462.0, 2420.0, 2455.0),
            (2458.0, 2411.0, 2419.0),
            (2430.0, 2388.0, 2395.0),
            (2401.0, 2350.0, 2362.0),
            (2390.0, 2345.0, 2381.0),
            (2412.0, 2370.0, 2408.0),
            (2426.0, 2399.0, 2420.0),
        ];
        PriceHistory::new(
            bars.into_iter()
                .map(|(high, low, close)| PriceBar::new(high, low, close))
                .collect(),
        )
    }

    #[test]
    fn test_floor_pivot_basic() {
        let (p, r, s) = floor_pivot(110.0, 90.0, 100.0);
        assert!((p - 100.0).abs() < 1e-9);
        assert!((r - 110.0).abs() < 1e-9); // 200 - 90
        assert!((s - 90.0).abs() < 1e-9); // 200 - 110
    }

    #[test]
    fn test_short_levels_use_latest_session_only() {
        let levels = pivot_levels(&sample_history()).unwrap();

        let expected_pivot = (2426.0 + 2399.0 + 2420.0) / 3.0;
        assert!((levels.short_pivot - expected_pivot).abs() < 1e-9);
        assert!((levels.short_resistance - (2.0 * expected_pivot - 2399.0)).abs() < 1e-9);
        assert!((levels.short_support - (2.0 * expected_pivot - 2426.0)).abs() < 1e-9);
    }

    #[test]
    fn test_long_levels_use_window_extremes() {
        let levels = pivot_levels(&sample_history()).unwrap();

        // Window high 2462, window low 2345, latest close 2420
        let expected_pivot = (2462.0 + 2345.0 + 2420.0) / 3.0;
        assert!((levels.long_pivot - expected_pivot).abs() < 1e-9);
        assert!((levels.long_resistance - (2.0 * expected_pivot - 2345.0)).abs() < 1e-9);
        assert!((levels.long_support - (2.0 * expected_pivot - 2462.0)).abs() < 1e-9);
    }

    #[test]
    fn test_pivot_identity_holds() {
        let levels = pivot_levels(&sample_history()).unwrap();

        let short_sum = levels.short_resistance + levels.short_support;
        let long_sum = levels.long_resistance + levels.long_support;
        assert!((short_sum - 2.0 * levels.short_pivot).abs() < 1e-9);
        assert!((long_sum - 2.0 * levels.long_pivot).abs() < 1e-9);
    }

    #[test]
    fn test_single_session_short_equals_long() {
        let history = PriceHistory::new(vec![PriceBar::new(52.0, 48.0, 51.0)]);
        let levels = pivot_levels(&history).unwrap();

        assert_eq!(levels.short_pivot, levels.long_pivot);
        assert_eq!(levels.short_resistance, levels.long_resistance);
        assert_eq!(levels.short_support, levels.long_support);
    }

    #[test]
    fn test_long_band_contains_short_band_width() {
        let levels = pivot_levels(&sample_history()).unwrap();

        let short_width = levels.short_resistance - levels.short_support;
        let long_width = levels.long_resistance - levels.long_support;
        assert!(long_width >= short_width);
    }

    #[test]
    fn test_empty_history_is_insufficient() {
        let result = pivot_levels(&PriceHistory::default());
        assert!(matches!(result, Err(AuditError::InsufficientData(_))));
    }

    #[test]
    fn test_empty_history_falls_back_to_price() {
        let levels = pivot_levels_or_flat(&PriceHistory::default(), 250.0);

        for level in [
            levels.short_pivot,
            levels.short_resistance,
            levels.short_support,
            levels.long_pivot,
            levels.long_resistance,
            levels.long_support,
        ] {
            assert_eq!(level, 250.0);
        }
    }

    #[test]
    fn test_fallback_ignored_when_history_present() {
        let levels = pivot_levels_or_flat(&sample_history(), 1.0);
        assert!(levels.short_pivot > 2000.0);
    }
}
