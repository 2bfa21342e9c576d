//! Sector Median Calculations
//!
//! Groups snapshots by sector and reduces each group's trailing P/E values
//! to a median multiple.

use audit_core::{FundamentalSnapshot, SectorStats};
use statrs::statistics::{Data, Median};
use std::collections::BTreeMap;

/// Sector name used when the provider reports none
pub const UNKNOWN_SECTOR: &str = "Unknown";

/// Median trailing P/E per sector, rounded to 2 decimals.
///
/// Snapshots without a trailing P/E (absent, zero or non-finite) contribute
/// nothing, and sectors left
/// with no values are omitted from the result.
pub fn compute_sector_medians(snapshots: &[FundamentalSnapshot]) -> BTreeMap<String, SectorStats> {
    let mut grouped: BTreeMap<String, Vec<f64>> = BTreeMap::new();

    for snapshot in snapshots {
        let sector = snapshot
            .sector
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(UNKNOWN_SECTOR);
        let values = grouped.entry(sector.to_string()).or_default();
        if let Some(pe) = snapshot.trailing_pe.filter(|pe| pe.is_finite() && *pe != 0.0) {
            values.push(pe);
        }
    }

    grouped
        .into_iter()
        .filter(|(_, pes)| !pes.is_empty())
        .map(|(sector, pes)| {
            let median = Data::new(pes).median();
            (sector, SectorStats { median_pe: (median * 100.0).round() / 100.0 })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(sector: Option<&str>, pe: Option<f64>) -> FundamentalSnapshot {
        FundamentalSnapshot {
            sector: sector.map(|s| s.to_string()),
            trailing_pe: pe,
            ..Default::default()
        }
    }

    #[test]
    fn test_odd_and_even_groups() {
        let snapshots = vec![
            snapshot(Some("Technology"), Some(30.0)),
            snapshot(Some("Technology"), Some(22.0)),
            snapshot(Some("Technology"), Some(26.0)),
            snapshot(Some("Energy"), Some(12.0)),
            snapshot(Some("Energy"), Some(15.0)),
        ];

        let medians = compute_sector_medians(&snapshots);

        assert_eq!(medians.len(), 2);
        assert_eq!(medians["Technology"].median_pe, 26.0);
        assert_eq!(medians["Energy"].median_pe, 13.5);
    }

    #[test]
    fn test_missing_pe_excluded_and_empty_sector_dropped() {
        let snapshots = vec![
            snapshot(Some("Utilities"), None),
            snapshot(Some("Financial Services"), Some(18.333)),
            snapshot(Some("Financial Services"), None),
        ];

        let medians = compute_sector_medians(&snapshots);

        assert!(!medians.contains_key("Utilities"));
        assert_eq!(medians["Financial Services"].median_pe, 18.33);
    }

    #[test]
    fn test_zero_pe_treated_as_missing() {
        let snapshots = vec![
            snapshot(Some("Energy"), Some(0.0)),
            snapshot(Some("Energy"), Some(10.0)),
            snapshot(Some("Energy"), Some(14.0)),
            snapshot(Some("Utilities"), Some(0.0)),
        ];

        let medians = compute_sector_medians(&snapshots);

        assert_eq!(medians["Energy"].median_pe, 12.0);
        assert!(!medians.contains_key("Utilities"));
    }

    #[test]
    fn test_missing_sector_grouped_as_unknown() {
        let snapshots = vec![snapshot(None, Some(40.0)), snapshot(Some(""), Some(20.0))];

        let medians = compute_sector_medians(&snapshots);

        assert_eq!(medians.len(), 1);
        assert_eq!(medians[UNKNOWN_SECTOR].median_pe, 30.0);
    }

    #[test]
    fn test_no_snapshots() {
        assert!(compute_sector_medians(&[]).is_empty());
    }
}
