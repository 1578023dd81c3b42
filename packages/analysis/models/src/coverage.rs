//! Per-region distance records for one scenario.

use std::collections::HashMap;

use school_share_geography_models::RegionId;
use serde::{Deserialize, Serialize};

use crate::Notice;

/// Distance, in meters, within which a region counts as covered.
pub const COVERAGE_THRESHOLD_M: f64 = 10_000.0;

/// Nearest-facility distances for one block group, before and after
/// activation, plus the fields derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageRecord {
    /// Canonical block-group id.
    pub region_id: RegionId,
    /// Distance to the nearest existing facility.
    pub distance_before_m: f64,
    /// Distance to the nearest facility or activated school.
    pub distance_after_m: f64,
    /// `before - after`; negative values are kept as-is.
    pub distance_reduction_m: f64,
    /// Reduction as a percentage of `before`; 0 when `before` is 0.
    pub percent_improvement: f64,
    /// `before` within the coverage threshold.
    pub covered_before: bool,
    /// `after` within the coverage threshold.
    pub covered_after: bool,
    /// Covered after activation but not before.
    pub newly_covered: bool,
}

impl CoverageRecord {
    /// Builds a record and its derived fields from the two distances.
    #[must_use]
    pub fn from_distances(region_id: RegionId, before_m: f64, after_m: f64) -> Self {
        let reduction = before_m - after_m;
        let percent_improvement = if before_m > 0.0 {
            reduction / before_m * 100.0
        } else {
            0.0
        };
        let covered_before = before_m <= COVERAGE_THRESHOLD_M;
        let covered_after = after_m <= COVERAGE_THRESHOLD_M;

        Self {
            region_id,
            distance_before_m: before_m,
            distance_after_m: after_m,
            distance_reduction_m: reduction,
            percent_improvement,
            covered_before,
            covered_after,
            newly_covered: covered_after && !covered_before,
        }
    }

    /// Distance reduction in kilometers.
    #[must_use]
    pub fn distance_reduction_km(&self) -> f64 {
        self.distance_reduction_m / 1000.0
    }
}

/// Aggregate view of a coverage set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageSummary {
    /// Regions whose distance went down.
    pub improved_regions: usize,
    /// All regions in the set.
    pub total_regions: usize,
    /// Mean reduction across all regions, in km.
    pub mean_reduction_km: f64,
    /// Regions that crossed into coverage.
    pub newly_covered: usize,
}

/// Coverage records loaded for one (state, service, rate) request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageSet {
    /// Rate the caller asked for.
    pub requested_rate: u8,
    /// Rate whose file was actually read.
    pub rate_used: u8,
    /// One record per region, first occurrence wins.
    pub records: Vec<CoverageRecord>,
    /// Conditions recovered while loading.
    pub notices: Vec<Notice>,
}

impl CoverageSet {
    /// Whether a different rate's file stood in for the requested one.
    #[must_use]
    pub const fn is_substituted(&self) -> bool {
        self.requested_rate != self.rate_used
    }

    /// Index of records by region id.
    #[must_use]
    pub fn by_region(&self) -> HashMap<&RegionId, &CoverageRecord> {
        self.records.iter().map(|r| (&r.region_id, r)).collect()
    }

    /// Aggregates the set.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn summary(&self) -> CoverageSummary {
        let total = self.records.len();
        let mean_reduction_km = if total == 0 {
            0.0
        } else {
            self.records
                .iter()
                .map(CoverageRecord::distance_reduction_km)
                .sum::<f64>()
                / total as f64
        };

        CoverageSummary {
            improved_regions: self
                .records
                .iter()
                .filter(|r| r.distance_reduction_m > 0.0)
                .count(),
            total_regions: total,
            mean_reduction_km,
            newly_covered: self.records.iter().filter(|r| r.newly_covered).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rid(raw: &str) -> RegionId {
        RegionId::parse(raw).unwrap()
    }

    #[test]
    fn newly_covered_iff_covered_after_and_not_before() {
        let cases = [
            (0.0, 0.0),
            (5_000.0, 2_000.0),
            (15_000.0, 8_000.0),
            (15_000.0, 12_000.0),
            (10_000.0, 10_000.0),
            (10_000.5, 10_000.0),
            (8_000.0, 12_000.0),
        ];
        for (before, after) in cases {
            let r = CoverageRecord::from_distances(rid("480019501001"), before, after);
            assert_eq!(
                r.newly_covered,
                r.covered_after && !r.covered_before,
                "before={before} after={after}"
            );
        }
    }

    #[test]
    fn percent_improvement_is_zero_exactly_when_before_is_zero() {
        let zero = CoverageRecord::from_distances(rid("480019501001"), 0.0, 0.0);
        assert!(zero.percent_improvement.is_finite());
        assert!(zero.percent_improvement.abs() < f64::EPSILON);

        let zero_worse = CoverageRecord::from_distances(rid("480019501001"), 0.0, 500.0);
        assert!(zero_worse.percent_improvement.abs() < f64::EPSILON);

        let half = CoverageRecord::from_distances(rid("480019501001"), 4_000.0, 2_000.0);
        assert!(half.percent_improvement.is_finite());
        assert!((half.percent_improvement - 50.0).abs() < 1e-9);
    }

    #[test]
    fn negative_reduction_is_not_clamped() {
        let r = CoverageRecord::from_distances(rid("480019501001"), 2_000.0, 3_000.0);
        assert!((r.distance_reduction_m + 1_000.0).abs() < f64::EPSILON);
        assert!((r.percent_improvement + 50.0).abs() < 1e-9);
    }

    #[test]
    fn summary_counts() {
        let set = CoverageSet {
            requested_rate: 30,
            rate_used: 25,
            records: vec![
                CoverageRecord::from_distances(rid("480019501001"), 12_000.0, 8_000.0),
                CoverageRecord::from_distances(rid("480019501002"), 3_000.0, 3_000.0),
                CoverageRecord::from_distances(rid("480019501003"), 5_000.0, 3_000.0),
            ],
            notices: Vec::new(),
        };

        let summary = set.summary();
        assert!(set.is_substituted());
        assert_eq!(summary.total_regions, 3);
        assert_eq!(summary.improved_regions, 2);
        assert_eq!(summary.newly_covered, 1);
        assert!((summary.mean_reduction_km - 2.0).abs() < 1e-9);
    }
}
