//! Parsed optimization output for one (state, service) pair.

use std::collections::BTreeMap;

use school_share_geography_models::EntityId;
use serde::{Deserialize, Serialize};

use crate::{Notice, Service};

/// Problem dimensions, read once from the first scenario column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Number of census block groups in the state.
    pub region_count: u64,
    /// Number of candidate public high schools.
    pub school_count: u64,
    /// Number of existing service facilities.
    pub facility_count: u64,
    /// Near-coverage distance threshold in meters.
    pub primary_threshold_m: f64,
    /// Far-coverage distance threshold in meters.
    pub secondary_threshold_m: f64,
}

/// The unoptimized, existing-facilities-only scenario.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Baseline {
    /// Regions within the primary threshold.
    pub primary_coverage_count: f64,
    /// Regions within the secondary threshold.
    pub secondary_coverage_count: f64,
    /// Mean region-to-nearest-facility distance in meters.
    pub mean_distance_m: f64,
    /// Worst region-to-nearest-facility distance in meters.
    pub max_distance_m: f64,
}

/// One existing facility assigned to one activated school.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pairing {
    /// Facility identifier as it appears in the facility table.
    pub facility_id: EntityId,
    /// NCES identifier of the paired school.
    pub school_id: EntityId,
}

/// Solution metrics for one activation rate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioResult {
    /// Schools opened as shared service locations.
    pub schools_activated_count: u64,
    /// Regions within the primary threshold.
    pub primary_coverage_count: f64,
    /// Regions within the secondary threshold.
    pub secondary_coverage_count: f64,
    /// Mean distance in meters.
    pub mean_distance_m: f64,
    /// Maximum distance in meters.
    pub max_distance_m: f64,
    /// Minimum distance in meters.
    pub min_distance_m: f64,
    /// Non-white population share among secondary-covered regions.
    pub nonwhite_fraction: f64,
    /// Non-bachelor's population share among secondary-covered regions.
    pub nonbachelor_fraction: f64,
    /// Solver wall time.
    pub computation_seconds: f64,
    /// Activated schools, in solver order.
    pub activated_school_ids: Vec<EntityId>,
    /// Facility to school assignments, in solver order.
    pub facility_school_pairings: Vec<Pairing>,
}

impl ScenarioResult {
    /// Percentage of `school_count` this scenario actually activated.
    ///
    /// Returns `None` when `school_count` is zero.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn activated_percent(&self, school_count: u64) -> Option<f64> {
        (school_count > 0)
            .then(|| self.schools_activated_count as f64 / school_count as f64 * 100.0)
    }
}

/// Everything known about one (state, service) optimization run.
///
/// Demo data uses the same shape with `is_synthetic` set, so consumers
/// never branch on structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    /// State display name.
    pub state: String,
    /// Service type.
    pub service: Service,
    /// Whether these numbers are illustrative constants rather than solver output.
    pub is_synthetic: bool,
    /// Problem dimensions.
    pub metadata: Metadata,
    /// Existing-facility scenario.
    pub baseline: Baseline,
    /// Scenarios keyed by activation rate in percent.
    pub scenarios: BTreeMap<u8, ScenarioResult>,
    /// Conditions recovered during parsing.
    pub notices: Vec<Notice>,
}

impl OptimizationResult {
    /// Available activation rates in ascending order.
    #[must_use]
    pub fn rates(&self) -> Vec<u8> {
        self.scenarios.keys().copied().collect()
    }

    /// The available rate closest to `requested`.
    ///
    /// Ties go to the lower rate. Returns `None` when there are no scenarios.
    #[must_use]
    pub fn nearest_rate(&self, requested: u8) -> Option<u8> {
        self.scenarios
            .keys()
            .copied()
            .min_by_key(|rate| rate.abs_diff(requested))
    }

    /// The scenario for the nearest available rate, with that rate.
    #[must_use]
    pub fn nearest_scenario(&self, requested: u8) -> Option<(u8, &ScenarioResult)> {
        let rate = self.nearest_rate(requested)?;
        self.scenarios.get(&rate).map(|s| (rate, s))
    }
}
