//! Dashboard-level figures derived from an optimization result.
//!
//! Population, lives-saved, and access numbers are heuristic point
//! estimates built from a per-region population proxy. They are not
//! measured outcomes and every serialized [`Metrics`] says so.

use serde::{Deserialize, Serialize};

/// Caveat attached to every metrics payload.
pub const HEURISTIC_DISCLAIMER: &str = "Population, lives-saved, and access figures are heuristic \
     estimates from a fixed people-per-region proxy, not measured outcomes.";

/// The service-specific headline estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServiceEstimate {
    /// Hospitals: lives saved from shorter travel.
    LivesSaved {
        /// Estimated lives.
        lives: i64,
    },
    /// Arts: people gaining access within the threshold distance.
    NewAccess {
        /// Threshold the estimate refers to, in meters.
        within_m: f64,
        /// Estimated people.
        people: i64,
    },
}

/// Cost of standing up and running the activated schools.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImplementationCost {
    /// One-time cost across all activated schools.
    pub startup: f64,
    /// Recurring yearly cost across all activated schools.
    pub annual: f64,
    /// Startup cost divided by people helped, when any are.
    pub per_person_helped: Option<f64>,
}

/// How many schools a given rate would activate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationPreview {
    /// Upper bound: half the schools, and no more than there are facilities.
    pub max_activatable: u64,
    /// Schools the rate activates after applying the bound.
    pub activated: u64,
}

/// Summary statistics for one scenario against the baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// Rate the caller asked for.
    pub requested_rate: u8,
    /// Rate the figures were computed at.
    pub activation_rate: u8,
    /// Schools opened in that scenario.
    pub schools_activated: u64,
    /// Whether the underlying result is demo data.
    pub is_synthetic: bool,
    /// Baseline mean distance in km.
    pub mean_baseline_distance_km: f64,
    /// Optimized mean distance in km.
    pub mean_optimized_distance_km: f64,
    /// Percent reduction in mean distance; 0 when the baseline is 0.
    pub distance_reduction_pct: f64,
    /// Baseline minus optimized mean distance, in km.
    pub km_saved: f64,
    /// Baseline primary coverage as a percentage of regions.
    pub baseline_coverage_pct: Option<f64>,
    /// Optimized primary coverage as a percentage of regions.
    pub optimized_coverage_pct: Option<f64>,
    /// Difference of the two, in percentage points.
    pub coverage_improvement_pct: Option<f64>,
    /// Regions gaining primary coverage.
    pub regions_helped: i64,
    /// People in those regions.
    pub population_helped: i64,
    /// Regions helped as a percentage of all regions.
    pub population_helped_pct: f64,
    /// Service-specific estimate.
    pub estimate: ServiceEstimate,
    /// Non-white share among secondary-covered regions.
    pub nonwhite_fraction: f64,
    /// Non-bachelor's share among secondary-covered regions.
    pub nonbachelor_fraction: f64,
    /// Implementation cost.
    pub cost: ImplementationCost,
    /// Caveat on the estimated figures.
    pub disclaimer: String,
}

impl Metrics {
    /// Whether the figures come from a different rate than requested.
    #[must_use]
    pub const fn is_substituted(&self) -> bool {
        self.requested_rate != self.activation_rate
    }
}
