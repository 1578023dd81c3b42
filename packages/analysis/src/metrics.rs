//! Impact metrics for one scenario against the baseline.
//!
//! The people-per-region proxy and the lives-saved rate drive every
//! population figure. They are policy inputs that need domain review, so
//! they live in [`ImpactPolicy`] rather than in the formulas.

use school_share_analysis_models::{
    HEURISTIC_DISCLAIMER, ImplementationCost, Metrics, OptimizationResult, Service, ServiceEstimate,
};
use serde::{Deserialize, Serialize};

/// Tunable constants behind the estimated figures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactPolicy {
    /// Assumed residents per block group.
    pub people_per_region: f64,
    /// People per one life saved for each km of travel removed.
    pub people_per_life_per_km: f64,
    /// Arts access estimates count everyone helped when the primary
    /// threshold is at most this many meters.
    pub arts_access_threshold_m: f64,
    /// Share of people helped counted as gaining arts access otherwise.
    pub arts_access_discount: f64,
    /// One-time cost per activated school.
    pub startup_cost_per_school: f64,
    /// Yearly cost per activated school.
    pub annual_cost_per_school: f64,
}

impl Default for ImpactPolicy {
    fn default() -> Self {
        Self {
            people_per_region: 1500.0,
            people_per_life_per_km: 100_000.0,
            arts_access_threshold_m: 10_000.0,
            arts_access_discount: 0.7,
            startup_cost_per_school: 50_000.0,
            annual_cost_per_school: 30_000.0,
        }
    }
}

/// Computes metrics at `rate`, or at the nearest available rate when that
/// exact scenario is absent.
///
/// Returns `None` when the result has no scenarios.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn get_metrics(
    result: &OptimizationResult,
    rate: u8,
    policy: &ImpactPolicy,
) -> Option<Metrics> {
    let (activation_rate, scenario) = result.nearest_scenario(rate)?;
    if activation_rate != rate {
        log::info!("No scenario at {rate}%; using nearest rate {activation_rate}%");
    }

    let baseline_km = result.baseline.mean_distance_m / 1000.0;
    let optimized_km = scenario.mean_distance_m / 1000.0;
    let km_saved = baseline_km - optimized_km;
    let distance_reduction_pct = if baseline_km > 0.0 {
        km_saved / baseline_km * 100.0
    } else {
        0.0
    };

    let region_count = result.metadata.region_count;
    let regions = region_count as f64;

    let (
        baseline_coverage_pct,
        optimized_coverage_pct,
        regions_helped,
        population_helped,
        population_helped_pct,
    ) = if region_count > 0 {
        let helped = scenario.primary_coverage_count - result.baseline.primary_coverage_count;
        (
            Some(result.baseline.primary_coverage_count / regions * 100.0),
            Some(scenario.primary_coverage_count / regions * 100.0),
            helped as i64,
            (helped * policy.people_per_region) as i64,
            helped / regions * 100.0,
        )
    } else {
        (None, None, 0, 0, 0.0)
    };

    let estimate = match result.service {
        Service::Hospitals => ServiceEstimate::LivesSaved {
            lives: (km_saved * regions * policy.people_per_region / policy.people_per_life_per_km)
                as i64,
        },
        Service::Arts => ServiceEstimate::NewAccess {
            within_m: policy.arts_access_threshold_m,
            people: if result.metadata.primary_threshold_m <= policy.arts_access_threshold_m {
                population_helped
            } else {
                (population_helped as f64 * policy.arts_access_discount) as i64
            },
        },
    };

    Some(Metrics {
        requested_rate: rate,
        activation_rate,
        schools_activated: scenario.schools_activated_count,
        is_synthetic: result.is_synthetic,
        mean_baseline_distance_km: baseline_km,
        mean_optimized_distance_km: optimized_km,
        distance_reduction_pct,
        km_saved,
        baseline_coverage_pct,
        optimized_coverage_pct,
        coverage_improvement_pct: baseline_coverage_pct
            .zip(optimized_coverage_pct)
            .map(|(b, o)| o - b),
        regions_helped,
        population_helped,
        population_helped_pct,
        estimate,
        nonwhite_fraction: scenario.nonwhite_fraction,
        nonbachelor_fraction: scenario.nonbachelor_fraction,
        cost: implementation_cost(scenario.schools_activated_count, population_helped, policy),
        disclaimer: HEURISTIC_DISCLAIMER.to_string(),
    })
}

/// Startup and running cost for `schools` activated schools.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn implementation_cost(
    schools: u64,
    population_helped: i64,
    policy: &ImpactPolicy,
) -> ImplementationCost {
    let startup = schools as f64 * policy.startup_cost_per_school;
    ImplementationCost {
        startup,
        annual: schools as f64 * policy.annual_cost_per_school,
        per_person_helped: (population_helped > 0).then(|| startup / population_helped as f64),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use school_share_analysis_models::{Baseline, Metadata, ScenarioResult};

    use crate::results::demo_result;

    use super::*;

    fn result(service: Service, baseline_m: f64, optimized_m: f64) -> OptimizationResult {
        OptimizationResult {
            state: "Texas".to_string(),
            service,
            is_synthetic: false,
            metadata: Metadata {
                region_count: 5000,
                school_count: 500,
                facility_count: 250,
                primary_threshold_m: 3553.0,
                secondary_threshold_m: 9060.0,
            },
            baseline: Baseline {
                primary_coverage_count: 2500.0,
                secondary_coverage_count: 3500.0,
                mean_distance_m: baseline_m,
                max_distance_m: 100_000.0,
            },
            scenarios: BTreeMap::from([
                (
                    25,
                    ScenarioResult {
                        schools_activated_count: 125,
                        primary_coverage_count: 3250.0,
                        mean_distance_m: optimized_m,
                        ..ScenarioResult::default()
                    },
                ),
                (
                    50,
                    ScenarioResult {
                        schools_activated_count: 250,
                        primary_coverage_count: 3600.0,
                        mean_distance_m: optimized_m / 2.0,
                        ..ScenarioResult::default()
                    },
                ),
            ]),
            notices: Vec::new(),
        }
    }

    #[test]
    fn distance_reduction_from_means() {
        let r = result(Service::Arts, 10_000.0, 6_000.0);
        let m = get_metrics(&r, 25, &ImpactPolicy::default()).unwrap();
        assert!((m.distance_reduction_pct - 40.0).abs() < 1e-9);
        assert!((m.km_saved - 4.0).abs() < 1e-9);
        assert!((m.mean_baseline_distance_km - 10.0).abs() < 1e-9);
    }

    #[test]
    fn population_helped_uses_region_proxy() {
        let r = result(Service::Arts, 10_000.0, 6_000.0);
        let m = get_metrics(&r, 25, &ImpactPolicy::default()).unwrap();
        assert_eq!(m.regions_helped, 750);
        assert_eq!(m.population_helped, 1_125_000);
        assert!((m.population_helped_pct - 15.0).abs() < 1e-9);
        assert!((m.baseline_coverage_pct.unwrap() - 50.0).abs() < 1e-9);
        assert!((m.optimized_coverage_pct.unwrap() - 65.0).abs() < 1e-9);
        assert!((m.coverage_improvement_pct.unwrap() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn zero_baseline_distance_does_not_divide() {
        let r = result(Service::Arts, 0.0, 0.0);
        let m = get_metrics(&r, 25, &ImpactPolicy::default()).unwrap();
        assert!(m.distance_reduction_pct.abs() < f64::EPSILON);
    }

    #[test]
    fn nearest_rate_is_used() {
        let r = result(Service::Arts, 10_000.0, 6_000.0);
        let m = get_metrics(&r, 30, &ImpactPolicy::default()).unwrap();
        assert_eq!(m.activation_rate, 25);
        assert_eq!(m.requested_rate, 30);
        assert!(m.is_substituted());
    }

    #[test]
    fn hospitals_estimate_lives_saved() {
        let r = result(Service::Hospitals, 10_000.0, 6_000.0);
        let m = get_metrics(&r, 25, &ImpactPolicy::default()).unwrap();
        // 4 km * 5000 regions * 1500 people / 100_000
        assert_eq!(m.estimate, ServiceEstimate::LivesSaved { lives: 300 });
    }

    #[test]
    #[allow(clippy::cast_possible_truncation)]
    fn arts_access_depends_on_primary_threshold() {
        let mut r = result(Service::Arts, 10_000.0, 6_000.0);
        let m = get_metrics(&r, 25, &ImpactPolicy::default()).unwrap();
        assert_eq!(
            m.estimate,
            ServiceEstimate::NewAccess {
                within_m: 10_000.0,
                people: 1_125_000
            }
        );

        r.metadata.primary_threshold_m = 16_093.0;
        let m = get_metrics(&r, 25, &ImpactPolicy::default()).unwrap();
        assert_eq!(
            m.estimate,
            ServiceEstimate::NewAccess {
                within_m: 10_000.0,
                people: (1_125_000.0 * 0.7) as i64
            }
        );
    }

    #[test]
    fn zero_regions_zeroes_population_figures() {
        let mut r = result(Service::Arts, 10_000.0, 6_000.0);
        r.metadata.region_count = 0;
        let m = get_metrics(&r, 25, &ImpactPolicy::default()).unwrap();
        assert_eq!(m.population_helped, 0);
        assert!(m.baseline_coverage_pct.is_none());
        assert!(m.cost.per_person_helped.is_none());
    }

    #[test]
    fn no_scenarios_no_metrics() {
        let mut r = result(Service::Arts, 10_000.0, 6_000.0);
        r.scenarios.clear();
        assert!(get_metrics(&r, 25, &ImpactPolicy::default()).is_none());
    }

    #[test]
    fn costs_scale_with_schools() {
        let cost = implementation_cost(125, 1_125_000, &ImpactPolicy::default());
        assert!((cost.startup - 6_250_000.0).abs() < f64::EPSILON);
        assert!((cost.annual - 3_750_000.0).abs() < f64::EPSILON);
        assert!((cost.per_person_helped.unwrap() - 6_250_000.0 / 1_125_000.0).abs() < 1e-12);
    }

    #[test]
    fn demo_metrics_are_flagged() {
        let demo = demo_result("Texas", Service::Arts);
        let m = get_metrics(&demo, 25, &ImpactPolicy::default()).unwrap();
        assert!(m.is_synthetic);
        assert_eq!(m.population_helped, 1_125_000);
    }
}
