#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Ingestion and analysis for the school-sharing decision support system.
//!
//! Reads precomputed optimization output (transposed result tables and
//! per-rate coverage tables), joins coverage against block-group
//! boundaries, and derives the impact metrics shown next to the map.
//!
//! Every stage degrades instead of failing: missing results become demo
//! data, missing coverage becomes "unavailable", bad rows and bad list
//! literals are skipped. Each degradation is logged and surfaced as a
//! [`Notice`] on the value it affected.
//!
//! [`Dss`] bundles the data paths, the impact policy, and one cache per
//! ingestion function.

pub mod cache;
pub mod coverage;
pub mod export;
pub mod literal;
pub mod locations;
pub mod metrics;
pub mod paths;
pub mod results;
pub mod table;

use std::path::PathBuf;
use std::sync::Arc;

use school_share_analysis_models::{
    CoverageSet, FacilityRecord, Metrics, Notice, OptimizationResult, SchoolRecord, Service,
};
use school_share_geography::{BoundarySet, GeoError};
use school_share_geography_models::fips::resolve_state;
use school_share_geography_models::{IdentifierError, StateRef};
use thiserror::Error;

use crate::cache::{TtlCache, file_stamp};
use crate::literal::LiteralError;
use crate::locations::LocationTable;
use crate::metrics::ImpactPolicy;
use crate::paths::{DataPaths, LocationKind};

/// Errors that can occur while reading analysis inputs.
///
/// Public entry points recover from all of these; they appear in return
/// values only from the lower-level readers.
#[derive(Debug, Error)]
pub enum DssError {
    /// A source file is absent.
    #[error("File not found: {}", path.display())]
    MissingFile {
        /// Path that was checked.
        path: PathBuf,
    },

    /// A required row or column is absent or not numeric.
    #[error("Malformed row '{row}' in column '{column}'")]
    MalformedRow {
        /// Row label.
        row: String,
        /// Column label.
        column: String,
    },

    /// A join key was null or empty.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(#[from] IdentifierError),

    /// An embedded list literal was rejected.
    #[error("Unsafe literal: {0}")]
    UnsafeLiteral(#[from] LiteralError),

    /// Boundary geometry could not be read.
    #[error("Geometry unavailable: {0}")]
    GeometryUnavailable(#[from] GeoError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

type ResultKey = (String, Service);
type CoverageKey = (&'static str, Service, u8);
type FacilityKey = (&'static str, Service);

/// Entry point for the dashboard shell: cached ingestion plus metrics.
pub struct Dss {
    paths: DataPaths,
    policy: ImpactPolicy,
    results: TtlCache<ResultKey, OptimizationResult>,
    coverage: TtlCache<CoverageKey, CoverageSet>,
    boundaries: TtlCache<&'static str, BoundarySet>,
    schools: TtlCache<&'static str, LocationTable<SchoolRecord>>,
    facilities: TtlCache<FacilityKey, LocationTable<FacilityRecord>>,
}

impl Dss {
    /// Creates a facade over `paths` with the default impact policy.
    #[must_use]
    pub fn new(paths: DataPaths) -> Self {
        Self {
            paths,
            policy: ImpactPolicy::default(),
            results: TtlCache::default(),
            coverage: TtlCache::default(),
            boundaries: TtlCache::default(),
            schools: TtlCache::default(),
            facilities: TtlCache::default(),
        }
    }

    /// Creates a facade with paths resolved from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(DataPaths::from_env())
    }

    /// Replaces the impact policy.
    #[must_use]
    pub fn with_policy(mut self, policy: ImpactPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Resolved data roots.
    #[must_use]
    pub const fn paths(&self) -> &DataPaths {
        &self.paths
    }

    /// Impact policy used for metrics.
    #[must_use]
    pub const fn policy(&self) -> &ImpactPolicy {
        &self.policy
    }

    /// Turns caching off (always recompute) or back on.
    pub fn set_cache_bypass(&self, bypass: bool) {
        self.results.set_bypass(bypass);
        self.coverage.set_bypass(bypass);
        self.boundaries.set_bypass(bypass);
        self.schools.set_bypass(bypass);
        self.facilities.set_bypass(bypass);
    }

    /// Drops every cached value.
    pub fn clear_caches(&self) {
        self.results.clear();
        self.coverage.clear();
        self.boundaries.clear();
        self.schools.clear();
        self.facilities.clear();
    }

    /// Optimization result for a state (name or abbreviation) and service.
    ///
    /// Falls back to demo data, flagged `is_synthetic`, when no table
    /// exists.
    #[must_use]
    pub fn get_result(&self, state: &str, service: Service) -> Arc<OptimizationResult> {
        let resolved = resolve_state(state);
        let key_state =
            resolved.map_or_else(|| state.trim().to_lowercase(), |s| s.name.to_string());
        let stamp = resolved
            .and_then(|s| self.paths.results_file(service, &s))
            .and_then(|p| file_stamp(&p));

        self.results
            .get_or_insert_with((key_state, service), stamp, || {
                results::load_result(&self.paths, state, service)
            })
    }

    /// Metrics for `result` at `rate`, or at the nearest available rate.
    #[must_use]
    pub fn get_metrics(&self, result: &OptimizationResult, rate: u8) -> Option<Metrics> {
        metrics::get_metrics(result, rate, &self.policy)
    }

    /// Coverage records for a state, service, and rate.
    ///
    /// Returns `None` ("unavailable") for unknown states or when no
    /// coverage table exists.
    #[must_use]
    pub fn get_coverage(
        &self,
        state: &str,
        service: Service,
        rate: u8,
    ) -> Option<Arc<CoverageSet>> {
        let state = resolve_state(state)?;
        let stamp = file_stamp(&self.paths.coverage_file(service, &state, rate));

        self.coverage
            .get_or_try_insert_with((state.fips, service, rate), stamp, || {
                coverage::load_coverage(&self.paths, &state, service, rate).ok_or(())
            })
            .ok()
    }

    /// Block-group boundaries for a state.
    ///
    /// # Errors
    ///
    /// Returns [`DssError::GeometryUnavailable`] if the boundary store is
    /// missing or unreadable.
    pub fn boundaries(&self, state: &StateRef) -> Result<Arc<BoundarySet>, DssError> {
        let path = self.paths.boundaries_file();
        let stamp = file_stamp(&path);

        self.boundaries
            .get_or_try_insert_with(state.fips, stamp, || {
                school_share_geography::load_block_groups(&path, state.fips)
            })
            .map_err(DssError::from)
    }

    /// School locations for a state; `None` when no table exists.
    #[must_use]
    pub fn schools(&self, state: &StateRef) -> Option<Arc<LocationTable<SchoolRecord>>> {
        let stamp = file_stamp(&self.paths.location_file(LocationKind::Schools, state.fips));
        self.schools
            .get_or_try_insert_with(state.fips, stamp, || {
                locations::load_schools(&self.paths, state.fips).ok_or(())
            })
            .ok()
    }

    /// Facility locations for a state and service; `None` when no table
    /// exists.
    #[must_use]
    pub fn facilities(
        &self,
        state: &StateRef,
        service: Service,
    ) -> Option<Arc<LocationTable<FacilityRecord>>> {
        let path = self
            .paths
            .location_file(LocationKind::facilities_for(service), state.fips);
        self.facilities
            .get_or_try_insert_with((state.fips, service), file_stamp(&path), || {
                locations::load_facilities(&self.paths, state.fips, service).ok_or(())
            })
            .ok()
    }
}

impl Default for Dss {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Notices from a result and, if present, its coverage, in that order.
#[must_use]
pub fn collect_notices(result: &OptimizationResult, coverage: Option<&CoverageSet>) -> Vec<Notice> {
    result
        .notices
        .iter()
        .chain(coverage.into_iter().flat_map(|c| c.notices.iter()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dss(name: &str) -> (Dss, DataPaths) {
        let base = std::env::temp_dir().join(format!("school_share_dss_{name}"));
        let _ = std::fs::remove_dir_all(&base);
        let paths = DataPaths::from_base(base);
        (Dss::new(paths.clone()), paths)
    }

    #[test]
    fn result_is_cached_per_state_and_service() {
        let (dss, _) = temp_dss("cache");
        let a = dss.get_result("Texas", Service::Arts);
        let b = dss.get_result("tx", Service::Arts);
        let c = dss.get_result("Texas", Service::Hospitals);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert!(a.is_synthetic);

        dss.set_cache_bypass(true);
        let d = dss.get_result("Texas", Service::Arts);
        assert!(!Arc::ptr_eq(&a, &d));
    }

    #[test]
    fn metrics_from_demo_result() {
        let (dss, _) = temp_dss("metrics");
        let result = dss.get_result("California", Service::Arts);
        let metrics = dss.get_metrics(&result, 30).unwrap();
        assert_eq!(metrics.activation_rate, 25);
        assert!(metrics.is_synthetic);
    }

    #[test]
    fn coverage_and_geometry_unavailable_without_files() {
        let (dss, paths) = temp_dss("unavailable");
        assert!(dss.get_coverage("Texas", Service::Arts, 25).is_none());
        assert!(dss.get_coverage("Atlantis", Service::Arts, 25).is_none());

        let tx = resolve_state("Texas").unwrap();
        assert!(matches!(
            dss.boundaries(&tx),
            Err(DssError::GeometryUnavailable(_))
        ));
        assert!(dss.schools(&tx).is_none());
        assert!(dss.facilities(&tx, Service::Arts).is_none());

        // A table written after a miss is picked up on the next call.
        let path = paths.location_file(LocationKind::Schools, "48");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "NCESSCH,School Name\n480001,Lamar High\n").unwrap();
        assert_eq!(dss.schools(&tx).unwrap().len(), 1);
    }

    #[test]
    fn notices_are_collected_in_order() {
        let (dss, _) = temp_dss("notices");
        let result = dss.get_result("Texas", Service::Arts);
        let notices = collect_notices(&result, None);
        assert_eq!(notices, result.notices);
    }
}
