#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Value types shared by the analysis pipeline and the map renderer.
//!
//! Everything here is produced once by ingestion and then only read:
//! optimization results, per-region coverage records, derived metrics,
//! and point locations for schools and facilities.

pub mod coverage;
pub mod location;
pub mod metrics;
pub mod notice;
pub mod result;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

pub use coverage::{COVERAGE_THRESHOLD_M, CoverageRecord, CoverageSet, CoverageSummary};
pub use location::{FacilityDetail, FacilityRecord, SchoolRecord};
pub use metrics::{
    ActivationPreview, HEURISTIC_DISCLAIMER, ImplementationCost, Metrics, ServiceEstimate,
};
pub use notice::{Notice, NoticeKind};
pub use result::{Baseline, Metadata, OptimizationResult, Pairing, ScenarioResult};

/// The service type co-located at activated schools.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    /// Arts and cultural organizations.
    #[strum(serialize = "Arts Facilities")]
    Arts,
    /// Hospitals and emergency care.
    #[strum(serialize = "Hospitals")]
    Hospitals,
}

impl Service {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Arts, Self::Hospitals]
    }

    /// Parses a loose, user-facing service name.
    ///
    /// Matches "arts", "Arts Facilities", "hospital", "Hospitals" and so on,
    /// case-insensitively.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let lower = raw.trim().to_lowercase();
        if lower.contains("arts") {
            Some(Self::Arts)
        } else if lower.contains("hospital") {
            Some(Self::Hospitals)
        } else {
            None
        }
    }

    /// Lowercase, underscore-separated label used in export file names.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Arts => "arts_facilities",
            Self::Hospitals => "hospitals",
        }
    }
}

impl std::str::FromStr for Service {
    type Err = UnknownServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownServiceError {
            value: s.to_string(),
        })
    }
}

/// Error returned when a service name matches neither known service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown service '{value}': expected 'arts' or 'hospitals'")]
pub struct UnknownServiceError {
    /// The unrecognized input.
    pub value: String,
}

/// What the choropleth encodes for each region.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ViewMode {
    /// Continuous scale over distance reduction in km.
    #[default]
    Distance,
    /// Continuous scale over percent improvement.
    Percent,
    /// Three-way categorical coverage status.
    Status,
}

impl ViewMode {
    /// Human-readable legend caption for this mode.
    #[must_use]
    pub const fn caption(self) -> &'static str {
        match self {
            Self::Distance => "Distance Reduction (km)",
            Self::Percent => "Distance Improvement (%)",
            Self::Status => "Coverage Status",
        }
    }
}
