//! Point locations for schools and existing facilities.

use school_share_geography_models::EntityId;
use serde::{Deserialize, Serialize};

/// Returns `(lat, lon)` only when both are present and finite.
fn valid_point(latitude: Option<f64>, longitude: Option<f64>) -> Option<(f64, f64)> {
    match (latitude, longitude) {
        (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
        _ => None,
    }
}

/// A public high school.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolRecord {
    /// NCES school id.
    pub id: EntityId,
    /// School name, blank when the table has none.
    pub name: String,
    /// School district.
    pub district: Option<String>,
    /// City.
    pub city: Option<String>,
    /// Enrollment as reported.
    pub enrollment: Option<String>,
    /// WGS84 latitude.
    pub latitude: Option<f64>,
    /// WGS84 longitude.
    pub longitude: Option<f64>,
}

impl SchoolRecord {
    /// Drawable coordinates.
    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        valid_point(self.latitude, self.longitude)
    }
}

/// Attributes that only one kind of facility has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FacilityDetail {
    /// Arts or cultural organization.
    Arts {
        /// NTEE classification or organization type.
        org_type: Option<String>,
    },
    /// Hospital.
    Hospital {
        /// Licensed bed count.
        beds: Option<String>,
        /// Trauma level designation.
        trauma: Option<String>,
        /// Hospital type.
        kind: Option<String>,
    },
}

/// An existing service facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityRecord {
    /// Facility id as used in pairings.
    pub id: EntityId,
    /// Display name, blank when the table has none.
    pub name: String,
    /// City.
    pub city: Option<String>,
    /// WGS84 latitude.
    pub latitude: Option<f64>,
    /// WGS84 longitude.
    pub longitude: Option<f64>,
    /// Service-specific attributes.
    pub detail: FacilityDetail,
}

impl FacilityRecord {
    /// Drawable coordinates.
    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        valid_point(self.latitude, self.longitude)
    }
}
