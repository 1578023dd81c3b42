//! Display-only polygon simplification.
//!
//! Output of this module feeds rendering and nothing else; metric
//! computation always works from the unsimplified coverage records.

use geo::{MultiPolygon, Simplify};

/// Douglas-Peucker tolerance, in degrees, applied before styling polygons.
pub const DISPLAY_TOLERANCE_DEG: f64 = 0.001;

/// Returns a reduced-vertex copy of `polygon` for drawing.
#[must_use]
pub fn simplify_for_display(polygon: &MultiPolygon<f64>, tolerance: f64) -> MultiPolygon<f64> {
    polygon.simplify(&tolerance)
}
