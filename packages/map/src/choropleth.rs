//! Per-region fill styling for the three view modes.

use geo::MultiPolygon;
use school_share_analysis::coverage::JoinedRegion;
use school_share_analysis_models::{CoverageRecord, ViewMode};
use school_share_geography::simplify_for_display;
use school_share_geography_models::RegionId;
use serde::Serialize;

use crate::color::{GRADIENT_OPACITY, Gradient, NO_DATA_COLOR, NO_DATA_OPACITY, color_bound};

/// Outline color shared by every region.
pub const STROKE_COLOR: &str = "#666";
/// Outline width shared by every region.
pub const STROKE_WIDTH: f64 = 0.3;

/// A region ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledRegion {
    /// Block-group id.
    pub region_id: RegionId,
    /// Display-simplified outline.
    pub polygon: MultiPolygon<f64>,
    /// Fill color as `#rrggbb`.
    pub fill: String,
    /// Fill opacity in `0..=1`.
    pub fill_opacity: f64,
    /// Outline color.
    pub stroke: &'static str,
    /// Outline width.
    pub stroke_width: f64,
    /// Hover text.
    pub tooltip: String,
}

/// Category shown by the status view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageStatus {
    /// Within the threshold only after activation.
    NewlyCovered,
    /// Within the threshold after activation, and already before it.
    AlreadyCovered,
    /// Outside the threshold after activation, or no data.
    NotCovered,
}

impl CoverageStatus {
    /// Status of a region; missing coverage counts as not covered.
    #[must_use]
    pub fn of(record: Option<&CoverageRecord>) -> Self {
        match record {
            Some(r) if r.newly_covered => Self::NewlyCovered,
            Some(r) if r.covered_after => Self::AlreadyCovered,
            _ => Self::NotCovered,
        }
    }

    /// Every status, in legend order.
    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::NewlyCovered, Self::AlreadyCovered, Self::NotCovered]
    }

    /// Fill color.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::NewlyCovered => "#27ae60",
            Self::AlreadyCovered => "#f1c40f",
            Self::NotCovered => "#e74c3c",
        }
    }

    /// Fill opacity.
    #[must_use]
    pub const fn opacity(self) -> f64 {
        match self {
            Self::NewlyCovered => 0.6,
            Self::AlreadyCovered => 0.5,
            Self::NotCovered => 0.4,
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NewlyCovered => "Newly Covered",
            Self::AlreadyCovered => "Already Covered",
            Self::NotCovered => "Not Covered (>10km)",
        }
    }
}

/// One swatch of a legend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    /// Swatch label.
    pub label: String,
    /// Swatch color.
    pub color: String,
}

/// Legend for the choropleth.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Legend {
    /// Legend title.
    pub caption: &'static str,
    /// Swatches; gradient stops for continuous modes.
    pub entries: Vec<LegendEntry>,
    /// Upper end of a continuous scale.
    pub max_value: Option<f64>,
}

/// Value a continuous mode colors by. Missing coverage reads as 0.
#[must_use]
pub fn metric_value(record: Option<&CoverageRecord>, mode: ViewMode) -> f64 {
    record.map_or(0.0, |r| match mode {
        ViewMode::Distance => r.distance_reduction_km(),
        ViewMode::Percent => r.percent_improvement,
        ViewMode::Status => f64::from(u8::from(r.newly_covered)),
    })
}

/// Styles every joined region for `mode` and builds the matching legend.
///
/// Outlines are simplified with `tolerance` first; the coverage values
/// themselves are never touched.
#[must_use]
pub fn style_regions(
    joined: &[JoinedRegion<'_>],
    mode: ViewMode,
    tolerance: f64,
) -> (Vec<StyledRegion>, Legend) {
    let Some(gradient) = Gradient::for_mode(mode) else {
        let regions = joined
            .iter()
            .map(|j| {
                let status = CoverageStatus::of(j.coverage);
                styled(
                    j,
                    tolerance,
                    status.color().to_string(),
                    status.opacity(),
                    status_tooltip(status, j.coverage),
                )
            })
            .collect();
        let legend = Legend {
            caption: mode.caption(),
            entries: CoverageStatus::all()
                .into_iter()
                .map(|s| LegendEntry {
                    label: s.label().to_string(),
                    color: s.color().to_string(),
                })
                .collect(),
            max_value: None,
        };
        return (regions, legend);
    };

    let values: Vec<f64> = joined
        .iter()
        .map(|j| metric_value(j.coverage, mode))
        .collect();
    let bound = color_bound(&values, mode);
    log::debug!("Color bound for {mode} view: {bound:.3}");

    let regions = joined
        .iter()
        .zip(&values)
        .map(|(j, &value)| {
            let (fill, opacity) = if value > 0.0 {
                (gradient.color_at(value, bound), GRADIENT_OPACITY)
            } else {
                (NO_DATA_COLOR.to_string(), NO_DATA_OPACITY)
            };
            styled(j, tolerance, fill, opacity, continuous_tooltip(j))
        })
        .collect();

    let legend = Legend {
        caption: mode.caption(),
        entries: gradient
            .stops
            .iter()
            .enumerate()
            .map(|(i, stop)| LegendEntry {
                label: format!("{:.1}", stop_value(i, gradient.stops.len(), bound)),
                color: (*stop).to_string(),
            })
            .collect(),
        max_value: Some(bound),
    };

    (regions, legend)
}

#[allow(clippy::cast_precision_loss)]
fn stop_value(index: usize, stops: usize, bound: f64) -> f64 {
    if stops <= 1 {
        return 0.0;
    }
    bound * index as f64 / (stops - 1) as f64
}

fn styled(
    joined: &JoinedRegion<'_>,
    tolerance: f64,
    fill: String,
    fill_opacity: f64,
    tooltip: String,
) -> StyledRegion {
    StyledRegion {
        region_id: joined.geometry.region_id.clone(),
        polygon: simplify_for_display(&joined.geometry.polygon, tolerance),
        fill,
        fill_opacity,
        stroke: STROKE_COLOR,
        stroke_width: STROKE_WIDTH,
        tooltip,
    }
}

fn continuous_tooltip(joined: &JoinedRegion<'_>) -> String {
    let id = joined.geometry.region_id.as_str();
    joined.coverage.map_or_else(
        || format!("GEOID: {id}<br>No coverage data"),
        |r| {
            format!(
                "GEOID: {id}<br>Distance reduction: {:.1} km<br>Improvement: {:.1}%",
                r.distance_reduction_km(),
                r.percent_improvement
            )
        },
    )
}

fn status_tooltip(status: CoverageStatus, record: Option<&CoverageRecord>) -> String {
    let (before, after) = record.map_or((0.0, 0.0), |r| {
        (r.distance_before_m / 1000.0, r.distance_after_m / 1000.0)
    });
    format!(
        "Status: {}<br>Distance before: {before:.1} km<br>Distance after: {after:.1} km",
        status.label()
    )
}
