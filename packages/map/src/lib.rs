#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Map rendering for one optimization scenario.
//!
//! [`render_map`] joins coverage onto block-group boundaries, styles the
//! regions for the requested [`ViewMode`], and adds facility markers,
//! activated-school markers, and pairing lines. Missing inputs drop the
//! affected layer and leave a [`Notice`] on the returned [`MapLayer`];
//! rendering itself never fails.

pub mod choropleth;
pub mod color;
pub mod layer;
pub mod markers;

use school_share_analysis::Dss;
use school_share_analysis::coverage::join_coverage;
use school_share_analysis_models::{Notice, NoticeKind, OptimizationResult, Pairing, Service, ViewMode};
use school_share_geography::DISPLAY_TOLERANCE_DEG;
use school_share_geography_models::{EntityId, StateRef};
use school_share_geography_models::fips::{DEFAULT_CENTER, resolve_state};

pub use choropleth::{Legend, StyledRegion};
pub use layer::MapLayer;
pub use markers::{DEFAULT_FACILITY_CAP, Marker, PairingLine};

/// What to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct MapRequest {
    /// State name or abbreviation.
    pub state: String,
    /// Service whose coverage and facilities are shown.
    pub service: Service,
    /// Activation rate whose coverage table is shown.
    pub rate: u8,
    /// Schools activated in the scenario.
    pub activated_ids: Vec<EntityId>,
    /// Facility-school assignments in the scenario.
    pub pairings: Vec<Pairing>,
    /// Choropleth encoding.
    pub view_mode: ViewMode,
    /// Draw existing facilities.
    pub show_facilities: bool,
    /// Draw activated schools.
    pub show_schools: bool,
    /// Draw facility-to-school connectors.
    pub show_pairing_lines: bool,
    /// Skip the choropleth and draw markers only.
    pub fast: bool,
    /// Most facility markers to draw.
    pub facility_cap: usize,
    /// Most school markers to draw; `None` draws all.
    pub school_cap: Option<usize>,
    /// Display simplification tolerance in degrees.
    pub tolerance: f64,
}

impl MapRequest {
    /// A request with default layers: choropleth, facilities, and schools,
    /// but no pairing lines.
    #[must_use]
    pub fn new(state: impl Into<String>, service: Service, rate: u8) -> Self {
        Self {
            state: state.into(),
            service,
            rate,
            activated_ids: Vec::new(),
            pairings: Vec::new(),
            view_mode: ViewMode::default(),
            show_facilities: true,
            show_schools: true,
            show_pairing_lines: false,
            fast: false,
            facility_cap: DEFAULT_FACILITY_CAP,
            school_cap: None,
            tolerance: DISPLAY_TOLERANCE_DEG,
        }
    }

    /// A request for the scenario of `result` nearest to `rate`, with its
    /// activated schools and pairings filled in.
    #[must_use]
    pub fn for_scenario(result: &OptimizationResult, rate: u8) -> Self {
        let mut request = Self::new(result.state.clone(), result.service, rate);
        if let Some((used, scenario)) = result.nearest_scenario(rate) {
            request.rate = used;
            request.activated_ids.clone_from(&scenario.activated_school_ids);
            request.pairings.clone_from(&scenario.facility_school_pairings);
        }
        request
    }

    /// Sets the view mode.
    #[must_use]
    pub const fn with_view_mode(mut self, view_mode: ViewMode) -> Self {
        self.view_mode = view_mode;
        self
    }
}

/// Builds the map for `request`.
///
/// Layers whose inputs are missing are left out: no coverage table or no
/// boundary store gives a marker-only map, and a missing location table
/// drops its markers. Each omission is logged and recorded as a notice.
#[must_use]
pub fn render_map(dss: &Dss, request: &MapRequest) -> MapLayer {
    let Some(state) = resolve_state(&request.state) else {
        let mut layer = MapLayer::empty(DEFAULT_CENTER, request.view_mode);
        push_notice(
            &mut layer,
            NoticeKind::MissingFile,
            format!("Unknown state '{}'; nothing to draw", request.state),
        );
        return layer;
    };

    let mut layer = MapLayer::empty(state.center(), request.view_mode);

    if request.fast {
        log::debug!("Fast mode: skipping choropleth for {state}");
    } else {
        add_choropleth(dss, request, &state, &mut layer);
    }

    let wants_facilities = request.show_facilities || request.show_pairing_lines;
    let facilities = if wants_facilities {
        dss.facilities(&state, request.service)
    } else {
        None
    };
    let wants_schools = (request.show_schools || request.show_pairing_lines)
        && !request.activated_ids.is_empty();
    let schools = if wants_schools {
        dss.schools(&state)
    } else {
        None
    };

    if request.show_facilities {
        match &facilities {
            Some(table) => layer.markers.extend(markers::facility_markers(
                table,
                request.service,
                request.facility_cap,
            )),
            None => push_notice(
                &mut layer,
                NoticeKind::MissingFile,
                format!("No {} locations for {state}", request.service),
            ),
        }
    }

    if request.show_schools && !request.activated_ids.is_empty() {
        match &schools {
            Some(table) => layer.markers.extend(markers::school_markers(
                table,
                &request.activated_ids,
                request.school_cap,
            )),
            None => push_notice(
                &mut layer,
                NoticeKind::MissingFile,
                format!("No school locations for {state}"),
            ),
        }
    }

    if request.show_pairing_lines && !request.pairings.is_empty() {
        if let (Some(facilities), Some(schools)) = (&facilities, &schools) {
            layer.lines = markers::pairing_lines(&request.pairings, facilities, schools);
        } else {
            push_notice(
                &mut layer,
                NoticeKind::MissingFile,
                "Pairing lines need both facility and school locations",
            );
        }
    }

    log::info!(
        "Rendered {state} / {} at {}%: {} regions, {} markers, {} lines",
        request.service,
        request.rate,
        layer.regions.len(),
        layer.markers.len(),
        layer.lines.len()
    );

    layer
}

fn add_choropleth(
    dss: &Dss,
    request: &MapRequest,
    state: &StateRef,
    layer: &mut MapLayer,
) {
    let Some(coverage) = dss.get_coverage(state.name, request.service, request.rate) else {
        push_notice(
            layer,
            NoticeKind::MissingFile,
            format!(
                "No coverage data for {state} / {} at {}%; showing markers only",
                request.service, request.rate
            ),
        );
        return;
    };
    layer.notices.extend(coverage.notices.iter().cloned());

    let boundaries = match dss.boundaries(state) {
        Ok(boundaries) => boundaries,
        Err(e) => {
            push_notice(
                layer,
                NoticeKind::GeometryUnavailable,
                format!("{e}; showing markers only"),
            );
            return;
        }
    };

    let joined = join_coverage(&boundaries.regions, Some(coverage.as_ref()));
    let (regions, legend) =
        choropleth::style_regions(&joined, request.view_mode, request.tolerance);
    layer.regions = regions;
    layer.legend = Some(legend);
}

fn push_notice(layer: &mut MapLayer, kind: NoticeKind, message: impl Into<String>) {
    let notice = Notice::new(kind, message);
    log::warn!("{notice}");
    layer.notices.push(notice);
}
