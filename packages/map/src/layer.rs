//! The assembled map and its `GeoJSON` form.

use geojson::{Feature, FeatureCollection, Geometry, Value};
use school_share_analysis_models::{Notice, ViewMode};
use serde_json::json;

use crate::choropleth::{Legend, StyledRegion};
use crate::markers::{Marker, PairingLine};

/// Initial zoom for a single-state map.
pub const DEFAULT_ZOOM: u8 = 6;

/// Everything needed to draw one scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct MapLayer {
    /// Initial center as `(lat, lon)`.
    pub center: (f64, f64),
    /// Initial zoom.
    pub zoom: u8,
    /// View mode the regions were styled for.
    pub view_mode: ViewMode,
    /// Styled block groups; empty in marker-only mode.
    pub regions: Vec<StyledRegion>,
    /// Facility and school markers.
    pub markers: Vec<Marker>,
    /// Facility-to-school connectors.
    pub lines: Vec<PairingLine>,
    /// Legend for `regions`; `None` when there is no choropleth.
    pub legend: Option<Legend>,
    /// Why anything was left out or substituted.
    pub notices: Vec<Notice>,
}

impl MapLayer {
    /// A map with no layers, centered on `center`.
    #[must_use]
    pub const fn empty(center: (f64, f64), view_mode: ViewMode) -> Self {
        Self {
            center,
            zoom: DEFAULT_ZOOM,
            view_mode,
            regions: Vec::new(),
            markers: Vec::new(),
            lines: Vec::new(),
            legend: None,
            notices: Vec::new(),
        }
    }

    /// Whether the map only has point layers.
    #[must_use]
    pub fn is_marker_only(&self) -> bool {
        self.regions.is_empty()
    }

    /// Flattens every layer into one feature collection: regions first,
    /// then lines, then markers, so points draw on top.
    ///
    /// Map-level settings go in foreign members (`center`, `zoom`,
    /// `viewMode`, `legend`, `notices`).
    #[must_use]
    pub fn to_geojson(&self) -> FeatureCollection {
        let mut features =
            Vec::with_capacity(self.regions.len() + self.lines.len() + self.markers.len());

        for region in &self.regions {
            let mut feature = feature(Value::from(&region.polygon));
            feature.set_property("layer", "region");
            feature.set_property("GEOID", region.region_id.as_str());
            feature.set_property("fill", region.fill.as_str());
            feature.set_property("fill-opacity", region.fill_opacity);
            feature.set_property("stroke", region.stroke);
            feature.set_property("stroke-width", region.stroke_width);
            feature.set_property("tooltip", region.tooltip.as_str());
            features.push(feature);
        }

        for line in &self.lines {
            let coords = vec![
                vec![line.from.1, line.from.0],
                vec![line.to.1, line.to.0],
            ];
            let mut feature = feature(Value::LineString(coords));
            feature.set_property("layer", "pairing");
            feature.set_property("facility_id", line.facility_id.as_str());
            feature.set_property("school_id", line.school_id.as_str());
            feature.set_property("stroke", line.color);
            feature.set_property("stroke-width", line.weight);
            feature.set_property("stroke-opacity", line.opacity);
            feature.set_property("dash-array", line.dash_array);
            feature.set_property("tooltip", line.tooltip.as_str());
            features.push(feature);
        }

        for marker in &self.markers {
            let mut feature = feature(Value::Point(vec![marker.longitude, marker.latitude]));
            feature.set_property("layer", json!(marker.kind));
            feature.set_property("id", marker.id.as_str());
            feature.set_property("stroke", marker.color);
            feature.set_property("stroke-width", marker.weight);
            feature.set_property("fill", marker.fill);
            feature.set_property("fill-opacity", marker.fill_opacity);
            feature.set_property("radius", marker.radius);
            feature.set_property("tooltip", marker.tooltip.as_str());
            feature.set_property("popup", marker.popup.as_str());
            features.push(feature);
        }

        let mut foreign = serde_json::Map::new();
        foreign.insert("center".to_string(), json!([self.center.0, self.center.1]));
        foreign.insert("zoom".to_string(), json!(self.zoom));
        foreign.insert("viewMode".to_string(), json!(self.view_mode));
        foreign.insert("legend".to_string(), json!(self.legend));
        foreign.insert("notices".to_string(), json!(self.notices));

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(foreign),
        }
    }
}

fn feature(value: Value) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: None,
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use geo::{MultiPolygon, polygon};
    use school_share_analysis_models::NoticeKind;
    use school_share_geography_models::{EntityId, RegionId};

    use crate::choropleth::{STROKE_COLOR, STROKE_WIDTH};
    use crate::markers::MarkerKind;

    use super::*;

    fn layer() -> MapLayer {
        let mut layer = MapLayer::empty((31.0, -100.0), ViewMode::Distance);
        layer.regions.push(StyledRegion {
            region_id: RegionId::parse("480019501001").unwrap(),
            polygon: MultiPolygon(vec![polygon![
                (x: -97.0, y: 30.0),
                (x: -96.9, y: 30.0),
                (x: -96.9, y: 30.1),
                (x: -97.0, y: 30.0),
            ]]),
            fill: "#238b45".to_string(),
            fill_opacity: 0.6,
            stroke: STROKE_COLOR,
            stroke_width: STROKE_WIDTH,
            tooltip: "GEOID: 480019501001".to_string(),
        });
        layer.markers.push(Marker {
            kind: MarkerKind::School,
            id: EntityId::parse("480001").unwrap(),
            latitude: 30.3,
            longitude: -97.75,
            color: "#27ae60",
            fill: "#2ecc71",
            fill_opacity: 0.8,
            radius: 5.0,
            weight: 2.0,
            tooltip: "School: Lamar High".to_string(),
            popup: String::new(),
        });
        layer.notices.push(Notice::new(
            NoticeKind::SubstitutedRate,
            "Coverage for 30% unavailable",
        ));
        layer
    }

    #[test]
    fn regions_draw_before_markers() {
        let fc = layer().to_geojson();
        assert_eq!(fc.features.len(), 2);

        let region = &fc.features[0];
        assert_eq!(
            region.property("fill").and_then(|v| v.as_str()),
            Some("#238b45")
        );
        assert_eq!(
            region.property("GEOID").and_then(|v| v.as_str()),
            Some("480019501001")
        );
        assert!(matches!(
            region.geometry.as_ref().map(|g| &g.value),
            Some(Value::MultiPolygon(_))
        ));

        let marker = &fc.features[1];
        assert_eq!(
            marker.property("layer").and_then(|v| v.as_str()),
            Some("school")
        );
        assert_eq!(
            marker.geometry.as_ref().map(|g| g.value.clone()),
            Some(Value::Point(vec![-97.75, 30.3]))
        );
    }

    #[test]
    fn map_settings_are_foreign_members() {
        let fc = layer().to_geojson();
        let foreign = fc.foreign_members.unwrap();
        assert_eq!(foreign["zoom"], json!(6));
        assert_eq!(foreign["viewMode"], json!("distance"));
        assert_eq!(foreign["notices"][0]["kind"], json!("substituted_rate"));
        assert!(foreign["legend"].is_null());
    }

    #[test]
    fn serializes_as_feature_collection() {
        let text = serde_json::to_string(&layer().to_geojson()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["type"], json!("FeatureCollection"));
        assert_eq!(parsed["features"][0]["properties"]["stroke"], json!("#666"));
    }
}
