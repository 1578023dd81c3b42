//! Point markers for facilities and activated schools, plus the dashed
//! lines joining each paired facility to its school.

use std::collections::HashSet;

use school_share_analysis::locations::LocationTable;
use school_share_analysis_models::{FacilityDetail, FacilityRecord, Pairing, SchoolRecord, Service};
use school_share_geography_models::EntityId;
use serde::Serialize;

/// Default cap on facility markers per map.
pub const DEFAULT_FACILITY_CAP: usize = 500;

/// What a marker stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    /// An existing arts organization.
    ArtsFacility,
    /// An existing hospital.
    Hospital,
    /// A school activated in the scenario.
    School,
}

/// A circle marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// Marker category.
    pub kind: MarkerKind,
    /// Facility or school id.
    pub id: EntityId,
    /// WGS84 latitude.
    pub latitude: f64,
    /// WGS84 longitude.
    pub longitude: f64,
    /// Outline color.
    pub color: &'static str,
    /// Fill color.
    pub fill: &'static str,
    /// Fill opacity.
    pub fill_opacity: f64,
    /// Circle radius in pixels.
    pub radius: f64,
    /// Outline width.
    pub weight: f64,
    /// Hover text.
    pub tooltip: String,
    /// Click-through HTML.
    pub popup: String,
}

/// A dashed facility-to-school connector.
#[derive(Debug, Clone, PartialEq)]
pub struct PairingLine {
    /// Facility end.
    pub facility_id: EntityId,
    /// School end.
    pub school_id: EntityId,
    /// `(lat, lon)` of the facility.
    pub from: (f64, f64),
    /// `(lat, lon)` of the school.
    pub to: (f64, f64),
    /// Line color.
    pub color: &'static str,
    /// Line width.
    pub weight: f64,
    /// Line opacity.
    pub opacity: f64,
    /// SVG dash pattern.
    pub dash_array: &'static str,
    /// Hover text.
    pub tooltip: String,
}

/// Colors and sizes for one marker category.
#[derive(Debug, Clone, Copy)]
struct MarkerStyle {
    color: &'static str,
    fill: &'static str,
    fill_opacity: f64,
    radius: f64,
    weight: f64,
}

const ARTS_STYLE: MarkerStyle = MarkerStyle {
    color: "#9b59b6",
    fill: "#9b59b6",
    fill_opacity: 0.7,
    radius: 4.0,
    weight: 1.0,
};

const HOSPITAL_STYLE: MarkerStyle = MarkerStyle {
    color: "#3498db",
    fill: "#3498db",
    fill_opacity: 0.7,
    radius: 4.0,
    weight: 1.0,
};

const SCHOOL_STYLE: MarkerStyle = MarkerStyle {
    color: "#27ae60",
    fill: "#2ecc71",
    fill_opacity: 0.8,
    radius: 5.0,
    weight: 2.0,
};

const PAIRING_COLOR: &str = "#e67e22";
const PAIRING_DASH: &str = "5, 5";

impl Marker {
    fn new(
        kind: MarkerKind,
        style: MarkerStyle,
        id: &EntityId,
        (latitude, longitude): (f64, f64),
        tooltip: String,
        popup: String,
    ) -> Self {
        Self {
            kind,
            id: id.clone(),
            latitude,
            longitude,
            color: style.color,
            fill: style.fill,
            fill_opacity: style.fill_opacity,
            radius: style.radius,
            weight: style.weight,
            tooltip,
            popup,
        }
    }
}

/// Markers for up to `cap` facilities, in table order. Rows without both
/// coordinates are skipped and do not count toward the cap.
#[must_use]
pub fn facility_markers(
    facilities: &LocationTable<FacilityRecord>,
    service: Service,
    cap: usize,
) -> Vec<Marker> {
    let (kind, style) = match service {
        Service::Arts => (MarkerKind::ArtsFacility, ARTS_STYLE),
        Service::Hospitals => (MarkerKind::Hospital, HOSPITAL_STYLE),
    };

    let markers: Vec<Marker> = facilities
        .records()
        .iter()
        .filter_map(|f| f.coordinates().map(|point| (f, point)))
        .take(cap)
        .map(|(f, point)| {
            let name = facility_name(f, service);
            Marker::new(kind, style, &f.id, point, name.clone(), facility_popup(f, &name))
        })
        .collect();

    if markers.len() == cap && facilities.len() > cap {
        log::info!("Facility markers capped at {cap} of {}", facilities.len());
    }
    markers
}

/// Markers for the activated schools found in `schools`, in table order.
/// `cap` of `None` draws all of them.
#[must_use]
pub fn school_markers(
    schools: &LocationTable<SchoolRecord>,
    activated: &[EntityId],
    cap: Option<usize>,
) -> Vec<Marker> {
    let wanted: HashSet<&EntityId> = activated.iter().collect();

    schools
        .records()
        .iter()
        .filter(|s| wanted.contains(&s.id))
        .filter_map(|s| s.coordinates().map(|point| (s, point)))
        .take(cap.unwrap_or(usize::MAX))
        .map(|(s, point)| {
            let name = if s.name.is_empty() {
                format!("School {}", s.id)
            } else {
                s.name.clone()
            };
            let popup = format!(
                "<b>{name}</b><br>District: {}<br>City: {}<br>Students: {}",
                s.district.as_deref().unwrap_or(""),
                s.city.as_deref().unwrap_or(""),
                s.enrollment.as_deref().unwrap_or("N/A"),
            );
            Marker::new(
                MarkerKind::School,
                SCHOOL_STYLE,
                &s.id,
                point,
                format!("School: {name}"),
                popup,
            )
        })
        .collect()
}

/// Lines for every pairing whose facility and school both have
/// coordinates. Unresolved endpoints are skipped.
#[must_use]
pub fn pairing_lines(
    pairings: &[Pairing],
    facilities: &LocationTable<FacilityRecord>,
    schools: &LocationTable<SchoolRecord>,
) -> Vec<PairingLine> {
    let lines: Vec<PairingLine> = pairings
        .iter()
        .filter_map(|p| {
            let from = facilities.get(&p.facility_id)?.coordinates()?;
            let to = schools.get(&p.school_id)?.coordinates()?;
            Some(PairingLine {
                facility_id: p.facility_id.clone(),
                school_id: p.school_id.clone(),
                from,
                to,
                color: PAIRING_COLOR,
                weight: 1.5,
                opacity: 0.6,
                dash_array: PAIRING_DASH,
                tooltip: format!(
                    "Pairing: Facility {} \u{2192} School {}",
                    p.facility_id, p.school_id
                ),
            })
        })
        .collect();

    let skipped = pairings.len() - lines.len();
    if skipped > 0 {
        log::debug!("Skipped {skipped} pairings with unresolved endpoints");
    }
    lines
}

fn facility_name(facility: &FacilityRecord, service: Service) -> String {
    if !facility.name.is_empty() {
        return facility.name.clone();
    }
    match service {
        Service::Arts => "Arts Facility".to_string(),
        Service::Hospitals => "Hospital".to_string(),
    }
}

fn facility_popup(facility: &FacilityRecord, name: &str) -> String {
    match &facility.detail {
        FacilityDetail::Arts { org_type } => format!(
            "<b>{name}</b><br>Type: {}<br>City: {}",
            org_type.as_deref().unwrap_or(""),
            facility.city.as_deref().unwrap_or(""),
        ),
        FacilityDetail::Hospital { beds, trauma, kind } => format!(
            "<b>{name}</b><br>Type: {}<br>Beds: {}<br>Trauma Level: {}",
            kind.as_deref().unwrap_or(""),
            beds.as_deref().unwrap_or("N/A"),
            trauma.as_deref().unwrap_or("N/A"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use school_share_analysis::locations::{read_facilities, read_schools};

    use super::*;

    fn id(raw: &str) -> EntityId {
        EntityId::parse(raw).unwrap()
    }

    fn schools() -> LocationTable<SchoolRecord> {
        let csv = "\
NCESSCH,School Name,District,CITY,Students*,LATITUDE,LONGITUDE
480001,Lamar High,Austin ISD,Austin,1500,30.30,-97.75
480002,Travis High,Austin ISD,Austin,,30.23,-97.76
480003,Crockett High,Austin ISD,Austin,1100,,
";
        read_schools(csv.as_bytes()).unwrap()
    }

    fn arts() -> LocationTable<FacilityRecord> {
        let csv = "\
NCARID,name,city,NTEECC,lat,lon
A-1,Ballet Austin,Austin,A62,30.27,-97.75
A-2,Zach Theatre,Austin,A65,,
A-3,Blanton Museum,Austin,A51,30.28,-97.74
";
        read_facilities(csv.as_bytes(), Service::Arts).unwrap()
    }

    #[test]
    fn facility_markers_skip_missing_coordinates() {
        let markers = facility_markers(&arts(), Service::Arts, DEFAULT_FACILITY_CAP);
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].tooltip, "Ballet Austin");
        assert_eq!(markers[0].color, "#9b59b6");
        assert_eq!(
            markers[0].popup,
            "<b>Ballet Austin</b><br>Type: A62<br>City: Austin"
        );
        assert_eq!(markers[1].id, id("A-3"));
    }

    #[test]
    fn facility_markers_respect_cap() {
        let markers = facility_markers(&arts(), Service::Arts, 1);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].id, id("A-1"));
    }

    #[test]
    fn only_activated_schools_with_coordinates() {
        let markers = school_markers(&schools(), &[id("480002"), id("480003")], None);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].tooltip, "School: Travis High");
        assert_eq!(markers[0].fill, "#2ecc71");
        assert!(markers[0].popup.contains("Students: N/A"));

        assert!(school_markers(&schools(), &[], None).is_empty());
    }

    #[test]
    fn pairing_lines_need_both_endpoints() {
        let pairings = [
            Pairing {
                facility_id: id("A-1"),
                school_id: id("480001"),
            },
            // Facility without coordinates.
            Pairing {
                facility_id: id("A-2"),
                school_id: id("480001"),
            },
            // Unknown school.
            Pairing {
                facility_id: id("A-3"),
                school_id: id("489999"),
            },
        ];
        let lines = pairing_lines(&pairings, &arts(), &schools());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].from, (30.27, -97.75));
        assert_eq!(lines[0].to, (30.30, -97.75));
        assert_eq!(
            lines[0].tooltip,
            "Pairing: Facility A-1 \u{2192} School 480001"
        );
    }
}
