//! Prefix-filtered reader for the block-group boundary store.
//!
//! The store is newline-delimited `GeoJSON` (`GeoJSONSeq`): one `Feature`
//! per line, with the block-group id in `properties.GEOID`. Each line's
//! properties are read first; the geometry is only built for block groups
//! in the requested state.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use geo::MultiPolygon;
use geojson::GeoJson;
use school_share_geography_models::RegionId;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::GeoError;

/// Property names that may carry the block-group id, tried in order.
const GEOID_PROPERTIES: &[&str] = &["GEOID", "GEOID20", "geoid"];

/// ASCII record separator that RFC 8142 allows in front of each record.
const RECORD_SEPARATOR: char = '\u{1e}';

/// The parts of a feature line needed to decide whether to keep it.
/// `geometry` is skipped without being built.
#[derive(Deserialize)]
struct FeatureHeader {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

/// Polygon for one block group, keyed by its canonical id.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionGeometry {
    /// Canonical block-group id.
    pub region_id: RegionId,
    /// Boundary in WGS84 lon/lat.
    pub polygon: MultiPolygon<f64>,
}

/// Block groups loaded for one state.
#[derive(Debug, Clone, Default)]
pub struct BoundarySet {
    /// Regions in file order.
    pub regions: Vec<RegionGeometry>,
    /// Features whose id could not be normalized.
    pub invalid_ids: usize,
    /// Lines that were not a polygon feature.
    pub malformed: usize,
}

impl BoundarySet {
    /// Number of regions loaded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether no regions were loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Loads the block groups of one state from the boundary store on disk.
///
/// # Errors
///
/// Returns [`GeoError::Unavailable`] if the store does not exist, or
/// [`GeoError::Io`] if reading it fails part-way.
pub fn load_block_groups(path: &Path, state_fips: &str) -> Result<BoundarySet, GeoError> {
    if !path.is_file() {
        return Err(GeoError::Unavailable {
            path: path.to_path_buf(),
        });
    }

    let file = File::open(path)?;
    let set = read_block_groups(BufReader::new(file), state_fips)?;

    log::info!(
        "Loaded {} block groups for state {state_fips} from {}",
        set.len(),
        path.display()
    );

    Ok(set)
}

/// Reads block groups whose id starts with `state_fips` from a
/// `GeoJSONSeq` stream.
///
/// Malformed lines and features with unusable ids are counted and skipped.
///
/// # Errors
///
/// Returns [`GeoError::Io`] if the underlying reader fails.
pub fn read_block_groups<R: BufRead>(reader: R, state_fips: &str) -> Result<BoundarySet, GeoError> {
    let mut set = BoundarySet::default();

    for line in reader.lines() {
        let line = line?;
        let record = line.trim().trim_start_matches(RECORD_SEPARATOR);
        if record.is_empty() {
            continue;
        }

        let header = match serde_json::from_str::<FeatureHeader>(record) {
            Ok(header) if header.kind == "Feature" => header,
            _ => {
                set.malformed += 1;
                continue;
            }
        };

        let Some(raw_id) = header.properties.as_ref().and_then(feature_geoid) else {
            set.invalid_ids += 1;
            continue;
        };

        let region_id = match RegionId::parse(&raw_id) {
            Ok(id) => id,
            Err(e) => {
                log::debug!("Skipping boundary feature: {e}");
                set.invalid_ids += 1;
                continue;
            }
        };

        if !region_id.in_state(state_fips) {
            continue;
        }

        let polygon = match record.parse::<GeoJson>() {
            Ok(GeoJson::Feature(feature)) => feature.geometry.and_then(to_multipolygon),
            _ => None,
        };
        let Some(polygon) = polygon else {
            set.malformed += 1;
            continue;
        };

        set.regions.push(RegionGeometry { region_id, polygon });
    }

    if set.invalid_ids > 0 || set.malformed > 0 {
        log::warn!(
            "Boundary store: skipped {} features with invalid ids and {} malformed records",
            set.invalid_ids,
            set.malformed
        );
    }

    Ok(set)
}

/// Pulls the raw block-group id out of a feature's properties, accepting
/// string or numeric values.
fn feature_geoid(props: &Map<String, Value>) -> Option<String> {
    GEOID_PROPERTIES
        .iter()
        .find_map(|name| match props.get(*name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => n.as_u64().map(|v| v.to_string()),
            _ => None,
        })
}

/// Converts a `GeoJSON` geometry into a [`MultiPolygon`].
/// Handles both `Polygon` and `MultiPolygon` geometry types.
fn to_multipolygon(geometry: geojson::Geometry) -> Option<MultiPolygon<f64>> {
    let geo_geom: geo::Geometry<f64> = geometry.try_into().ok()?;
    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}
