//! Per-region coverage tables and the boundary join.

use std::collections::HashSet;
use std::io::Read;

use school_share_analysis_models::{CoverageRecord, CoverageSet, Notice, NoticeKind, Service};
use school_share_geography::RegionGeometry;
use school_share_geography_models::{RegionId, StateRef};

use crate::DssError;
use crate::paths::DataPaths;

/// Column holding the block-group id.
pub const ID_COLUMN: &str = "GEOID";
/// Column holding the distance before activation, in meters.
pub const BEFORE_COLUMN: &str = "mindist_current";
/// Column holding the distance after activation, in meters.
pub const AFTER_COLUMN: &str = "mindist_sol";

/// Records read from one coverage table.
#[derive(Debug, Clone, Default)]
pub struct CoverageRows {
    /// Parsed records, one per region.
    pub records: Vec<CoverageRecord>,
    /// Conditions recovered while reading.
    pub notices: Vec<Notice>,
}

/// Reads a coverage table.
///
/// Rows with unusable ids or distances are skipped and counted; repeated
/// ids keep their first row.
///
/// # Errors
///
/// Returns [`DssError::Csv`] for invalid CSV, or
/// [`DssError::MalformedRow`] if a required column is absent.
pub fn read_coverage<R: Read>(reader: R) -> Result<CoverageRows, DssError> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers = rdr.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| DssError::MalformedRow {
                row: "header".to_string(),
                column: name.to_string(),
            })
    };
    let id_col = column(ID_COLUMN)?;
    let before_col = column(BEFORE_COLUMN)?;
    let after_col = column(AFTER_COLUMN)?;

    let mut seen = HashSet::new();
    let mut out = CoverageRows::default();
    let (mut invalid_ids, mut bad_distances, mut duplicates) = (0_usize, 0_usize, 0_usize);

    for record in rdr.records() {
        let record = record?;

        let Ok(region_id) = RegionId::parse(record.get(id_col).unwrap_or_default()) else {
            invalid_ids += 1;
            continue;
        };

        let distance = |idx: usize| {
            record
                .get(idx)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite() && *v >= 0.0)
        };
        let (Some(before), Some(after)) = (distance(before_col), distance(after_col)) else {
            bad_distances += 1;
            continue;
        };

        if !seen.insert(region_id.clone()) {
            duplicates += 1;
            continue;
        }

        out.records
            .push(CoverageRecord::from_distances(region_id, before, after));
    }

    let mut note = |kind: NoticeKind, count: usize, what: &str| {
        if count > 0 {
            let message = format!("Skipped {count} coverage rows with {what}");
            log::warn!("{message}");
            out.notices.push(Notice::new(kind, message));
        }
    };
    note(NoticeKind::InvalidIdentifier, invalid_ids, "empty or invalid GEOIDs");
    note(NoticeKind::MalformedRow, bad_distances, "missing or negative distances");
    note(NoticeKind::MalformedRow, duplicates, "duplicate GEOIDs (first kept)");

    Ok(out)
}

/// Loads coverage for `rate`, substituting the nearest available rate when
/// that exact table does not exist.
///
/// Returns `None` when no coverage table exists for the state at all, or
/// when the chosen table cannot be read.
#[must_use]
pub fn load_coverage(
    paths: &DataPaths,
    state: &StateRef,
    service: Service,
    rate: u8,
) -> Option<CoverageSet> {
    let rate_used = if paths.coverage_file(service, state, rate).is_file() {
        rate
    } else {
        let available = paths.coverage_rates(service, state);
        let nearest = available.into_iter().min_by_key(|r| r.abs_diff(rate))?;
        log::warn!(
            "No {service} coverage for {} at {rate}%; using {nearest}%",
            state.name
        );
        nearest
    };

    let path = paths.coverage_file(service, state, rate_used);
    let rows = match std::fs::File::open(&path)
        .map_err(DssError::from)
        .and_then(read_coverage)
    {
        Ok(rows) => rows,
        Err(e) => {
            log::warn!("Failed to read coverage {}: {e}", path.display());
            return None;
        }
    };

    let mut notices = rows.notices;
    if rate_used != rate {
        notices.push(Notice::new(
            NoticeKind::SubstitutedRate,
            format!("Coverage for {rate}% unavailable; showing nearest available rate {rate_used}%"),
        ));
    }

    log::info!(
        "Loaded {} coverage rows for {} / {service} at {rate_used}%",
        rows.records.len(),
        state.name
    );

    Some(CoverageSet {
        requested_rate: rate,
        rate_used,
        records: rows.records,
        notices,
    })
}

/// A boundary polygon with its coverage record, if any.
#[derive(Debug, Clone, Copy)]
pub struct JoinedRegion<'a> {
    /// The region's boundary.
    pub geometry: &'a RegionGeometry,
    /// Its coverage; `None` renders as "no data".
    pub coverage: Option<&'a CoverageRecord>,
}

/// Left outer join from boundaries to coverage: every boundary appears
/// exactly once, in boundary order.
#[must_use]
pub fn join_coverage<'a>(
    boundaries: &'a [RegionGeometry],
    coverage: Option<&'a CoverageSet>,
) -> Vec<JoinedRegion<'a>> {
    let index = coverage.map(CoverageSet::by_region).unwrap_or_default();
    boundaries
        .iter()
        .map(|geometry| JoinedRegion {
            geometry,
            coverage: index.get(&geometry.region_id).copied(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use geo::{MultiPolygon, polygon};
    use school_share_geography_models::fips::resolve_state;

    use super::*;

    fn write_coverage(paths: &DataPaths, state: &StateRef, rate: u8, body: &str) {
        let path = paths.coverage_file(Service::Arts, state, rate);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    fn temp_paths(name: &str) -> DataPaths {
        let base = std::env::temp_dir().join(format!("school_share_coverage_{name}"));
        let _ = std::fs::remove_dir_all(&base);
        DataPaths::from_base(base)
    }

    #[test]
    fn reads_and_normalizes_rows() {
        let csv = "\
GEOID,mindist_current,mindist_sol
60371011101,12000,8000
060371011102,0,0
,100,50
060371011101,1,1
060371011103,abc,1
";
        let rows = read_coverage(csv.as_bytes()).unwrap();
        assert_eq!(rows.records.len(), 2);
        assert_eq!(rows.records[0].region_id.as_str(), "060371011101");
        assert!(rows.records[0].newly_covered);
        assert_eq!(rows.notices.len(), 3);
    }

    #[test]
    fn missing_column_is_malformed() {
        let csv = "GEOID,mindist_current\n480019501001,5\n";
        assert!(matches!(
            read_coverage(csv.as_bytes()),
            Err(DssError::MalformedRow { .. })
        ));
    }

    #[test]
    fn nearest_rate_substitution_is_reported() {
        let paths = temp_paths("nearest");
        let tx = resolve_state("Texas").unwrap();
        let body = "GEOID,mindist_current,mindist_sol\n480019501001,5000,1000\n";
        write_coverage(&paths, &tx, 25, body);
        write_coverage(&paths, &tx, 50, body);

        let set = load_coverage(&paths, &tx, Service::Arts, 30).unwrap();
        assert_eq!(set.requested_rate, 30);
        assert_eq!(set.rate_used, 25);
        assert!(set.is_substituted());
        assert!(set.notices.iter().any(|n| n.kind == NoticeKind::SubstitutedRate));

        let exact = load_coverage(&paths, &tx, Service::Arts, 50).unwrap();
        assert_eq!(exact.rate_used, 50);
        assert!(exact.notices.is_empty());
    }

    #[test]
    fn no_files_means_unavailable() {
        let paths = temp_paths("none");
        let tx = resolve_state("Texas").unwrap();
        assert!(load_coverage(&paths, &tx, Service::Arts, 25).is_none());
    }

    #[test]
    fn join_keeps_every_boundary() {
        let square = MultiPolygon(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 0.0),
        ]]);
        let boundaries = vec![
            RegionGeometry {
                region_id: RegionId::parse("480019501001").unwrap(),
                polygon: square.clone(),
            },
            RegionGeometry {
                region_id: RegionId::parse("480019501002").unwrap(),
                polygon: square,
            },
        ];
        let set = CoverageSet {
            requested_rate: 25,
            rate_used: 25,
            records: vec![CoverageRecord::from_distances(
                RegionId::from_number(480_019_501_001).unwrap(),
                5000.0,
                1000.0,
            )],
            notices: Vec::new(),
        };

        let joined = join_coverage(&boundaries, Some(&set));
        assert_eq!(joined.len(), 2);
        assert!(joined[0].coverage.is_some());
        assert!(joined[1].coverage.is_none());

        let bare = join_coverage(&boundaries, None);
        assert!(bare.iter().all(|j| j.coverage.is_none()));
    }
}
