//! School and facility location tables.
//!
//! Source tables come from several upstream exports that disagree on
//! column names, so each logical attribute lists its candidate columns in
//! priority order. Resolution happens once per row here; downstream code
//! only sees the fixed-shape records.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use school_share_analysis_models::{FacilityDetail, FacilityRecord, SchoolRecord, Service};
use school_share_geography_models::EntityId;

use crate::DssError;
use crate::paths::{DataPaths, LocationKind};

/// Latitude column candidates.
pub const LATITUDE: &[&str] = &["lat", "Latitude", "LATITUDE", "LAT", "y"];
/// Longitude column candidates.
pub const LONGITUDE: &[&str] = &["lon", "Longitude", "LONGITUDE", "LON", "x"];

/// Candidate columns for school tables.
pub mod school_columns {
    /// NCES id; the blank header is an exported index column.
    pub const ID: &[&str] = &["NCESSCH", "id", "index", ""];
    /// School name.
    pub const NAME: &[&str] = &["School Name", "NAME", "name"];
    /// District.
    pub const DISTRICT: &[&str] = &["District"];
    /// City.
    pub const CITY: &[&str] = &["CITY", "City"];
    /// Enrollment.
    pub const ENROLLMENT: &[&str] = &["Students*", "Students"];
}

/// Candidate columns for arts organization tables.
pub mod arts_columns {
    /// Organization id.
    pub const ID: &[&str] = &["NCARID", "id", "index", ""];
    /// Organization name.
    pub const NAME: &[&str] = &["name", "OrgName"];
    /// City.
    pub const CITY: &[&str] = &["city", "City"];
    /// Organization type.
    pub const ORG_TYPE: &[&str] = &["org_type", "NTEECC"];
}

/// Candidate columns for hospital tables.
pub mod hospital_columns {
    /// Hospital id. Pairings reference the exported row index, so it
    /// takes precedence over the HIFLD `ID` column.
    pub const ID: &[&str] = &["", "index", "id", "ID"];
    /// Hospital name.
    pub const NAME: &[&str] = &["NAME", "name"];
    /// City.
    pub const CITY: &[&str] = &["CITY", "City"];
    /// Bed count.
    pub const BEDS: &[&str] = &["BEDS"];
    /// Trauma level.
    pub const TRAUMA: &[&str] = &["TRAUMA"];
    /// Hospital type.
    pub const TYPE: &[&str] = &["TYPE"];
}

/// Header positions of one logical attribute, in candidate order.
#[derive(Debug, Clone)]
struct Field {
    columns: Vec<usize>,
}

impl Field {
    fn resolve(headers: &StringRecord, candidates: &[&str]) -> Self {
        let columns = candidates
            .iter()
            .filter_map(|c| headers.iter().position(|h| h.trim() == *c))
            .collect();
        Self { columns }
    }

    /// First non-empty value across the candidate columns.
    fn get<'r>(&self, record: &'r StringRecord) -> Option<&'r str> {
        self.columns
            .iter()
            .filter_map(|&i| record.get(i))
            .map(str::trim)
            .find(|v| !v.is_empty() && !v.eq_ignore_ascii_case("nan"))
    }

    fn text(&self, record: &StringRecord) -> Option<String> {
        self.get(record).map(ToString::to_string)
    }

    fn number(&self, record: &StringRecord) -> Option<f64> {
        self.get(record)?.parse::<f64>().ok()
    }
}

/// Location records indexed by id.
#[derive(Debug, Clone)]
pub struct LocationTable<T> {
    records: Vec<T>,
    index: HashMap<EntityId, usize>,
    /// Rows dropped for lacking an id.
    pub skipped: usize,
}

impl<T> LocationTable<T> {
    fn new(records: Vec<T>, skipped: usize, key: impl Fn(&T) -> &EntityId) -> Self {
        let mut index = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            index.entry(key(record).clone()).or_insert(i);
        }
        Self {
            records,
            index,
            skipped,
        }
    }

    /// Looks up a record by id.
    #[must_use]
    pub fn get(&self, id: &EntityId) -> Option<&T> {
        self.index.get(id).and_then(|&i| self.records.get(i))
    }

    /// All records in file order.
    #[must_use]
    pub fn records(&self) -> &[T] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Reads a school table.
///
/// # Errors
///
/// Returns [`DssError::Csv`] if the input is not valid CSV.
pub fn read_schools<R: Read>(reader: R) -> Result<LocationTable<SchoolRecord>, DssError> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let id = Field::resolve(&headers, school_columns::ID);
    let name = Field::resolve(&headers, school_columns::NAME);
    let district = Field::resolve(&headers, school_columns::DISTRICT);
    let city = Field::resolve(&headers, school_columns::CITY);
    let enrollment = Field::resolve(&headers, school_columns::ENROLLMENT);
    let lat = Field::resolve(&headers, LATITUDE);
    let lon = Field::resolve(&headers, LONGITUDE);

    let mut records = Vec::new();
    let mut skipped = 0;
    for row in rdr.records() {
        let row = row?;
        let Some(school_id) = id.get(&row).and_then(|v| EntityId::parse(v).ok()) else {
            skipped += 1;
            continue;
        };
        records.push(SchoolRecord {
            id: school_id,
            name: name.text(&row).unwrap_or_default(),
            district: district.text(&row),
            city: city.text(&row),
            enrollment: enrollment.text(&row),
            latitude: lat.number(&row),
            longitude: lon.number(&row),
        });
    }

    Ok(LocationTable::new(records, skipped, |s| &s.id))
}

/// Reads a facility table for `service`.
///
/// # Errors
///
/// Returns [`DssError::Csv`] if the input is not valid CSV.
pub fn read_facilities<R: Read>(
    reader: R,
    service: Service,
) -> Result<LocationTable<FacilityRecord>, DssError> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let (id_cols, name_cols, city_cols) = match service {
        Service::Arts => (arts_columns::ID, arts_columns::NAME, arts_columns::CITY),
        Service::Hospitals => (
            hospital_columns::ID,
            hospital_columns::NAME,
            hospital_columns::CITY,
        ),
    };
    let id = Field::resolve(&headers, id_cols);
    let name = Field::resolve(&headers, name_cols);
    let city = Field::resolve(&headers, city_cols);
    let org_type = Field::resolve(&headers, arts_columns::ORG_TYPE);
    let beds = Field::resolve(&headers, hospital_columns::BEDS);
    let trauma = Field::resolve(&headers, hospital_columns::TRAUMA);
    let kind = Field::resolve(&headers, hospital_columns::TYPE);
    let lat = Field::resolve(&headers, LATITUDE);
    let lon = Field::resolve(&headers, LONGITUDE);

    let mut records = Vec::new();
    let mut skipped = 0;
    for row in rdr.records() {
        let row = row?;
        let Some(facility_id) = id.get(&row).and_then(|v| EntityId::parse(v).ok()) else {
            skipped += 1;
            continue;
        };
        let detail = match service {
            Service::Arts => FacilityDetail::Arts {
                org_type: org_type.text(&row),
            },
            Service::Hospitals => FacilityDetail::Hospital {
                beds: beds.text(&row),
                trauma: trauma.text(&row),
                kind: kind.text(&row),
            },
        };
        records.push(FacilityRecord {
            id: facility_id,
            name: name.text(&row).unwrap_or_default(),
            city: city.text(&row),
            latitude: lat.number(&row),
            longitude: lon.number(&row),
            detail,
        });
    }

    Ok(LocationTable::new(records, skipped, |f| &f.id))
}

/// Loads the school table for a state; `None` when absent or unreadable.
#[must_use]
pub fn load_schools(paths: &DataPaths, state_fips: &str) -> Option<LocationTable<SchoolRecord>> {
    let path = paths.location_file(LocationKind::Schools, state_fips);
    load_table(&path, read_schools)
}

/// Loads the facility table for a state and service; `None` when absent
/// or unreadable.
#[must_use]
pub fn load_facilities(
    paths: &DataPaths,
    state_fips: &str,
    service: Service,
) -> Option<LocationTable<FacilityRecord>> {
    let path = paths.location_file(LocationKind::facilities_for(service), state_fips);
    load_table(&path, |file| read_facilities(file, service))
}

fn load_table<T>(
    path: &Path,
    read: impl FnOnce(std::fs::File) -> Result<LocationTable<T>, DssError>,
) -> Option<LocationTable<T>> {
    if !path.is_file() {
        log::info!("Location table {} not found", path.display());
        return None;
    }

    let table = std::fs::File::open(path)
        .map_err(DssError::from)
        .and_then(read)
        .inspect_err(|e| log::warn!("Failed to read {}: {e}", path.display()))
        .ok()?;

    if table.skipped > 0 {
        log::warn!(
            "Skipped {} rows without an id in {}",
            table.skipped,
            path.display()
        );
    }
    log::info!("Loaded {} locations from {}", table.len(), path.display());

    Some(table)
}
