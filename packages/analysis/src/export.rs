//! Downloadable CSV exports.

use std::collections::HashSet;
use std::io::Write;

use school_share_analysis_models::{FacilityRecord, Pairing, SchoolRecord, Service};
use school_share_geography_models::EntityId;

use crate::DssError;
use crate::locations::LocationTable;

/// Header of the pairing table.
pub const PAIRING_HEADER: [&str; 4] = ["Facility ID", "Facility Name", "School ID", "School Name"];

/// Header of the detailed activated-school roster.
pub const ROSTER_HEADER: [&str; 5] = ["NCES ID", "School Name", "District", "City", "Students"];

/// Header of the id-only roster used when no school table exists.
pub const ROSTER_IDS_HEADER: [&str; 5] = [
    "NCES_School_ID",
    "Selection_Order",
    "State",
    "Service_Type",
    "Activation_Rate",
];

/// Which export a file name is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    /// Facility-school pairing table.
    Pairings,
    /// Activated-school roster.
    Schools,
}

/// File name for an export, e.g. `texas_arts_facilities_pairings_25pct.csv`.
#[must_use]
pub fn export_file_name(state: &str, service: Service, kind: ExportKind, rate: u8) -> String {
    let kind = match kind {
        ExportKind::Pairings => "pairings",
        ExportKind::Schools => "schools",
    };
    format!(
        "{}_{}_{kind}_{rate}pct.csv",
        state.trim().to_lowercase().replace(' ', "_"),
        service.slug()
    )
}

/// Writes the pairing table. Names are blank when an id is not found in
/// the corresponding location table.
///
/// # Errors
///
/// Returns a [`DssError::Csv`] if writing fails.
pub fn write_pairings<W: Write>(
    writer: W,
    pairings: &[Pairing],
    facilities: Option<&LocationTable<FacilityRecord>>,
    schools: Option<&LocationTable<SchoolRecord>>,
) -> Result<(), DssError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(PAIRING_HEADER)?;

    for pairing in pairings {
        let facility_name = facilities
            .and_then(|t| t.get(&pairing.facility_id))
            .map_or("", |f| f.name.as_str());
        let school_name = schools
            .and_then(|t| t.get(&pairing.school_id))
            .map_or("", |s| s.name.as_str());

        wtr.write_record([
            pairing.facility_id.as_str(),
            facility_name,
            pairing.school_id.as_str(),
            school_name,
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Writes the activated-school roster.
///
/// With a school table, lists matching schools in table order with their
/// details. Without one, or when none of the ids match, lists the ids in
/// selection order.
///
/// # Errors
///
/// Returns a [`DssError::Csv`] if writing fails.
pub fn write_roster<W: Write>(
    writer: W,
    activated: &[EntityId],
    schools: Option<&LocationTable<SchoolRecord>>,
    state: &str,
    service: Service,
    rate: u8,
) -> Result<(), DssError> {
    let mut wtr = csv::Writer::from_writer(writer);

    let wanted: HashSet<&EntityId> = activated.iter().collect();
    let matched: Vec<&SchoolRecord> = schools
        .map(|t| {
            t.records()
                .iter()
                .filter(|s| wanted.contains(&s.id))
                .collect()
        })
        .unwrap_or_default();

    if matched.is_empty() {
        if schools.is_some() {
            log::warn!("No activated schools found in the school table; exporting ids only");
        }
        wtr.write_record(ROSTER_IDS_HEADER)?;
        let service = service.to_string();
        let rate = format!("{rate}%");
        for (order, id) in activated.iter().enumerate() {
            let order = (order + 1).to_string();
            wtr.write_record([id.as_str(), order.as_str(), state, service.as_str(), rate.as_str()])?;
        }
    } else {
        wtr.write_record(ROSTER_HEADER)?;
        for school in matched {
            wtr.write_record([
                school.id.as_str(),
                school.name.as_str(),
                school.district.as_deref().unwrap_or(""),
                school.city.as_deref().unwrap_or(""),
                school.enrollment.as_deref().unwrap_or("N/A"),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::locations::{read_facilities, read_schools};

    use super::*;

    fn id(raw: &str) -> EntityId {
        EntityId::parse(raw).unwrap()
    }

    fn schools() -> LocationTable<SchoolRecord> {
        let csv = "\
NCESSCH,School Name,District,CITY,Students*
480001,Lamar High,Austin ISD,Austin,1500
480002,Travis High,Austin ISD,Austin,
480003,Crockett High,Austin ISD,Austin,1100
";
        read_schools(csv.as_bytes()).unwrap()
    }

    #[test]
    fn file_names() {
        assert_eq!(
            export_file_name("Texas", Service::Arts, ExportKind::Pairings, 25),
            "texas_arts_facilities_pairings_25pct.csv"
        );
        assert_eq!(
            export_file_name("New York", Service::Hospitals, ExportKind::Schools, 10),
            "new_york_hospitals_schools_10pct.csv"
        );
    }

    #[test]
    fn pairings_with_partial_lookups() {
        let facilities =
            read_facilities("NCARID,name\nA-1,Ballet Austin\n".as_bytes(), Service::Arts).unwrap();
        let schools = schools();
        let pairings = vec![
            Pairing {
                facility_id: id("A-1"),
                school_id: id("480001"),
            },
            Pairing {
                facility_id: id("A-9"),
                school_id: id("489999"),
            },
        ];

        let mut out = Vec::new();
        write_pairings(&mut out, &pairings, Some(&facilities), Some(&schools)).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "Facility ID,Facility Name,School ID,School Name\n\
             A-1,Ballet Austin,480001,Lamar High\n\
             A-9,,489999,\n"
        );
    }

    #[test]
    fn empty_pairings_still_have_header() {
        let mut out = Vec::new();
        write_pairings(&mut out, &[], None, None).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Facility ID,Facility Name,School ID,School Name\n"
        );
    }

    #[test]
    fn roster_with_school_table_uses_table_order() {
        let schools = schools();
        let mut out = Vec::new();
        write_roster(
            &mut out,
            &[id("480003"), id("480002")],
            Some(&schools),
            "Texas",
            Service::Arts,
            25,
        )
        .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "NCES ID,School Name,District,City,Students\n\
             480002,Travis High,Austin ISD,Austin,N/A\n\
             480003,Crockett High,Austin ISD,Austin,1100\n"
        );
    }

    #[test]
    fn roster_without_school_table_lists_ids() {
        let mut out = Vec::new();
        write_roster(
            &mut out,
            &[id("480003"), id("480002")],
            None,
            "Texas",
            Service::Hospitals,
            10,
        )
        .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "NCES_School_ID,Selection_Order,State,Service_Type,Activation_Rate\n\
             480003,1,Texas,Hospitals,10%\n\
             480002,2,Texas,Hospitals,10%\n"
        );
    }
}
