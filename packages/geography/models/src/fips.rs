//! US state FIPS code utilities.
//!
//! One table holds the two-digit FIPS code, two-letter abbreviation, full
//! name, and default map center for the 50 US states + DC. Everything else
//! in this module is a lookup over that table.

use serde::Serialize;

/// Map center used when a state has no entry of its own.
pub const DEFAULT_CENTER: (f64, f64) = (39.8, -98.5);

/// `(fips, abbr, name, (lat, lon) center)` for the 50 states + DC.
const STATES: &[(&str, &str, &str, (f64, f64))] = &[
    ("01", "AL", "Alabama", (32.8, -86.8)),
    ("02", "AK", "Alaska", (64.2, -149.5)),
    ("04", "AZ", "Arizona", (34.0, -111.1)),
    ("05", "AR", "Arkansas", (34.8, -92.2)),
    ("06", "CA", "California", (36.7, -119.4)),
    ("08", "CO", "Colorado", (39.1, -105.4)),
    ("09", "CT", "Connecticut", (41.6, -72.7)),
    ("10", "DE", "Delaware", (39.0, -75.5)),
    ("11", "DC", "District of Columbia", (38.9, -77.0)),
    ("12", "FL", "Florida", (27.8, -81.7)),
    ("13", "GA", "Georgia", (32.6, -83.4)),
    ("15", "HI", "Hawaii", (19.9, -155.6)),
    ("16", "ID", "Idaho", (44.1, -114.7)),
    ("17", "IL", "Illinois", (40.0, -89.0)),
    ("18", "IN", "Indiana", (39.8, -86.1)),
    ("19", "IA", "Iowa", (42.0, -93.5)),
    ("20", "KS", "Kansas", (38.5, -98.8)),
    ("21", "KY", "Kentucky", (37.8, -85.3)),
    ("22", "LA", "Louisiana", (31.0, -92.0)),
    ("23", "ME", "Maine", (45.4, -69.0)),
    ("24", "MD", "Maryland", (39.0, -76.7)),
    ("25", "MA", "Massachusetts", (42.4, -71.4)),
    ("26", "MI", "Michigan", (44.3, -85.6)),
    ("27", "MN", "Minnesota", (46.3, -94.2)),
    ("28", "MS", "Mississippi", (32.7, -89.7)),
    ("29", "MO", "Missouri", (38.5, -92.3)),
    ("30", "MT", "Montana", (46.9, -110.4)),
    ("31", "NE", "Nebraska", (41.5, -99.9)),
    ("32", "NV", "Nevada", (38.8, -116.4)),
    ("33", "NH", "New Hampshire", (44.0, -71.5)),
    ("34", "NJ", "New Jersey", (40.3, -74.5)),
    ("35", "NM", "New Mexico", (34.5, -106.1)),
    ("36", "NY", "New York", (42.9, -75.5)),
    ("37", "NC", "North Carolina", (35.5, -79.8)),
    ("38", "ND", "North Dakota", (47.5, -100.5)),
    ("39", "OH", "Ohio", (40.4, -82.7)),
    ("40", "OK", "Oklahoma", (35.5, -97.5)),
    ("41", "OR", "Oregon", (44.0, -120.5)),
    ("42", "PA", "Pennsylvania", (40.9, -77.8)),
    ("44", "RI", "Rhode Island", (41.7, -71.5)),
    ("45", "SC", "South Carolina", (33.9, -81.0)),
    ("46", "SD", "South Dakota", (44.4, -100.2)),
    ("47", "TN", "Tennessee", (35.9, -86.4)),
    ("48", "TX", "Texas", (31.0, -99.0)),
    ("49", "UT", "Utah", (39.3, -111.7)),
    ("50", "VT", "Vermont", (44.0, -72.7)),
    ("51", "VA", "Virginia", (37.5, -78.9)),
    ("53", "WA", "Washington", (47.4, -120.5)),
    ("54", "WV", "West Virginia", (38.9, -80.2)),
    ("55", "WI", "Wisconsin", (44.8, -89.5)),
    ("56", "WY", "Wyoming", (43.0, -107.6)),
];

/// A resolved US state: FIPS code, abbreviation, and full name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateRef {
    /// Two-digit FIPS code (e.g. "48").
    pub fips: &'static str,
    /// Two-letter abbreviation (e.g. "TX").
    pub abbr: &'static str,
    /// Full state name (e.g. "Texas").
    pub name: &'static str,
}

impl StateRef {
    /// Default map center for this state as `(lat, lon)`.
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        state_center(self.fips)
    }
}

impl std::fmt::Display for StateRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

fn entry_to_ref(entry: &(&'static str, &'static str, &'static str, (f64, f64))) -> StateRef {
    StateRef {
        fips: entry.0,
        abbr: entry.1,
        name: entry.2,
    }
}

/// Iterates all known states in FIPS order.
pub fn all_states() -> impl Iterator<Item = StateRef> {
    STATES.iter().map(entry_to_ref)
}

/// Resolves a state from its full name or two-letter abbreviation.
///
/// Matching is case-insensitive and ignores surrounding whitespace.
#[must_use]
pub fn resolve_state(input: &str) -> Option<StateRef> {
    let needle = input.trim();
    STATES
        .iter()
        .find(|(_, abbr, name, _)| {
            abbr.eq_ignore_ascii_case(needle) || name.eq_ignore_ascii_case(needle)
        })
        .map(entry_to_ref)
}

/// Looks up a state by its two-digit FIPS code.
#[must_use]
pub fn state_by_fips(fips: &str) -> Option<StateRef> {
    STATES.iter().find(|entry| entry.0 == fips).map(entry_to_ref)
}

/// Maps a two-letter abbreviation to the full state name.
///
/// Returns `None` for unrecognized abbreviations.
#[must_use]
pub fn abbr_to_name(abbr: &str) -> Option<&'static str> {
    STATES
        .iter()
        .find(|(_, a, _, _)| a.eq_ignore_ascii_case(abbr))
        .map(|entry| entry.2)
}

/// Default map center `(lat, lon)` for a FIPS code, falling back to the
/// geographic center of the contiguous US.
#[must_use]
pub fn state_center(fips: &str) -> (f64, f64) {
    STATES
        .iter()
        .find(|entry| entry.0 == fips)
        .map_or(DEFAULT_CENTER, |entry| entry.3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_has_fifty_states_and_dc() {
        assert_eq!(all_states().count(), 51);
    }

    #[test]
    fn resolves_by_name_and_abbr() {
        let by_name = resolve_state("Texas").unwrap();
        let by_abbr = resolve_state(" tx ").unwrap();
        assert_eq!(by_name, by_abbr);
        assert_eq!(by_name.fips, "48");
        assert_eq!(by_name.abbr, "TX");
    }

    #[test]
    fn resolves_multi_word_names() {
        let dc = resolve_state("district of columbia").unwrap();
        assert_eq!(dc.fips, "11");
    }

    #[test]
    fn fips_lookup_roundtrips() {
        for state in all_states() {
            assert_eq!(state_by_fips(state.fips), Some(state));
            assert_eq!(abbr_to_name(state.abbr), Some(state.name));
        }
    }

    #[test]
    fn unknown_inputs() {
        assert!(resolve_state("Atlantis").is_none());
        assert!(state_by_fips("99").is_none());
        assert_eq!(abbr_to_name("XX"), None);
        assert_eq!(state_center("99"), DEFAULT_CENTER);
    }

    #[test]
    fn centers_come_from_table() {
        let tx = resolve_state("TX").unwrap();
        assert_eq!(tx.center(), (31.0, -99.0));
    }
}
