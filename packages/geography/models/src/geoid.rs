//! Canonical identifiers for regions and point entities.
//!
//! Census block-group GEOIDs are hierarchical (state + county + tract +
//! group) and lose their leading zero whenever a tool parses them as a
//! number, so `"060371011101"` comes back as `60371011101`. [`RegionId`]
//! restores the fixed 12-character form from any of those representations.
//!
//! School and facility identifiers are heterogeneous (NCES codes, `NCARID`
//! strings, raw numeric keys) and are only ever compared as text, so
//! [`EntityId`] is a trimmed string cast with no padding. Integer-like
//! float renderings (`"480001.0"`) collapse to their integer text so that
//! ids read from float columns match ids read as text.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Width of a census block-group GEOID.
pub const REGION_ID_WIDTH: usize = 12;

/// Reasons an identifier cannot be normalized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// Null, blank, or `NaN` input.
    #[error("identifier is empty")]
    Empty,

    /// A region identifier containing something other than digits.
    #[error("region identifier '{0}' is not numeric")]
    NonNumeric(String),

    /// A region identifier wider than a block-group GEOID.
    #[error("region identifier '{0}' is longer than 12 digits")]
    TooLong(String),
}

/// A block-group GEOID in canonical 12-character, zero-padded form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegionId(String);

impl RegionId {
    /// Normalizes a textual region identifier.
    ///
    /// Accepts canonical codes, zero-stripped codes, and numeric renderings
    /// with a trailing `.0` (what spreadsheet exports produce for integer
    /// columns containing blanks).
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError`] for empty, non-numeric, or over-long input.
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
            return Err(IdentifierError::Empty);
        }

        let digits = trimmed
            .strip_suffix(".0")
            .filter(|rest| !rest.is_empty())
            .unwrap_or(trimmed);

        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(IdentifierError::NonNumeric(trimmed.to_string()));
        }
        if digits.len() > REGION_ID_WIDTH {
            return Err(IdentifierError::TooLong(trimmed.to_string()));
        }

        Ok(Self(format!("{digits:0>width$}", width = REGION_ID_WIDTH)))
    }

    /// Normalizes a numeric region identifier.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::TooLong`] if the value has more than 12
    /// digits.
    pub fn from_number(value: u64) -> Result<Self, IdentifierError> {
        Self::parse(&value.to_string())
    }

    /// The canonical 12-character code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Two-digit state FIPS prefix.
    #[must_use]
    pub fn state_fips(&self) -> &str {
        &self.0[..2]
    }

    /// Whether this region lies in the state with the given FIPS code.
    #[must_use]
    pub fn in_state(&self, fips: &str) -> bool {
        self.0.starts_with(fips)
    }
}

impl TryFrom<String> for RegionId {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for RegionId {
    type Error = IdentifierError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<u64> for RegionId {
    type Error = IdentifierError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::from_number(value)
    }
}

impl From<RegionId> for String {
    fn from(value: RegionId) -> Self {
        value.0
    }
}

impl std::fmt::Display for RegionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A school or facility identifier, compared as trimmed text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(String);

impl EntityId {
    /// Normalizes a textual entity identifier.
    ///
    /// A trailing `.0` is dropped when the rest is all digits.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::Empty`] for blank or `NaN` input.
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
            return Err(IdentifierError::Empty);
        }
        let text = trimmed
            .strip_suffix(".0")
            .filter(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
            .unwrap_or(trimmed);
        Ok(Self(text.to_string()))
    }

    /// The identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl TryFrom<String> for EntityId {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for EntityId {
    type Error = IdentifierError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<EntityId> for String {
    fn from(value: EntityId) -> Self {
        value.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_region_id_is_unchanged() {
        let id = RegionId::parse("480019501001").unwrap();
        assert_eq!(id.as_str(), "480019501001");
        let again = RegionId::parse(id.as_str()).unwrap();
        assert_eq!(id, again);
    }

    #[test]
    fn string_and_integer_forms_agree() {
        let from_text = RegionId::parse("480019501001").unwrap();
        let from_int = RegionId::from_number(480_019_501_001).unwrap();
        assert_eq!(from_text, from_int);
    }

    #[test]
    fn restores_stripped_leading_zero() {
        let id = RegionId::from_number(60_371_011_101).unwrap();
        assert_eq!(id.as_str(), "060371011101");
        assert_eq!(id.state_fips(), "06");
        assert!(id.in_state("06"));
    }

    #[test]
    fn accepts_float_rendering() {
        let id = RegionId::parse("60371011101.0").unwrap();
        assert_eq!(id.as_str(), "060371011101");
    }

    #[test]
    fn rejects_empty_region_ids() {
        assert_eq!(RegionId::parse(""), Err(IdentifierError::Empty));
        assert_eq!(RegionId::parse("   "), Err(IdentifierError::Empty));
        assert_eq!(RegionId::parse("NaN"), Err(IdentifierError::Empty));
    }

    #[test]
    fn rejects_malformed_region_ids() {
        assert!(matches!(
            RegionId::parse("48A019501001"),
            Err(IdentifierError::NonNumeric(_))
        ));
        assert!(matches!(
            RegionId::parse("4800195010011"),
            Err(IdentifierError::TooLong(_))
        ));
        assert!(matches!(
            RegionId::parse(".0"),
            Err(IdentifierError::NonNumeric(_))
        ));
    }

    #[test]
    fn entity_ids_are_plain_string_casts() {
        assert_eq!(EntityId::parse(" 480001234567 ").unwrap().as_str(), "480001234567");
        assert_eq!(EntityId::parse("ncar-0042").unwrap().as_str(), "ncar-0042");
        assert_eq!(EntityId::from(1234_i64).as_str(), "1234");
        assert_eq!(EntityId::from(1234_i64), EntityId::parse("1234").unwrap());
        assert_eq!(EntityId::parse(""), Err(IdentifierError::Empty));
    }

    #[test]
    fn integer_like_entity_floats_collapse() {
        assert_eq!(EntityId::parse("480001234567.0").unwrap().as_str(), "480001234567");
        assert_eq!(EntityId::parse("12.0").unwrap(), EntityId::from(12_i64));
        assert_eq!(EntityId::parse("12.5").unwrap().as_str(), "12.5");
        assert_eq!(EntityId::parse("A-1.0").unwrap().as_str(), "A-1.0");
        assert_eq!(EntityId::parse(".0").unwrap().as_str(), ".0");
    }
}
