#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! State tables and census identifier types.
//!
//! Everything that needs to agree on "which state" or "which block group"
//! goes through this crate: the FIPS/abbreviation/name table and the
//! canonical identifier forms used as join keys.

pub mod fips;
pub mod geoid;

pub use fips::StateRef;
pub use geoid::{EntityId, IdentifierError, RegionId};
