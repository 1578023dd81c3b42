#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Census block-group boundaries for choropleth rendering.
//!
//! Reads block-group polygons from the national boundary store, keeping
//! only the regions of one state so a single-state analysis never holds
//! the whole country in memory. Also provides the lossy, display-only
//! simplification applied right before polygons are styled.

pub mod boundaries;
pub mod simplify;

use std::path::PathBuf;

use thiserror::Error;

pub use boundaries::{BoundarySet, RegionGeometry, load_block_groups, read_block_groups};
pub use simplify::{DISPLAY_TOLERANCE_DEG, simplify_for_display};

/// Errors that can occur while reading boundary geometry.
#[derive(Debug, Error)]
pub enum GeoError {
    /// The boundary store does not exist.
    #[error("Boundary store not found: {}", path.display())]
    Unavailable {
        /// Path that was checked.
        path: PathBuf,
    },

    /// Reading the boundary store failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
