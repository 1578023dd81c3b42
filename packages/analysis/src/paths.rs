#![allow(clippy::module_name_repetitions)]
//! Data directory layout and file naming.
//!
//! Four roots, each overridable by an environment variable and each
//! defaulting from the one before it:
//!
//! | variable | default |
//! |---|---|
//! | `DSS_BASE_PATH` | workspace root |
//! | `DSS_DATA_PATH` | `<base>/data` |
//! | `DSS_CENSUS_PATH` | `<data>/census` |
//! | `DSS_PROCESSED_PATH` | `<data>/processed` |

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use school_share_analysis_models::Service;
use school_share_geography_models::StateRef;

/// Name of the national block-group boundary store inside the census root.
pub const BOUNDARIES_FILE: &str = "cbg_shapes_2020.geojsonseq";

static COVERAGE_FILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z]{2})_(\d{2})_coverage_mindist_numfacility_(\d{1,3})perc\.csv$")
        .unwrap_or_else(|e| unreachable!("coverage file pattern is valid: {e}"))
});

/// Point-location table families, one file per state each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationKind {
    /// Public high schools.
    Schools,
    /// Arts organizations.
    Arts,
    /// Hospitals.
    Hospitals,
}

impl LocationKind {
    /// The facility table for a service.
    #[must_use]
    pub const fn facilities_for(service: Service) -> Self {
        match service {
            Service::Arts => Self::Arts,
            Service::Hospitals => Self::Hospitals,
        }
    }

    const fn file_prefix(self) -> &'static str {
        match self {
            Self::Schools => "HS",
            Self::Arts => "OM",
            Self::Hospitals => "HO",
        }
    }
}

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`.
#[must_use]
pub fn project_root() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest
        .ancestors()
        .nth(2)
        .map_or_else(|| manifest.to_path_buf(), Path::to_path_buf)
}

/// Resolved data roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    /// Application root.
    pub base: PathBuf,
    /// Raw and processed data root.
    pub data: PathBuf,
    /// Census geometry root.
    pub census: PathBuf,
    /// Processed location tables root.
    pub processed: PathBuf,
}

impl DataPaths {
    /// Derives every root from `base` with no environment overrides.
    #[must_use]
    pub fn from_base(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        let data = base.join("data");
        Self {
            census: data.join("census"),
            processed: data.join("processed"),
            data,
            base,
        }
    }

    /// Resolves roots from the `DSS_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let base = env_path("DSS_BASE_PATH").unwrap_or_else(project_root);
        let data = env_path("DSS_DATA_PATH").unwrap_or_else(|| base.join("data"));
        let census = env_path("DSS_CENSUS_PATH").unwrap_or_else(|| data.join("census"));
        let processed = env_path("DSS_PROCESSED_PATH").unwrap_or_else(|| data.join("processed"));

        let paths = Self {
            base,
            data,
            census,
            processed,
        };

        if std::env::var_os("DSS_DEBUG").is_some() {
            log::info!("Base path: {}", paths.base.display());
            log::info!("Data path: {}", paths.data.display());
            log::info!("Census path: {}", paths.census.display());
            log::info!("Processed path: {}", paths.processed.display());
        }

        paths
    }

    /// Directory holding a service's optimization result tables.
    #[must_use]
    pub fn results_dir(&self, service: Service) -> PathBuf {
        let dir = match service {
            Service::Arts => "result_arts_250425",
            Service::Hospitals => "result_hospital_250507",
        };
        self.data.join("raw").join(dir)
    }

    /// The result table for a state, if one exists.
    ///
    /// Arts tables carry run-specific thresholds in their names, so the
    /// lexicographically first match wins.
    #[must_use]
    pub fn results_file(&self, service: Service, state: &StateRef) -> Option<PathBuf> {
        let dir = self.results_dir(service);
        match service {
            Service::Hospitals => {
                let path = dir.join(format!(
                    "{}_{}_result_dist_16093_32187_reduced.csv",
                    state.abbr, state.fips
                ));
                path.is_file().then_some(path)
            }
            Service::Arts => {
                let prefix = format!("{}_{}_result_dist_", state.abbr, state.fips);
                let mut matches: Vec<PathBuf> = list_file_names(&dir)
                    .into_iter()
                    .filter(|name| name.starts_with(&prefix) && name.ends_with("_reduced.csv"))
                    .map(|name| dir.join(name))
                    .collect();
                matches.sort();
                matches.into_iter().next()
            }
        }
    }

    /// Directory holding per-rate coverage tables.
    #[must_use]
    pub fn coverage_dir(&self, service: Service) -> PathBuf {
        self.results_dir(service).join("coverages")
    }

    /// Expected coverage table path for one rate.
    #[must_use]
    pub fn coverage_file(&self, service: Service, state: &StateRef, rate: u8) -> PathBuf {
        self.coverage_dir(service).join(format!(
            "{}_{}_coverage_mindist_numfacility_{rate}perc.csv",
            state.abbr, state.fips
        ))
    }

    /// Rates with a coverage table on disk for this state, ascending.
    #[must_use]
    pub fn coverage_rates(&self, service: Service, state: &StateRef) -> Vec<u8> {
        let mut rates: Vec<u8> = list_file_names(&self.coverage_dir(service))
            .iter()
            .filter_map(|name| {
                let caps = COVERAGE_FILE_RE.captures(name)?;
                if &caps[1] != state.abbr || &caps[2] != state.fips {
                    return None;
                }
                caps[3].parse::<u8>().ok()
            })
            .collect();
        rates.sort_unstable();
        rates.dedup();
        rates
    }

    /// National block-group boundary store.
    #[must_use]
    pub fn boundaries_file(&self) -> PathBuf {
        self.census.join(BOUNDARIES_FILE)
    }

    /// Location table for one state.
    #[must_use]
    pub fn location_file(&self, kind: LocationKind, state_fips: &str) -> PathBuf {
        self.processed.join(format!(
            "{}_gdf_meters_clipped_{state_fips}.csv",
            kind.file_prefix()
        ))
    }
}

impl Default for DataPaths {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// File names directly under `dir`; empty when it cannot be read.
pub(crate) fn list_file_names(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
        .filter_map(|e| e.file_name().into_string().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use school_share_geography_models::fips::resolve_state;

    use super::*;

    fn temp_paths(name: &str) -> DataPaths {
        let base = std::env::temp_dir().join(format!("school_share_paths_{name}"));
        let _ = std::fs::remove_dir_all(&base);
        DataPaths::from_base(base)
    }

    #[test]
    fn roots_derive_from_base() {
        let paths = DataPaths::from_base("/srv/dss");
        assert_eq!(paths.data, PathBuf::from("/srv/dss/data"));
        assert_eq!(paths.census, PathBuf::from("/srv/dss/data/census"));
        assert_eq!(paths.processed, PathBuf::from("/srv/dss/data/processed"));
        assert_eq!(
            paths.boundaries_file(),
            PathBuf::from("/srv/dss/data/census/cbg_shapes_2020.geojsonseq")
        );
    }

    #[test]
    fn file_names_follow_state_codes() {
        let paths = DataPaths::from_base("/srv/dss");
        let tx = resolve_state("Texas").unwrap();
        assert_eq!(
            paths.coverage_file(Service::Hospitals, &tx, 25),
            PathBuf::from(
                "/srv/dss/data/raw/result_hospital_250507/coverages/TX_48_coverage_mindist_numfacility_25perc.csv"
            )
        );
        assert_eq!(
            paths.location_file(LocationKind::Schools, "48"),
            PathBuf::from("/srv/dss/data/processed/HS_gdf_meters_clipped_48.csv")
        );
    }

    #[test]
    fn finds_arts_results_by_prefix() {
        let paths = temp_paths("arts_glob");
        let dir = paths.results_dir(Service::Arts);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("TX_48_result_dist_3553_9060_reduced.csv"), "x").unwrap();
        std::fs::write(dir.join("CA_06_result_dist_3553_9060_reduced.csv"), "x").unwrap();

        let tx = resolve_state("tx").unwrap();
        let found = paths.results_file(Service::Arts, &tx).unwrap();
        assert!(found.ends_with("TX_48_result_dist_3553_9060_reduced.csv"));

        let ny = resolve_state("New York").unwrap();
        assert!(paths.results_file(Service::Arts, &ny).is_none());
    }

    #[test]
    fn lists_coverage_rates_for_one_state() {
        let paths = temp_paths("coverage_rates");
        let dir = paths.coverage_dir(Service::Arts);
        std::fs::create_dir_all(&dir).unwrap();
        for name in [
            "TX_48_coverage_mindist_numfacility_50perc.csv",
            "TX_48_coverage_mindist_numfacility_25perc.csv",
            "CA_06_coverage_mindist_numfacility_10perc.csv",
            "TX_48_coverage_notes.txt",
        ] {
            std::fs::write(dir.join(name), "x").unwrap();
        }

        let tx = resolve_state("Texas").unwrap();
        assert_eq!(paths.coverage_rates(Service::Arts, &tx), vec![25, 50]);
    }
}
