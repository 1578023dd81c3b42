//! Optimization result ingestion.
//!
//! Turns a transposed result table into an [`OptimizationResult`],
//! dropping scenarios that are missing required rows, and falls back to a
//! fixed demo dataset when no table exists for the requested state.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use school_share_analysis_models::{
    ActivationPreview, Baseline, Metadata, Notice, NoticeKind, OptimizationResult, ScenarioResult,
    Service,
};
use school_share_geography_models::fips::{abbr_to_name, resolve_state};

use crate::literal::{is_blank_literal, parse_id_list, parse_pair_list};
use crate::paths::{DataPaths, list_file_names};
use crate::table::TransposedTable;

/// Column label of the existing-facilities scenario.
pub const BASELINE_COLUMN: &str = "existing";

/// Row labels used by the optimizer's result tables.
pub mod rows {
    /// Number of block groups.
    pub const REGION_COUNT: &str = "|I|";
    /// Number of candidate schools.
    pub const SCHOOL_COUNT: &str = "|J|";
    /// Number of existing facilities.
    pub const FACILITY_COUNT: &str = "|Q|";
    /// Primary distance threshold.
    pub const PRIMARY_THRESHOLD: &str = "delta1 threshold";
    /// Secondary distance threshold.
    pub const SECONDARY_THRESHOLD: &str = "delta2 threshold";
    /// Schools opened.
    pub const SCHOOLS_ACTIVATED: &str = "num facility to open";
    /// Primary coverage count.
    pub const PRIMARY_COVERAGE: &str = "Primary coverage";
    /// Secondary coverage count.
    pub const SECONDARY_COVERAGE: &str = "Secondary coverage";
    /// Mean distance.
    pub const MEAN_DISTANCE: &str = "Customer Avg dist to fac";
    /// Max distance.
    pub const MAX_DISTANCE: &str = "Customer Max dist to fac";
    /// Min distance.
    pub const MIN_DISTANCE: &str = "Customer Min dist to fac";
    /// Non-white share.
    pub const NONWHITE: &str = "Nonwhite % (secondary cover)";
    /// Non-bachelor's share.
    pub const NONBACHELOR: &str = "NonBach % (secondary cover)";
    /// Solver time.
    pub const COMPUTATION_TIME: &str = "Total Time (sec)";
    /// Activated school list literal.
    pub const ACTIVATED_SCHOOLS: &str = "open facility NCESSCH";
    /// Facility-school pairing list literal.
    pub const PAIRINGS: &str = "facility-school pairs";
}

/// Scenario columns look like `p=25%`.
static SCENARIO_COLUMN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^p\s*=\s*(\d+)\s*%?$").unwrap_or_else(|_| unreachable!())
});

/// Largest gap, in percentage points, tolerated between a scenario's
/// column rate and the share of schools it actually activated.
const RATE_MISMATCH_TOLERANCE: f64 = 1.0;

/// Illustrative states offered when no result directory exists.
pub const DEMO_STATES: &[&str] = &["California", "New York", "Texas"];

/// Parses a transposed result table.
///
/// Never fails: unparseable scenarios are dropped and recorded as
/// [`NoticeKind::MalformedRow`] notices, unreadable list cells become
/// empty lists with [`NoticeKind::UnsafeLiteral`] notices.
#[must_use]
pub fn parse_result_table(table: &TransposedTable, state: &str, service: Service) -> OptimizationResult {
    let mut notices = Vec::new();

    let scenario_columns: Vec<(u8, &str)> = table
        .columns()
        .iter()
        .filter_map(|col| {
            let caps = SCENARIO_COLUMN_RE.captures(col)?;
            match caps[1].parse::<u8>() {
                Ok(rate) if rate <= 100 => Some((rate, col.as_str())),
                _ => {
                    push_notice(
                        &mut notices,
                        NoticeKind::MalformedRow,
                        format!("Ignoring scenario column '{col}': rate is not a percentage"),
                    );
                    None
                }
            }
        })
        .collect();

    let metadata = scenario_columns
        .first()
        .map(|(_, col)| read_metadata(table, col, &mut notices))
        .unwrap_or_default();
    let baseline = read_baseline(table, &mut notices);

    let mut scenarios = BTreeMap::new();
    for (rate, col) in scenario_columns {
        if scenarios.contains_key(&rate) {
            push_notice(
                &mut notices,
                NoticeKind::MalformedRow,
                format!("Duplicate scenario column '{col}' ignored"),
            );
            continue;
        }

        match read_scenario(table, col, &mut notices) {
            Ok(scenario) => {
                check_rate(rate, &scenario, metadata.school_count, &mut notices);
                scenarios.insert(rate, scenario);
            }
            Err(row) => push_notice(
                &mut notices,
                NoticeKind::MalformedRow,
                format!("Dropped scenario '{col}': row '{row}' is missing or not numeric"),
            ),
        }
    }

    log::info!(
        "Parsed {} scenarios for {state} / {service} ({} notices)",
        scenarios.len(),
        notices.len()
    );

    OptimizationResult {
        state: state.to_string(),
        service,
        is_synthetic: false,
        metadata,
        baseline,
        scenarios,
        notices,
    }
}

fn read_metadata(table: &TransposedTable, col: &str, notices: &mut Vec<Notice>) -> Metadata {
    let mut count = |row: &str| {
        table.number(row, col).and_then(to_count).unwrap_or_else(|| {
            missing_value(notices, row, col);
            0
        })
    };
    let region_count = count(rows::REGION_COUNT);
    let school_count = count(rows::SCHOOL_COUNT);
    let facility_count = count(rows::FACILITY_COUNT);

    let mut distance = |row: &str| {
        table.number(row, col).unwrap_or_else(|| {
            missing_value(notices, row, col);
            0.0
        })
    };
    let primary_threshold_m = distance(rows::PRIMARY_THRESHOLD);
    let secondary_threshold_m = distance(rows::SECONDARY_THRESHOLD);

    Metadata {
        region_count,
        school_count,
        facility_count,
        primary_threshold_m,
        secondary_threshold_m,
    }
}

fn read_baseline(table: &TransposedTable, notices: &mut Vec<Notice>) -> Baseline {
    let mut value = |row: &str| {
        table.number(row, BASELINE_COLUMN).unwrap_or_else(|| {
            missing_value(notices, row, BASELINE_COLUMN);
            0.0
        })
    };

    Baseline {
        primary_coverage_count: value(rows::PRIMARY_COVERAGE),
        secondary_coverage_count: value(rows::SECONDARY_COVERAGE),
        mean_distance_m: value(rows::MEAN_DISTANCE),
        max_distance_m: value(rows::MAX_DISTANCE),
    }
}

/// Reads one scenario column. On failure returns the first offending row.
fn read_scenario(
    table: &TransposedTable,
    col: &str,
    notices: &mut Vec<Notice>,
) -> Result<ScenarioResult, &'static str> {
    let num = |row: &'static str| table.number(row, col).ok_or(row);

    let schools_activated_count = num(rows::SCHOOLS_ACTIVATED)
        .map(to_count)?
        .ok_or(rows::SCHOOLS_ACTIVATED)?;

    let mut scenario = ScenarioResult {
        schools_activated_count,
        primary_coverage_count: num(rows::PRIMARY_COVERAGE)?,
        secondary_coverage_count: num(rows::SECONDARY_COVERAGE)?,
        mean_distance_m: num(rows::MEAN_DISTANCE)?,
        max_distance_m: num(rows::MAX_DISTANCE)?,
        min_distance_m: num(rows::MIN_DISTANCE)?,
        nonwhite_fraction: num(rows::NONWHITE)?,
        nonbachelor_fraction: num(rows::NONBACHELOR)?,
        computation_seconds: num(rows::COMPUTATION_TIME)?,
        activated_school_ids: Vec::new(),
        facility_school_pairings: Vec::new(),
    };

    if let Some(raw) = table.cell(rows::ACTIVATED_SCHOOLS, col)
        && !is_blank_literal(raw)
    {
        match parse_id_list(raw) {
            Ok(ids) => scenario.activated_school_ids = ids,
            Err(e) => push_notice(
                notices,
                NoticeKind::UnsafeLiteral,
                format!("Activated schools for '{col}' unreadable ({e}); using an empty list"),
            ),
        }
    }

    if let Some(raw) = table.cell(rows::PAIRINGS, col)
        && !is_blank_literal(raw)
    {
        match parse_pair_list(raw) {
            Ok(pairs) => scenario.facility_school_pairings = pairs,
            Err(e) => push_notice(
                notices,
                NoticeKind::UnsafeLiteral,
                format!("Pairings for '{col}' unreadable ({e}); using an empty list"),
            ),
        }
    }

    Ok(scenario)
}

fn check_rate(
    rate: u8,
    scenario: &ScenarioResult,
    school_count: u64,
    notices: &mut Vec<Notice>,
) {
    if let Some(actual) = scenario.activated_percent(school_count)
        && (actual - f64::from(rate)).abs() > RATE_MISMATCH_TOLERANCE
    {
        push_notice(
            notices,
            NoticeKind::RateMismatch,
            format!(
                "Scenario p={rate}% activated {} of {school_count} schools ({actual:.1}%)",
                scenario.schools_activated_count
            ),
        );
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_count(value: f64) -> Option<u64> {
    (value >= 0.0).then(|| value.trunc() as u64)
}

fn missing_value(notices: &mut Vec<Notice>, row: &str, col: &str) {
    push_notice(
        notices,
        NoticeKind::MalformedRow,
        format!("Row '{row}' missing or not numeric in column '{col}'; using 0"),
    );
}

fn push_notice(notices: &mut Vec<Notice>, kind: NoticeKind, message: String) {
    log::warn!("{message}");
    notices.push(Notice::new(kind, message));
}

/// Fixed illustrative result used when no table exists.
#[must_use]
pub fn demo_result(state: &str, service: Service) -> OptimizationResult {
    let arts = service == Service::Arts;
    let pick = |a: f64, h: f64| if arts { a } else { h };

    let scenario = ScenarioResult {
        schools_activated_count: 125,
        primary_coverage_count: 3250.0,
        secondary_coverage_count: 4200.0,
        mean_distance_m: pick(6500.0, 4500.0),
        max_distance_m: pick(150_000.0, 80_000.0),
        min_distance_m: 10.2,
        nonwhite_fraction: 0.35,
        nonbachelor_fraction: 0.65,
        computation_seconds: 1.5,
        activated_school_ids: Vec::new(),
        facility_school_pairings: Vec::new(),
    };

    OptimizationResult {
        state: state.to_string(),
        service,
        is_synthetic: true,
        metadata: Metadata {
            region_count: 5000,
            school_count: 500,
            facility_count: if arts { 250 } else { 150 },
            primary_threshold_m: pick(3553.0, 16093.0),
            secondary_threshold_m: pick(9060.0, 32187.0),
        },
        baseline: Baseline {
            primary_coverage_count: 2500.0,
            secondary_coverage_count: 3500.0,
            mean_distance_m: pick(9438.0, 6450.0),
            max_distance_m: pick(178_202.0, 95_000.0),
        },
        scenarios: BTreeMap::from([(25, scenario)]),
        notices: vec![Notice::new(
            NoticeKind::MissingFile,
            format!("No optimization results for {state} / {service}; showing demo data"),
        )],
    }
}

/// Loads the result for a state given by name or abbreviation.
///
/// Unknown states, missing tables, and unreadable tables all fall back to
/// [`demo_result`].
#[must_use]
pub fn load_result(paths: &DataPaths, state: &str, service: Service) -> OptimizationResult {
    let Some(state_ref) = resolve_state(state) else {
        log::warn!("Unknown state '{state}'; using demo data");
        return demo_result(state.trim(), service);
    };

    let Some(path) = paths.results_file(service, &state_ref) else {
        log::warn!(
            "No {service} results for {} in {}; using demo data",
            state_ref.name,
            paths.results_dir(service).display()
        );
        return demo_result(state_ref.name, service);
    };

    match TransposedTable::from_path(&path) {
        Ok(table) => {
            log::info!("Loading results from {}", path.display());
            parse_result_table(&table, state_ref.name, service)
        }
        Err(e) => {
            log::warn!("Failed to read {}: {e}; using demo data", path.display());
            let mut demo = demo_result(state_ref.name, service);
            demo.notices.push(Notice::new(
                NoticeKind::MissingFile,
                format!("Result table {} unreadable: {e}", path.display()),
            ));
            demo
        }
    }
}

/// State names that have a result table for `service`, sorted.
///
/// Returns [`DEMO_STATES`] when the result directory does not exist.
#[must_use]
pub fn available_states(paths: &DataPaths, service: Service) -> Vec<String> {
    let dir = paths.results_dir(service);
    if !dir.is_dir() {
        return DEMO_STATES.iter().map(ToString::to_string).collect();
    }

    let mut states: Vec<String> = list_file_names(&dir)
        .iter()
        .filter(|name| name.contains("_result_dist_") && name.ends_with("_reduced.csv"))
        .filter_map(|name| name.split('_').next())
        .map(|abbr| abbr_to_name(abbr).map_or_else(|| abbr.to_string(), ToString::to_string))
        .collect();
    states.sort();
    states.dedup();
    states
}

/// How many schools `rate` percent would activate.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn activation_preview(metadata: &Metadata, rate: u8) -> ActivationPreview {
    let max_activatable = (metadata.school_count / 2).min(metadata.facility_count);
    let requested = (metadata.school_count as f64 * f64::from(rate) / 100.0).floor() as u64;
    ActivationPreview {
        max_activatable,
        activated: requested.min(max_activatable),
    }
}
