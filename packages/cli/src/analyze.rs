//! The `analyze` subcommand: one state, service, and rate in; map,
//! metrics, and CSV exports out.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use school_share_analysis::export::{ExportKind, export_file_name, write_pairings, write_roster};
use school_share_analysis::results::activation_preview;
use school_share_analysis::{Dss, DssError, collect_notices};
use school_share_analysis_models::{
    ActivationPreview, CoverageSet, CoverageSummary, Metrics, Notice, Service, ViewMode,
};
use school_share_cli_utils::{MultiProgress, StepProgress};
use school_share_geography_models::fips::resolve_state;
use school_share_map::{MapLayer, MapRequest, render_map};
use serde::Serialize;
use thiserror::Error;

/// Name of the map output.
pub const MAP_FILE: &str = "map.geojson";
/// Name of the metrics output.
pub const METRICS_FILE: &str = "metrics.json";

/// Errors that stop an analysis run. Data problems never do; only failing
/// to write the outputs does.
#[derive(Debug, Error)]
pub enum CliError {
    /// Creating or writing an output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing an output failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing a CSV export failed.
    #[error(transparent)]
    Export(#[from] DssError),
}

/// Settings for one run.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub state: String,
    pub service: Service,
    pub rate: u8,
    pub view: ViewMode,
    pub fast: bool,
    pub show_facilities: bool,
    pub show_schools: bool,
    pub pairing_lines: bool,
    pub out: PathBuf,
}

/// Contents of `metrics.json`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<'a> {
    state: &'a str,
    service: Service,
    is_synthetic: bool,
    metrics: Option<&'a Metrics>,
    activation: ActivationPreview,
    coverage: Option<CoverageSummary>,
    notices: &'a [Notice],
}

/// What a run produced.
#[derive(Debug)]
pub struct Summary {
    pub metrics: Option<Metrics>,
    pub files: Vec<PathBuf>,
    pub notices: Vec<Notice>,
    pub marker_only: bool,
}

/// Runs one analysis and writes every output under `opts.out`.
///
/// # Errors
///
/// Returns an error only if an output cannot be written.
pub fn run(dss: &Dss, opts: &AnalyzeOptions, multi: &MultiProgress) -> Result<Summary, CliError> {
    let progress = StepProgress::new(multi, "Analyzing", 5);

    progress.start("Loading optimization results");
    let result = dss.get_result(&opts.state, opts.service);
    let metrics = dss.get_metrics(&result, opts.rate);
    let rate_used = metrics.as_ref().map_or(opts.rate, |m| m.activation_rate);
    progress.complete();

    progress.start("Loading coverage");
    let coverage = dss.get_coverage(&opts.state, opts.service, rate_used);
    progress.complete();

    progress.start("Rendering map");
    let mut request = MapRequest::for_scenario(&result, opts.rate).with_view_mode(opts.view);
    request.fast = opts.fast;
    request.show_facilities = opts.show_facilities;
    request.show_schools = opts.show_schools;
    request.show_pairing_lines = opts.pairing_lines;
    let layer = render_map(dss, &request);
    progress.complete();

    std::fs::create_dir_all(&opts.out)?;
    let mut files = Vec::new();

    progress.start("Writing map and metrics");
    files.push(write_map(&opts.out, &layer)?);

    let mut notices = collect_notices(&result, None);
    for notice in &layer.notices {
        if !notices.contains(notice) {
            notices.push(notice.clone());
        }
    }

    let report = Report {
        state: &result.state,
        service: result.service,
        is_synthetic: result.is_synthetic,
        metrics: metrics.as_ref(),
        activation: activation_preview(&result.metadata, rate_used),
        coverage: coverage.as_deref().map(CoverageSet::summary),
        notices: &notices,
    };
    let path = opts.out.join(METRICS_FILE);
    serde_json::to_writer_pretty(BufWriter::new(File::create(&path)?), &report)?;
    files.push(path);
    progress.complete();

    progress.start("Writing exports");
    files.extend(write_exports(dss, opts, &request)?);
    progress.complete();
    progress.finish("Analysis complete");

    Ok(Summary {
        metrics,
        files,
        notices,
        marker_only: layer.is_marker_only(),
    })
}

fn write_map(out: &Path, layer: &MapLayer) -> Result<PathBuf, CliError> {
    let path = out.join(MAP_FILE);
    serde_json::to_writer(BufWriter::new(File::create(&path)?), &layer.to_geojson())?;
    Ok(path)
}

fn write_exports(
    dss: &Dss,
    opts: &AnalyzeOptions,
    request: &MapRequest,
) -> Result<Vec<PathBuf>, CliError> {
    let state = resolve_state(&opts.state);
    let schools = state.and_then(|s| dss.schools(&s));
    let facilities = state.and_then(|s| dss.facilities(&s, opts.service));
    let state_name = state.map_or(opts.state.as_str(), |s| s.name);

    let pairings_path = opts.out.join(export_file_name(
        state_name,
        opts.service,
        ExportKind::Pairings,
        request.rate,
    ));
    write_pairings(
        BufWriter::new(File::create(&pairings_path)?),
        &request.pairings,
        facilities.as_deref(),
        schools.as_deref(),
    )?;

    let roster_path = opts.out.join(export_file_name(
        state_name,
        opts.service,
        ExportKind::Schools,
        request.rate,
    ));
    write_roster(
        BufWriter::new(File::create(&roster_path)?),
        &request.activated_ids,
        schools.as_deref(),
        state_name,
        opts.service,
        request.rate,
    )?;

    Ok(vec![pairings_path, roster_path])
}

#[cfg(test)]
mod tests {
    use indicatif::ProgressDrawTarget;
    use school_share_analysis::paths::DataPaths;

    use super::*;

    fn hidden_multi() -> MultiProgress {
        MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
    }

    fn options(name: &str) -> (Dss, AnalyzeOptions) {
        let base = std::env::temp_dir().join(format!("school_share_cli_{name}"));
        let _ = std::fs::remove_dir_all(&base);
        let dss = Dss::new(DataPaths::from_base(base.join("data_root")));
        let opts = AnalyzeOptions {
            state: "Texas".to_string(),
            service: Service::Arts,
            rate: 30,
            view: ViewMode::Distance,
            fast: false,
            show_facilities: true,
            show_schools: true,
            pairing_lines: false,
            out: base.join("out"),
        };
        (dss, opts)
    }

    #[test]
    fn demo_run_writes_every_output() {
        let (dss, opts) = options("demo");
        let summary = run(&dss, &opts, &hidden_multi()).unwrap();

        assert!(summary.marker_only);
        assert_eq!(summary.metrics.as_ref().unwrap().activation_rate, 25);
        assert_eq!(summary.files.len(), 4);
        assert!(summary.files.iter().all(|f| f.is_file()));
        assert!(opts.out.join("texas_arts_facilities_pairings_25pct.csv").is_file());

        let metrics: serde_json::Value =
            serde_json::from_reader(File::open(opts.out.join(METRICS_FILE)).unwrap()).unwrap();
        assert_eq!(metrics["isSynthetic"], serde_json::json!(true));
        assert!(metrics["coverage"].is_null());
        assert!(!metrics["notices"].as_array().unwrap().is_empty());

        let map: serde_json::Value =
            serde_json::from_reader(File::open(opts.out.join(MAP_FILE)).unwrap()).unwrap();
        assert_eq!(map["type"], serde_json::json!("FeatureCollection"));
    }

    #[test]
    fn unknown_state_still_produces_outputs() {
        let (dss, mut opts) = options("unknown");
        opts.state = "Atlantis".to_string();
        let summary = run(&dss, &opts, &hidden_multi()).unwrap();
        assert!(summary.metrics.unwrap().is_synthetic);
        assert!(opts.out.join("atlantis_arts_facilities_schools_25pct.csv").is_file());
    }
}
