#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI for school-sharing scenario analysis.
//!
//! ```text
//! school_share states [--service arts]
//! school_share analyze --state Texas --service arts --rate 25 [--view status] [--out output]
//! ```
//!
//! Data roots come from `DSS_BASE_PATH`, `DSS_DATA_PATH`, `DSS_CENSUS_PATH`,
//! and `DSS_PROCESSED_PATH`. Uses `indicatif-log-bridge` (via
//! [`school_share_cli_utils::init_logger`]) so log lines and progress bars
//! share the terminal cleanly.

mod analyze;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use school_share_analysis::Dss;
use school_share_analysis::results::available_states;
use school_share_analysis_models::{Service, ServiceEstimate, ViewMode};

use crate::analyze::AnalyzeOptions;

#[derive(Parser)]
#[command(
    name = "school_share",
    about = "Analyze school-sharing scenarios for arts and hospital access"
)]
struct Cli {
    /// Recompute everything instead of using cached inputs
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List states with optimization results for a service
    States {
        /// Service type ("arts" or "hospitals")
        #[arg(long, default_value = "arts")]
        service: Service,
    },
    /// Render one scenario and write its map, metrics, and exports
    #[allow(clippy::struct_excessive_bools)]
    Analyze {
        /// State name or two-letter abbreviation
        #[arg(long)]
        state: String,
        /// Service type ("arts" or "hospitals")
        #[arg(long, default_value = "arts")]
        service: Service,
        /// Activation rate in percent; the nearest available rate is used
        #[arg(long, default_value = "25")]
        rate: u8,
        /// Choropleth view: distance, percent, or status
        #[arg(long, default_value = "distance")]
        view: ViewMode,
        /// Skip the choropleth and draw markers only
        #[arg(long)]
        fast: bool,
        /// Leave out existing facilities
        #[arg(long)]
        no_facilities: bool,
        /// Leave out activated schools
        #[arg(long)]
        no_schools: bool,
        /// Draw facility-to-school pairing lines
        #[arg(long)]
        pairing_lines: bool,
        /// Output directory
        #[arg(long, default_value = "output")]
        out: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = school_share_cli_utils::init_logger();
    let cli = Cli::parse();

    let dss = Dss::from_env();
    dss.set_cache_bypass(cli.no_cache);

    match cli.command {
        Commands::States { service } => {
            let spinner = school_share_cli_utils::spinner(&multi, "Scanning result tables");
            let states = available_states(dss.paths(), service);
            spinner.finish_and_clear();

            for state in &states {
                println!("{state}");
            }
            println!("\n{} state(s) with {service} results", states.len());
        }
        Commands::Analyze {
            state,
            service,
            rate,
            view,
            fast,
            no_facilities,
            no_schools,
            pairing_lines,
            out,
        } => {
            let opts = AnalyzeOptions {
                state,
                service,
                rate,
                view,
                fast,
                show_facilities: !no_facilities,
                show_schools: !no_schools,
                pairing_lines,
                out,
            };
            let summary = analyze::run(&dss, &opts, &multi)?;

            if let Some(m) = &summary.metrics {
                if m.is_synthetic {
                    log::warn!("No optimization results found; figures below are demo data");
                }
                log::info!(
                    "{} / {service} at {}% ({} schools): {:.2} km -> {:.2} km ({:.1}% shorter)",
                    opts.state,
                    m.activation_rate,
                    m.schools_activated,
                    m.mean_baseline_distance_km,
                    m.mean_optimized_distance_km,
                    m.distance_reduction_pct
                );
                log::info!(
                    "Population helped: {} ({:.1}%)",
                    m.population_helped,
                    m.population_helped_pct
                );
                match m.estimate {
                    ServiceEstimate::LivesSaved { lives } => {
                        log::info!("Estimated lives saved: {lives}");
                    }
                    ServiceEstimate::NewAccess { within_m, people } => {
                        log::info!(
                            "Estimated new access within {:.0} km: {people}",
                            within_m / 1000.0
                        );
                    }
                }
                log::info!("{}", m.disclaimer);
            } else {
                log::warn!("No scenarios available for {}", opts.state);
            }

            if summary.marker_only && !opts.fast {
                log::warn!("Map has no choropleth; see notices in metrics.json");
            }
            for notice in &summary.notices {
                log::debug!("{notice}");
            }
            for file in &summary.files {
                println!("{}", file.display());
            }
        }
    }

    Ok(())
}
