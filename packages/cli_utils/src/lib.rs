#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared CLI utilities for the school-sharing toolchain.
//!
//! [`init_logger`] sets up `indicatif-log-bridge` so that `log::info!` and
//! friends are suspended while progress bars redraw, and [`StepProgress`]
//! tracks the fixed sequence of stages an analysis run goes through.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

pub use indicatif::MultiProgress;

/// A bar over a known number of named steps.
pub struct StepProgress {
    bar: ProgressBar,
}

impl StepProgress {
    /// Adds a step bar with `total` steps to `multi`.
    #[must_use]
    pub fn new(multi: &MultiProgress, message: &str, total: u64) -> Self {
        let bar = multi.add(ProgressBar::new(total));
        bar.set_style(
            ProgressStyle::with_template(
                "{msg} {wide_bar:.green/dim} {pos}/{len} [{elapsed_precise}]",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
        );
        bar.set_message(message.to_string());
        Self { bar }
    }

    /// Labels the step now running.
    pub fn start(&self, step: &str) {
        self.bar.set_message(step.to_string());
    }

    /// Marks the current step done.
    pub fn complete(&self) {
        self.bar.inc(1);
    }

    /// Finishes the bar, leaving `msg` on screen.
    pub fn finish(&self, msg: &str) {
        self.bar.finish_with_message(msg.to_string());
    }
}

/// Adds a spinner for work of unknown length.
#[must_use]
pub fn spinner(multi: &MultiProgress, message: &str) -> ProgressBar {
    let bar = multi.add(ProgressBar::new_spinner());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message.to_string());
    bar
}

/// Initializes the global logger wrapped in `indicatif-log-bridge` so that
/// `log::info!` and friends are suspended while progress bars redraw.
///
/// Returns the [`MultiProgress`] that all progress bars must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    // Fails only if a logger is already installed.
    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok();

    log::set_max_level(level);

    multi
}

#[cfg(test)]
mod tests {
    use indicatif::ProgressDrawTarget;

    use super::*;

    #[test]
    fn steps_advance_to_total() {
        let multi = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
        let progress = StepProgress::new(&multi, "Analyzing", 2);
        progress.start("Loading results");
        progress.complete();
        progress.start("Rendering map");
        progress.complete();
        assert_eq!(progress.bar.position(), 2);
        progress.finish("Done");
        assert!(progress.bar.is_finished());
    }

    #[test]
    fn logger_can_be_initialized_twice() {
        let _ = init_logger();
        let _ = init_logger();
    }
}
