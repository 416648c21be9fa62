//! CLI commands

pub mod cache;
pub mod context;
pub mod diff;
pub mod style;
pub mod submit;

use async_trait::async_trait;
use indicatif::ProgressBar;
use lapo::progress::{Phase, ProgressCallback};
use lapo::stage::StageState;
use std::time::Duration;
use style::{check, spinner_style};

/// Spinner-based progress on stderr
pub struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    /// Start a spinner; hidden when `quiet`
    pub fn new(quiet: bool) -> Self {
        let spinner = if quiet {
            ProgressBar::hidden()
        } else {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(spinner_style());
            spinner.enable_steady_tick(Duration::from_millis(80));
            spinner
        };
        Self { spinner }
    }

    /// Remove the spinner line
    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

#[async_trait]
impl ProgressCallback for CliProgress {
    async fn on_phase(&self, phase: Phase) {
        self.spinner.set_message(format!("{phase}..."));
    }

    async fn on_stage(&self, state: StageState) {
        self.spinner.println(format!("{} {state}", check()));
    }

    async fn on_message(&self, message: &str) {
        self.spinner.set_message(message.to_string());
    }
}
