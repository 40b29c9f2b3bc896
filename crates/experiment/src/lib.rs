//! Experiment harness for the housing market.
//!
//! Reads an experiment description from TOML, runs many independently seeded
//! markets through `market-core`, and aggregates the outcomes.
//!
//! # Modules
//!
//! - [`config`]: Experiment configuration and its TOML form
//! - [`runner`]: Seeded batch execution
//! - [`summary`]: Per-run metrics and per-entry policy statistics
//! - [`report`]: Text report for the command line

pub mod config;
pub mod report;
pub mod runner;
pub mod summary;

pub use config::{
    default_config_toml, AgentEntry, ConfigError, EnvironmentSettings, ExperimentConfig,
    GeneralConfig, DEFAULT_EXPERIMENT_PATH,
};
pub use report::render_summary;
pub use runner::{run_experiments, ExperimentRunner};
pub use summary::{ExperimentSummary, PolicyStats, SeriesStats};

use std::path::Path;

use market_core::SimError;
use thiserror::Error;

/// Errors surfaced by the experiment harness.
#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("simulation error: {0}")]
    Simulation(#[from] SimError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Load `path` and run the experiment it describes.
pub fn run_experiment_file(path: &Path) -> Result<ExperimentSummary, ExperimentError> {
    let config = ExperimentConfig::from_file(path)?;
    Ok(run_experiments(&config)?)
}
