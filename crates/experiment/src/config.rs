//! Configuration loading for experiments.
//!
//! An experiment is described by a TOML file: how many runs, which market,
//! how the environment presents offers, and the agent population.

use std::path::Path;

use market_core::{
    AgentSpec, EnvironmentConfig, HouseGenerator, PolicyConfig, PresentationMode, SimError,
    SimResult, TieBreak,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default experiment file path
pub const DEFAULT_EXPERIMENT_PATH: &str = "experiment.toml";

/// Complete experiment configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Run count and seeding
    #[serde(default)]
    pub experiment: GeneralConfig,
    /// Offer presentation settings
    #[serde(default)]
    pub environment: EnvironmentSettings,
    /// House generator used for every run
    #[serde(default = "default_houses")]
    pub houses: HouseGenerator,
    /// Agent population, in priority order
    #[serde(default = "default_agents")]
    pub agents: Vec<AgentEntry>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            experiment: GeneralConfig::default(),
            environment: EnvironmentSettings::default(),
            houses: default_houses(),
            agents: default_agents(),
        }
    }
}

impl ExperimentConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Serializes the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check everything that can be checked before the first run.
    pub fn validate(&self) -> SimResult<()> {
        if self.experiment.num_experiments == 0 {
            return Err(SimError::invalid("num_experiments must be positive"));
        }
        if self.agents.is_empty() {
            return Err(SimError::invalid("experiment has no agents"));
        }
        self.houses.validate()?;
        self.agent_specs().map(|_| ())
    }

    /// Build the agent specifications, one shared policy per entry.
    pub fn agent_specs(&self) -> SimResult<Vec<AgentSpec>> {
        self.agents
            .iter()
            .map(|entry| {
                if entry.number == 0 {
                    return Err(SimError::invalid(format!(
                        "agent entry '{}' must have a positive number of agents",
                        entry.name
                    )));
                }
                AgentSpec::from_config(entry.name.clone(), &entry.policy, entry.number)
            })
            .collect()
    }

    /// Total agents per run
    pub fn population_size(&self) -> usize {
        self.agents.iter().map(|a| a.number).sum()
    }
}

/// Run count and seeding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Number of independent runs
    pub num_experiments: usize,
    /// Run `i` uses seed `seed + i` for both houses and environment
    pub seed: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            num_experiments: 100,
            seed: 42,
        }
    }
}

/// Environment settings shared by every run; the seed is set per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EnvironmentSettings {
    pub mode: PresentationMode,
    pub tie_break: TieBreak,
    pub record_events: bool,
}

impl EnvironmentSettings {
    pub fn for_seed(&self, seed: u64) -> EnvironmentConfig {
        EnvironmentConfig {
            mode: self.mode,
            tie_break: self.tie_break,
            seed,
            record_events: self.record_events,
        }
    }
}

/// One entry of the agent population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentEntry {
    pub name: String,
    pub policy: PolicyConfig,
    pub number: usize,
}

impl AgentEntry {
    pub fn new(name: impl Into<String>, policy: PolicyConfig, number: usize) -> Self {
        Self {
            name: name.into(),
            policy,
            number,
        }
    }
}

fn default_houses() -> HouseGenerator {
    HouseGenerator::uniform(100)
}

fn default_agents() -> Vec<AgentEntry> {
    vec![
        AgentEntry::new("Greedy", PolicyConfig::Greedy, 10),
        AgentEntry::new(
            "Threshold_6",
            PolicyConfig::Threshold {
                threshold: 6.0,
                quality_range: None,
                settle_on_final_offer: false,
            },
            10,
        ),
        AgentEntry::new(
            "Threshold_8",
            PolicyConfig::Threshold {
                threshold: 8.0,
                quality_range: None,
                settle_on_final_offer: false,
            },
            10,
        ),
        AgentEntry::new(
            "Optimal_Stopping",
            PolicyConfig::OptimalStopping {
                exploration_fraction: 0.1,
                basis: Default::default(),
                settle_on_final_offer: false,
            },
            10,
        ),
    ]
}

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Error parsing TOML config
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    /// Error writing TOML config
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Generates a default configuration file content.
pub fn default_config_toml() -> String {
    r#"# Experiment Configuration

[experiment]
num_experiments = 100
seed = 42

[environment]
# shared_market: every active agent sees the same house each round
# private_stream: agents are paired with random distinct houses each round
mode = { kind = "shared_market" }
# mode = { kind = "private_stream", max_rounds = 30 }
tie_break = "lowest_index"
record_events = false

[houses]
distribution = "uniform"
n_houses = 100
min_quality = 1.0
max_quality = 10.0

[[agents]]
name = "Greedy"
number = 10
policy = { kind = "greedy" }

[[agents]]
name = "Threshold_6"
number = 10
policy = { kind = "threshold", threshold = 6.0 }

[[agents]]
name = "Threshold_8"
number = 10
policy = { kind = "threshold", threshold = 8.0 }

[[agents]]
name = "Optimal_Stopping"
number = 10
policy = { kind = "optimal_stopping", exploration_fraction = 0.1, basis = "offer_stream" }
"#
    .to_string()
}
