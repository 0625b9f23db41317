//! Configuration types for an elite search run.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_poll_interval_ms() -> u64 {
    10
}

/// Top-level run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Identifier of the problem in the problem registry.
    pub problem: String,
    /// Number of initial designs, and therefore of concurrent workers.
    pub population_size: usize,
    /// Capacity of the elite archive.
    pub elite_size: usize,
    /// Per-bit probability of taking the elite parent's bit.
    pub crossover_rate: f64,
    /// Per-bit flip probability.
    pub mutation_rate: f64,
    /// Total number of evaluations before termination.
    pub evaluation_budget: u64,
    /// Master seed. Worker RNGs are derived from it.
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Fixed backoff between polling attempts, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Previously persisted archive used to seed the initial population.
    #[serde(default)]
    pub resume_from: Option<PathBuf>,
    /// Output artifact locations.
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            problem: "one-max".to_string(),
            population_size: 16,
            elite_size: 8,
            crossover_rate: 0.5,
            mutation_rate: 0.01,
            evaluation_budget: 10_000,
            random_seed: None,
            poll_interval_ms: default_poll_interval_ms(),
            resume_from: None,
            output: OutputConfig::default(),
        }
    }
}

/// Where the collector writes its artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Ranked fitness values, one per line.
    pub results_path: PathBuf,
    /// Reloadable JSON copy of the final archive.
    pub archive_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_path: PathBuf::from("results.txt"),
            archive_path: PathBuf::from("designs.json"),
        }
    }
}

impl RunConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size < 1 {
            return Err(ConfigError::PopulationTooSmall);
        }
        if self.elite_size < 1 {
            return Err(ConfigError::EliteTooSmall);
        }
        check_rate("crossover", self.crossover_rate)?;
        check_rate("mutation", self.mutation_rate)?;
        if self.evaluation_budget < self.elite_size as u64 {
            return Err(ConfigError::BudgetBelowElite {
                budget: self.evaluation_budget,
                elite: self.elite_size,
            });
        }
        Ok(())
    }
}

fn check_rate(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidRate { name, value })
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("The population size must be greater than or equal to 1")]
    PopulationTooSmall,
    #[error("The size of the elite group must be greater than or equal to 1")]
    EliteTooSmall,
    #[error("The {name} rate must be on the range [0,1], got {value}")]
    InvalidRate { name: &'static str, value: f64 },
    #[error("The evaluation budget ({budget}) must be at least the elite size ({elite})")]
    BudgetBelowElite { budget: u64, elite: usize },
    #[error("Unknown problem '{0}'")]
    UnknownProblem(String),
    #[error("Design vector length {found} does not match the run's length {expected}")]
    DesignLengthMismatch { expected: usize, found: usize },
    #[error("Design vectors must not be empty")]
    EmptyDesignVector,
}
