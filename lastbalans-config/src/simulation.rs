//! Simulation parameters: horizon, routing distribution, per-server
//! queueing capacity and service rates.

use std::path::Path;

use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation;
use crate::ConfigError;

/// Parameters for one simulation run.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
#[validate(schema(function = validation::validate_shape))]
pub struct SimulationConfig {
    /// Simulation horizon in time units; the generator stops once the
    /// clock reaches it.
    #[validate(range(min = 0.0))]
    pub horizon: f64,

    /// Number of servers behind the dispatcher.
    #[validate(range(min = 1))]
    pub servers: usize,

    /// Server-selection distribution; one entry per server, summing to 1.
    pub probabilities: Vec<f64>,

    /// Rate (lambda) of the Poisson arrival process.
    #[validate(range(exclusive_min = 0.0))]
    pub arrival_rate: f64,

    /// Waiting-room slots per server; admitted capacity is the value + 1.
    pub queue_sizes: Vec<u64>,

    /// Per-server exponential service rates; mean service time is 1/rate.
    pub service_rates: Vec<f64>,

    /// Seed for the kernel's randomness source.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_seed() -> u64 {
    42
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            horizon: 100.0,
            servers: 1,
            probabilities: vec![1.0],
            arrival_rate: 1.0,
            queue_sizes: vec![0],
            service_rates: vec![1.0],
            seed: default_seed(),
        }
    }
}

impl SimulationConfig {
    /// Load from a YAML file merged with `LASTBALANS_*` environment
    /// overrides.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("LASTBALANS_"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(Self::validated)
    }

    /// Parse from a YAML string; used by tests and embedding callers.
    pub fn load_from_str(yaml: &str) -> Result<Self, ConfigError> {
        Figment::new()
            .merge(Yaml::string(yaml))
            .extract()
            .map_err(ConfigError::from)
            .and_then(Self::validated)
    }

    /// Runs full validation, returning the configuration on success.
    pub fn validated(self) -> Result<Self, ConfigError> {
        self.validate()?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        SimulationConfig::default()
            .validated()
            .expect("default config should validate");
    }

    #[test]
    fn yaml_round_trip() {
        let config = SimulationConfig::load_from_str(
            r#"
            horizon: 50.0
            servers: 2
            probabilities: [0.25, 0.75]
            arrival_rate: 3.0
            queue_sizes: [1, 4]
            service_rates: [2.0, 2.5]
            "#,
        )
        .unwrap();

        assert_eq!(config.servers, 2);
        assert_eq!(config.probabilities, vec![0.25, 0.75]);
        // Seed falls back to the serde default.
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn probability_mass_must_sum_to_one() {
        let result = SimulationConfig {
            probabilities: vec![0.6],
            ..Default::default()
        }
        .validated();
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn sequence_lengths_must_match_server_count() {
        let result = SimulationConfig {
            servers: 2,
            probabilities: vec![0.5, 0.5],
            queue_sizes: vec![1],
            service_rates: vec![1.0, 1.0],
            ..Default::default()
        }
        .validated();
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn service_rates_must_be_positive() {
        let result = SimulationConfig {
            service_rates: vec![0.0],
            ..Default::default()
        }
        .validated();
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn negative_horizon_is_rejected() {
        let result = SimulationConfig {
            horizon: -1.0,
            ..Default::default()
        }
        .validated();
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn missing_file_is_reported() {
        let result = SimulationConfig::load_from_path("does/not/exist.yaml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }
}
