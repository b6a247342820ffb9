//! Evaluation configuration

use crate::error::{Result, ValidatorError};
use crate::preprocessing::ScalerType;
use crate::utils::LoaderOptions;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for an evaluation campaign
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Minimum mean phi coefficient for a passing model
    pub accepted_phi: f64,

    /// Maximum standard deviation of AUC across runs
    pub accepted_deviation: f64,

    /// Number of train/test runs
    pub n_runs: usize,

    /// Fraction of the examples held out for testing on each run
    pub test_size: f64,

    /// Directory receiving plots, logs and stored models
    pub output_dir: PathBuf,

    /// Whether plots, log file and stored models are written at all
    pub write_files: bool,

    /// Feature scaling applied after loading
    pub scaler: ScalerType,

    /// Layout of the examples file
    pub loader: LoaderOptions,

    /// Training iterations for each network fit
    pub nn_iterations: usize,

    /// Random seed for splits, folds and weight initialization
    pub random_state: Option<u64>,

    /// Run identifier; a timestamp is used when absent
    pub run_id: Option<u64>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            accepted_phi: 0.7,
            accepted_deviation: 0.02,
            n_runs: 1,
            test_size: 0.2,
            output_dir: std::env::temp_dir().join("model-validator"),
            write_files: true,
            scaler: ScalerType::Robust,
            loader: LoaderOptions::default(),
            nn_iterations: 10_000,
            random_state: None,
            run_id: None,
        }
    }
}

impl EvaluationConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a JSON configuration; missing keys take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ValidatorError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Builder method to set the acceptance thresholds
    pub fn with_thresholds(mut self, accepted_phi: f64, accepted_deviation: f64) -> Self {
        self.accepted_phi = accepted_phi;
        self.accepted_deviation = accepted_deviation;
        self
    }

    /// Builder method to set the number of runs
    pub fn with_runs(mut self, n_runs: usize) -> Self {
        self.n_runs = n_runs;
        self
    }

    /// Builder method to set the output directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Builder method to enable or disable file output
    pub fn with_files(mut self, write_files: bool) -> Self {
        self.write_files = write_files;
        self
    }

    /// Builder method to set the scaler
    pub fn with_scaler(mut self, scaler: ScalerType) -> Self {
        self.scaler = scaler;
        self
    }

    /// Builder method to set the random seed
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Builder method to set the network iteration count
    pub fn with_nn_iterations(mut self, iterations: usize) -> Self {
        self.nn_iterations = iterations;
        self
    }

    /// Builder method to pin the run identifier
    pub fn with_run_id(mut self, run_id: u64) -> Self {
        self.run_id = Some(run_id);
        self
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.n_runs == 0 {
            return Err(invalid("n_runs", self.n_runs, "at least one run is required"));
        }
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(invalid("test_size", self.test_size, "must be within (0, 1)"));
        }
        if !self.accepted_phi.is_finite() {
            return Err(invalid("accepted_phi", self.accepted_phi, "must be finite"));
        }
        if !(self.accepted_deviation.is_finite() && self.accepted_deviation >= 0.0) {
            return Err(invalid(
                "accepted_deviation",
                self.accepted_deviation,
                "must be finite and non-negative",
            ));
        }
        if self.nn_iterations == 0 {
            return Err(invalid("nn_iterations", self.nn_iterations, "must be positive"));
        }
        Ok(())
    }

    /// Random generator for this campaign
    pub fn rng(&self) -> ChaCha8Rng {
        match self.random_state {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }

    /// Configured run id, or the current unix timestamp
    pub fn resolve_run_id(&self) -> u64 {
        self.run_id
            .unwrap_or_else(|| chrono::Utc::now().timestamp().max(0) as u64)
    }
}

fn invalid(name: &str, value: impl ToString, reason: &str) -> ValidatorError {
    ValidatorError::InvalidParameter {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EvaluationConfig::default();
        assert_eq!(config.accepted_phi, 0.7);
        assert_eq!(config.accepted_deviation, 0.02);
        assert_eq!(config.n_runs, 1);
        assert_eq!(config.scaler, ScalerType::Robust);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = EvaluationConfig::new()
            .with_thresholds(0.5, 0.1)
            .with_runs(4)
            .with_files(false)
            .with_random_state(42)
            .with_run_id(7);

        assert_eq!(config.accepted_phi, 0.5);
        assert_eq!(config.n_runs, 4);
        assert!(!config.write_files);
        assert_eq!(config.random_state, Some(42));
        assert_eq!(config.resolve_run_id(), 7);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(EvaluationConfig::new().with_runs(0).validate().is_err());
        assert!(EvaluationConfig::new().with_thresholds(0.7, -0.1).validate().is_err());

        let mut config = EvaluationConfig::new();
        config.test_size = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"accepted_phi": 0.4, "n_runs": 3, "scaler": "standard"}"#)
            .unwrap();

        let config = EvaluationConfig::from_json_file(&path).unwrap();
        assert_eq!(config.accepted_phi, 0.4);
        assert_eq!(config.n_runs, 3);
        assert_eq!(config.scaler, ScalerType::Standard);
        assert_eq!(config.accepted_deviation, 0.02);
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        use rand::Rng;
        let config = EvaluationConfig::new().with_random_state(5);
        let a: u64 = config.rng().gen();
        let b: u64 = config.rng().gen();
        assert_eq!(a, b);
    }
}
