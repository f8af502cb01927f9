//! Benchmark construction parameters

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Rows in a synthetic training pool
pub const NUM_DATA: usize = 120;
/// Cross-validation folds, for every dataset kind
pub const CV_FOLDS: usize = 10;
/// Scalars in the synthetic test grid before reshaping to `(size / D) × D`
pub const SYNTHETIC_TEST_SIZE: usize = 60000;
/// Seed of the real-world train/test split, independent of `random_state`
pub const SPLIT_SEED: u64 = 42;

/// Configuration of one benchmark problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Regressor family: `decision_tree`, `decision_tree_depth`, `mlp` or `any`
    pub regressor: String,

    /// Feature count of a synthetic dataset; must be absent for real-world data
    #[serde(default)]
    pub data_dimension: Option<usize>,

    #[serde(default = "default_dataset")]
    pub dataset: String,

    /// Report the cross-validated error instead of the held-out one
    #[serde(default)]
    pub overfitter: bool,

    /// Seed of the benchmark random source, entropy when absent
    #[serde(default)]
    pub random_state: Option<u64>,

    /// Directory holding `<dataset>.csv` for real-world datasets
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Label the synthetic training pool with the selected target function
    #[serde(default)]
    pub consistent_training_labels: bool,
}

fn default_dataset() -> String {
    "artificial".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl BenchmarkConfig {
    pub fn new(regressor: impl Into<String>) -> Self {
        Self {
            regressor: regressor.into(),
            data_dimension: None,
            dataset: default_dataset(),
            overfitter: false,
            random_state: None,
            data_dir: default_data_dir(),
            consistent_training_labels: false,
        }
    }

    pub fn with_data_dimension(mut self, dimension: usize) -> Self {
        self.data_dimension = Some(dimension);
        self
    }

    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = dataset.into();
        self
    }

    pub fn with_overfitter(mut self, overfitter: bool) -> Self {
        self.overfitter = overfitter;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_consistent_training_labels(mut self, consistent: bool) -> Self {
        self.consistent_training_labels = consistent;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = BenchmarkConfig::new("mlp")
            .with_data_dimension(3)
            .with_overfitter(true)
            .with_random_state(7);

        assert_eq!(config.regressor, "mlp");
        assert_eq!(config.data_dimension, Some(3));
        assert_eq!(config.dataset, "artificial");
        assert!(config.overfitter);
        assert_eq!(config.random_state, Some(7));
        assert!(!config.consistent_training_labels);
    }

    #[test]
    fn test_json_defaults() {
        let config =
            BenchmarkConfig::from_json_str(r#"{"regressor": "decision_tree", "dataset": "boston"}"#)
                .unwrap();
        assert_eq!(config.dataset, "boston");
        assert_eq!(config.data_dimension, None);
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert!(!config.overfitter);
    }

    #[test]
    fn test_json_requires_regressor() {
        assert!(BenchmarkConfig::from_json_str(r#"{"dataset": "boston"}"#).is_err());
    }

    #[test]
    fn test_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bench.json");
        std::fs::write(&path, r#"{"regressor": "mlp", "data_dimension": 2}"#).unwrap();

        let config = BenchmarkConfig::from_json_file(&path).unwrap();
        assert_eq!(config, BenchmarkConfig::new("mlp").with_data_dimension(2));
    }
}
