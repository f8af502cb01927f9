//! Dataset resolution
//!
//! Named datasets are either real-world tables read through a
//! [`DatasetSource`] or synthetic sets generated from a target function of an
//! evenly spaced grid.

mod loader;
mod provider;
pub mod synthetic;

pub use loader::{CsvDatasetSource, DatasetSource, InMemorySource};
pub use provider::DatasetProvider;
pub use synthetic::TargetFunction;

use crate::error::{MlTuningError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Feature matrix with one label per row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub features: Array2<f64>,
    pub labels: Array1<f64>,
}

impl Dataset {
    /// Build a dataset, checking `N == len(labels)` and `D >= 1`
    pub fn new(features: Array2<f64>, labels: Array1<f64>) -> Result<Self> {
        if features.nrows() != labels.len() {
            return Err(MlTuningError::ShapeError {
                expected: format!("{} labels", features.nrows()),
                actual: format!("{} labels", labels.len()),
            });
        }
        if features.ncols() == 0 {
            return Err(MlTuningError::DataError(
                "dataset must have at least one feature".to_string(),
            ));
        }
        Ok(Self { features, labels })
    }

    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// Rows at `indices`, in that order
    pub fn select_rows(&self, indices: &[usize]) -> Dataset {
        Dataset {
            features: self.features.select(Axis(0), indices),
            labels: self.labels.select(Axis(0), indices),
        }
    }
}

/// Datasets the benchmark knows by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetName {
    Diabetes,
    Boston,
    Artificial,
    #[serde(rename = "artificialcos")]
    ArtificialCos,
    #[serde(rename = "artificialsquare")]
    ArtificialSquare,
}

impl DatasetName {
    pub const ALL: [DatasetName; 5] = [
        DatasetName::Diabetes,
        DatasetName::Boston,
        DatasetName::Artificial,
        DatasetName::ArtificialCos,
        DatasetName::ArtificialSquare,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetName::Diabetes => "diabetes",
            DatasetName::Boston => "boston",
            DatasetName::Artificial => "artificial",
            DatasetName::ArtificialCos => "artificialcos",
            DatasetName::ArtificialSquare => "artificialsquare",
        }
    }

    /// Synthetic datasets are generated and require a dimension
    pub fn is_artificial(&self) -> bool {
        self.target_function().is_some()
    }

    /// Label function of a synthetic dataset
    pub fn target_function(&self) -> Option<TargetFunction> {
        match self {
            DatasetName::Artificial => Some(TargetFunction::Sin),
            DatasetName::ArtificialCos => Some(TargetFunction::Cos),
            DatasetName::ArtificialSquare => Some(TargetFunction::Square),
            DatasetName::Diabetes | DatasetName::Boston => None,
        }
    }

    /// Enforce `is_artificial() == dimension.is_some()`
    pub fn check_dimension(&self, dimension: Option<usize>) -> Result<()> {
        match (self.is_artificial(), dimension) {
            (true, None) => Err(MlTuningError::ConfigError(format!(
                "dataset '{}' is synthetic and requires a data dimension",
                self
            ))),
            (false, Some(d)) => Err(MlTuningError::ConfigError(format!(
                "dataset '{}' is real-world and does not accept a data dimension (got {})",
                self, d
            ))),
            (true, Some(0)) => Err(MlTuningError::ConfigError(
                "data dimension must be at least 1".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for DatasetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetName {
    type Err = MlTuningError;

    fn from_str(s: &str) -> Result<Self> {
        DatasetName::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| MlTuningError::ConfigError(format!("unknown dataset '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_dataset_shape_checks() {
        assert!(Dataset::new(array![[1.0], [2.0]], array![1.0]).is_err());
        assert!(Dataset::new(Array2::zeros((2, 0)), array![1.0, 2.0]).is_err());

        let ds = Dataset::new(array![[1.0, 2.0], [3.0, 4.0]], array![1.0, 2.0]).unwrap();
        assert_eq!(ds.n_samples(), 2);
        assert_eq!(ds.n_features(), 2);

        let picked = ds.select_rows(&[1]);
        assert_eq!(picked.features, array![[3.0, 4.0]]);
        assert_eq!(picked.labels, array![2.0]);
    }

    #[test]
    fn test_dataset_names() {
        for name in DatasetName::ALL {
            assert_eq!(name.as_str().parse::<DatasetName>().unwrap(), name);
        }
        assert!("iris".parse::<DatasetName>().unwrap_err().is_config_error());
        assert!(DatasetName::ArtificialSquare.is_artificial());
        assert!(!DatasetName::Diabetes.is_artificial());
    }

    #[test]
    fn test_dimension_must_match_dataset_kind() {
        assert!(DatasetName::Artificial.check_dimension(None).is_err());
        assert!(DatasetName::Diabetes.check_dimension(Some(3)).is_err());
        assert!(DatasetName::Artificial.check_dimension(Some(0)).is_err());
        assert!(DatasetName::Artificial.check_dimension(Some(2)).is_ok());
        assert!(DatasetName::Boston.check_dimension(None).is_ok());
    }

    #[test]
    fn test_serde_names() {
        let name: DatasetName = serde_json::from_str("\"artificialcos\"").unwrap();
        assert_eq!(name, DatasetName::ArtificialCos);
        assert_eq!(serde_json::to_string(&DatasetName::Diabetes).unwrap(), "\"diabetes\"");
    }
}
