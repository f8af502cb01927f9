//! Real-world dataset sources

use crate::data::{Dataset, DatasetName};
use crate::error::{MlTuningError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Fixed source of real-world tabular datasets
pub trait DatasetSource: Send + Sync {
    /// Load the dataset stored under `name`
    fn load(&self, name: DatasetName) -> Result<Dataset>;
}

/// Reads `<data_dir>/<name>.csv`: header row, numeric columns, label in the
/// column named `target` or, failing that, the last column.
#[derive(Debug, Clone)]
pub struct CsvDatasetSource {
    data_dir: PathBuf,
}

impl CsvDatasetSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn path_for(&self, name: DatasetName) -> PathBuf {
        self.data_dir.join(format!("{}.csv", name.as_str()))
    }

    /// Load a CSV file
    fn load_csv(path: &Path) -> Result<DataFrame> {
        let file = File::open(path).map_err(|e| {
            MlTuningError::DataError(format!("cannot open {}: {}", path.display(), e))
        })?;

        let reader = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(100))
            .into_reader_with_file_handle(file);

        reader
            .finish()
            .map_err(|e| MlTuningError::DataError(e.to_string()))
    }

    fn column_values(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
        let column = df
            .column(name)
            .map_err(|e| MlTuningError::DataError(e.to_string()))?;
        let as_f64 = column
            .cast(&DataType::Float64)
            .map_err(|e| MlTuningError::DataError(e.to_string()))?;
        let values = as_f64
            .f64()
            .map_err(|e| MlTuningError::DataError(e.to_string()))?
            .into_iter()
            .map(|v| {
                v.ok_or_else(|| {
                    MlTuningError::DataError(format!("missing value in column '{}'", name))
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        Ok(values)
    }

    /// Split a frame into a row-major feature matrix and the label column
    fn frame_to_dataset(df: &DataFrame) -> Result<Dataset> {
        let names: Vec<String> = df
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        if names.len() < 2 {
            return Err(MlTuningError::DataError(
                "expected at least one feature column and one label column".to_string(),
            ));
        }

        let target = names
            .iter()
            .find(|n| n.as_str() == "target")
            .or_else(|| names.last())
            .cloned()
            .ok_or_else(|| MlTuningError::DataError("empty frame".to_string()))?;
        let feature_names: Vec<&String> = names.iter().filter(|n| **n != target).collect();

        let columns = feature_names
            .iter()
            .map(|n| Self::column_values(df, n))
            .collect::<Result<Vec<Vec<f64>>>>()?;
        let labels = Array1::from_vec(Self::column_values(df, &target)?);

        let n_rows = df.height();
        let features = Array2::from_shape_fn((n_rows, columns.len()), |(r, c)| columns[c][r]);
        Dataset::new(features, labels)
    }
}

impl DatasetSource for CsvDatasetSource {
    fn load(&self, name: DatasetName) -> Result<Dataset> {
        let path = self.path_for(name);
        if !path.exists() {
            warn!(dataset = %name, path = %path.display(), "dataset file not found");
        }
        let df = Self::load_csv(&path)?;
        debug!(dataset = %name, rows = df.height(), cols = df.width(), "loaded CSV");
        Self::frame_to_dataset(&df)
    }
}

/// Datasets registered in memory
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    datasets: HashMap<DatasetName, Dataset>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `dataset` under `name`
    pub fn with_dataset(mut self, name: DatasetName, dataset: Dataset) -> Self {
        self.datasets.insert(name, dataset);
        self
    }
}

impl DatasetSource for InMemorySource {
    fn load(&self, name: DatasetName) -> Result<Dataset> {
        self.datasets
            .get(&name)
            .cloned()
            .ok_or_else(|| MlTuningError::DataError(format!("dataset '{}' is not registered", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::io::Write;

    fn write_csv(dir: &Path, name: &str, content: &str) {
        let mut file = File::create(dir.join(name)).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_load_csv_last_column_is_label() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "diabetes.csv", "a,b,y\n1,2,3\n4,5,6\n7,8,9\n");

        let source = CsvDatasetSource::new(dir.path());
        let ds = source.load(DatasetName::Diabetes).unwrap();

        assert_eq!(ds.features, array![[1.0, 2.0], [4.0, 5.0], [7.0, 8.0]]);
        assert_eq!(ds.labels, array![3.0, 6.0, 9.0]);
    }

    #[test]
    fn test_load_csv_named_target_column() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "boston.csv", "target,a,b\n10,1,2\n20,3,4\n");

        let source = CsvDatasetSource::new(dir.path());
        let ds = source.load(DatasetName::Boston).unwrap();

        assert_eq!(ds.features, array![[1.0, 2.0], [3.0, 4.0]]);
        assert_eq!(ds.labels, array![10.0, 20.0]);
    }

    #[test]
    fn test_missing_file_is_data_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = CsvDatasetSource::new(dir.path());
        assert!(matches!(
            source.load(DatasetName::Diabetes),
            Err(MlTuningError::DataError(_))
        ));
    }

    #[test]
    fn test_in_memory_source() {
        let ds = Dataset::new(array![[1.0], [2.0]], array![0.5, 1.5]).unwrap();
        let source = InMemorySource::new().with_dataset(DatasetName::Diabetes, ds.clone());

        assert_eq!(source.load(DatasetName::Diabetes).unwrap(), ds);
        assert!(source.load(DatasetName::Boston).is_err());
    }
}
