//! Error types for the ML tuning benchmarks

use thiserror::Error;

/// Result type alias for benchmark operations
pub type Result<T> = std::result::Result<T, MlTuningError>;

/// Main error type for the benchmark problems
#[derive(Error, Debug)]
pub enum MlTuningError {
    /// Unknown family/dataset, or a dimension that does not match the dataset kind
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Type mismatch for parameter '{name}': expected {expected}, got {actual}")]
    TypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl MlTuningError {
    /// Whether this error stems from configuration (fails fast, never from a fit)
    pub fn is_config_error(&self) -> bool {
        matches!(self, MlTuningError::ConfigError(_))
    }

    /// Whether this error is a parameter type violation
    pub fn is_type_error(&self) -> bool {
        matches!(self, MlTuningError::TypeMismatch { .. })
    }
}

impl From<polars::error::PolarsError> for MlTuningError {
    fn from(err: polars::error::PolarsError) -> Self {
        MlTuningError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for MlTuningError {
    fn from(err: serde_json::Error) -> Self {
        MlTuningError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for MlTuningError {
    fn from(err: ndarray::ShapeError) -> Self {
        MlTuningError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MlTuningError::ConfigError("artificial requires a dimension".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: artificial requires a dimension"
        );
        assert!(err.is_config_error());
    }

    #[test]
    fn test_type_mismatch_display() {
        let err = MlTuningError::TypeMismatch {
            name: "depth".to_string(),
            expected: "integer".to_string(),
            actual: "float 5.5".to_string(),
        };
        assert!(err.is_type_error());
        assert!(err.to_string().contains("depth"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: MlTuningError = io_err.into();
        assert!(matches!(err, MlTuningError::IoError(_)));
    }
}
