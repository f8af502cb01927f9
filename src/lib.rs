//! mltuning - Hyperparameter-tuning benchmark problems
//!
//! Turns a regressor family and a dataset into a reproducible objective
//! function for black-box optimizers.
//!
//! # Modules
//!
//! - [`data`] - Real-world and synthetic dataset materialization
//! - [`split`] - Deterministic train / validation / test partitioning
//! - [`training`] - Regressors, loss metric and cross-validation indices
//! - [`optimizer`] - Search spaces and hyperparameter configurations
//! - [`benchmark`] - The [`MLTuning`](benchmark::MLTuning) problem and its evaluator
//! - [`cli`] - Command-line interface

pub mod error;

pub mod data;
pub mod split;
pub mod training;
pub mod optimizer;
pub mod benchmark;

pub mod cli;

pub use error::{MlTuningError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{MlTuningError, Result};

    pub use crate::data::{CsvDatasetSource, Dataset, DatasetName, DatasetSource, InMemorySource};
    pub use crate::split::{Fold, Split, SplitEngine};
    pub use crate::training::{CVResults, DecisionTreeRegressor, MLPRegressor, Regressor};
    pub use crate::optimizer::{HyperparameterConfig, ParameterValue, SearchSpace};
    pub use crate::benchmark::{BenchmarkConfig, MLTuning, RegressorFamily, RegressorSpec};
}
