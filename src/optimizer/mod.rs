//! Optimizer-facing surface
//!
//! The benchmark problems do not run a search themselves; they describe their
//! hyperparameters through a [`SearchSpace`] and accept a
//! [`HyperparameterConfig`] per objective call.

mod search_space;

pub use search_space::{HyperparameterConfig, Parameter, ParameterType, ParameterValue, SearchSpace};
