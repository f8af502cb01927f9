//! Regression models and cross-validation utilities
//!
//! The evaluation protocol only relies on the [`Regressor`] capability
//! (`fit` / `predict`). Two model families implement it:
//! - Decision tree regressor (mse, friedman_mse, mae criteria)
//! - Multi-layer perceptron regressor (lbfgs, sgd, adam solvers)

mod models;
pub mod cross_validation;
pub mod decision_tree;
pub mod neural_network;

pub use models::{mean_squared_error, Regressor};
pub use cross_validation::{train_test_split_indices, CVResults, CVSplit, CVStrategy, CrossValidator};
pub use decision_tree::{Criterion, DecisionTreeRegressor, MinSamplesSplit, TreeNode};
pub use neural_network::{Activation, LearningRateSchedule, MLPConfig, MLPRegressor, Solver};
