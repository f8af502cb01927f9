//! Regressor families, their search spaces and model resolution

use crate::error::{MlTuningError, Result};
use crate::optimizer::{HyperparameterConfig, ParameterValue, SearchSpace};
use crate::training::{
    Activation, Criterion, DecisionTreeRegressor, LearningRateSchedule, MLPConfig, MLPRegressor,
    MinSamplesSplit, Regressor, Solver,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MAX_DEPTH: i64 = 1200;
const CRITERIA: [&str; 3] = ["mse", "friedman_mse", "mae"];
const ACTIVATIONS: [&str; 4] = ["identity", "logistic", "tanh", "relu"];
const SOLVERS: [&str; 3] = ["lbfgs", "sgd", "adam"];
const LEARNING_RATES: [&str; 3] = ["constant", "invscaling", "adaptive"];

/// Which hyperparameters the optimizer searches over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegressorFamily {
    /// Tree depth only
    DecisionTreeDepth,
    /// Depth, criterion and min_samples_split
    DecisionTree,
    Mlp,
    /// Tree and MLP parameters plus the regressor choice
    Any,
}

impl RegressorFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegressorFamily::DecisionTreeDepth => "decision_tree_depth",
            RegressorFamily::DecisionTree => "decision_tree",
            RegressorFamily::Mlp => "mlp",
            RegressorFamily::Any => "any",
        }
    }

    pub fn search_space(&self) -> SearchSpace {
        match self {
            RegressorFamily::DecisionTreeDepth => SearchSpace::new().int("depth", 1, MAX_DEPTH),
            RegressorFamily::DecisionTree => tree_space().constant("regressor", "decision_tree"),
            RegressorFamily::Mlp => mlp_space(SearchSpace::new()).constant("regressor", "mlp"),
            RegressorFamily::Any => {
                mlp_space(tree_space()).categorical("regressor", &["mlp", "decision_tree"])
            }
        }
    }

    /// Values merged underneath every search configuration
    pub fn fixed_params(&self) -> HyperparameterConfig {
        match self {
            RegressorFamily::DecisionTreeDepth => HyperparameterConfig::new()
                .with("regressor", "decision_tree")
                .with("criterion", "mse")
                .with("min_samples_split", 1e-5),
            RegressorFamily::DecisionTree => {
                HyperparameterConfig::new().with("regressor", "decision_tree")
            }
            RegressorFamily::Mlp => HyperparameterConfig::new().with("regressor", "mlp"),
            RegressorFamily::Any => HyperparameterConfig::new(),
        }
    }
}

fn tree_space() -> SearchSpace {
    SearchSpace::new()
        .int("depth", 1, MAX_DEPTH)
        .categorical("criterion", &CRITERIA)
        .log_float("min_samples_split", 1e-7, 1.0)
}

fn mlp_space(space: SearchSpace) -> SearchSpace {
    space
        .categorical("activation", &ACTIVATIONS)
        .categorical("solver", &SOLVERS)
        .categorical("learning_rate", &LEARNING_RATES)
        .log_float("alpha", 1e-7, 1.0)
}

impl fmt::Display for RegressorFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegressorFamily {
    type Err = MlTuningError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "decision_tree_depth" => Ok(RegressorFamily::DecisionTreeDepth),
            "decision_tree" => Ok(RegressorFamily::DecisionTree),
            "mlp" => Ok(RegressorFamily::Mlp),
            "any" => Ok(RegressorFamily::Any),
            other => Err(MlTuningError::ConfigError(format!(
                "unknown regressor family '{}'",
                other
            ))),
        }
    }
}

/// Fully resolved model, built from a merged configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "regressor", rename_all = "snake_case")]
pub enum RegressorSpec {
    DecisionTree {
        depth: usize,
        criterion: Criterion,
        min_samples_split: MinSamplesSplit,
    },
    Mlp {
        activation: Activation,
        solver: Solver,
        learning_rate: LearningRateSchedule,
        alpha: f64,
    },
}

impl RegressorSpec {
    /// Resolve the `regressor` field and read only the fields that model uses.
    pub fn from_config(config: &HyperparameterConfig) -> Result<Self> {
        match config.string("regressor")? {
            "decision_tree" => Self::tree_from_config(config),
            "mlp" => Self::mlp_from_config(config),
            other => Err(MlTuningError::ConfigError(format!(
                "unknown regressor '{}', expected decision_tree or mlp",
                other
            ))),
        }
    }

    fn tree_from_config(config: &HyperparameterConfig) -> Result<Self> {
        let depth = config.int("depth")?;
        if depth < 1 {
            return Err(MlTuningError::InvalidParameter {
                name: "depth".to_string(),
                value: depth.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        let criterion: Criterion = config.string("criterion")?.parse()?;
        // Integers are sample counts, floats are fractions of the training rows.
        let min_samples_split = match config.get("min_samples_split") {
            Some(ParameterValue::Int(n)) if *n >= 2 => MinSamplesSplit::Count(*n as usize),
            Some(ParameterValue::Int(n)) => {
                return Err(MlTuningError::InvalidParameter {
                    name: "min_samples_split".to_string(),
                    value: n.to_string(),
                    reason: "an integer count must be at least 2".to_string(),
                })
            }
            _ => MinSamplesSplit::fraction(config.float("min_samples_split")?)?,
        };

        Ok(RegressorSpec::DecisionTree {
            depth: depth as usize,
            criterion,
            min_samples_split,
        })
    }

    fn mlp_from_config(config: &HyperparameterConfig) -> Result<Self> {
        let alpha = config.float("alpha")?;
        if !(alpha >= 0.0 && alpha.is_finite()) {
            return Err(MlTuningError::InvalidParameter {
                name: "alpha".to_string(),
                value: alpha.to_string(),
                reason: "must be a finite non-negative number".to_string(),
            });
        }

        Ok(RegressorSpec::Mlp {
            activation: config.string("activation")?.parse()?,
            solver: config.string("solver")?.parse()?,
            learning_rate: config.string("learning_rate")?.parse()?,
            alpha,
        })
    }

    /// Fresh, unfitted model
    pub fn build(&self) -> Box<dyn Regressor> {
        match *self {
            RegressorSpec::DecisionTree {
                depth,
                criterion,
                min_samples_split,
            } => Box::new(
                DecisionTreeRegressor::new()
                    .with_max_depth(depth)
                    .with_criterion(criterion)
                    .with_min_samples_split(min_samples_split),
            ),
            RegressorSpec::Mlp {
                activation,
                solver,
                learning_rate,
                alpha,
            } => Box::new(MLPRegressor::new(MLPConfig {
                activation,
                solver,
                learning_rate,
                alpha,
                ..MLPConfig::default()
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_config() -> HyperparameterConfig {
        RegressorFamily::DecisionTreeDepth
            .fixed_params()
            .with("depth", 5i64)
    }

    #[test]
    fn test_family_names() {
        for family in [
            RegressorFamily::DecisionTreeDepth,
            RegressorFamily::DecisionTree,
            RegressorFamily::Mlp,
            RegressorFamily::Any,
        ] {
            assert_eq!(family.as_str().parse::<RegressorFamily>().unwrap(), family);
        }
        assert!("svm".parse::<RegressorFamily>().unwrap_err().is_config_error());
    }

    #[test]
    fn test_search_spaces() {
        assert_eq!(
            RegressorFamily::DecisionTreeDepth.search_space().param_names(),
            vec!["depth"]
        );

        let tree = RegressorFamily::DecisionTree.search_space();
        assert_eq!(tree.len(), 4);
        assert!(tree.get("regressor").unwrap().contains(&"decision_tree".into()));

        let any = RegressorFamily::Any.search_space();
        assert_eq!(any.len(), 8);
        assert!(any.get("regressor").unwrap().contains(&"mlp".into()));
        assert!(any.get("alpha").unwrap().contains(&ParameterValue::Float(1e-3)));
    }

    #[test]
    fn test_resolve_tree() {
        let spec = RegressorSpec::from_config(&tree_config()).unwrap();
        assert_eq!(
            spec,
            RegressorSpec::DecisionTree {
                depth: 5,
                criterion: Criterion::Mse,
                min_samples_split: MinSamplesSplit::Fraction(1e-5),
            }
        );
    }

    #[test]
    fn test_fractional_depth_is_type_error() {
        let config = tree_config().with("depth", 5.5);
        assert!(RegressorSpec::from_config(&config)
            .unwrap_err()
            .is_type_error());
    }

    #[test]
    fn test_depth_below_one_rejected() {
        let config = tree_config().with("depth", 0i64);
        assert!(matches!(
            RegressorSpec::from_config(&config),
            Err(MlTuningError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_min_samples_split_integer_is_count() {
        let config = tree_config().with("min_samples_split", 4i64);
        assert!(matches!(
            RegressorSpec::from_config(&config).unwrap(),
            RegressorSpec::DecisionTree {
                min_samples_split: MinSamplesSplit::Count(4),
                ..
            }
        ));

        for n in [1i64, 0, -3] {
            let config = tree_config().with("min_samples_split", n);
            assert!(matches!(
                RegressorSpec::from_config(&config),
                Err(MlTuningError::InvalidParameter { .. })
            ));
        }
    }

    #[test]
    fn test_irrelevant_fields_ignored() {
        // MLP fields on a tree, and a fractional depth on an MLP, are never read
        let tree = tree_config().with("activation", "bogus").with("alpha", -1.0);
        assert!(RegressorSpec::from_config(&tree).is_ok());

        let mlp = RegressorFamily::Mlp
            .fixed_params()
            .with("activation", "relu")
            .with("solver", "adam")
            .with("learning_rate", "constant")
            .with("alpha", 1e-4)
            .with("depth", 2.5);
        assert!(matches!(
            RegressorSpec::from_config(&mlp).unwrap(),
            RegressorSpec::Mlp { .. }
        ));
    }

    #[test]
    fn test_unknown_regressor_is_config_error() {
        let config = HyperparameterConfig::new().with("regressor", "svm");
        assert!(RegressorSpec::from_config(&config)
            .unwrap_err()
            .is_config_error());
    }

    #[test]
    fn test_missing_field() {
        let config = RegressorFamily::Mlp.fixed_params().with("activation", "tanh");
        assert!(matches!(
            RegressorSpec::from_config(&config),
            Err(MlTuningError::MissingParameter(_))
        ));
    }

    #[test]
    fn test_sampled_configs_resolve() {
        use rand::SeedableRng;
        let mut rng = rand_xoshiro::Xoshiro256PlusPlus::seed_from_u64(4);
        for family in [
            RegressorFamily::DecisionTreeDepth,
            RegressorFamily::DecisionTree,
            RegressorFamily::Mlp,
            RegressorFamily::Any,
        ] {
            let space = family.search_space();
            for _ in 0..20 {
                let config = family.fixed_params().merged(&space.sample(&mut rng));
                assert!(RegressorSpec::from_config(&config).is_ok(), "{}", family);
            }
        }
    }
}
