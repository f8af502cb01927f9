//! Configuration → loss, over a prepared split

use crate::benchmark::family::RegressorSpec;
use crate::data::Dataset;
use crate::error::Result;
use crate::optimizer::HyperparameterConfig;
use crate::split::Split;
use crate::training::{mean_squared_error, CVResults};
use tracing::debug;

/// Fits models described by a configuration against one [`Split`]
pub struct Evaluator<'a> {
    split: &'a Split,
}

impl<'a> Evaluator<'a> {
    pub fn new(split: &'a Split) -> Self {
        Self { split }
    }

    /// Cross-validated loss when `noise_free` is false, held-out loss otherwise
    pub fn evaluate(&self, config: &HyperparameterConfig, noise_free: bool) -> Result<f64> {
        let spec = RegressorSpec::from_config(config)?;
        let loss = if noise_free {
            self.held_out(&spec)?
        } else {
            self.cross_validate(&spec)?.mean_score
        };
        debug!(noise_free, loss, "evaluated configuration");
        Ok(loss)
    }

    /// Per-fold losses of the cross-validated mode
    pub fn evaluate_detailed(&self, config: &HyperparameterConfig) -> Result<CVResults> {
        let spec = RegressorSpec::from_config(config)?;
        self.cross_validate(&spec)
    }

    /// Fresh model per fold, fit on the fold's train side, MSE on its validation side
    pub fn cross_validate(&self, spec: &RegressorSpec) -> Result<CVResults> {
        let scores = self
            .split
            .folds
            .iter()
            .map(|fold| {
                let loss = fit_and_score(spec, &fold.train, &fold.validation)?;
                debug!(fold = fold.fold_idx, loss, "fold evaluated");
                Ok(loss)
            })
            .collect::<Result<Vec<f64>>>()?;
        Ok(CVResults::from_scores(scores))
    }

    /// One model fit on the training pool, MSE on the test set
    pub fn held_out(&self, spec: &RegressorSpec) -> Result<f64> {
        fit_and_score(spec, &self.split.train_pool, &self.split.test_set)
    }
}

fn fit_and_score(spec: &RegressorSpec, train: &Dataset, test: &Dataset) -> Result<f64> {
    let mut model = spec.build();
    model.fit(&train.features, &train.labels)?;
    let predictions = model.predict(&test.features)?;
    mean_squared_error(&test.labels, &predictions)
}
