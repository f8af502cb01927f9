//! Hyperparameter-tuning benchmark problems
//!
//! [`MLTuning`] pairs a regressor family with a dataset and exposes two entry
//! points to an optimizer:
//! - [`MLTuning::objective`]: cross-validated loss of `fixed ⊕ config`
//! - [`MLTuning::evaluation_function`]: report loss of `config ⊕ eval_params`,
//!   held-out unless the problem is an overfitter
//!
//! Data is materialized and split on the first call, then cached for the
//! lifetime of the instance.

pub mod config;
pub mod evaluator;
pub mod family;

pub use config::{BenchmarkConfig, CV_FOLDS, NUM_DATA, SPLIT_SEED, SYNTHETIC_TEST_SIZE};
pub use evaluator::Evaluator;
pub use family::{RegressorFamily, RegressorSpec};

use crate::data::{CsvDatasetSource, Dataset, DatasetName, DatasetProvider, DatasetSource};
use crate::error::{MlTuningError, Result};
use crate::optimizer::{HyperparameterConfig, ParameterValue, SearchSpace};
use crate::split::{Split, SplitEngine};
use crate::training::CVResults;
use parking_lot::Mutex;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Materialized dataset and its split, built together on first use
#[derive(Debug)]
pub struct PreparedData {
    pub dataset: Arc<Dataset>,
    pub split: Split,
}

/// One benchmark problem
pub struct MLTuning {
    family: RegressorFamily,
    dataset: DatasetName,
    data_dimension: Option<usize>,
    overfitter: bool,
    provider: DatasetProvider,
    split_engine: SplitEngine,
    fixed_params: HyperparameterConfig,
    eval_params: HyperparameterConfig,
    rng: Mutex<Xoshiro256PlusPlus>,
    prepared: Mutex<Option<Arc<PreparedData>>>,
}

impl MLTuning {
    /// Validate `config` and build a problem reading real-world data from
    /// `config.data_dir`.
    pub fn new(config: BenchmarkConfig) -> Result<Self> {
        let source = Arc::new(CsvDatasetSource::new(config.data_dir.clone()));
        Self::with_source(config, source)
    }

    /// Same as [`MLTuning::new`] with an explicit real-world data source
    pub fn with_source(config: BenchmarkConfig, source: Arc<dyn DatasetSource>) -> Result<Self> {
        let family: RegressorFamily = config.regressor.parse()?;
        let dataset: DatasetName = config.dataset.parse()?;
        let provider = DatasetProvider::new(dataset, config.data_dimension, NUM_DATA, source)?
            .with_consistent_training_labels(config.consistent_training_labels);

        let split_engine = match (dataset.target_function(), config.data_dimension) {
            (Some(target), Some(dimension)) => {
                if SYNTHETIC_TEST_SIZE % dimension != 0 {
                    return Err(MlTuningError::ConfigError(format!(
                        "data dimension {} does not divide the synthetic test size {}",
                        dimension, SYNTHETIC_TEST_SIZE
                    )));
                }
                SplitEngine::synthetic(target, dimension, SYNTHETIC_TEST_SIZE, CV_FOLDS)
            }
            _ => SplitEngine::real_world(SPLIT_SEED, CV_FOLDS),
        };

        let fixed_params = family.fixed_params();
        let mut eval_params = fixed_params.clone();
        eval_params.insert("noise_free", !config.overfitter);

        let rng = match config.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        info!(
            regressor = %family,
            dataset = %dataset,
            dimension = ?config.data_dimension,
            overfitter = config.overfitter,
            "created benchmark"
        );

        Ok(Self {
            family,
            dataset,
            data_dimension: config.data_dimension,
            overfitter: config.overfitter,
            provider,
            split_engine,
            fixed_params,
            eval_params,
            rng: Mutex::new(rng),
            prepared: Mutex::new(None),
        })
    }

    pub fn family(&self) -> RegressorFamily {
        self.family
    }

    pub fn dataset(&self) -> DatasetName {
        self.dataset
    }

    pub fn overfitter(&self) -> bool {
        self.overfitter
    }

    /// Parameters the optimizer searches over
    pub fn search_space(&self) -> SearchSpace {
        self.family.search_space()
    }

    /// Values merged underneath every objective configuration
    pub fn fixed_params(&self) -> &HyperparameterConfig {
        &self.fixed_params
    }

    /// Values forced onto every report configuration, including `noise_free`
    pub fn eval_params(&self) -> &HyperparameterConfig {
        &self.eval_params
    }

    /// `"{regressor}Dim{dimension}"`, e.g. `mlpDim2` or `decision_treeDimNone`
    pub fn name(&self) -> String {
        let dimension = self
            .data_dimension
            .map_or_else(|| "None".to_string(), |d| d.to_string());
        format!("{}Dim{}", self.family, dimension)
    }

    pub fn descriptors(&self) -> BTreeMap<String, ParameterValue> {
        let mut descriptors = BTreeMap::new();
        descriptors.insert("regressor".to_string(), self.family.as_str().into());
        descriptors.insert("dataset".to_string(), self.dataset.as_str().into());
        descriptors.insert("overfitter".to_string(), self.overfitter.into());
        if let Some(d) = self.data_dimension {
            descriptors.insert("data_dimension".to_string(), ParameterValue::Int(d as i64));
        }
        descriptors
    }

    /// Dataset and split, built once under the lock
    pub fn prepared(&self) -> Result<Arc<PreparedData>> {
        let mut slot = self.prepared.lock();
        if let Some(prepared) = slot.as_ref() {
            return Ok(Arc::clone(prepared));
        }

        let mut rng = self.rng.lock();
        let dataset = self.provider.materialize(&mut *rng)?;
        let split = self.split_engine.build_split(&dataset, &mut *rng)?;

        let prepared = Arc::new(PreparedData { dataset, split });
        *slot = Some(Arc::clone(&prepared));
        Ok(prepared)
    }

    /// Loss of `config` with `noise_free` chosen by the caller
    pub fn evaluate(&self, config: &HyperparameterConfig, noise_free: bool) -> Result<f64> {
        let prepared = self.prepared()?;
        Evaluator::new(&prepared.split).evaluate(config, noise_free)
    }

    /// Cross-validated loss of `fixed ⊕ config`; search values win
    pub fn objective(&self, config: &HyperparameterConfig) -> Result<f64> {
        self.evaluate(&self.fixed_params.merged(config), false)
    }

    /// Report loss of `config ⊕ eval_params`; evaluation parameters win
    pub fn evaluation_function(&self, config: &HyperparameterConfig) -> Result<f64> {
        let merged = config.merged(&self.eval_params);
        let noise_free = merged
            .get("noise_free")
            .and_then(ParameterValue::as_bool)
            .unwrap_or(!self.overfitter);
        self.evaluate(&merged, noise_free)
    }

    /// Per-fold losses behind [`MLTuning::objective`]
    pub fn evaluate_detailed(&self, config: &HyperparameterConfig) -> Result<CVResults> {
        let prepared = self.prepared()?;
        Evaluator::new(&prepared.split).evaluate_detailed(&self.fixed_params.merged(config))
    }
}

impl std::fmt::Debug for MLTuning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MLTuning")
            .field("name", &self.name())
            .field("dataset", &self.dataset)
            .field("overfitter", &self.overfitter)
            .field("prepared", &self.prepared.lock().is_some())
            .finish()
    }
}
