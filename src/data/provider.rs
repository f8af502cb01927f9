//! Lazy, cached dataset materialization

use crate::data::{synthetic, Dataset, DatasetName, DatasetSource, TargetFunction};
use crate::error::Result;
use parking_lot::Mutex;
use rand::Rng;
use std::sync::Arc;
use tracing::info;

/// Resolves a named dataset into feature/label arrays, once.
pub struct DatasetProvider {
    name: DatasetName,
    dimension: Option<usize>,
    num_data: usize,
    consistent_training_labels: bool,
    source: Arc<dyn DatasetSource>,
    materialized: Mutex<Option<Arc<Dataset>>>,
}

impl DatasetProvider {
    /// Fails with a configuration error unless
    /// `name.is_artificial() == dimension.is_some()`.
    pub fn new(
        name: DatasetName,
        dimension: Option<usize>,
        num_data: usize,
        source: Arc<dyn DatasetSource>,
    ) -> Result<Self> {
        name.check_dimension(dimension)?;
        Ok(Self {
            name,
            dimension,
            num_data,
            consistent_training_labels: false,
            source,
            materialized: Mutex::new(None),
        })
    }

    /// Label the synthetic training pool with the selected target function
    /// instead of `sin`.
    pub fn with_consistent_training_labels(mut self, consistent: bool) -> Self {
        self.consistent_training_labels = consistent;
        self
    }

    pub fn is_materialized(&self) -> bool {
        self.materialized.lock().is_some()
    }

    /// The dataset, built on first call and returned from the cache afterwards.
    ///
    /// Synthetic rows are shuffled with `rng`; real-world data is returned as
    /// loaded.
    pub fn materialize(&self, rng: &mut impl Rng) -> Result<Arc<Dataset>> {
        let mut slot = self.materialized.lock();
        if let Some(dataset) = slot.as_ref() {
            return Ok(Arc::clone(dataset));
        }

        let dataset = match (self.name.target_function(), self.dimension) {
            (Some(target), Some(dimension)) => self.generate(target, dimension, rng)?,
            _ => self.source.load(self.name)?,
        };
        info!(
            dataset = %self.name,
            n_samples = dataset.n_samples(),
            n_features = dataset.n_features(),
            "materialized dataset"
        );

        let dataset = Arc::new(dataset);
        *slot = Some(Arc::clone(&dataset));
        Ok(dataset)
    }

    fn generate(
        &self,
        target: TargetFunction,
        dimension: usize,
        rng: &mut impl Rng,
    ) -> Result<Dataset> {
        let features = synthetic::training_features(self.num_data, dimension, rng)?;
        // The training pool is labelled with sin whatever the target, unless
        // consistent labels were requested.
        let label_fn = if self.consistent_training_labels {
            target
        } else {
            TargetFunction::Sin
        };
        let labels = label_fn.labels(&features);
        Dataset::new(features, labels)
    }
}

impl std::fmt::Debug for DatasetProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetProvider")
            .field("name", &self.name)
            .field("dimension", &self.dimension)
            .field("num_data", &self.num_data)
            .field("materialized", &self.is_materialized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::InMemorySource;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn empty_source() -> Arc<dyn DatasetSource> {
        Arc::new(InMemorySource::new())
    }

    #[test]
    fn test_materialize_is_cached() {
        let provider =
            DatasetProvider::new(DatasetName::Artificial, Some(2), 120, empty_source()).unwrap();
        assert!(!provider.is_materialized());

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        let first = provider.materialize(&mut rng).unwrap();
        let second = provider.materialize(&mut rng).unwrap();

        assert!(provider.is_materialized());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.features.dim(), (120, 2));
    }

    #[test]
    fn test_same_seed_same_dataset() {
        let build = || {
            let provider =
                DatasetProvider::new(DatasetName::ArtificialCos, Some(3), 120, empty_source())
                    .unwrap();
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(9);
            provider.materialize(&mut rng).unwrap()
        };
        assert_eq!(*build(), *build());
    }

    #[test]
    fn test_training_labels_use_sin_by_default() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);
        let provider =
            DatasetProvider::new(DatasetName::ArtificialSquare, Some(2), 120, empty_source())
                .unwrap();
        let ds = provider.materialize(&mut rng).unwrap();
        assert_eq!(ds.labels, TargetFunction::Sin.labels(&ds.features));

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);
        let provider =
            DatasetProvider::new(DatasetName::ArtificialSquare, Some(2), 120, empty_source())
                .unwrap()
                .with_consistent_training_labels(true);
        let ds = provider.materialize(&mut rng).unwrap();
        assert_eq!(ds.labels, TargetFunction::Square.labels(&ds.features));
    }

    #[test]
    fn test_real_world_loaded_verbatim() {
        let data = Dataset::new(array![[1.0, 2.0], [3.0, 4.0]], array![1.0, 2.0]).unwrap();
        let source: Arc<dyn DatasetSource> =
            Arc::new(InMemorySource::new().with_dataset(DatasetName::Diabetes, data.clone()));
        let provider = DatasetProvider::new(DatasetName::Diabetes, None, 120, source).unwrap();

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        assert_eq!(*provider.materialize(&mut rng).unwrap(), data);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let err = DatasetProvider::new(DatasetName::Diabetes, Some(3), 120, empty_source())
            .unwrap_err();
        assert!(err.is_config_error());
        let err =
            DatasetProvider::new(DatasetName::Artificial, None, 120, empty_source()).unwrap_err();
        assert!(err.is_config_error());
    }
}
