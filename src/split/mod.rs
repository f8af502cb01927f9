//! Deterministic train / validation / test partitioning
//!
//! A [`SplitEngine`] turns a materialized [`Dataset`] into a [`Split`]: a
//! held-out test set, the training pool, and `K` cross-validation folds over
//! that pool. Real-world data is split 50/50 with a fixed seed and folded
//! contiguously; synthetic data is folded by `index % K` and tested on a
//! separate, much larger population.

use crate::data::{synthetic, Dataset, TargetFunction};
use crate::error::{MlTuningError, Result};
use crate::training::{train_test_split_indices, CVStrategy, CrossValidator};
use ndarray::Axis;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

/// How a dataset is partitioned
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SplitMode {
    /// Column shuffle, seeded train/test split, contiguous K-fold on the train side
    RealWorld { test_fraction: f64, split_seed: u64 },
    /// Modulo folds over the whole set, fresh grid as the test population
    Synthetic {
        target: TargetFunction,
        dimension: usize,
        test_size: usize,
    },
}

/// One cross-validation fold. Indices are rows of the training pool.
#[derive(Debug, Clone, PartialEq)]
pub struct Fold {
    pub fold_idx: usize,
    pub train: Dataset,
    pub validation: Dataset,
    pub train_indices: Vec<usize>,
    pub validation_indices: Vec<usize>,
}

/// Immutable partition of one dataset
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub train_pool: Dataset,
    pub test_set: Dataset,
    pub folds: Vec<Fold>,
    /// Source rows forming the training pool (real-world only)
    pub train_rows: Option<Vec<usize>>,
    /// Source rows forming the test set (real-world only)
    pub test_rows: Option<Vec<usize>>,
}

impl Split {
    pub fn n_folds(&self) -> usize {
        self.folds.len()
    }
}

/// Builds [`Split`]s for one dataset kind
#[derive(Debug, Clone)]
pub struct SplitEngine {
    mode: SplitMode,
    n_folds: usize,
}

impl SplitEngine {
    pub fn new(mode: SplitMode, n_folds: usize) -> Self {
        Self { mode, n_folds }
    }

    /// 50/50 split seeded with `split_seed`
    pub fn real_world(split_seed: u64, n_folds: usize) -> Self {
        Self::new(
            SplitMode::RealWorld {
                test_fraction: 0.5,
                split_seed,
            },
            n_folds,
        )
    }

    pub fn synthetic(
        target: TargetFunction,
        dimension: usize,
        test_size: usize,
        n_folds: usize,
    ) -> Self {
        Self::new(
            SplitMode::Synthetic {
                target,
                dimension,
                test_size,
            },
            n_folds,
        )
    }

    /// Partition `dataset`. Randomness other than the fixed split seed is
    /// drawn from `rng`.
    pub fn build_split(&self, dataset: &Dataset, rng: &mut impl Rng) -> Result<Split> {
        let split = match self.mode {
            SplitMode::RealWorld {
                test_fraction,
                split_seed,
            } => self.split_real_world(dataset, test_fraction, split_seed, rng)?,
            SplitMode::Synthetic {
                target,
                dimension,
                test_size,
            } => self.split_synthetic(dataset, target, dimension, test_size, rng)?,
        };

        info!(
            train_pool = split.train_pool.n_samples(),
            test_set = split.test_set.n_samples(),
            folds = split.n_folds(),
            "built split"
        );
        Ok(split)
    }

    fn split_real_world(
        &self,
        dataset: &Dataset,
        test_fraction: f64,
        split_seed: u64,
        rng: &mut impl Rng,
    ) -> Result<Split> {
        let mut columns: Vec<usize> = (0..dataset.n_features()).collect();
        columns.shuffle(rng);
        let shuffled = Dataset::new(
            dataset.features.select(Axis(1), &columns),
            dataset.labels.clone(),
        )?;

        let (train_rows, test_rows) =
            train_test_split_indices(shuffled.n_samples(), test_fraction, split_seed)?;
        let train_pool = shuffled.select_rows(&train_rows);
        let test_set = shuffled.select_rows(&test_rows);

        let cv = CrossValidator::new(CVStrategy::KFold {
            n_splits: self.n_folds,
        });
        let folds = cv
            .split(train_pool.n_samples())?
            .into_iter()
            .map(|s| Fold {
                fold_idx: s.fold_idx,
                train: train_pool.select_rows(&s.train_indices),
                validation: train_pool.select_rows(&s.validation_indices),
                train_indices: s.train_indices,
                validation_indices: s.validation_indices,
            })
            .collect();

        Ok(Split {
            train_pool,
            test_set,
            folds,
            train_rows: Some(train_rows),
            test_rows: Some(test_rows),
        })
    }

    fn split_synthetic(
        &self,
        dataset: &Dataset,
        target: TargetFunction,
        dimension: usize,
        test_size: usize,
        rng: &mut impl Rng,
    ) -> Result<Split> {
        if dataset.n_features() != dimension {
            return Err(MlTuningError::ShapeError {
                expected: format!("{} features", dimension),
                actual: format!("{} features", dataset.n_features()),
            });
        }

        let cv = CrossValidator::new(CVStrategy::Modulo {
            n_splits: self.n_folds,
        });
        // Fold labels come from the selected target, not the pool labels.
        let relabel = |indices: &[usize]| -> Result<Dataset> {
            let features = dataset.features.select(Axis(0), indices);
            let labels = target.labels(&features);
            Dataset::new(features, labels)
        };
        let folds = cv
            .split(dataset.n_samples())?
            .into_iter()
            .map(|s| {
                Ok(Fold {
                    fold_idx: s.fold_idx,
                    train: relabel(&s.train_indices)?,
                    validation: relabel(&s.validation_indices)?,
                    train_indices: s.train_indices,
                    validation_indices: s.validation_indices,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let test_set = synthetic::test_set(test_size, dimension, target, rng)?;

        Ok(Split {
            train_pool: dataset.clone(),
            test_set,
            folds,
            train_rows: None,
            test_rows: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn toy(n: usize, d: usize) -> Dataset {
        let features = Array2::from_shape_fn((n, d), |(r, c)| (r * d + c) as f64);
        let labels = Array1::from_shape_fn(n, |r| r as f64);
        Dataset::new(features, labels).unwrap()
    }

    #[test]
    fn test_real_world_partition() {
        let ds = toy(45, 3);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let split = SplitEngine::real_world(42, 10)
            .build_split(&ds, &mut rng)
            .unwrap();

        let train_rows = split.train_rows.clone().unwrap();
        let test_rows = split.test_rows.clone().unwrap();
        assert_eq!(test_rows.len(), 23);
        assert_eq!(train_rows.len() + test_rows.len(), 45);
        assert!(train_rows.iter().all(|r| !test_rows.contains(r)));

        assert_eq!(split.n_folds(), 10);
        let sizes: Vec<usize> = split
            .folds
            .iter()
            .map(|f| f.validation_indices.len())
            .collect();
        assert_eq!(sizes, vec![3, 3, 2, 2, 2, 2, 2, 2, 2, 2]);
    }

    #[test]
    fn test_real_world_columns_are_permuted_together() {
        let ds = toy(20, 4);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(11);
        let split = SplitEngine::real_world(42, 10)
            .build_split(&ds, &mut rng)
            .unwrap();

        // Each pool row keeps its label and the same multiset of values
        for (row, &label) in split.train_pool.features.rows().into_iter().zip(&split.train_pool.labels) {
            let source = label as usize;
            let mut got: Vec<f64> = row.to_vec();
            let mut want: Vec<f64> = ds.features.row(source).to_vec();
            got.sort_by(|a, b| a.total_cmp(b));
            want.sort_by(|a, b| a.total_cmp(b));
            assert_eq!(got, want);
        }
    }

    #[test]
    fn test_synthetic_folds_relabelled_with_target() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(2);
        let features = synthetic::training_features(120, 2, &mut rng).unwrap();
        let labels = TargetFunction::Sin.labels(&features);
        let ds = Dataset::new(features, labels).unwrap();

        let split = SplitEngine::synthetic(TargetFunction::Square, 2, 60000, 10)
            .build_split(&ds, &mut rng)
            .unwrap();

        assert_eq!(split.train_pool, ds);
        assert_eq!(split.test_set.features.dim(), (30000, 2));
        for fold in &split.folds {
            assert_eq!(fold.validation_indices.len(), 12);
            assert_eq!(
                fold.validation.labels,
                TargetFunction::Square.labels(&fold.validation.features)
            );
        }
    }

    #[test]
    fn test_synthetic_dimension_mismatch() {
        let ds = toy(120, 3);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let err = SplitEngine::synthetic(TargetFunction::Sin, 2, 60000, 10)
            .build_split(&ds, &mut rng)
            .unwrap_err();
        assert!(matches!(err, MlTuningError::ShapeError { .. }));
    }
}
