//! Cross-validation index generators

use crate::error::{MlTuningError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Cross-validation strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CVStrategy {
    /// Contiguous K-Fold; the first `n % k` folds hold one extra sample
    KFold { n_splits: usize },
    /// Fold `f` validates on every sample whose index satisfies `i % k == f`
    Modulo { n_splits: usize },
}

impl Default for CVStrategy {
    fn default() -> Self {
        CVStrategy::KFold { n_splits: 10 }
    }
}

/// Row indices of one train/validation split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CVSplit {
    pub train_indices: Vec<usize>,
    pub validation_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Cross-validation splitter
pub struct CrossValidator {
    strategy: CVStrategy,
}

impl CrossValidator {
    /// Create a new cross-validator
    pub fn new(strategy: CVStrategy) -> Self {
        Self { strategy }
    }

    /// Generate train/validation splits over `n_samples` rows
    pub fn split(&self, n_samples: usize) -> Result<Vec<CVSplit>> {
        match &self.strategy {
            CVStrategy::KFold { n_splits } => self.k_fold_split(n_samples, *n_splits),
            CVStrategy::Modulo { n_splits } => self.modulo_split(n_samples, *n_splits),
        }
    }

    fn check(n_samples: usize, n_splits: usize) -> Result<()> {
        if n_splits < 2 {
            return Err(MlTuningError::ConfigError(
                "n_splits must be at least 2".to_string(),
            ));
        }
        if n_samples < n_splits {
            return Err(MlTuningError::DataError(format!(
                "n_samples ({}) must be >= n_splits ({})",
                n_samples, n_splits
            )));
        }
        Ok(())
    }

    fn k_fold_split(&self, n_samples: usize, n_splits: usize) -> Result<Vec<CVSplit>> {
        Self::check(n_samples, n_splits)?;

        let indices: Vec<usize> = (0..n_samples).collect();

        let base = n_samples / n_splits;
        let remainder = n_samples % n_splits;

        let mut splits = Vec::with_capacity(n_splits);
        let mut current = 0;

        for fold_idx in 0..n_splits {
            let fold_size = if fold_idx < remainder { base + 1 } else { base };
            let validation_indices = indices[current..current + fold_size].to_vec();
            let train_indices: Vec<usize> = indices[..current]
                .iter()
                .chain(indices[current + fold_size..].iter())
                .copied()
                .collect();

            splits.push(CVSplit {
                train_indices,
                validation_indices,
                fold_idx,
            });

            current += fold_size;
        }

        Ok(splits)
    }

    fn modulo_split(&self, n_samples: usize, n_splits: usize) -> Result<Vec<CVSplit>> {
        Self::check(n_samples, n_splits)?;

        let splits = (0..n_splits)
            .map(|fold_idx| {
                let (validation_indices, train_indices): (Vec<usize>, Vec<usize>) =
                    (0..n_samples).partition(|i| i % n_splits == fold_idx);
                CVSplit {
                    train_indices,
                    validation_indices,
                    fold_idx,
                }
            })
            .collect();

        Ok(splits)
    }
}

/// Shuffled train/test partition of `n_samples` row indices.
///
/// `ceil(test_fraction * n)` rows go to the test side. The permutation comes
/// from a ChaCha8 stream seeded with `seed`, so the partition depends only on
/// `(n_samples, test_fraction, seed)`.
pub fn train_test_split_indices(
    n_samples: usize,
    test_fraction: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(MlTuningError::ConfigError(format!(
            "test fraction must lie in (0, 1), got {}",
            test_fraction
        )));
    }
    let n_test = (test_fraction * n_samples as f64).ceil() as usize;
    if n_test == 0 || n_test >= n_samples {
        return Err(MlTuningError::DataError(format!(
            "cannot split {} samples with test fraction {}",
            n_samples, test_fraction
        )));
    }

    let mut permutation: Vec<usize> = (0..n_samples).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    permutation.shuffle(&mut rng);

    let train = permutation[n_test..].to_vec();
    let test = permutation[..n_test].to_vec();
    Ok((train, test))
}

/// Cross-validation results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CVResults {
    /// Loss of each fold
    pub scores: Vec<f64>,
    /// Mean loss across folds
    pub mean_score: f64,
    /// Standard deviation of fold losses
    pub std_score: f64,
    /// Number of folds
    pub n_folds: usize,
}

impl CVResults {
    /// Create CV results from fold scores
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let n_folds = scores.len();
        let mean_score = scores.iter().sum::<f64>() / n_folds as f64;
        let variance =
            scores.iter().map(|s| (s - mean_score).powi(2)).sum::<f64>() / n_folds as f64;
        let std_score = variance.sqrt();

        Self {
            scores,
            mean_score,
            std_score,
            n_folds,
        }
    }
}
