//! Decision tree regressor

use crate::error::{MlTuningError, Result};
use crate::training::models::{check_xy, Regressor};
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with prediction value
    Leaf { value: f64, n_samples: usize },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

/// Split quality criterion
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Criterion {
    /// Variance reduction, leaves predict the mean
    Mse,
    /// Friedman's improvement score, leaves predict the mean
    FriedmanMse,
    /// Mean absolute deviation around the median, leaves predict the median
    Mae,
}

impl FromStr for Criterion {
    type Err = MlTuningError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mse" | "squared_error" => Ok(Criterion::Mse),
            "friedman_mse" => Ok(Criterion::FriedmanMse),
            "mae" | "absolute_error" => Ok(Criterion::Mae),
            other => Err(MlTuningError::InvalidParameter {
                name: "criterion".to_string(),
                value: other.to_string(),
                reason: "expected one of mse, friedman_mse, mae".to_string(),
            }),
        }
    }
}

/// Minimum number of samples required to split a node
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum MinSamplesSplit {
    Count(usize),
    /// Fraction of the training samples, in (0, 1]
    Fraction(f64),
}

impl MinSamplesSplit {
    /// Fraction form, validated against (0, 1]
    pub fn fraction(f: f64) -> Result<Self> {
        if !(f > 0.0 && f <= 1.0) {
            return Err(MlTuningError::InvalidParameter {
                name: "min_samples_split".to_string(),
                value: f.to_string(),
                reason: "must lie in (0, 1]".to_string(),
            });
        }
        Ok(MinSamplesSplit::Fraction(f))
    }

    /// Absolute sample count for a training set of `n_samples` rows
    pub fn resolve(&self, n_samples: usize) -> usize {
        match *self {
            MinSamplesSplit::Count(c) => c.max(2),
            MinSamplesSplit::Fraction(f) => ((f * n_samples as f64).ceil() as usize).max(2),
        }
    }
}

/// Decision tree regression model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeRegressor {
    /// Tree root
    root: Option<TreeNode>,
    /// Maximum depth
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: MinSamplesSplit,
    /// Split criterion
    pub criterion: Criterion,
    n_features: usize,
}

impl Default for DecisionTreeRegressor {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTreeRegressor {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: MinSamplesSplit::Count(2),
            criterion: Criterion::Mse,
            n_features: 0,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: MinSamplesSplit) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    /// Set criterion
    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        min_split: usize,
    ) -> TreeNode {
        let n_samples = indices.len();
        let y_subset: Vec<f64> = indices.iter().map(|&i| y[i]).collect();

        let should_stop = n_samples < min_split
            || self.max_depth.map_or(false, |d| depth >= d)
            || is_constant(&y_subset);

        if should_stop {
            return self.leaf(&y_subset);
        }

        match self.find_best_split(x, y, indices) {
            Some((feature_idx, threshold)) => {
                let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| x[[i, feature_idx]] <= threshold);

                let left = Box::new(self.build_tree(x, y, &left_indices, depth + 1, min_split));
                let right = Box::new(self.build_tree(x, y, &right_indices, depth + 1, min_split));

                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                    n_samples,
                }
            }
            None => self.leaf(&y_subset),
        }
    }

    fn leaf(&self, y: &[f64]) -> TreeNode {
        let value = match self.criterion {
            Criterion::Mse | Criterion::FriedmanMse => mean(y),
            Criterion::Mae => median(y),
        };
        TreeNode::Leaf {
            value,
            n_samples: y.len(),
        }
    }

    /// Best (feature, threshold) over all features, or `None` if no split improves.
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
    ) -> Option<(usize, f64)> {
        // Each feature independently finds its best split
        let feature_results: Vec<Option<(usize, f64, f64)>> = (0..x.ncols())
            .into_par_iter()
            .map(|feature_idx| self.best_split_for_feature(x, y, indices, feature_idx))
            .collect();

        // Earliest feature wins ties so the tree does not depend on scheduling
        let mut best: Option<(usize, f64, f64)> = None;
        for candidate in feature_results.into_iter().flatten() {
            if best.map_or(true, |b| candidate.2 > b.2) {
                best = Some(candidate);
            }
        }
        best.map(|(f, t, _)| (f, t))
    }

    fn best_split_for_feature(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        feature_idx: usize,
    ) -> Option<(usize, f64, f64)> {
        let mut sorted: Vec<(f64, f64)> = indices
            .iter()
            .map(|&i| (x[[i, feature_idx]], y[i]))
            .collect();
        sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

        let n = sorted.len();
        let total_sum: f64 = sorted.iter().map(|s| s.1).sum();
        let total_sq: f64 = sorted.iter().map(|s| s.1 * s.1).sum();
        let parent_impurity = match self.criterion {
            Criterion::Mae => {
                let ys: Vec<f64> = sorted.iter().map(|s| s.1).collect();
                mean_absolute_deviation(&ys)
            }
            _ => total_sq / n as f64 - (total_sum / n as f64).powi(2),
        };

        let mut best_gain = 0.0f64;
        let mut best_threshold = None;
        let mut left_sum = 0.0f64;
        let mut left_sq = 0.0f64;

        for pos in 0..n - 1 {
            let (value, yi) = sorted[pos];
            left_sum += yi;
            left_sq += yi * yi;

            let next_value = sorted[pos + 1].0;
            if next_value <= value {
                continue;
            }

            let n_left = pos + 1;
            let n_right = n - n_left;

            let (nl, nr) = (n_left as f64, n_right as f64);
            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;

            let gain = match self.criterion {
                Criterion::Mse => {
                    let left_imp = left_sq / nl - (left_sum / nl).powi(2);
                    let right_imp = right_sq / nr - (right_sum / nr).powi(2);
                    parent_impurity - (nl * left_imp + nr * right_imp) / n as f64
                }
                Criterion::FriedmanMse => {
                    let diff = left_sum / nl - right_sum / nr;
                    nl * nr * diff * diff / n as f64
                }
                Criterion::Mae => {
                    let left_y: Vec<f64> = sorted[..n_left].iter().map(|s| s.1).collect();
                    let right_y: Vec<f64> = sorted[n_left..].iter().map(|s| s.1).collect();
                    let weighted = nl * mean_absolute_deviation(&left_y)
                        + nr * mean_absolute_deviation(&right_y);
                    parent_impurity - weighted / n as f64
                }
            };

            if gain > best_gain {
                best_gain = gain;
                best_threshold = Some((value + next_value) / 2.0);
            }
        }

        best_threshold.map(|t| (feature_idx, t, best_gain))
    }

    fn predict_sample(node: &TreeNode, sample: &[f64]) -> f64 {
        match node {
            TreeNode::Leaf { value, .. } => *value,
            TreeNode::Split {
                feature_idx,
                threshold,
                left,
                right,
                ..
            } => {
                if sample[*feature_idx] <= *threshold {
                    Self::predict_sample(left, sample)
                } else {
                    Self::predict_sample(right, sample)
                }
            }
        }
    }

    /// Get tree depth (a single leaf has depth 0)
    pub fn get_depth(&self) -> usize {
        fn depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + depth(left).max(depth(right)),
            }
        }
        self.root.as_ref().map_or(0, depth)
    }

    /// Get number of leaves
    pub fn get_n_leaves(&self) -> usize {
        fn count(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => count(left) + count(right),
            }
        }
        self.root.as_ref().map_or(0, count)
    }
}

impl Regressor for DecisionTreeRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_xy(x, y)?;
        if self.max_depth == Some(0) {
            return Err(MlTuningError::InvalidParameter {
                name: "depth".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        self.n_features = x.ncols();
        let min_split = self.min_samples_split.resolve(x.nrows());
        let indices: Vec<usize> = (0..x.nrows()).collect();
        self.root = Some(self.build_tree(x, y, &indices, 0, min_split));
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(MlTuningError::ModelNotFitted)?;
        if x.ncols() != self.n_features {
            return Err(MlTuningError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        let predictions: Vec<f64> = x
            .rows()
            .into_iter()
            .map(|row| Self::predict_sample(root, &row.to_vec()))
            .collect();

        Ok(Array1::from_vec(predictions))
    }
}

fn is_constant(y: &[f64]) -> bool {
    match y.first() {
        None => true,
        Some(&first) => y.iter().all(|&v| (v - first).abs() < 1e-12),
    }
}

fn mean(y: &[f64]) -> f64 {
    if y.is_empty() {
        return 0.0;
    }
    y.iter().sum::<f64>() / y.len() as f64
}

fn median(y: &[f64]) -> f64 {
    if y.is_empty() {
        return 0.0;
    }
    let mut sorted = y.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn mean_absolute_deviation(y: &[f64]) -> f64 {
    if y.is_empty() {
        return 0.0;
    }
    let m = median(y);
    y.iter().map(|&v| (v - m).abs()).sum::<f64>() / y.len() as f64
}
