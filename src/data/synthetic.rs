//! Synthetic regression data generated from a target function

use crate::data::Dataset;
use crate::error::{MlTuningError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-coordinate function whose row sum is the label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetFunction {
    Sin,
    Cos,
    Square,
}

impl TargetFunction {
    pub fn apply(&self, v: f64) -> f64 {
        match self {
            TargetFunction::Sin => v.sin(),
            TargetFunction::Cos => v.cos(),
            TargetFunction::Square => v * v,
        }
    }

    /// `sum(target(row))` for every row of `x`
    pub fn labels(&self, x: &Array2<f64>) -> Array1<f64> {
        x.map_axis(Axis(1), |row| row.iter().map(|&v| self.apply(v)).sum())
    }
}

/// `n` evenly spaced values `i / n` covering `[0, 1)`
pub fn evenly_spaced(n: usize) -> Vec<f64> {
    let step = 1.0 / n as f64;
    (0..n).map(|i| i as f64 * step).collect()
}

/// `num_data × dimension` grid over `[0, 1)`, filled row-major, rows shuffled
pub fn training_features(
    num_data: usize,
    dimension: usize,
    rng: &mut impl Rng,
) -> Result<Array2<f64>> {
    let grid = Array2::from_shape_vec((num_data, dimension), evenly_spaced(num_data * dimension))?;
    let mut order: Vec<usize> = (0..num_data).collect();
    order.shuffle(rng);
    Ok(grid.select(Axis(0), &order))
}

/// Fresh test population: `size` grid values shuffled as a flat vector, then
/// reshaped to `(size / dimension) × dimension`.
pub fn test_set(
    size: usize,
    dimension: usize,
    target: TargetFunction,
    rng: &mut impl Rng,
) -> Result<Dataset> {
    if dimension == 0 || size % dimension != 0 {
        return Err(MlTuningError::ConfigError(format!(
            "synthetic test set of {} values cannot be reshaped to dimension {}",
            size, dimension
        )));
    }

    let mut values = evenly_spaced(size);
    values.shuffle(rng);
    let features = Array2::from_shape_vec((size / dimension, dimension), values)?;
    let labels = target.labels(&features);
    Dataset::new(features, labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn test_target_labels_sum_over_row() {
        let x = array![[0.0, 0.5], [0.25, 0.25]];
        let square = TargetFunction::Square.labels(&x);
        assert_eq!(square, array![0.25, 0.125]);

        let cos = TargetFunction::Cos.labels(&x);
        assert!((cos[0] - (1.0 + 0.5f64.cos())).abs() < 1e-12);
    }

    #[test]
    fn test_training_grid_is_a_row_permutation() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        let x = training_features(120, 2, &mut rng).unwrap();
        assert_eq!(x.dim(), (120, 2));

        // Every row is still a consecutive pair (2k/240, (2k+1)/240)
        let mut firsts: Vec<usize> = x
            .rows()
            .into_iter()
            .map(|row| {
                let k = (row[0] * 240.0).round() as usize;
                assert!((row[1] - (k + 1) as f64 / 240.0).abs() < 1e-12);
                k
            })
            .collect();
        firsts.sort_unstable();
        assert_eq!(firsts, (0..120).map(|k| 2 * k).collect::<Vec<_>>());
    }

    #[test]
    fn test_grid_in_unit_interval() {
        let grid = evenly_spaced(360);
        assert_eq!(grid.len(), 360);
        assert_eq!(grid[0], 0.0);
        assert!(grid.iter().all(|&v| (0.0..1.0).contains(&v)));
    }

    #[test]
    fn test_test_set_shape() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        let ts = test_set(60000, 3, TargetFunction::Sin, &mut rng).unwrap();
        assert_eq!(ts.features.dim(), (20000, 3));
        assert_eq!(ts.labels.len(), 20000);

        assert!(test_set(60000, 7, TargetFunction::Sin, &mut rng)
            .unwrap_err()
            .is_config_error());
    }
}
