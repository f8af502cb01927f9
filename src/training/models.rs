//! Regressor capability and loss metric

use crate::error::{MlTuningError, Result};
use ndarray::{Array1, Array2};

/// The fit/predict capability the evaluation protocol relies on.
///
/// Implementations are instantiated fresh for every fit; the protocol never
/// reuses a fitted regressor across folds.
pub trait Regressor: Send + Sync {
    /// Fit the model to training data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Make predictions
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;
}

/// Mean squared error between targets and predictions
pub fn mean_squared_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    if y_true.len() != y_pred.len() {
        return Err(MlTuningError::ShapeError {
            expected: format!("{} predictions", y_true.len()),
            actual: format!("{} predictions", y_pred.len()),
        });
    }
    if y_true.is_empty() {
        return Err(MlTuningError::DataError(
            "cannot compute mean squared error of an empty set".to_string(),
        ));
    }

    let n = y_true.len() as f64;
    Ok(y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum::<f64>()
        / n)
}

/// Check that `x` and `y` describe the same number of samples
pub(crate) fn check_xy(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(MlTuningError::ShapeError {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    if x.nrows() == 0 {
        return Err(MlTuningError::DataError("cannot fit on zero samples".to_string()));
    }
    Ok(())
}
