//! Model traits shared by the classifiers the validator trains

use crate::error::{Result, ValidatorError};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Coefficients and intercept of a fitted linear decision function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearParameters {
    pub coefficients: Array1<f64>,
    pub intercept: f64,
}

/// A binary classifier over labels in {0, 1}
pub trait BinaryModel {
    /// Fit the model to training data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Probability of the positive class for every row
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Hard labels at the model's default decision boundary
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Linear coefficients, for models that have them
    fn linear_parameters(&self) -> Option<LinearParameters> {
        None
    }
}

/// Fails unless every label is exactly 0 or 1.
pub fn check_binary_labels(y: &Array1<f64>) -> Result<()> {
    match y.iter().find(|&&v| v != 0.0 && v != 1.0) {
        Some(bad) => Err(ValidatorError::ValidationError(format!(
            "labels must be 0 or 1, found {}",
            bad
        ))),
        None => Ok(()),
    }
}

/// Probability assigned to each example's true class.
///
/// `proba_positive[i]` is P(y = 1); for negative examples the complement is
/// taken.
pub fn true_class_probability(proba_positive: &Array1<f64>, y: &Array1<f64>) -> Array1<f64> {
    proba_positive
        .iter()
        .zip(y.iter())
        .map(|(&p, &label)| if label == 1.0 { p } else { 1.0 - p })
        .collect()
}
