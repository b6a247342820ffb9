//! Linear model implementations

use crate::error::{Result, ValidatorError};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::models::{check_binary_labels, BinaryModel, LinearParameters};

/// Gradient descent step size
const LEARNING_RATE: f64 = 0.5;
/// Stop once the penalized gradient norm falls below this
const TOLERANCE: f64 = 1e-4;

/// L2-regularized binary logistic regression.
///
/// Regularization follows the inverse-strength convention: the penalty on
/// the weights is `1 / (C * n_samples)` per sample, so larger `C` means a
/// weaker penalty. The intercept is never penalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Fitted coefficients
    pub coefficients: Option<Array1<f64>>,
    /// Fitted intercept
    pub intercept: Option<f64>,
    /// Inverse regularization strength
    pub c: f64,
    /// Maximum iterations
    pub max_iter: usize,
    /// Whether model is fitted
    pub is_fitted: bool,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegression {
    /// Create a new logistic regression model
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: None,
            c: 1.0,
            max_iter: 1000,
            is_fitted: false,
        }
    }

    /// Set inverse regularization strength
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Sigmoid function
    fn sigmoid(z: &Array1<f64>) -> Array1<f64> {
        z.mapv(|v| 1.0 / (1.0 + (-v).exp()))
    }

    /// Fit the model using gradient descent.
    ///
    /// The L2 term is applied as an implicit (proximal) step so the update
    /// stays stable for very small `C`.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(ValidatorError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(ValidatorError::TrainingError(
                "cannot fit logistic regression on an empty training set".to_string(),
            ));
        }
        if !(self.c > 0.0) {
            return Err(ValidatorError::InvalidParameter {
                name: "C".to_string(),
                value: self.c.to_string(),
                reason: "must be strictly positive".to_string(),
            });
        }
        check_binary_labels(y)?;

        let mut weights = Array1::zeros(n_features);
        let mut bias = 0.0;

        let lr = LEARNING_RATE;
        let alpha = 1.0 / (self.c * n_samples as f64);
        let shrink = 1.0 / (1.0 + lr * alpha);

        for _iter in 0..self.max_iter {
            let linear = x.dot(&weights) + bias;
            let predictions = Self::sigmoid(&linear);

            let errors = &predictions - y;
            let dw = x.t().dot(&errors) / n_samples as f64;
            let db = errors.mean().unwrap_or(0.0);

            let penalized = &dw + &(alpha * &weights);
            let grad_norm = (penalized.mapv(|v| v * v).sum() + db * db).sqrt();
            if grad_norm < TOLERANCE {
                break;
            }

            weights = (weights - lr * dw) * shrink;
            bias -= lr * db;
        }

        self.coefficients = Some(weights);
        self.intercept = Some(bias);
        self.is_fitted = true;

        Ok(self)
    }

    /// Predict the probability of the positive class
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = match (&self.coefficients, self.is_fitted) {
            (Some(c), true) => c,
            _ => return Err(ValidatorError::ModelNotFitted),
        };
        if x.ncols() != coefficients.len() {
            return Err(ValidatorError::ShapeError {
                expected: format!("{} features", coefficients.len()),
                actual: format!("{} features", x.ncols()),
            });
        }
        let intercept = self.intercept.unwrap_or(0.0);

        let linear = x.dot(coefficients) + intercept;
        Ok(Self::sigmoid(&linear))
    }

    /// Predict class labels at the 0.5 boundary
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }

    /// Get accuracy score
    pub fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let y_pred = self.predict(x)?;

        let correct = y_pred
            .iter()
            .zip(y.iter())
            .filter(|(pred, actual)| (*pred - *actual).abs() < 0.5)
            .count();

        Ok(correct as f64 / y.len() as f64)
    }
}

impl BinaryModel for LogisticRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        LogisticRegression::fit(self, x, y).map(|_| ())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        LogisticRegression::predict_proba(self, x)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        LogisticRegression::predict(self, x)
    }

    fn linear_parameters(&self) -> Option<LinearParameters> {
        match (&self.coefficients, self.intercept) {
            (Some(coefficients), Some(intercept)) if self.is_fitted => Some(LinearParameters {
                coefficients: coefficients.clone(),
                intercept,
            }),
            _ => None,
        }
    }
}
