//! Neural Network (Multi-Layer Perceptron) classifier
//!
//! A small feedforward network with a two-unit softmax output, trained by
//! backpropagation.

use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use super::models::{check_binary_labels, BinaryModel};
use crate::error::{Result, ValidatorError};

/// Neural Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MLPConfig {
    /// Hidden layer sizes; hidden units use `tanh`
    pub hidden_layers: Vec<usize>,
    /// Learning rate (epsilon)
    pub learning_rate: f64,
    /// Number of full-batch gradient steps
    pub max_epochs: usize,
    /// L2 regularization
    pub alpha: f64,
    /// Random seed
    pub random_state: Option<u64>,
}

impl Default for MLPConfig {
    fn default() -> Self {
        Self {
            hidden_layers: vec![5, 3],
            learning_rate: 0.01,
            max_epochs: 10_000,
            alpha: 0.0005,
            random_state: None,
        }
    }
}

/// Multi-Layer Perceptron binary classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MLPClassifier {
    config: MLPConfig,
    weights: Vec<Array2<f64>>,
    biases: Vec<Array1<f64>>,
    n_features: usize,
    is_fitted: bool,
}

const N_OUTPUTS: usize = 2;

impl MLPClassifier {
    pub fn new(config: MLPConfig) -> Self {
        Self {
            config,
            weights: Vec::new(),
            biases: Vec::new(),
            n_features: 0,
            is_fitted: false,
        }
    }

    pub fn config(&self) -> &MLPConfig {
        &self.config
    }

    /// Fit the model
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(ValidatorError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(ValidatorError::TrainingError(
                "cannot fit a network on an empty training set".to_string(),
            ));
        }
        if !(self.config.learning_rate > 0.0) {
            return Err(ValidatorError::InvalidParameter {
                name: "learning_rate".to_string(),
                value: self.config.learning_rate.to_string(),
                reason: "must be strictly positive".to_string(),
            });
        }
        check_binary_labels(y)?;
        self.n_features = x.ncols();

        let mut rng = match self.config.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        self.initialize_weights(&mut rng);

        let y_onehot = Self::to_onehot(y);
        let lr = self.config.learning_rate;
        let decay = 1.0 - self.config.alpha * lr;

        for _epoch in 0..self.config.max_epochs {
            let (activations, z_values) = self.forward(x);
            let gradients = self.backward(&y_onehot, &activations, &z_values);

            for (i, (grad_w, grad_b)) in gradients.into_iter().enumerate() {
                self.weights[i] = (&self.weights[i] - &(grad_w * lr)) * decay;
                self.biases[i] = &self.biases[i] - &(grad_b * lr);
            }
        }

        self.is_fitted = true;
        Ok(())
    }

    /// Softmax output rows: column 0 is P(y = 0), column 1 is P(y = 1)
    pub fn predict_proba_matrix(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(ValidatorError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(ValidatorError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }
        let (mut activations, _) = self.forward(x);
        activations.pop().ok_or(ValidatorError::ModelNotFitted)
    }

    fn initialize_weights(&mut self, rng: &mut Xoshiro256PlusPlus) {
        self.weights.clear();
        self.biases.clear();

        let mut layer_sizes = vec![self.n_features];
        layer_sizes.extend(&self.config.hidden_layers);
        layer_sizes.push(N_OUTPUTS);

        for pair in layer_sizes.windows(2) {
            let (n_in, n_out) = (pair[0], pair[1]);

            // Xavier/Glorot initialization
            let scale = (2.0 / (n_in + n_out) as f64).sqrt();

            self.weights.push(Array2::from_shape_fn((n_in, n_out), |_| {
                rng.gen::<f64>() * 2.0 * scale - scale
            }));
            self.biases.push(Array1::zeros(n_out));
        }
    }

    fn forward(&self, x: &Array2<f64>) -> (Vec<Array2<f64>>, Vec<Array2<f64>>) {
        let mut activations = vec![x.clone()];
        let mut z_values = Vec::with_capacity(self.weights.len());
        let last = self.weights.len().saturating_sub(1);

        for (i, (w, b)) in self.weights.iter().zip(self.biases.iter()).enumerate() {
            let z = activations[i].dot(w) + b;

            let a = if i < last {
                z.mapv(f64::tanh)
            } else {
                Self::softmax(&z)
            };

            z_values.push(z);
            activations.push(a);
        }

        (activations, z_values)
    }

    fn backward(
        &self,
        y_onehot: &Array2<f64>,
        activations: &[Array2<f64>],
        z_values: &[Array2<f64>],
    ) -> Vec<(Array2<f64>, Array1<f64>)> {
        let n = y_onehot.nrows() as f64;
        let mut gradients = Vec::with_capacity(self.weights.len());

        // Cross-entropy gradient with softmax
        let mut delta = (&activations[self.weights.len()] - y_onehot) / n;

        for i in (0..self.weights.len()).rev() {
            let a_prev = &activations[i];

            let grad_w = a_prev.t().dot(&delta);
            let grad_b = delta.sum_axis(Axis(0));

            gradients.push((grad_w, grad_b));

            if i > 0 {
                let z = &z_values[i - 1];
                let t = z.mapv(f64::tanh);
                delta = delta.dot(&self.weights[i].t()) * (1.0 - &t * &t);
            }
        }

        gradients.reverse();
        gradients
    }

    fn softmax(z: &Array2<f64>) -> Array2<f64> {
        let mut result = z.clone();
        for mut row in result.rows_mut() {
            let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let exp_sum: f64 = row.iter().map(|&v| (v - max).exp()).sum();
            for v in row.iter_mut() {
                *v = (*v - max).exp() / exp_sum;
            }
        }
        result
    }

    fn to_onehot(y: &Array1<f64>) -> Array2<f64> {
        let mut onehot = Array2::zeros((y.len(), N_OUTPUTS));
        for (i, &label) in y.iter().enumerate() {
            onehot[[i, label as usize]] = 1.0;
        }
        onehot
    }
}

impl BinaryModel for MLPClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        MLPClassifier::fit(self, x, y)
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(self.predict_proba_matrix(x)?.column(1).to_owned())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba_matrix(x)?;
        Ok(proba
            .rows()
            .into_iter()
            .map(|row| if row[1] > row[0] { 1.0 } else { 0.0 })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_classification_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_vec((100, 2), (0..200).map(|i| (i as f64) * 0.05).collect())
            .unwrap();

        let y: Array1<f64> = x
            .rows()
            .into_iter()
            .map(|row| if row[0] + row[1] > 5.0 { 1.0 } else { 0.0 })
            .collect();

        (x, y)
    }

    #[test]
    fn test_mlp_classifier() {
        let (x, y) = create_classification_data();

        let config = MLPConfig {
            hidden_layers: vec![8, 4],
            max_epochs: 1000,
            learning_rate: 0.5,
            random_state: Some(42),
            ..Default::default()
        };

        let mut mlp = MLPClassifier::new(config);
        mlp.fit(&x, &y).unwrap();

        let predictions = BinaryModel::predict(&mlp, &x).unwrap();
        assert_eq!(predictions.len(), 100);

        let correct: usize = y
            .iter()
            .zip(predictions.iter())
            .filter(|(&yi, &pi)| (yi - pi).abs() < 0.5)
            .count();

        let accuracy = correct as f64 / y.len() as f64;
        assert!(accuracy > 0.7, "Accuracy ({}) should be above 70%", accuracy);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let (x, y) = create_classification_data();
        let mut mlp = MLPClassifier::new(MLPConfig {
            max_epochs: 20,
            random_state: Some(7),
            ..Default::default()
        });
        mlp.fit(&x, &y).unwrap();

        let proba = mlp.predict_proba_matrix(&x).unwrap();
        for row in proba.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
        let positive = BinaryModel::predict_proba(&mlp, &x).unwrap();
        assert_eq!(positive.len(), 100);
    }

    #[test]
    fn test_seeded_fit_is_reproducible() {
        let (x, y) = create_classification_data();
        let config = MLPConfig {
            max_epochs: 50,
            random_state: Some(11),
            ..Default::default()
        };
        let mut a = MLPClassifier::new(config.clone());
        let mut b = MLPClassifier::new(config);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        assert_eq!(
            a.predict_proba_matrix(&x).unwrap(),
            b.predict_proba_matrix(&x).unwrap()
        );
    }

    #[test]
    fn test_fit_rejects_non_positive_learning_rate() {
        let (x, y) = create_classification_data();
        let mut mlp = MLPClassifier::new(MLPConfig {
            learning_rate: 0.0,
            ..Default::default()
        });
        assert!(matches!(
            mlp.fit(&x, &y),
            Err(ValidatorError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_predict_before_fit() {
        let mlp = MLPClassifier::new(MLPConfig::default());
        let x = Array2::zeros((1, 2));
        assert!(matches!(
            mlp.predict_proba_matrix(&x),
            Err(ValidatorError::ModelNotFitted)
        ));
    }
}
