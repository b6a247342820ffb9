//! Grid search over the network learning rate

use super::{first_best, ModelFamily};
use crate::error::{Result, ValidatorError};
use crate::evaluation::calculate_metrics;
use crate::training::{BinaryModel, CVResults, CrossValidator, MLPClassifier, MLPConfig};
use ndarray::{Array1, Array2, Axis};
use tracing::{debug, info};

const EPSILONS: [f64; 15] = [
    1e-6, 5e-6, 1e-5, 5e-5, 1e-4, 5e-4, 1e-3, 5e-3, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0,
];

/// Two-hidden-layer network family; the hyperparameter is the learning rate
#[derive(Debug, Clone)]
pub struct NeuralFamily {
    epsilons: Vec<f64>,
    hidden_layers: Vec<usize>,
    reg_lambda: f64,
    iterations: usize,
    n_folds: usize,
    random_state: Option<u64>,
}

impl Default for NeuralFamily {
    fn default() -> Self {
        Self {
            epsilons: EPSILONS.to_vec(),
            hidden_layers: vec![5, 3],
            reg_lambda: 0.0005,
            iterations: 10_000,
            n_folds: 3,
            random_state: None,
        }
    }
}

impl NeuralFamily {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_epsilons(mut self, epsilons: Vec<f64>) -> Self {
        self.epsilons = epsilons;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_folds(mut self, n_folds: usize) -> Self {
        self.n_folds = n_folds;
        self
    }

    pub fn with_random_state(mut self, seed: Option<u64>) -> Self {
        self.random_state = seed;
        self
    }

    pub fn epsilons(&self) -> &[f64] {
        &self.epsilons
    }

    fn network(&self, epsilon: f64) -> MLPClassifier {
        MLPClassifier::new(MLPConfig {
            hidden_layers: self.hidden_layers.clone(),
            learning_rate: epsilon,
            max_epochs: self.iterations,
            alpha: self.reg_lambda,
            random_state: self.random_state,
            ..MLPConfig::default()
        })
    }

    /// Mean held-out phi of one candidate
    fn cv_phi(&self, epsilon: f64, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let splits = CrossValidator::new(self.n_folds)
        .with_optional_random_state(self.random_state)
        .split(y)?;

        let mut fold_phis = Vec::with_capacity(splits.len());
        for split in &splits {
            let x_train = x.select(Axis(0), &split.train_indices);
            let y_train = y.select(Axis(0), &split.train_indices);
            let x_test = x.select(Axis(0), &split.test_indices);
            let y_test = y.select(Axis(0), &split.test_indices);

            let mut model = self.network(epsilon);
            model.fit(&x_train, &y_train)?;
            let predicted = BinaryModel::predict(&model, &x_test)?;

            let truth: Vec<bool> = y_test.iter().map(|&v| v == 1.0).collect();
            let pred: Vec<bool> = predicted.iter().map(|&v| v == 1.0).collect();
            fold_phis.push(calculate_metrics(&truth, &pred)?.phi);
        }
        let results = CVResults::from_scores(fold_phis);
        debug!(epsilon, mean = results.mean_score, std = results.std_score, "Epsilon scored");
        Ok(results.mean_score)
    }
}

impl ModelFamily for NeuralFamily {
    fn name(&self) -> &str {
        "neural"
    }

    fn select_hyperparameter(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let scores = self
            .epsilons
            .iter()
            .map(|&eps| self.cv_phi(eps, x, y))
            .collect::<Result<Vec<f64>>>()?;
        debug!(?scores, "Cross-validated phi per epsilon");

        let epsilon = first_best(&scores)
            .map(|i| self.epsilons[i])
            .ok_or_else(|| {
                ValidatorError::TrainingError("no epsilon candidate could be scored".to_string())
            })?;
        info!("Best epsilon: {}", epsilon);
        Ok(epsilon)
    }

    fn build(&self, hyperparameter: f64) -> Box<dyn BinaryModel> {
        Box::new(self.network(hyperparameter))
    }

    fn learning_curve_enabled(&self) -> bool {
        false
    }
}
