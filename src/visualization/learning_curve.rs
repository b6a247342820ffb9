//! Learning curve: accuracy as a function of training-set size

use super::canvas::{lighten, series_color, Chart};
use crate::error::{Result, ValidatorError};
use crate::training::{BinaryModel, CrossValidator};
use crate::utils::{linspace, mean, std_dev};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_FOLDS: usize = 5;
const DEFAULT_POINTS: usize = 5;

/// Builds an unfitted classifier for every fold and size
pub type ClassifierFactory<'a> = Box<dyn Fn() -> Box<dyn BinaryModel> + 'a>;

/// Mean and spread of train/validation accuracy at each training size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningCurveScores {
    pub train_sizes: Vec<usize>,
    pub train_mean: Vec<f64>,
    pub train_std: Vec<f64>,
    pub validation_mean: Vec<f64>,
    pub validation_std: Vec<f64>,
}

impl LearningCurveScores {
    pub fn len(&self) -> usize {
        self.train_sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.train_sizes.is_empty()
    }
}

/// Trains a classifier on growing prefixes of every cross-validation
/// training fold and records train and held-out accuracy.
pub struct LearningCurve<'a> {
    run_id: u64,
    classifier: Option<ClassifierFactory<'a>>,
    n_folds: usize,
    fractions: Vec<f64>,
    random_state: Option<u64>,
}

impl<'a> LearningCurve<'a> {
    pub fn new(run_id: u64) -> Self {
        Self {
            run_id,
            classifier: None,
            n_folds: DEFAULT_FOLDS,
            fractions: linspace(0.1, 1.0, DEFAULT_POINTS),
            random_state: None,
        }
    }

    pub fn with_random_state(mut self, seed: Option<u64>) -> Self {
        self.random_state = seed;
        self
    }

    pub fn with_folds(mut self, n_folds: usize) -> Self {
        self.n_folds = n_folds;
        self
    }

    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    pub fn set_classifier<F>(&mut self, factory: F)
    where
        F: Fn() -> Box<dyn BinaryModel> + 'a,
    {
        self.classifier = Some(Box::new(factory));
    }

    /// Scores per training size, or `None` when there are too few examples
    /// to form the folds
    pub fn compute(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<Option<LearningCurveScores>> {
        let factory = self.classifier.as_ref().ok_or_else(|| {
            ValidatorError::ConfigError("learning curve has no classifier".to_string())
        })?;
        if x.nrows() != y.len() {
            return Err(ValidatorError::ShapeError {
                expected: format!("{} labels", x.nrows()),
                actual: format!("{} labels", y.len()),
            });
        }
        if y.len() < 2 * self.n_folds {
            debug!(examples = y.len(), folds = self.n_folds, "Too few examples for a learning curve");
            return Ok(None);
        }

        let splits = CrossValidator::new(self.n_folds)
        .with_optional_random_state(self.random_state)
        .split(y)?;

        let mut rng = match self.random_state {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        // Folds deal examples class by class, so shuffle before taking prefixes
        let train_orders: Vec<Vec<usize>> = splits
            .iter()
            .map(|split| {
                let mut order = split.train_indices.clone();
                order.shuffle(&mut rng);
                order
            })
            .collect();

        let n_max = train_orders.iter().map(Vec::len).min().unwrap_or(0);
        let mut sizes: Vec<usize> = self
            .fractions
            .iter()
            .map(|f| ((f * n_max as f64) as usize).clamp(1, n_max))
            .collect();
        sizes.dedup();

        let mut scores = LearningCurveScores {
            train_sizes: Vec::with_capacity(sizes.len()),
            train_mean: Vec::with_capacity(sizes.len()),
            train_std: Vec::with_capacity(sizes.len()),
            validation_mean: Vec::with_capacity(sizes.len()),
            validation_std: Vec::with_capacity(sizes.len()),
        };

        for &size in &sizes {
            let mut train_acc = Vec::with_capacity(splits.len());
            let mut valid_acc = Vec::with_capacity(splits.len());
            for (split, order) in splits.iter().zip(&train_orders) {
                let subset = &order[..size];
                let x_train = x.select(Axis(0), subset);
                let y_train = y.select(Axis(0), subset);
                let x_valid = x.select(Axis(0), &split.test_indices);
                let y_valid = y.select(Axis(0), &split.test_indices);

                let mut model = factory();
                model.fit(&x_train, &y_train)?;
                train_acc.push(accuracy(model.as_ref(), &x_train, &y_train)?);
                valid_acc.push(accuracy(model.as_ref(), &x_valid, &y_valid)?);
            }
            scores.train_sizes.push(size);
            scores.train_mean.push(mean(&train_acc));
            scores.train_std.push(std_dev(&train_acc));
            scores.validation_mean.push(mean(&valid_acc));
            scores.validation_std.push(std_dev(&valid_acc));
        }

        Ok(Some(scores))
    }

    /// Compute the curve and render it into `<dir>/<run_id>.learning-curve.png`
    pub fn save(&self, x: &Array2<f64>, y: &Array1<f64>, dir: &Path) -> Result<Option<PathBuf>> {
        match self.compute(x, y)? {
            Some(scores) => plot_learning_curve(&scores, dir, self.run_id).map(Some),
            None => Ok(None),
        }
    }
}

fn accuracy(model: &dyn BinaryModel, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
    let predicted = model.predict(x)?;
    let correct = predicted
        .iter()
        .zip(y.iter())
        .filter(|(p, t)| (*p - *t).abs() < 0.5)
        .count();
    Ok(correct as f64 / y.len().max(1) as f64)
}

/// Render training and validation accuracy with one-std bands
pub fn plot_learning_curve(scores: &LearningCurveScores, dir: &Path, run_id: u64) -> Result<PathBuf> {
    if scores.is_empty() {
        return Err(ValidatorError::ValidationError(
            "learning curve has no points".to_string(),
        ));
    }
    let sizes: Vec<f64> = scores.train_sizes.iter().map(|&s| s as f64).collect();
    let x_min = sizes.first().copied().unwrap_or(0.0);
    let mut x_max = sizes.last().copied().unwrap_or(1.0);
    if x_max <= x_min {
        x_max = x_min + 1.0;
    }

    let mut chart = Chart::new((x_min, x_max), (0.0, 1.05))?;
    chart.draw_frame();

    let curves = [
        (&scores.train_mean, &scores.train_std, series_color(3)),
        (&scores.validation_mean, &scores.validation_std, series_color(2)),
    ];
    for (means, stds, color) in curves {
        let lower: Vec<f64> = means.iter().zip(stds.iter()).map(|(m, s)| m - s).collect();
        let upper: Vec<f64> = means.iter().zip(stds.iter()).map(|(m, s)| m + s).collect();
        chart.band(&sizes, &lower, &upper, lighten(color, 0.8));
    }
    for (means, _, color) in curves {
        chart.line(&sizes, means, color);
    }
    chart.title("Learning curve");
    chart.axis_labels("Training examples", "Score");
    chart.legend(&[
        (series_color(3), "Training score"),
        (series_color(2), "Cross-validation score"),
    ]);

    let path = dir.join(format!("{}.learning-curve.png", run_id));
    chart.save(&path)?;
    Ok(path)
}
