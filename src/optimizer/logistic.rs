//! Cross-validated selection of the logistic regression `C`

use super::{first_best, ModelFamily};
use crate::error::{Result, ValidatorError};
use crate::training::{BinaryModel, CVResults, CrossValidator, LogisticRegression};
use crate::utils::logspace;
use ndarray::{Array1, Array2, Axis};
use tracing::{debug, info};

/// Logistic regression family; the hyperparameter is `C`
#[derive(Debug, Clone)]
pub struct LogisticFamily {
    cs: Vec<f64>,
    n_folds: usize,
    max_iter: usize,
    random_state: Option<u64>,
}

impl Default for LogisticFamily {
    fn default() -> Self {
        Self {
            cs: logspace(-4.0, 4.0, 10),
            n_folds: 3,
            max_iter: 1000,
            random_state: None,
        }
    }
}

impl LogisticFamily {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cs(mut self, cs: Vec<f64>) -> Self {
        self.cs = cs;
        self
    }

    pub fn with_folds(mut self, n_folds: usize) -> Self {
        self.n_folds = n_folds;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_random_state(mut self, seed: Option<u64>) -> Self {
        self.random_state = seed;
        self
    }

    pub fn cs(&self) -> &[f64] {
        &self.cs
    }

    /// Mean held-out accuracy of every candidate C on one binary problem
    fn cv_scores(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<Vec<f64>> {
        let splits = CrossValidator::new(self.n_folds)
        .with_optional_random_state(self.random_state)
        .split(y)?;

        let mut means = Vec::with_capacity(self.cs.len());
        for &c in &self.cs {
            let mut fold_scores = Vec::with_capacity(splits.len());
            for split in &splits {
                let x_train = x.select(Axis(0), &split.train_indices);
                let y_train = y.select(Axis(0), &split.train_indices);
                let x_test = x.select(Axis(0), &split.test_indices);
                let y_test = y.select(Axis(0), &split.test_indices);

                let mut model = LogisticRegression::new()
                    .with_c(c)
                    .with_max_iter(self.max_iter);
                model.fit(&x_train, &y_train)?;
                fold_scores.push(model.score(&x_test, &y_test)?);
            }
            means.push(CVResults::from_scores(fold_scores).mean_score);
        }
        Ok(means)
    }

    fn best_c(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let scores = self.cv_scores(x, y)?;
        debug!(?scores, "Cross-validated accuracy per C");
        first_best(&scores)
            .map(|i| self.cs[i])
            .ok_or_else(|| ValidatorError::TrainingError("no C candidate could be scored".to_string()))
    }
}

/// C of the most frequent class.
///
/// One-vs-rest search yields one C per class; the class with the most
/// examples decides, not the best average score. On equal counts the first
/// class wins.
pub fn select_for_majority_class(c_per_class: &[f64], class_counts: &[usize]) -> Result<f64> {
    if c_per_class.is_empty() || c_per_class.len() != class_counts.len() {
        return Err(ValidatorError::ShapeError {
            expected: format!("{} class counts", c_per_class.len()),
            actual: format!("{} class counts", class_counts.len()),
        });
    }
    let mut majority = 0;
    for (i, &count) in class_counts.iter().enumerate() {
        if count > class_counts[majority] {
            majority = i;
        }
    }
    Ok(c_per_class[majority])
}

impl ModelFamily for LogisticFamily {
    fn name(&self) -> &str {
        "logistic"
    }

    fn select_hyperparameter(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        if self.cs.is_empty() {
            return Err(ValidatorError::ConfigError("no C candidates".to_string()));
        }

        let mut classes: Vec<f64> = y.to_vec();
        classes.sort_by(|a, b| a.total_cmp(b));
        classes.dedup();

        let c = if classes.len() <= 2 {
            self.best_c(x, y)?
        } else {
            let mut per_class = Vec::with_capacity(classes.len());
            let mut counts = Vec::with_capacity(classes.len());
            for &class in &classes {
                let y_class = y.mapv(|v| if v == class { 1.0 } else { 0.0 });
                per_class.push(self.best_c(x, &y_class)?);
                counts.push(y.iter().filter(|&&v| v == class).count());
            }
            let c = select_for_majority_class(&per_class, &counts)?;
            info!(
                "From all classes best C values ({:?}), {:.6} has been selected",
                per_class, c
            );
            c
        };

        info!("Best C: {:.6}", c);
        Ok(c)
    }

    fn build(&self, hyperparameter: f64) -> Box<dyn BinaryModel> {
        Box::new(
            LogisticRegression::new()
                .with_c(hyperparameter)
                .with_max_iter(self.max_iter),
        )
    }
}
