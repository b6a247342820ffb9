//! Hyperparameter selection module
//!
//! Each model family pairs a search for its single hyperparameter with a
//! factory for classifiers using it:
//! - [`LogisticFamily`]: inverse regularization `C` by cross-validated accuracy
//! - [`NeuralFamily`]: learning rate `epsilon` by a grid search on phi

pub mod logistic;
pub mod neural;

pub use logistic::{select_for_majority_class, LogisticFamily};
pub use neural::NeuralFamily;

use crate::error::{Result, ValidatorError};
use crate::evaluation::EvaluationConfig;
use crate::training::BinaryModel;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Hyperparameter search plus classifier factory for one kind of model
pub trait ModelFamily {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Search the hyperparameter on the given examples
    fn select_hyperparameter(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64>;

    /// Unfitted classifier using `hyperparameter`
    fn build(&self, hyperparameter: f64) -> Box<dyn BinaryModel>;

    /// Whether a learning curve is meaningful for this family
    fn learning_curve_enabled(&self) -> bool {
        true
    }
}

impl<T: ModelFamily + ?Sized> ModelFamily for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn select_hyperparameter(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        (**self).select_hyperparameter(x, y)
    }

    fn build(&self, hyperparameter: f64) -> Box<dyn BinaryModel> {
        (**self).build(hyperparameter)
    }

    fn learning_curve_enabled(&self) -> bool {
        (**self).learning_curve_enabled()
    }
}

/// Available model families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    #[default]
    Logistic,
    Neural,
}

impl std::str::FromStr for ModelKind {
    type Err = ValidatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "logistic" | "lr" => Ok(Self::Logistic),
            "neural" | "nn" | "mlp" => Ok(Self::Neural),
            other => Err(ValidatorError::InvalidParameter {
                name: "model".to_string(),
                value: other.to_string(),
                reason: "expected logistic or neural".to_string(),
            }),
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logistic => write!(f, "logistic"),
            Self::Neural => write!(f, "neural"),
        }
    }
}

/// Build the family for `kind`, seeded and sized from `config`
pub fn create_family(kind: ModelKind, config: &EvaluationConfig) -> Box<dyn ModelFamily> {
    match kind {
        ModelKind::Logistic => {
            Box::new(LogisticFamily::new().with_random_state(config.random_state))
        }
        ModelKind::Neural => Box::new(
            NeuralFamily::new()
                .with_iterations(config.nn_iterations)
                .with_random_state(config.random_state),
        ),
    }
}

/// Index of the first maximum; `None` when empty or all NaN
pub(crate) fn first_best(scores: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if score <= b => {}
            _ => best = Some((i, score)),
        }
    }
    best.map(|(i, _)| i)
}
