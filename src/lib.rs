//! Model Validator - gatekeeping for binary classifiers
//!
//! This crate trains a classifier repeatedly on random splits of a labeled
//! example file and accepts or rejects it:
//! - Mean phi coefficient must reach an accepted minimum
//! - AUC must not vary across runs more than an accepted deviation
//! - ROC and learning curve figures document every campaign
//!
//! # Modules
//!
//! ## Core
//! - [`evaluation`] - Metrics, ROC/AUC and the evaluation loop
//! - [`optimizer`] - Hyperparameter selection per model family
//! - [`training`] - Logistic regression, MLP and cross-validation splitters
//!
//! ## Data
//! - [`preprocessing`] - Feature scaling
//! - [`utils`] - Example loading and splitting
//!
//! ## Output
//! - [`reporting`] - Reporter seam for curves and log lines
//! - [`visualization`] - PNG rendering of ROC and learning curves
//! - [`export`] - Linear model coefficients as numeric text
//!
//! ## Services
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Core
pub mod evaluation;
pub mod optimizer;
pub mod training;

// Data
pub mod preprocessing;
pub mod utils;

// Output
pub mod export;
pub mod reporting;
pub mod visualization;

// Services
pub mod cli;

pub use error::{Result, ValidatorError};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{Result, ValidatorError};

    // Evaluation
    pub use crate::evaluation::{
        calculate_metrics, roc_curve, ClassificationRates, EvaluationConfig, EvaluationResult,
        Evaluator,
    };

    // Model families
    pub use crate::optimizer::{create_family, LogisticFamily, ModelFamily, ModelKind, NeuralFamily};

    // Training
    pub use crate::training::{BinaryModel, LogisticRegression, MLPClassifier, MLPConfig};

    // Data
    pub use crate::preprocessing::{Scaler, ScalerType};
    pub use crate::utils::{DataLoader, ExampleSet, LoaderOptions};

    // Output
    pub use crate::reporting::{FileReporter, MemoryReporter, Reporter};
    pub use crate::visualization::{LearningCurve, RocCurvePlot};
}
