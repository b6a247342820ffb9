//! Model training module
//!
//! The classifiers the validator fits during evaluation:
//! - Logistic regression with inverse regularization strength `C`
//! - A small feedforward neural network (MLP)
//! - Cross-validation splitters used by hyperparameter selection

mod models;
pub mod cross_validation;
pub mod linear_models;
pub mod neural_network;

pub use cross_validation::{CrossValidator, CVSplit, CVResults};
pub use linear_models::LogisticRegression;
pub use models::{check_binary_labels, true_class_probability, BinaryModel, LinearParameters};
pub use neural_network::{MLPClassifier, MLPConfig};
