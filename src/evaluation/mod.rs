//! Evaluation module
//!
//! Scores a model family over repeated random splits and decides whether it
//! is good enough:
//! - [`calculate_metrics`]: confusion-matrix rates and the phi coefficient
//! - [`roc_curve`]: ROC points and trapezoidal AUC
//! - [`Evaluator`]: the train/score/aggregate loop
//! - [`EvaluationResult`]: aggregated verdict with threshold messages

mod config;
mod evaluator;
mod metrics;
mod result;
mod roc;

pub use config::EvaluationConfig;
pub use evaluator::{check_classes_balance, Evaluator};
pub use metrics::{calculate_metrics, ClassificationRates};
pub use result::{EvaluationResult, RunRates};
pub use roc::{roc_curve, trapezoidal_auc, RocCurve};
