//! Confusion-matrix rates for a single evaluation run

use crate::error::{Result, ValidatorError};
use serde::{Deserialize, Serialize};

/// Confusion counts and the rates derived from them
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRates {
    pub tp: usize,
    pub tn: usize,
    pub fp: usize,
    #[serde(rename = "fn")]
    pub fn_: usize,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub phi: f64,
}

/// Accuracy, precision, recall and phi from ground-truth and predicted
/// positive flags.
///
/// Precision is 0 when nothing was predicted positive, recall is 0 when
/// nothing is actually positive, and phi is 0 whenever any confusion-matrix
/// margin is empty.
pub fn calculate_metrics(y_true: &[bool], y_pred: &[bool]) -> Result<ClassificationRates> {
    if y_true.len() != y_pred.len() {
        return Err(ValidatorError::ValidationError(format!(
            "truth and prediction lengths differ: {} != {}",
            y_true.len(),
            y_pred.len()
        )));
    }
    if y_true.is_empty() {
        return Err(ValidatorError::ValidationError(
            "cannot rate an empty prediction set".to_string(),
        ));
    }

    let (mut tp, mut tn, mut fp, mut fn_) = (0usize, 0usize, 0usize, 0usize);
    for (&truth, &pred) in y_true.iter().zip(y_pred.iter()) {
        match (truth, pred) {
            (true, true) => tp += 1,
            (false, false) => tn += 1,
            (false, true) => fp += 1,
            (true, false) => fn_ += 1,
        }
    }

    let accuracy = (tp + tn) as f64 / y_true.len() as f64;
    let precision = if tp + fp > 0 {
        tp as f64 / (tp + fp) as f64
    } else {
        0.0
    };
    let recall = if tp + fn_ > 0 {
        tp as f64 / (tp + fn_) as f64
    } else {
        0.0
    };

    // Products in f64: four margins multiplied overflow usize on large test sets
    let denominator =
        (tp + fp) as f64 * (tp + fn_) as f64 * (tn + fp) as f64 * (tn + fn_) as f64;
    let phi = if denominator != 0.0 {
        ((tp * tn) as f64 - (fp * fn_) as f64) / denominator.sqrt()
    } else {
        0.0
    };

    Ok(ClassificationRates {
        tp,
        tn,
        fp,
        fn_,
        accuracy,
        precision,
        recall,
        phi,
    })
}
