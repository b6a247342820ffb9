//! Per-run rates and the aggregated evaluation verdict

use super::metrics::ClassificationRates;
use crate::utils::{mean, std_dev};
use serde::{Deserialize, Serialize};

/// Metric lists accumulated over the runs of one evaluation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunRates {
    pub accuracies: Vec<f64>,
    pub precisions: Vec<f64>,
    pub recalls: Vec<f64>,
    pub phis: Vec<f64>,
    pub aucs: Vec<f64>,
}

impl RunRates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the rates and AUC of one run
    pub fn push(&mut self, rates: &ClassificationRates, auc: f64) {
        self.accuracies.push(rates.accuracy);
        self.precisions.push(rates.precision);
        self.recalls.push(rates.recall);
        self.phis.push(rates.phi);
        self.aucs.push(auc);
    }

    pub fn clear(&mut self) {
        self.accuracies.clear();
        self.precisions.clear();
        self.recalls.clear();
        self.phis.clear();
        self.aucs.clear();
    }

    pub fn len(&self) -> usize {
        self.aucs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aucs.is_empty()
    }
}

/// Outcome of an evaluation campaign.
///
/// `exitcode` is 0 when the model passed both the stability and the quality
/// check, 1 otherwise; `errors` then explains each failed check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    auc: f64,
    accuracy: f64,
    precision: f64,
    recall: f64,
    phi: f64,
    auc_deviation: f64,
    accepted_phi: f64,
    accepted_deviation: f64,
    exitcode: i32,
    errors: Vec<String>,
    id: u64,
}

impl EvaluationResult {
    /// Aggregate the runs and apply the acceptance thresholds
    pub fn from_runs(
        runs: &RunRates,
        accepted_phi: f64,
        accepted_deviation: f64,
        id: u64,
    ) -> Self {
        let auc_deviation = std_dev(&runs.aucs);
        let phi = mean(&runs.phis);

        let mut errors = Vec::new();
        if auc_deviation > accepted_deviation {
            errors.push(format!(
                "The results obtained varied too much, we need more examples to check if this \
                 model is valid. Model deviation = {:.6}, accepted deviation = {:.6}",
                auc_deviation, accepted_deviation
            ));
        }
        if phi < accepted_phi {
            errors.push(format!(
                "The model is not good enough. Model phi = {:.6}, accepted phi = {:.6}",
                phi, accepted_phi
            ));
        }

        Self {
            auc: mean(&runs.aucs),
            accuracy: mean(&runs.accuracies),
            precision: mean(&runs.precisions),
            recall: mean(&runs.recalls),
            phi,
            auc_deviation,
            accepted_phi,
            accepted_deviation,
            exitcode: if errors.is_empty() { 0 } else { 1 },
            errors,
            id,
        }
    }

    pub fn auc(&self) -> f64 {
        self.auc
    }

    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    pub fn precision(&self) -> f64 {
        self.precision
    }

    pub fn recall(&self) -> f64 {
        self.recall
    }

    pub fn phi(&self) -> f64 {
        self.phi
    }

    pub fn auc_deviation(&self) -> f64 {
        self.auc_deviation
    }

    pub fn accepted_phi(&self) -> f64 {
        self.accepted_phi
    }

    pub fn accepted_deviation(&self) -> f64 {
        self.accepted_deviation
    }

    pub fn exitcode(&self) -> i32 {
        self.exitcode
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_accepted(&self) -> bool {
        self.exitcode == 0
    }
}
