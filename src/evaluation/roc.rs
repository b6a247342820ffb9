//! ROC curve and area under it

use crate::error::{Result, ValidatorError};
use serde::{Deserialize, Serialize};

/// Receiver operating characteristic of one scored test set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocCurve {
    /// False positive rate at each threshold, starting at 0
    pub fpr: Vec<f64>,
    /// True positive rate at each threshold, starting at 0
    pub tpr: Vec<f64>,
    /// Score thresholds, descending; the first is +inf
    pub thresholds: Vec<f64>,
    /// Trapezoidal area under the curve
    pub auc: f64,
}

/// Compute the ROC curve from binary labels and ranking scores.
///
/// Examples sharing a score move the curve together, so ties contribute a
/// diagonal segment (half credit) to the area.
pub fn roc_curve(labels: &[bool], scores: &[f64]) -> Result<RocCurve> {
    if labels.is_empty() {
        return Err(ValidatorError::ValidationError("empty score set".to_string()));
    }
    if labels.len() != scores.len() {
        return Err(ValidatorError::ValidationError(format!(
            "labels length {} != scores length {}",
            labels.len(),
            scores.len()
        )));
    }

    let total_pos = labels.iter().filter(|&&l| l).count();
    let total_neg = labels.len() - total_pos;
    if total_pos == 0 || total_neg == 0 {
        return Err(ValidatorError::ValidationError(
            "ROC is undefined when the test set holds a single class".to_string(),
        ));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let p = total_pos as f64;
    let n = total_neg as f64;

    let mut fpr = vec![0.0];
    let mut tpr = vec![0.0];
    let mut thresholds = vec![f64::INFINITY];

    let (mut tp, mut fp) = (0usize, 0usize);
    let mut i = 0;
    while i < order.len() {
        let current = scores[order[i]];
        while i < order.len() && scores[order[i]].total_cmp(&current).is_eq() {
            if labels[order[i]] {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
        }
        fpr.push(fp as f64 / n);
        tpr.push(tp as f64 / p);
        thresholds.push(current);
    }

    let auc = trapezoidal_auc(&fpr, &tpr);
    Ok(RocCurve {
        fpr,
        tpr,
        thresholds,
        auc,
    })
}

/// Area under a piecewise-linear curve by the trapezoidal rule
pub fn trapezoidal_auc(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]).abs() * (ys[1] + ys[0]) / 2.0)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_ranking() {
        let labels = [true, true, false, false];
        let scores = [0.9, 0.8, 0.3, 0.1];
        let roc = roc_curve(&labels, &scores).unwrap();
        assert!((roc.auc - 1.0).abs() < 1e-12);
        assert_eq!(roc.fpr.first(), Some(&0.0));
        assert_eq!(roc.tpr.last(), Some(&1.0));
        assert_eq!(roc.fpr.last(), Some(&1.0));
    }

    #[test]
    fn test_inverted_ranking() {
        let labels = [true, true, false, false];
        let scores = [0.1, 0.2, 0.8, 0.9];
        let roc = roc_curve(&labels, &scores).unwrap();
        assert!(roc.auc.abs() < 1e-12);
    }

    #[test]
    fn test_all_tied_scores() {
        let labels = [true, false, true, false];
        let scores = [0.5; 4];
        let roc = roc_curve(&labels, &scores).unwrap();
        assert!((roc.auc - 0.5).abs() < 1e-12);
        assert_eq!(roc.fpr, vec![0.0, 1.0]);
    }

    #[test]
    fn test_known_curve_points() {
        // scores descending: 0.9 (P), 0.7 (N), 0.6 (P), 0.2 (N)
        let labels = [true, false, true, false];
        let scores = [0.9, 0.7, 0.6, 0.2];
        let roc = roc_curve(&labels, &scores).unwrap();
        assert_eq!(roc.tpr, vec![0.0, 0.5, 0.5, 1.0, 1.0]);
        assert_eq!(roc.fpr, vec![0.0, 0.0, 0.5, 0.5, 1.0]);
        assert!((roc.auc - 0.75).abs() < 1e-12);
        assert_eq!(roc.thresholds[0], f64::INFINITY);
    }

    #[test]
    fn test_single_class_is_an_error() {
        assert!(roc_curve(&[true, true], &[0.4, 0.6]).is_err());
        assert!(roc_curve(&[], &[]).is_err());
        assert!(roc_curve(&[true, false], &[0.4]).is_err());
    }

    #[test]
    fn test_trapezoidal_auc() {
        let x = [0.0, 0.5, 1.0];
        let y = [0.0, 1.0, 1.0];
        assert!((trapezoidal_auc(&x, &y) - 0.75).abs() < 1e-12);
    }
}
