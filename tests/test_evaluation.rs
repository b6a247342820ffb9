//! Integration tests for the evaluation loop: files in, verdicts and figures out

use model_validator::evaluation::{EvaluationConfig, Evaluator};
use model_validator::optimizer::{LogisticFamily, ModelFamily, NeuralFamily};
use model_validator::reporting::{FileReporter, MemoryReporter};
use model_validator::utils::ExampleSet;
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::Level;

// ============================================================================
// Fixtures
// ============================================================================

/// Two gaussian-ish blobs; `spread` controls the overlap
fn blobs(n: usize, spread: f64, seed: u64) -> (Array2<f64>, Array1<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let x = Array2::from_shape_fn((n, 3), |(i, _)| {
        let center = if i % 2 == 0 { 1.0 } else { -1.0 };
        let noise: f64 = (0..4).map(|_| rng.gen::<f64>() - 0.5).sum();
        center + spread * noise
    });
    let y = Array1::from_shape_fn(n, |i| if i % 2 == 0 { 1.0 } else { 0.0 });
    (x, y)
}

/// Examples file with two metadata lines, a header and the label last
fn write_examples(dir: &Path, x: &Array2<f64>, y: &Array1<f64>) -> PathBuf {
    let mut out = String::new();
    writeln!(out, "nfeatures,targetclasses,targettype").unwrap();
    writeln!(out, "{},\"[0,1]\",discrete", x.ncols()).unwrap();
    let header: Vec<String> = (0..x.ncols()).map(|j| format!("f{}", j)).collect();
    writeln!(out, "{},label", header.join(",")).unwrap();
    for (row, label) in x.rows().into_iter().zip(y.iter()) {
        let values: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writeln!(out, "{},{}", values.join(","), label).unwrap();
    }
    let path = dir.join("examples.csv");
    std::fs::write(&path, out).unwrap();
    path
}

fn config(dir: &Path, run_id: u64) -> EvaluationConfig {
    EvaluationConfig::new()
        .with_output_dir(dir)
        .with_random_state(17)
        .with_run_id(run_id)
}

// ============================================================================
// Logistic family
// ============================================================================

#[test]
fn test_logistic_evaluation_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let (x, y) = blobs(120, 0.3, 1);
    let path = write_examples(dir.path(), &x, &y);

    let family = LogisticFamily::new().with_random_state(Some(17)).with_max_iter(300);
    let reporter = FileReporter::new(dir.path(), true);
    let mut evaluator = Evaluator::new(family, reporter, config(dir.path(), 1001)).unwrap();

    let result = evaluator.evaluate(&path, 0.7, 1.0, 3).unwrap();

    assert_eq!(result.exitcode(), 0, "errors: {:?}", result.errors());
    assert!(result.accuracy() > 0.9);
    assert!(result.phi() > 0.8);
    assert_eq!(result.id(), 1001);
    assert!(evaluator.hyperparameter().is_some());

    assert!(dir.path().join("1001.roc.png").exists());
    assert!(dir.path().join("1001.learning-curve.png").exists());
}

#[test]
fn test_result_serializes_all_keys() {
    let dir = tempfile::tempdir().unwrap();
    let (x, y) = blobs(60, 0.3, 2);
    let examples = ExampleSet::new(x, y).unwrap();

    let family = LogisticFamily::new().with_random_state(Some(2)).with_max_iter(200);
    let mut evaluator =
        Evaluator::new(family, MemoryReporter::new(), config(dir.path(), 5)).unwrap();
    let result = evaluator.evaluate_examples(examples, 0.7, 0.02, 1).unwrap();

    let value = serde_json::to_value(&result).unwrap();
    let object = value.as_object().unwrap();
    let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        vec![
            "accepted_deviation",
            "accepted_phi",
            "accuracy",
            "auc",
            "auc_deviation",
            "errors",
            "exitcode",
            "id",
            "phi",
            "precision",
            "recall",
        ]
    );
    assert_eq!(object["id"], 5);
}

#[test]
fn test_zero_deviation_with_several_runs() {
    let dir = tempfile::tempdir().unwrap();
    // Overlapping blobs: every split ranks the test examples differently
    let (x, y) = blobs(80, 0.9, 3);
    let examples = ExampleSet::new(x, y).unwrap();

    let family = LogisticFamily::new().with_random_state(Some(3)).with_max_iter(200);
    let mut evaluator =
        Evaluator::new(family, MemoryReporter::new(), config(dir.path(), 6)).unwrap();
    let result = evaluator.evaluate_examples(examples, -1.0, 0.0, 4).unwrap();

    let aucs = &evaluator.rates().aucs;
    assert_eq!(aucs.len(), 4);
    assert!(aucs.iter().any(|auc| (auc - aucs[0]).abs() > 1e-12));
    assert!(result.auc_deviation() > 0.0);

    assert_eq!(result.exitcode(), 1);
    assert_eq!(result.errors().len(), 1);
    assert!(result.errors()[0].starts_with(
        "The results obtained varied too much, we need more examples to check if this model \
         is valid. Model deviation = "
    ));
    assert!(result.errors()[0].ends_with("accepted deviation = 0.000000"));
}

#[test]
fn test_unreachable_phi_rejects_model() {
    let dir = tempfile::tempdir().unwrap();
    let (x, y) = blobs(80, 2.0, 4);
    let examples = ExampleSet::new(x, y).unwrap();

    let family = LogisticFamily::new().with_random_state(Some(4)).with_max_iter(200);
    let mut evaluator =
        Evaluator::new(family, MemoryReporter::new(), config(dir.path(), 7)).unwrap();
    let result = evaluator.evaluate_examples(examples, 0.99, 1.0, 2).unwrap();

    assert_eq!(result.exitcode(), 1);
    assert_eq!(result.errors().len(), 1);
    assert!(result.errors()[0].starts_with("The model is not good enough. Model phi = "));
}

#[test]
fn test_repeated_evaluations_do_not_leak() {
    let dir = tempfile::tempdir().unwrap();
    let (x, y) = blobs(60, 0.4, 5);
    let examples = ExampleSet::new(x, y).unwrap();

    let family = LogisticFamily::new().with_random_state(Some(5)).with_max_iter(200);
    let mut evaluator =
        Evaluator::new(family, MemoryReporter::new(), config(dir.path(), 8)).unwrap();

    evaluator.evaluate_examples(examples.clone(), 0.5, 1.0, 5).unwrap();
    let c = evaluator.hyperparameter();
    evaluator.evaluate_examples(examples, 0.5, 1.0, 1).unwrap();

    assert_eq!(evaluator.rates().len(), 1);
    assert_eq!(evaluator.reporter().curves.len(), 1);
    assert_eq!(evaluator.hyperparameter(), c);
    assert_eq!(
        evaluator
            .reporter()
            .messages_at(Level::INFO)
            .iter()
            .filter(|m| m.starts_with("Accuracy: "))
            .count(),
        2
    );
}

#[test]
fn test_store_model_after_evaluation() {
    let dir = tempfile::tempdir().unwrap();
    let (x, y) = blobs(60, 0.3, 6);
    let path = write_examples(dir.path(), &x, &y);

    let family = LogisticFamily::new().with_random_state(Some(6)).with_max_iter(200);
    let reporter = FileReporter::new(dir.path(), false);
    let mut evaluator = Evaluator::new(family, reporter, config(dir.path(), 2024)).unwrap();
    evaluator.evaluate(&path, 0.7, 1.0, 1).unwrap();

    let stored = evaluator.store_model().unwrap();
    let coef = std::fs::read_to_string(&stored.coef_path).unwrap();
    let values: Vec<f64> = coef
        .split_whitespace()
        .map(|v| v.parse().unwrap())
        .collect();
    assert_eq!(values.len(), 3);
    assert!(values.iter().all(|v| *v > 0.0));
    assert!(coef.contains("e+") || coef.contains("e-"));
    assert!(dir.path().join("2024.intercept.txt").exists());
    assert!(!dir.path().join("2024.roc.png").exists());
}

#[test]
fn test_single_positive_example_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let (x, _) = blobs(30, 0.3, 10);
    let y = Array1::from_shape_fn(30, |i| if i == 0 { 1.0 } else { 0.0 });
    let examples = ExampleSet::new(x, y).unwrap();

    let family = LogisticFamily::new().with_random_state(Some(10)).with_max_iter(200);
    let mut evaluator =
        Evaluator::new(family, MemoryReporter::new(), config(dir.path(), 12)).unwrap();
    let result = evaluator.evaluate_examples(examples, 0.7, 0.02, 2).unwrap();

    assert_eq!(evaluator.rates().len(), 2);
    assert!(result.auc().is_nan());
    assert!(result.auc_deviation().is_nan());
    assert!(evaluator.reporter().curves.is_empty());
    assert!(evaluator.reporter().contains("ROC AUC is not defined"));
    assert!(evaluator
        .reporter()
        .contains("Provided classes are very unbalanced, predictions may not be accurate."));
    // The only verdict comes from phi
    assert_eq!(result.exitcode(), 1);
    assert_eq!(result.errors().len(), 1);
    assert!(result.errors()[0].starts_with("The model is not good enough"));
}

#[test]
fn test_non_binary_labels_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (x, mut y) = blobs(20, 0.3, 7);
    y[3] = 2.0;
    let path = write_examples(dir.path(), &x, &y);

    let family = LogisticFamily::new();
    let mut evaluator =
        Evaluator::new(family, MemoryReporter::new(), config(dir.path(), 9)).unwrap();
    assert!(evaluator.evaluate(&path, 0.7, 0.02, 1).is_err());
}

// ============================================================================
// Neural family
// ============================================================================

#[test]
fn test_neural_evaluation_skips_learning_curve() {
    let dir = tempfile::tempdir().unwrap();
    let (x, y) = blobs(60, 0.3, 8);
    let examples = ExampleSet::new(x, y).unwrap();

    let family = NeuralFamily::new()
        .with_epsilons(vec![0.01, 0.1])
        .with_iterations(200)
        .with_random_state(Some(8));
    assert!(!family.learning_curve_enabled());

    let reporter = MemoryReporter::new().with_learning_curve();
    let mut evaluator = Evaluator::new(family, reporter, config(dir.path(), 10)).unwrap();
    let result = evaluator.evaluate_examples(examples, 0.0, 1.0, 2).unwrap();

    assert!(evaluator.reporter().learning_curves.is_empty());
    assert!([0.01, 0.1].contains(&evaluator.hyperparameter().unwrap()));
    assert_eq!(evaluator.rates().len(), 2);
    assert!((0.0..=1.0).contains(&result.accuracy()));
}

#[test]
fn test_neural_model_cannot_be_stored() {
    let dir = tempfile::tempdir().unwrap();
    let (x, y) = blobs(40, 0.3, 9);
    let examples = ExampleSet::new(x, y).unwrap();

    let family = NeuralFamily::new()
        .with_epsilons(vec![0.1])
        .with_iterations(50)
        .with_random_state(Some(9));
    let mut evaluator =
        Evaluator::new(family, MemoryReporter::new(), config(dir.path(), 11)).unwrap();
    evaluator.evaluate_examples(examples, 0.0, 1.0, 1).unwrap();
    assert!(evaluator.store_model().is_err());
}
