use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use model_validator::evaluation::{calculate_metrics, roc_curve, EvaluationConfig, Evaluator};
use model_validator::optimizer::{LogisticFamily, ModelFamily};
use model_validator::reporting::MemoryReporter;
use model_validator::utils::ExampleSet;
use ndarray::{Array1, Array2};
use rand::prelude::*;

fn create_classification_data(n_rows: usize, n_features: usize) -> ExampleSet {
    let mut rng = rand::thread_rng();

    let y = Array1::from_shape_fn(n_rows, |i| if i % 2 == 0 { 1.0 } else { 0.0 });
    let x = Array2::from_shape_fn((n_rows, n_features), |(i, _)| {
        let center = if y[i] == 1.0 { 0.5 } else { -0.5 };
        center + rng.gen::<f64>() - 0.5
    });

    ExampleSet::new(x, y).unwrap()
}

fn bench_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("metrics");
    let mut rng = rand::thread_rng();

    for n in [1_000, 10_000, 100_000].iter() {
        let labels: Vec<bool> = (0..*n).map(|i| i % 3 == 0).collect();
        let predicted: Vec<bool> = (0..*n).map(|_| rng.gen::<bool>()).collect();
        let scores: Vec<f64> = (0..*n).map(|_| rng.gen::<f64>()).collect();

        group.bench_with_input(BenchmarkId::new("confusion", n), n, |b, _| {
            b.iter(|| calculate_metrics(black_box(&labels), black_box(&predicted)).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("roc", n), n, |b, _| {
            b.iter(|| roc_curve(black_box(&labels), black_box(&scores)).unwrap())
        });
    }

    group.finish();
}

fn bench_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection");
    group.sample_size(10); // Cross-validation over ten C values is slow

    for n_rows in [200, 1000].iter() {
        let examples = create_classification_data(*n_rows, 5);
        let family = LogisticFamily::new().with_random_state(Some(1)).with_max_iter(200);

        group.bench_with_input(BenchmarkId::new("logistic_c", n_rows), n_rows, |b, _| {
            b.iter(|| {
                family
                    .select_hyperparameter(black_box(examples.x()), black_box(examples.y()))
                    .unwrap()
            })
        });
    }

    group.finish();
}

fn bench_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluation");
    group.sample_size(10);

    let examples = create_classification_data(1000, 5);
    let config = EvaluationConfig::new()
        .with_files(false)
        .with_random_state(3)
        .with_run_id(1);
    let family = LogisticFamily::new().with_random_state(Some(3)).with_max_iter(200);
    let mut evaluator = Evaluator::new(family, MemoryReporter::new(), config).unwrap();
    // Select C once; the runs reuse it
    evaluator.ensure_hyperparameter(examples.x(), examples.y()).unwrap();

    for runs in [1usize, 5].iter() {
        group.bench_with_input(BenchmarkId::new("runs", runs), runs, |b, &runs| {
            b.iter(|| {
                evaluator
                    .evaluate_examples(black_box(examples.clone()), 0.7, 0.02, runs)
                    .unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_metrics, bench_selection, bench_evaluation);
criterion_main!(benches);
