//! The repeated train/score/aggregate loop

use super::config::EvaluationConfig;
use super::metrics::{calculate_metrics, ClassificationRates};
use super::result::{EvaluationResult, RunRates};
use super::roc::roc_curve;
use crate::error::{Result, ValidatorError};
use crate::export::{save_linear_model, StoredModel};
use crate::optimizer::ModelFamily;
use crate::preprocessing::Scaler;
use crate::reporting::Reporter;
use crate::training::{true_class_probability, BinaryModel};
use crate::utils::{DataLoader, ExampleSet, Timer};
use crate::visualization::LearningCurve;
use ndarray::{Array1, Array2};
use rand_chacha::ChaCha8Rng;
use std::path::{Path, PathBuf};
use tracing::{debug, Level};

const ROC_LABEL: &str = "Positives";
const SINGLE_CLASS_WARNING: &str =
    "Only one class present in the test split, ROC AUC is not defined for this run.";

/// Warning when one class outnumbers another more than threefold
pub fn check_classes_balance(counts: &[usize]) -> Option<String> {
    let max = counts.iter().copied().max()?;
    let min = counts.iter().copied().min()?;
    if max > min.saturating_mul(3) {
        Some("Provided classes are very unbalanced, predictions may not be accurate.".to_string())
    } else {
        None
    }
}

/// Evaluates one model family over repeated random train/test splits.
///
/// The selected hyperparameter is kept across calls until [`Evaluator::reset`];
/// metric lists and recorded curves start empty on every `evaluate`.
pub struct Evaluator<F: ModelFamily, R: Reporter> {
    family: F,
    reporter: R,
    config: EvaluationConfig,
    run_id: u64,
    hyperparameter: Option<f64>,
    rates: RunRates,
    examples: Option<ExampleSet>,
    rng: ChaCha8Rng,
}

impl<F: ModelFamily, R: Reporter> Evaluator<F, R> {
    pub fn new(family: F, reporter: R, config: EvaluationConfig) -> Result<Self> {
        config.validate()?;
        let run_id = config.resolve_run_id();
        let rng = config.rng();
        Ok(Self {
            family,
            reporter,
            config,
            run_id,
            hyperparameter: None,
            rates: RunRates::new(),
            examples: None,
            rng,
        })
    }

    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    pub fn family(&self) -> &F {
        &self.family
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn reporter_mut(&mut self) -> &mut R {
        &mut self.reporter
    }

    /// Cached hyperparameter, if one was selected already
    pub fn hyperparameter(&self) -> Option<f64> {
        self.hyperparameter
    }

    /// Metric lists of the current evaluation
    pub fn rates(&self) -> &RunRates {
        &self.rates
    }

    /// Examples loaded by the last `evaluate` or `load_examples`
    pub fn examples(&self) -> Option<&ExampleSet> {
        self.examples.as_ref()
    }

    /// Evaluate with the thresholds and run count from the configuration
    pub fn evaluate_default(&mut self, path: &Path) -> Result<EvaluationResult> {
        let (phi, deviation, runs) = (
            self.config.accepted_phi,
            self.config.accepted_deviation,
            self.config.n_runs,
        );
        self.evaluate(path, phi, deviation, runs)
    }

    /// Load examples from `path` and evaluate them
    pub fn evaluate(
        &mut self,
        path: &Path,
        accepted_phi: f64,
        accepted_deviation: f64,
        n_runs: usize,
    ) -> Result<EvaluationResult> {
        let examples = self.load_examples(path)?;
        self.evaluate_examples(examples, accepted_phi, accepted_deviation, n_runs)
    }

    /// Read and rescale the examples file, keeping the result for `store_model`
    pub fn load_examples(&mut self, path: &Path) -> Result<ExampleSet> {
        let raw = DataLoader::new(self.config.loader.clone()).load_examples(path)?;
        let scaled = self.scale(raw)?;
        self.examples = Some(scaled.clone());
        Ok(scaled)
    }

    fn scale(&self, examples: ExampleSet) -> Result<ExampleSet> {
        let mut scaler = Scaler::new(self.config.scaler);
        let x = scaler.fit_transform(examples.x())?;
        examples.with_features(x)
    }

    /// Run the train/score loop `n_runs` times on in-memory examples
    pub fn evaluate_examples(
        &mut self,
        examples: ExampleSet,
        accepted_phi: f64,
        accepted_deviation: f64,
        n_runs: usize,
    ) -> Result<EvaluationResult> {
        if n_runs == 0 {
            return Err(ValidatorError::InvalidParameter {
                name: "n_runs".to_string(),
                value: "0".to_string(),
                reason: "at least one run is required".to_string(),
            });
        }
        let timer = Timer::new("evaluate");
        self.reset_rates();

        let counts = examples.class_counts();
        self.reporter.log(
            Level::INFO,
            &format!("Number of examples by y value: [{}, {}]", counts[0], counts[1]),
        );
        if let Some(warning) = check_classes_balance(&counts) {
            self.reporter.log(Level::WARN, &warning);
        }

        if self.reporter.wants_learning_curve() && self.family.learning_curve_enabled() {
            self.store_learning_curve(&examples)?;
        }

        for run in 0..n_runs {
            let split = examples.train_test_split(self.config.test_size, &mut self.rng)?;
            let model = self.train(&split.x_train, &split.y_train)?;
            let rates = self.rate_prediction(model.as_ref(), &split.x_test, &split.y_test)?;
            debug!(run, phi = rates.phi, accuracy = rates.accuracy, "Run rated");
        }

        if let Some(path) = self.reporter.finalize_plot(self.run_id)? {
            self.reporter
                .log(Level::INFO, &format!("Figure stored in {}", path.display()));
        }

        let result =
            EvaluationResult::from_runs(&self.rates, accepted_phi, accepted_deviation, self.run_id);

        self.reporter.log(
            Level::INFO,
            &format!("Accuracy: {:.2}%", result.accuracy() * 100.0),
        );
        self.reporter.log(
            Level::INFO,
            &format!(
                "Precision (predicted elements that are real): {:.2}%",
                result.precision() * 100.0
            ),
        );
        self.reporter.log(
            Level::INFO,
            &format!(
                "Recall (real elements that are predicted): {:.2}%",
                result.recall() * 100.0
            ),
        );
        self.reporter.log(
            Level::INFO,
            &format!("Phi coefficient: {:.2}%", result.phi() * 100.0),
        );
        self.reporter.log(
            Level::INFO,
            &format!("AUC standard desviation: {:.4}", result.auc_deviation()),
        );
        debug!(
            family = self.family.name(),
            runs = n_runs,
            elapsed_ms = timer.elapsed().as_millis() as u64,
            "Evaluation finished"
        );

        self.examples = Some(examples);
        Ok(result)
    }

    /// Hyperparameter for these examples, selecting it on first use only
    pub fn ensure_hyperparameter(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        if let Some(h) = self.hyperparameter {
            return Ok(h);
        }
        let h = self.family.select_hyperparameter(x, y)?;
        self.hyperparameter = Some(h);
        Ok(h)
    }

    /// Unfitted classifier using the cached hyperparameter
    pub fn classifier(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<Box<dyn BinaryModel>> {
        let h = self.ensure_hyperparameter(x, y)?;
        Ok(self.family.build(h))
    }

    /// Build and fit a classifier on the training examples
    pub fn train(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<Box<dyn BinaryModel>> {
        let mut model = self.classifier(x, y)?;
        model.fit(x, y)?;
        Ok(model)
    }

    /// Score a fitted model on the test examples and record the run.
    ///
    /// A test split holding a single class has no ROC curve: its AUC is
    /// recorded as NaN and no curve reaches the reporter.
    pub fn rate_prediction(
        &mut self,
        model: &dyn BinaryModel,
        x_test: &Array2<f64>,
        y_test: &Array1<f64>,
    ) -> Result<ClassificationRates> {
        let proba = model.predict_proba(x_test)?;
        let scores = true_class_probability(&proba, y_test).to_vec();
        let truth: Vec<bool> = y_test.iter().map(|&v| v == 1.0).collect();

        let predicted = model.predict(x_test)?;
        let pred: Vec<bool> = predicted.iter().map(|&v| v == 1.0).collect();
        let rates = calculate_metrics(&truth, &pred)?;

        let both_classes = truth.iter().any(|&t| t) && truth.iter().any(|&t| !t);
        if both_classes {
            let roc = roc_curve(&truth, &scores)?;
            self.rates.push(&rates, roc.auc);
            self.reporter.record_curve(&roc.fpr, &roc.tpr, ROC_LABEL)?;
        } else {
            self.rates.push(&rates, f64::NAN);
            self.reporter.log(Level::WARN, SINGLE_CLASS_WARNING);
        }
        Ok(rates)
    }

    /// Compute the learning curve on all examples and hand it to the reporter
    pub fn store_learning_curve(&mut self, examples: &ExampleSet) -> Result<Option<PathBuf>> {
        let h = self.ensure_hyperparameter(examples.x(), examples.y())?;

        let family = &self.family;
        let mut curve = LearningCurve::new(self.run_id).with_random_state(self.config.random_state);
        curve.set_classifier(move || family.build(h));
        let Some(scores) = curve.compute(examples.x(), examples.y())? else {
            return Ok(None);
        };

        let stored = self.reporter.store_learning_curve(self.run_id, &scores)?;
        if let Some(path) = &stored {
            self.reporter
                .log(Level::INFO, &format!("Figure stored in {}", path.display()));
        }
        Ok(stored)
    }

    /// Fit on every loaded example and write the linear coefficients
    pub fn store_model(&mut self) -> Result<StoredModel> {
        let examples = self.examples.take().ok_or_else(|| {
            ValidatorError::ValidationError("no examples loaded; evaluate first".to_string())
        })?;
        let trained = self.train(examples.x(), examples.y());
        self.examples = Some(examples);

        let params = trained?.linear_parameters().ok_or_else(|| {
            ValidatorError::Unsupported(format!(
                "{} models have no linear coefficients to store",
                self.family.name()
            ))
        })?;
        save_linear_model(&self.config.output_dir, self.run_id, &params)
    }

    /// Clear the metric lists and recorded curves
    pub fn reset_rates(&mut self) {
        self.rates.clear();
        self.reporter.clear_curves();
    }

    /// Clear the rates and forget the selected hyperparameter
    pub fn reset(&mut self) {
        self.reset_rates();
        self.hyperparameter = None;
    }
}
