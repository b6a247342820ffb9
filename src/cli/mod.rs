//! Model Validator CLI Module
//!
//! Command-line interface for evaluating classifiers and storing models.
//! The evaluation result goes to stdout as JSON; the human summary and logs
//! go to stderr.

use clap::{Parser, Subcommand};
use colored::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::evaluation::{EvaluationConfig, EvaluationResult, Evaluator};
use crate::optimizer::{create_family, ModelKind};
use crate::preprocessing::ScalerType;
use crate::reporting::FileReporter;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn step_run(msg: &str) {
    eprint!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    eprintln!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    eprintln!();
    eprintln!("  {}", title.white().bold());
    eprintln!("  {}", dim(&"─".repeat(56)));
}

fn kv(key: &str, val: &str) {
    eprintln!("  {:<22} {}", muted(key), val.white());
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "model-validator")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Gate binary classifiers on phi and AUC stability")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate a model family on an examples file
    Evaluate {
        /// Examples file; the last column holds the 0/1 label
        #[arg(short, long)]
        data: PathBuf,

        /// Model family (logistic, neural)
        #[arg(short, long, default_value = "logistic")]
        model: ModelKind,

        /// Minimum mean phi coefficient
        #[arg(long)]
        accepted_phi: Option<f64>,

        /// Maximum AUC standard deviation across runs
        #[arg(long)]
        accepted_deviation: Option<f64>,

        /// Number of train/test runs
        #[arg(short, long)]
        runs: Option<usize>,

        /// Directory for figures, log file and stored models
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Do not write figures or the log file
        #[arg(long)]
        no_files: bool,

        /// Scaler type (none, standard, minmax, robust, maxabs)
        #[arg(long)]
        scaler: Option<ScalerType>,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Random seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Fit logistic regression on all examples and store its coefficients
    StoreModel {
        /// Examples file; the last column holds the 0/1 label
        #[arg(short, long)]
        data: PathBuf,

        /// Directory for the coefficient files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Random seed
        #[arg(long)]
        seed: Option<u64>,
    },
}

/// Flags that override the configuration file
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub accepted_phi: Option<f64>,
    pub accepted_deviation: Option<f64>,
    pub runs: Option<usize>,
    pub output_dir: Option<PathBuf>,
    pub no_files: bool,
    pub scaler: Option<ScalerType>,
    pub seed: Option<u64>,
}

/// Configuration file (or defaults) with command-line flags applied on top.
/// The run id is pinned so the log file and figures share it.
pub fn build_config(file: Option<&Path>, overrides: &Overrides) -> anyhow::Result<EvaluationConfig> {
    let mut config = match file {
        Some(path) => EvaluationConfig::from_json_file(path)?,
        None => EvaluationConfig::default(),
    };
    if let Some(phi) = overrides.accepted_phi {
        config.accepted_phi = phi;
    }
    if let Some(deviation) = overrides.accepted_deviation {
        config.accepted_deviation = deviation;
    }
    if let Some(runs) = overrides.runs {
        config.n_runs = runs;
    }
    if let Some(dir) = &overrides.output_dir {
        config.output_dir = dir.clone();
    }
    if overrides.no_files {
        config.write_files = false;
    }
    if let Some(scaler) = overrides.scaler {
        config.scaler = scaler;
    }
    if let Some(seed) = overrides.seed {
        config.random_state = Some(seed);
    }
    config.run_id = Some(config.resolve_run_id());
    config.validate()?;
    Ok(config)
}

/// Install the stderr logger and, when given, a plain-text log file
pub fn init_logging(log_file: Option<&Path>) -> anyhow::Result<()> {
    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = File::create(path)?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("model_validator=info")),
        )
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(())
}

/// Run a parsed command; returns the process exit code
pub fn run(cli: Cli) -> anyhow::Result<i32> {
    match cli.command {
        Commands::Evaluate {
            data,
            model,
            accepted_phi,
            accepted_deviation,
            runs,
            output_dir,
            no_files,
            scaler,
            config,
            seed,
        } => {
            let overrides = Overrides {
                accepted_phi,
                accepted_deviation,
                runs,
                output_dir,
                no_files,
                scaler,
                seed,
            };
            let config = build_config(config.as_deref(), &overrides)?;
            init_logging(log_path(&config).as_deref())?;
            cmd_evaluate(&data, model, config)
        }
        Commands::StoreModel {
            data,
            output_dir,
            config,
            seed,
        } => {
            let overrides = Overrides {
                output_dir,
                seed,
                ..Overrides::default()
            };
            let config = build_config(config.as_deref(), &overrides)?;
            init_logging(None)?;
            cmd_store_model(&data, config)?;
            Ok(0)
        }
    }
}

fn log_path(config: &EvaluationConfig) -> Option<PathBuf> {
    if !config.write_files {
        return None;
    }
    let id = config.run_id?;
    Some(config.output_dir.join(format!("{}.log", id)))
}

pub fn cmd_evaluate(data: &Path, kind: ModelKind, config: EvaluationConfig) -> anyhow::Result<i32> {
    section("Evaluate");
    kv("Data", &data.display().to_string());
    kv("Model", &kind.to_string());
    kv("Runs", &config.n_runs.to_string());

    let family = create_family(kind, &config);
    let reporter = FileReporter::new(config.output_dir.clone(), config.write_files);
    let mut evaluator = Evaluator::new(family, reporter, config)?;

    step_run(&format!("Evaluating {}", kind.to_string().cyan()));
    let start = Instant::now();
    let result = evaluator.evaluate_default(data)?;
    step_done(&format!("{:.2?}", start.elapsed()));

    print_summary(&result);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(result.exitcode())
}

pub fn cmd_store_model(data: &Path, config: EvaluationConfig) -> anyhow::Result<()> {
    section("Store model");

    let family = create_family(ModelKind::Logistic, &config);
    let reporter = FileReporter::new(config.output_dir.clone(), false);
    let mut evaluator = Evaluator::new(family, reporter, config)?;

    step_run("Loading examples");
    let examples = evaluator.load_examples(data)?;
    step_done(&format!(
        "{} examples × {} features",
        examples.n_examples(),
        examples.n_features()
    ));

    step_run("Fitting on all examples");
    let stored = evaluator.store_model()?;
    step_done("");

    kv("Coefficients", &stored.coef_path.display().to_string());
    kv("Intercept", &stored.intercept_path.display().to_string());
    eprintln!();
    Ok(())
}

fn print_summary(result: &EvaluationResult) {
    eprintln!();
    kv("AUC", &format!("{:.4}", result.auc()));
    kv("AUC deviation", &format!("{:.4}", result.auc_deviation()));
    kv("Accuracy", &format!("{:.2}%", result.accuracy() * 100.0));
    kv("Precision", &format!("{:.2}%", result.precision() * 100.0));
    kv("Recall", &format!("{:.2}%", result.recall() * 100.0));
    kv("Phi", &format!("{:.4}", result.phi()));
    eprintln!();
    if result.is_accepted() {
        eprintln!("  {} {}", ok("accepted"), dim(&format!("run {}", result.id())));
    } else {
        eprintln!("  {} {}", "rejected".red().bold(), dim(&format!("run {}", result.id())));
        for error in result.errors() {
            eprintln!("  {} {}", "·".red(), error);
        }
    }
    eprintln!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_evaluate() {
        let cli = Cli::try_parse_from([
            "model-validator",
            "evaluate",
            "--data",
            "examples.csv",
            "--model",
            "neural",
            "--runs",
            "3",
            "--no-files",
        ])
        .unwrap();
        match cli.command {
            Commands::Evaluate { model, runs, no_files, .. } => {
                assert_eq!(model, ModelKind::Neural);
                assert_eq!(runs, Some(3));
                assert!(no_files);
            }
            _ => panic!("expected evaluate"),
        }
    }

    #[test]
    fn test_rejects_unknown_model() {
        let parsed = Cli::try_parse_from([
            "model-validator",
            "evaluate",
            "--data",
            "examples.csv",
            "--model",
            "forest",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"accepted_phi": 0.5, "n_runs": 4}"#).unwrap();

        let overrides = Overrides {
            runs: Some(2),
            no_files: true,
            seed: Some(8),
            ..Overrides::default()
        };
        let config = build_config(Some(&path), &overrides).unwrap();
        assert_eq!(config.accepted_phi, 0.5);
        assert_eq!(config.n_runs, 2);
        assert!(!config.write_files);
        assert_eq!(config.random_state, Some(8));
        assert!(config.run_id.is_some());
        assert!(log_path(&config).is_none());
    }

    #[test]
    fn test_log_path_uses_run_id() {
        let mut config = EvaluationConfig::new().with_output_dir("/tmp/out").with_run_id(12);
        assert_eq!(log_path(&config), Some(PathBuf::from("/tmp/out/12.log")));
        config.write_files = false;
        assert_eq!(log_path(&config), None);
    }
}
