//! Side-effect seam of the evaluation loop.
//!
//! The evaluator hands curves, figures and log lines to a [`Reporter`];
//! [`FileReporter`] renders PNGs and forwards to `tracing`, while
//! [`MemoryReporter`] keeps everything in memory.

use crate::error::Result;
use crate::visualization::{plot_learning_curve, LearningCurveScores, RocCurvePlot};
use std::path::{Path, PathBuf};
use tracing::Level;

/// Figure number of the combined ROC diagram
const ROC_FIGURE: u32 = 2;

/// Destination for the evaluation's curves and messages
pub trait Reporter {
    /// Record one ROC curve for the current evaluation
    fn record_curve(&mut self, fpr: &[f64], tpr: &[f64], label: &str) -> Result<()>;

    /// Produce the combined ROC figure; `None` when nothing is written
    fn finalize_plot(&mut self, run_id: u64) -> Result<Option<PathBuf>>;

    /// Emit one log line
    fn log(&mut self, level: Level, message: &str);

    /// Drop the curves recorded so far
    fn clear_curves(&mut self);

    /// Whether a learning curve should be computed at all
    fn wants_learning_curve(&self) -> bool {
        false
    }

    /// Persist learning curve scores; `None` when nothing is written
    fn store_learning_curve(
        &mut self,
        _run_id: u64,
        _scores: &LearningCurveScores,
    ) -> Result<Option<PathBuf>> {
        Ok(None)
    }
}

/// Forward a message to the `tracing` macro for its level
pub fn emit(level: Level, message: &str) {
    if level == Level::ERROR {
        tracing::error!("{}", message);
    } else if level == Level::WARN {
        tracing::warn!("{}", message);
    } else if level == Level::INFO {
        tracing::info!("{}", message);
    } else if level == Level::DEBUG {
        tracing::debug!("{}", message);
    } else {
        tracing::trace!("{}", message);
    }
}

/// Writes figures under an output directory and logs through `tracing`
pub struct FileReporter {
    plot: RocCurvePlot,
    write_files: bool,
}

impl FileReporter {
    /// Figures go to `dir`; with `write_files` false only logging happens
    pub fn new(dir: impl Into<PathBuf>, write_files: bool) -> Self {
        Self {
            plot: RocCurvePlot::new(dir, ROC_FIGURE),
            write_files,
        }
    }

    pub fn dir(&self) -> &Path {
        self.plot.dir()
    }

    pub fn writes_files(&self) -> bool {
        self.write_files
    }
}

impl Reporter for FileReporter {
    fn record_curve(&mut self, fpr: &[f64], tpr: &[f64], label: &str) -> Result<()> {
        self.plot.add(fpr, tpr, label)
    }

    fn finalize_plot(&mut self, run_id: u64) -> Result<Option<PathBuf>> {
        if !self.write_files {
            return Ok(None);
        }
        self.plot.store(run_id).map(Some)
    }

    fn log(&mut self, level: Level, message: &str) {
        emit(level, message);
    }

    fn clear_curves(&mut self) {
        self.plot.clear();
    }

    fn wants_learning_curve(&self) -> bool {
        self.write_files
    }

    fn store_learning_curve(
        &mut self,
        run_id: u64,
        scores: &LearningCurveScores,
    ) -> Result<Option<PathBuf>> {
        if !self.write_files {
            return Ok(None);
        }
        plot_learning_curve(scores, self.plot.dir(), run_id).map(Some)
    }
}

/// A recorded curve
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCurve {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    pub label: String,
}

/// Keeps curves, figures and messages in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryReporter {
    pub curves: Vec<RecordedCurve>,
    pub finalized: Vec<u64>,
    pub messages: Vec<(Level, String)>,
    pub learning_curves: Vec<(u64, LearningCurveScores)>,
    learning_curve: bool,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also request learning curves from the evaluator
    pub fn with_learning_curve(mut self) -> Self {
        self.learning_curve = true;
        self
    }

    /// Messages logged at `level`
    pub fn messages_at(&self, level: Level) -> Vec<&str> {
        self.messages
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.as_str())
            .collect()
    }

    pub fn contains(&self, fragment: &str) -> bool {
        self.messages.iter().any(|(_, m)| m.contains(fragment))
    }
}

impl Reporter for MemoryReporter {
    fn record_curve(&mut self, fpr: &[f64], tpr: &[f64], label: &str) -> Result<()> {
        self.curves.push(RecordedCurve {
            fpr: fpr.to_vec(),
            tpr: tpr.to_vec(),
            label: label.to_string(),
        });
        Ok(())
    }

    fn finalize_plot(&mut self, run_id: u64) -> Result<Option<PathBuf>> {
        self.finalized.push(run_id);
        Ok(None)
    }

    fn log(&mut self, level: Level, message: &str) {
        self.messages.push((level, message.to_string()));
    }

    fn clear_curves(&mut self) {
        self.curves.clear();
    }

    fn wants_learning_curve(&self) -> bool {
        self.learning_curve
    }

    fn store_learning_curve(
        &mut self,
        run_id: u64,
        scores: &LearningCurveScores,
    ) -> Result<Option<PathBuf>> {
        self.learning_curves.push((run_id, scores.clone()));
        Ok(None)
    }
}
