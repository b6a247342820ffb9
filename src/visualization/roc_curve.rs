//! Combined ROC diagram across evaluation runs

use super::canvas::{series_color, Chart};
use crate::error::{Result, ValidatorError};
use image::Rgb;
use std::path::{Path, PathBuf};
use tracing::debug;

const DIAGONAL: Rgb<u8> = Rgb([90, 90, 90]);

/// One recorded curve
#[derive(Debug, Clone)]
pub struct RocSeries {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    pub label: String,
}

/// Accumulates ROC curves and renders them into one figure.
///
/// Every plot owns its series, so two figures never share curves.
#[derive(Debug, Clone)]
pub struct RocCurvePlot {
    dir: PathBuf,
    figure_id: u32,
    series: Vec<RocSeries>,
}

impl RocCurvePlot {
    pub fn new(dir: impl Into<PathBuf>, figure_id: u32) -> Self {
        Self {
            dir: dir.into(),
            figure_id,
            series: Vec::new(),
        }
    }

    pub fn figure_id(&self) -> u32 {
        self.figure_id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn series(&self) -> &[RocSeries] {
        &self.series
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Record one curve
    pub fn add(&mut self, fpr: &[f64], tpr: &[f64], label: impl Into<String>) -> Result<()> {
        if fpr.len() != tpr.len() {
            return Err(ValidatorError::ShapeError {
                expected: format!("{} true positive rates", fpr.len()),
                actual: format!("{} true positive rates", tpr.len()),
            });
        }
        self.series.push(RocSeries {
            fpr: fpr.to_vec(),
            tpr: tpr.to_vec(),
            label: label.into(),
        });
        Ok(())
    }

    pub fn clear(&mut self) {
        self.series.clear();
    }

    /// Render every recorded curve over the chance diagonal into
    /// `<dir>/<run_id>.roc.png`
    pub fn store(&self, run_id: u64) -> Result<PathBuf> {
        let mut chart = Chart::new((0.0, 1.0), (0.0, 1.05))?;
        chart.draw_frame();
        chart.dashed_line((0.0, 0.0), (1.0, 1.0), DIAGONAL);

        let mut entries = Vec::with_capacity(self.series.len());
        for (i, series) in self.series.iter().enumerate() {
            let color = series_color(i);
            chart.line(&series.fpr, &series.tpr, color);
            entries.push((color, series.label.as_str()));
        }
        chart.title("Provided data ROC curve/s");
        chart.axis_labels("False Positive Rate", "True Positive Rate");
        chart.legend(&entries);

        let path = self.dir.join(format!("{}.roc.png", run_id));
        chart.save(&path)?;
        debug!(figure = self.figure_id, curves = self.series.len(), path = %path.display(), "ROC figure rendered");
        Ok(path)
    }
}
