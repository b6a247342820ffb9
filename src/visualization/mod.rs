//! Visualization module: ROC and learning curve figures rendered to PNG.

pub mod canvas;
pub mod learning_curve;
pub mod roc_curve;

pub use canvas::Chart;
pub use learning_curve::{plot_learning_curve, ClassifierFactory, LearningCurve, LearningCurveScores};
pub use roc_curve::{RocCurvePlot, RocSeries};
