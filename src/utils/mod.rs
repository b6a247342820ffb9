//! Utility functions and types

pub mod data_loader;

pub use data_loader::{DataLoader, ExampleSet, LoaderOptions, TrainTestSplit};

use std::time::{Duration, Instant};

/// Simple wall-clock timer for logging how long a phase took
pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn new(name: &str) -> Self {
        Self {
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Arithmetic mean; 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (ddof = 0); 0 for an empty slice
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// `n` evenly spaced values from `start` to `end` inclusive
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// `n` values spaced evenly on a log10 scale between `10^start` and `10^end`
pub fn logspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    linspace(start, end, n)
        .into_iter()
        .map(|e| 10f64.powf(e))
        .collect()
}
