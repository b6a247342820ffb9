//! Feature scaling implementations

use crate::error::{Result, ValidatorError};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// Type of scaler to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalerType {
    /// Standard scaling (z-score normalization): (x - mean) / std
    Standard,
    /// Min-Max scaling: (x - min) / (max - min)
    MinMax,
    /// Robust scaling using median and IQR
    Robust,
    /// Max absolute scaling: x / max(|x|)
    MaxAbs,
    /// No scaling
    None,
}

impl Default for ScalerType {
    fn default() -> Self {
        ScalerType::Robust
    }
}

impl std::str::FromStr for ScalerType {
    type Err = ValidatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(ScalerType::Standard),
            "minmax" => Ok(ScalerType::MinMax),
            "robust" => Ok(ScalerType::Robust),
            "maxabs" => Ok(ScalerType::MaxAbs),
            "none" => Ok(ScalerType::None),
            other => Err(ValidatorError::ConfigError(format!(
                "unknown scaler '{}', expected one of standard, minmax, robust, maxabs, none",
                other
            ))),
        }
    }
}

/// Per-column feature scaler over a dense matrix.
///
/// Columns with zero spread keep a scale of 1 so they pass through centred
/// but otherwise unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    scaler_type: ScalerType,
    center: Option<Array1<f64>>,
    scale: Option<Array1<f64>>,
}

impl Scaler {
    /// Create a new scaler
    pub fn new(scaler_type: ScalerType) -> Self {
        Self {
            scaler_type,
            center: None,
            scale: None,
        }
    }

    pub fn scaler_type(&self) -> ScalerType {
        self.scaler_type
    }

    /// Fit the scaler to the columns of `x`
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        if x.nrows() == 0 {
            return Err(ValidatorError::PreprocessingError(
                "cannot fit a scaler on zero rows".to_string(),
            ));
        }

        let n_features = x.ncols();
        let mut center = Array1::zeros(n_features);
        let mut scale = Array1::ones(n_features);

        for (j, column) in x.axis_iter(Axis(1)).enumerate() {
            let (c, s) = self.compute_params(column);
            center[j] = c;
            scale[j] = if s == 0.0 || !s.is_finite() { 1.0 } else { s };
        }

        self.center = Some(center);
        self.scale = Some(scale);
        Ok(self)
    }

    /// Transform the data
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (center, scale) = self.params()?;
        if x.ncols() != center.len() {
            return Err(ValidatorError::ShapeError {
                expected: format!("{} columns", center.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }

        Ok((x - center) / scale)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    fn params(&self) -> Result<(&Array1<f64>, &Array1<f64>)> {
        match (&self.center, &self.scale) {
            (Some(c), Some(s)) => Ok((c, s)),
            _ => Err(ValidatorError::ModelNotFitted),
        }
    }

    fn compute_params(&self, column: ArrayView1<f64>) -> (f64, f64) {
        match self.scaler_type {
            ScalerType::Standard => {
                let mean = column.mean().unwrap_or(0.0);
                (mean, column.std(0.0))
            }
            ScalerType::MinMax => {
                let min = column.iter().cloned().fold(f64::INFINITY, f64::min);
                let max = column.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                (min, max - min)
            }
            ScalerType::Robust => {
                let mut sorted: Vec<f64> = column.to_vec();
                sorted.sort_by(|a, b| a.total_cmp(b));
                let median = quantile_sorted(&sorted, 0.5);
                let iqr = quantile_sorted(&sorted, 0.75) - quantile_sorted(&sorted, 0.25);
                (median, iqr)
            }
            ScalerType::MaxAbs => {
                let max_abs = column.iter().fold(0.0f64, |a, &b| a.max(b.abs()));
                (0.0, max_abs)
            }
            ScalerType::None => (0.0, 1.0),
        }
    }
}

/// Linear-interpolated quantile of an ascending slice
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let pos = q * (n - 1) as f64;
            let lower = pos.floor() as usize;
            let upper = pos.ceil() as usize;
            let frac = pos - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * frac
        }
    }
}
