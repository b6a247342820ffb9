//! Model export
//!
//! Fitted linear models are written as plain numeric text: one file for the
//! coefficients (a single whitespace-delimited row) and one for the
//! intercept, every value in `%.18e` notation.

use crate::error::Result;
use crate::training::LinearParameters;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

/// Paths written by [`save_linear_model`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredModel {
    pub coef_path: PathBuf,
    pub intercept_path: PathBuf,
}

/// Format like C's `%.18e`: two-digit minimum exponent with explicit sign
pub fn format_exp(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let raw = format!("{:.18e}", value);
    match raw.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exponent.abs())
        }
        None => raw,
    }
}

/// Write `<dir>/<run_id>.coef.txt` and `<dir>/<run_id>.intercept.txt`
pub fn save_linear_model(dir: &Path, run_id: u64, params: &LinearParameters) -> Result<StoredModel> {
    std::fs::create_dir_all(dir)?;

    let mut coef = String::new();
    for (i, value) in params.coefficients.iter().enumerate() {
        if i > 0 {
            coef.push(' ');
        }
        coef.push_str(&format_exp(*value));
    }
    coef.push('\n');

    let mut intercept = String::new();
    // Writing to a String cannot fail
    let _ = writeln!(intercept, "{}", format_exp(params.intercept));

    let coef_path = dir.join(format!("{}.coef.txt", run_id));
    let intercept_path = dir.join(format!("{}.intercept.txt", run_id));
    std::fs::write(&coef_path, coef)?;
    std::fs::write(&intercept_path, intercept)?;

    info!(coef = %coef_path.display(), intercept = %intercept_path.display(), "Model stored");
    Ok(StoredModel {
        coef_path,
        intercept_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_format_exp() {
        assert_eq!(format_exp(1.0), "1.000000000000000000e+00");
        assert_eq!(format_exp(-0.25), "-2.500000000000000000e-01");
        assert_eq!(format_exp(12345.0), "1.234500000000000000e+04");
        assert_eq!(format_exp(0.0), "0.000000000000000000e+00");
        assert_eq!(format_exp(1e-120), "1.000000000000000000e-120");
        assert_eq!(format_exp(f64::NAN), "nan");
    }

    #[test]
    fn test_save_linear_model() {
        let dir = tempfile::tempdir().unwrap();
        let params = LinearParameters {
            coefficients: array![0.5, -2.0],
            intercept: 0.125,
        };
        let stored = save_linear_model(dir.path(), 77, &params).unwrap();

        assert_eq!(stored.coef_path, dir.path().join("77.coef.txt"));
        let coef = std::fs::read_to_string(&stored.coef_path).unwrap();
        assert_eq!(coef, "5.000000000000000000e-01 -2.000000000000000000e+00\n");

        let intercept = std::fs::read_to_string(&stored.intercept_path).unwrap();
        let parsed: f64 = intercept.trim().parse().unwrap();
        assert_eq!(parsed, 0.125);
    }
}
