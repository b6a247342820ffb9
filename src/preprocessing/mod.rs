//! Data preprocessing module
//!
//! Feature rescaling applied to the example matrix before any model is
//! trained (StandardScaler, MinMaxScaler, RobustScaler, MaxAbsScaler).

mod scaler;

pub use scaler::{Scaler, ScalerType};
