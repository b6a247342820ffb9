//! Error types for the model validator

use thiserror::Error;

/// Result type alias for validator operations
pub type Result<T> = std::result::Result<T, ValidatorError>;

/// Main error type for the validator.
///
/// Statistical failures (low phi, unstable AUC) are not errors: they are
/// reported through [`crate::evaluation::EvaluationResult`]. This enum covers
/// malformed input and failures of the collaborators.
#[derive(Error, Debug)]
pub enum ValidatorError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Font error: {0}")]
    FontError(#[from] ab_glyph::InvalidFont),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl From<polars::error::PolarsError> for ValidatorError {
    fn from(err: polars::error::PolarsError) -> Self {
        ValidatorError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for ValidatorError {
    fn from(err: serde_json::Error) -> Self {
        ValidatorError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for ValidatorError {
    fn from(err: ndarray::ShapeError) -> Self {
        ValidatorError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
