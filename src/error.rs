//! Error types for the shapboard pipeline

use thiserror::Error;

/// Result type alias for shapboard operations
pub type Result<T> = std::result::Result<T, ShapboardError>;

/// Main error type for the pipeline, model and explanation layers
#[derive(Error, Debug)]
pub enum ShapboardError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Schema error: {0}")]
    SchemaError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Explanation error: {0}")]
    ExplanationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },
}

impl From<polars::error::PolarsError> for ShapboardError {
    fn from(err: polars::error::PolarsError) -> Self {
        ShapboardError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for ShapboardError {
    fn from(err: serde_json::Error) -> Self {
        ShapboardError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for ShapboardError {
    fn from(err: ndarray::ShapeError) -> Self {
        ShapboardError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ShapboardError::SchemaError("missing target".to_string());
        assert_eq!(err.to_string(), "Schema error: missing target");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ShapboardError = io_err.into();
        assert!(matches!(err, ShapboardError::IoError(_)));
    }
}
