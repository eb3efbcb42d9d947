//! Error types for the house price service

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pricing operations
pub type Result<T> = std::result::Result<T, PricingError>;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum PricingError {
    #[error("Dataset not found: {}", .0.display())]
    DatasetNotFound(PathBuf),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Schema error: {0}")]
    SchemaError(String),

    #[error("Invalid value for feature '{feature}': {reason}")]
    InvalidFeatureValue { feature: String, reason: String },

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Inference error: {0}")]
    InferenceError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Model not loaded")]
    ModelNotLoaded,

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Missing chunk files: {}", .0.join(", "))]
    MissingChunks(Vec<String>),

    #[error("Integrity check failed: {0}")]
    IntegrityError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<polars::error::PolarsError> for PricingError {
    fn from(err: polars::error::PolarsError) -> Self {
        PricingError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for PricingError {
    fn from(err: serde_json::Error) -> Self {
        PricingError::SerializationError(err.to_string())
    }
}

impl From<bincode::Error> for PricingError {
    fn from(err: bincode::Error) -> Self {
        PricingError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for PricingError {
    fn from(err: ndarray::ShapeError) -> Self {
        PricingError::ShapeError {
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
        let err = PricingError::DataError("test error".to_string());
        assert_eq!(err.to_string(), "Data error: test error");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PricingError = io_err.into();
        assert!(matches!(err, PricingError::IoError(_)));
    }

    #[test]
    fn test_missing_chunks_lists_names() {
        let err = PricingError::MissingChunks(vec!["a.part01".into(), "a.part03".into()]);
        assert_eq!(err.to_string(), "Missing chunk files: a.part01, a.part03");
    }

    #[test]
    fn test_dataset_not_found_shows_path() {
        let err = PricingError::DatasetNotFound(PathBuf::from("House_dataset.csv"));
        assert!(err.to_string().contains("House_dataset.csv"));
    }
}
