//! House Price - prediction service for tabular property listings
//!
//! This crate provides:
//! - CSV loading into typed, columnar datasets
//! - Imputation, one-hot or label encoding and numeric scaling
//! - In-crate regressors (random forest, decision tree, linear regression)
//!   with holdout scoring and best-model selection
//! - A published model snapshot with single-file persistence
//! - Chunked staging of large model files
//! - Web server and CLI interfaces
//!
//! # Modules
//!
//! ## Core
//! - [`dataset`] - Schema, records and columnar datasets
//! - [`preprocessing`] - Imputation, encoding, scaling
//! - [`training`] - Estimators, metrics and the trainer
//! - [`model`] - Trained model snapshot and store
//! - [`inference`] - Record-level prediction
//!
//! ## Infrastructure
//! - [`staging`] - Split and reassemble model files
//! - [`utils`] - Data loading
//!
//! ## Services
//! - [`server`] - HTTP server with JSON API
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Core modules
pub mod dataset;
pub mod preprocessing;
pub mod training;
pub mod model;
pub mod inference;

// Infrastructure
pub mod staging;
pub mod utils;

// Services
pub mod server;
pub mod cli;

pub use error::{PricingError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{PricingError, Result};

    // Data
    pub use crate::dataset::{Dataset, FeatureValue, PropertyRecord, Schema};
    pub use crate::utils::DataLoader;

    // Preprocessing
    pub use crate::preprocessing::{DataPreprocessor, PreprocessingConfig};

    // Training
    pub use crate::training::{ModelType, ModelVariant, RegressionMetrics, Trainer, TrainingConfig};

    // Model
    pub use crate::model::{ModelStore, TrainedModel};

    // Inference
    pub use crate::inference::{InferenceConfig, PredictionService};

    // Staging
    pub use crate::staging::{reconstruct, split_file, ChunkManifest};
}
