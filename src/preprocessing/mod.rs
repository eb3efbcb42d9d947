//! Data preprocessing module
//!
//! Turns typed property data into the numeric matrix the estimators consume:
//! - Missing value imputation (column mean / most frequent category)
//! - Feature scaling (z-score or none)
//! - Categorical encoding (one-hot or label) with a configurable fallback for
//!   categories never seen during fit

mod config;
mod encoder;
mod imputer;
mod pipeline;
mod scaler;

pub use config::{MissingValuePolicy, PreprocessingConfig, UnknownCategoryPolicy};
pub use encoder::{Encoded, Encoder, EncoderType};
pub use imputer::{FillValue, Imputer};
pub use pipeline::DataPreprocessor;
pub use scaler::{Scaler, ScalerType};
