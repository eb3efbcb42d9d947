//! Inference module
//!
//! Completes incoming records against the fit-time schema, applies the stored
//! preprocessing and returns a finite price per record. Unknown categories
//! resolve through the fitted encoder and never fail a request.

mod config;
mod engine;

pub use config::InferenceConfig;
pub use engine::PredictionService;
