//! Record-level prediction

use crate::dataset::{ColumnType, CompleteRecord, FeatureValue, PropertyRecord};
use crate::error::{PricingError, Result};
use crate::model::TrainedModel;
use crate::preprocessing::Encoded;
use super::InferenceConfig;
use tracing::debug;

/// Turns property records into prices using a trained model.
///
/// Holds no model itself; callers pass the snapshot they took from the store.
#[derive(Debug, Clone, Default)]
pub struct PredictionService {
    config: InferenceConfig,
}

impl PredictionService {
    /// Create a new service
    pub fn new(config: InferenceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Predict the price of a single listing
    pub fn predict(&self, model: &TrainedModel, record: &PropertyRecord) -> Result<f64> {
        let prices = self.predict_batch(model, std::slice::from_ref(record))?;
        prices
            .first()
            .copied()
            .ok_or_else(|| PricingError::InferenceError("model returned no prediction".to_string()))
    }

    /// Predict prices for several listings, in input order
    pub fn predict_batch(&self, model: &TrainedModel, records: &[PropertyRecord]) -> Result<Vec<f64>> {
        let completed = records
            .iter()
            .map(|record| self.complete(model, record))
            .collect::<Result<Vec<_>>>()?;

        let x = model.preprocessor().transform_records(&completed)?;
        let predictions = model.predict_matrix(&x)?;

        if predictions.len() != records.len() {
            return Err(PricingError::InferenceError(format!(
                "expected {} predictions, got {}",
                records.len(),
                predictions.len()
            )));
        }

        predictions
            .iter()
            .map(|&price| {
                if price.is_finite() {
                    Ok(price)
                } else {
                    Err(PricingError::InferenceError(format!("model produced a non-finite price: {}", price)))
                }
            })
            .collect()
    }

    fn complete(&self, model: &TrainedModel, record: &PropertyRecord) -> Result<CompleteRecord> {
        let schema = model.schema();
        let completed = schema.complete(record, self.config.absent_features)?;

        for (spec, value) in schema.columns().iter().zip(completed.values()) {
            if spec.column_type != ColumnType::Categorical {
                continue;
            }
            if let FeatureValue::Text(text) = value {
                match model.preprocessor().encode_category(&spec.name, text)? {
                    Encoded::Known(_) => {}
                    fallback => {
                        debug!(feature = %spec.name, value = %text, encoded = ?fallback, "Unknown category");
                    }
                }
            }
        }

        Ok(completed)
    }
}
