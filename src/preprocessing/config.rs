//! Preprocessing configuration

use crate::error::{PricingError, Result};
use serde::{Deserialize, Serialize};
use super::{EncoderType, ScalerType};

/// How rows with missing feature values are handled at fit time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissingValuePolicy {
    /// Fill numeric gaps with the column mean, categorical gaps with the mode
    Impute,
    /// Drop every row that has a missing value
    DropRows,
}

/// What an unseen category encodes to at prediction time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnknownCategoryPolicy {
    /// One-hot only: all indicators zero
    Ignore,
    /// Use the first known class of the column
    FirstKnown,
}

/// Configuration for data preprocessing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessingConfig {
    /// Missing-value handling during fit
    pub missing_values: MissingValuePolicy,

    /// Encoder for categorical features
    pub encoder_type: EncoderType,

    /// Fallback for categories not seen during fit
    pub unknown_categories: UnknownCategoryPolicy,

    /// Scaler for numeric features
    pub scaler_type: ScalerType,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self::one_hot()
    }
}

impl PreprocessingConfig {
    /// Imputation, one-hot encoding with unknowns ignored, z-score scaling
    pub fn one_hot() -> Self {
        Self {
            missing_values: MissingValuePolicy::Impute,
            encoder_type: EncoderType::OneHot,
            unknown_categories: UnknownCategoryPolicy::Ignore,
            scaler_type: ScalerType::Standard,
        }
    }

    /// Incomplete rows dropped, label encoding with first-class fallback, no scaling
    pub fn label_encoded() -> Self {
        Self {
            missing_values: MissingValuePolicy::DropRows,
            encoder_type: EncoderType::Label,
            unknown_categories: UnknownCategoryPolicy::FirstKnown,
            scaler_type: ScalerType::None,
        }
    }

    /// Builder method to set the missing-value policy
    pub fn with_missing_values(mut self, policy: MissingValuePolicy) -> Self {
        self.missing_values = policy;
        self
    }

    /// Builder method to set encoder type
    pub fn with_encoder(mut self, encoder_type: EncoderType) -> Self {
        self.encoder_type = encoder_type;
        self
    }

    /// Builder method to set the unknown-category policy
    pub fn with_unknown_categories(mut self, policy: UnknownCategoryPolicy) -> Self {
        self.unknown_categories = policy;
        self
    }

    /// Builder method to set scaler type
    pub fn with_scaler(mut self, scaler_type: ScalerType) -> Self {
        self.scaler_type = scaler_type;
        self
    }

    /// Reject combinations that have no encoding
    pub fn validate(&self) -> Result<()> {
        if self.encoder_type == EncoderType::Label && self.unknown_categories == UnknownCategoryPolicy::Ignore {
            return Err(PricingError::ConfigError(
                "label encoding cannot ignore unknown categories; use FirstKnown".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        assert!(PreprocessingConfig::one_hot().validate().is_ok());
        assert!(PreprocessingConfig::label_encoded().validate().is_ok());
    }

    #[test]
    fn test_label_with_ignore_rejected() {
        let config = PreprocessingConfig::label_encoded()
            .with_unknown_categories(UnknownCategoryPolicy::Ignore);
        assert!(matches!(config.validate(), Err(PricingError::ConfigError(_))));
    }

    #[test]
    fn test_config_serialize() {
        let json = serde_json::to_string(&PreprocessingConfig::default()).unwrap();
        assert!(json.contains("OneHot"));
        assert!(json.contains("Impute"));
    }
}
