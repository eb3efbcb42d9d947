//! Training configuration

use crate::dataset::{Schema, LISTING_FEATURES};
use crate::error::{PricingError, Result};
use crate::preprocessing::PreprocessingConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type of model to train
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelType {
    /// Random Forest
    RandomForest,
    /// Linear Regression
    LinearRegression,
    /// Decision Tree
    DecisionTree,
}

impl ModelType {
    /// All supported estimators, in candidate order
    pub const ALL: [ModelType; 3] = [ModelType::RandomForest, ModelType::LinearRegression, ModelType::DecisionTree];

    /// Display name reported by the API
    pub fn name(&self) -> &'static str {
        match self {
            ModelType::RandomForest => "RandomForestRegressor",
            ModelType::LinearRegression => "LinearRegression",
            ModelType::DecisionTree => "DecisionTreeRegressor",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelType {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rf" | "random_forest" | "randomforest" | "forest" => Ok(ModelType::RandomForest),
            "linear" | "linear_regression" | "linearregression" | "lr" => Ok(ModelType::LinearRegression),
            "tree" | "decision_tree" | "decisiontree" | "dt" => Ok(ModelType::DecisionTree),
            other => Err(PricingError::ConfigError(format!("unknown model type: {}", other))),
        }
    }
}

/// Which training setup the service runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ModelVariant {
    /// Every column except the target, one-hot encoding, random forest only
    #[default]
    Generic,
    /// The seven listing fields, label encoding, best of three estimators
    Listing,
}

impl FromStr for ModelVariant {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generic" => Ok(ModelVariant::Generic),
            "listing" => Ok(ModelVariant::Listing),
            other => Err(PricingError::ConfigError(format!(
                "unknown model variant '{}', expected 'generic' or 'listing'",
                other
            ))),
        }
    }
}

/// Configuration for model training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Target column name
    pub target_column: String,

    /// Feature column names (None = all except target)
    pub feature_columns: Option<Vec<String>>,

    /// Column types the selected features must have (None = as loaded)
    pub expected_schema: Option<Schema>,

    /// Fraction of rows held out for scoring
    pub test_size: f64,

    /// Random seed for the split and the estimators
    pub random_seed: u64,

    /// Number of trees (random forest)
    pub n_estimators: usize,

    /// Maximum depth of trees
    pub max_depth: Option<usize>,

    /// Minimum samples per leaf
    pub min_samples_leaf: usize,

    /// Estimators to fit, in order; ties keep the earliest
    pub candidates: Vec<ModelType>,

    /// Preprocessing applied before fitting
    pub preprocessing: PreprocessingConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            target_column: "price".to_string(),
            feature_columns: None,
            expected_schema: None,
            test_size: 0.2,
            random_seed: 42,
            n_estimators: 100,
            max_depth: None,
            min_samples_leaf: 1,
            candidates: vec![ModelType::RandomForest],
            preprocessing: PreprocessingConfig::one_hot(),
        }
    }
}

impl TrainingConfig {
    /// Create a new configuration
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target_column: target.into(),
            ..Default::default()
        }
    }

    /// Seven typed listing fields, label encoding, all three estimators
    pub fn listing(target: impl Into<String>) -> Self {
        Self {
            target_column: target.into(),
            feature_columns: Some(LISTING_FEATURES.iter().map(|s| s.to_string()).collect()),
            expected_schema: Some(Schema::listing()),
            candidates: ModelType::ALL.to_vec(),
            preprocessing: PreprocessingConfig::label_encoded(),
            ..Default::default()
        }
    }

    /// Configuration for a service variant
    pub fn for_variant(variant: ModelVariant, target: impl Into<String>) -> Self {
        match variant {
            ModelVariant::Generic => Self::new(target),
            ModelVariant::Listing => Self::listing(target),
        }
    }

    /// Builder method to restrict the feature columns
    pub fn with_feature_columns(mut self, columns: Vec<String>) -> Self {
        self.feature_columns = Some(columns);
        self
    }

    /// Builder method to require column types
    pub fn with_expected_schema(mut self, schema: Schema) -> Self {
        self.expected_schema = Some(schema);
        self
    }

    /// Builder method to set the holdout fraction
    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    /// Builder method to set the random seed
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    /// Builder method to set the number of trees
    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    /// Builder method to set the maximum tree depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Builder method to set the candidate estimators
    pub fn with_candidates(mut self, candidates: Vec<ModelType>) -> Self {
        self.candidates = candidates;
        self
    }

    /// Builder method to set the preprocessing
    pub fn with_preprocessing(mut self, preprocessing: PreprocessingConfig) -> Self {
        self.preprocessing = preprocessing;
        self
    }

    /// Check the configuration before any data is touched
    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(PricingError::ConfigError(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        if self.n_estimators == 0 {
            return Err(PricingError::ConfigError("n_estimators must be positive".to_string()));
        }
        if self.candidates.is_empty() {
            return Err(PricingError::ConfigError("at least one candidate model is required".to_string()));
        }
        if let Some(columns) = &self.feature_columns {
            if columns.iter().any(|c| c == &self.target_column) {
                return Err(PricingError::ConfigError(format!(
                    "target column '{}' cannot be a feature",
                    self.target_column
                )));
            }
        }
        self.preprocessing.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::EncoderType;

    #[test]
    fn test_defaults() {
        let config = TrainingConfig::default();
        assert_eq!(config.target_column, "price");
        assert_eq!(config.test_size, 0.2);
        assert_eq!(config.random_seed, 42);
        assert_eq!(config.n_estimators, 100);
        assert_eq!(config.candidates, vec![ModelType::RandomForest]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_listing_preset() {
        let config = TrainingConfig::for_variant(ModelVariant::Listing, "price");
        assert_eq!(config.feature_columns.as_ref().unwrap().len(), 7);
        assert_eq!(config.candidates.len(), 3);
        assert_eq!(config.preprocessing.encoder_type, EncoderType::Label);
        assert_eq!(config.expected_schema, Some(Schema::listing()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_configs() {
        assert!(TrainingConfig::default().with_test_size(0.0).validate().is_err());
        assert!(TrainingConfig::default().with_test_size(1.0).validate().is_err());
        assert!(TrainingConfig::default().with_candidates(vec![]).validate().is_err());
        assert!(TrainingConfig::default().with_n_estimators(0).validate().is_err());
        assert!(TrainingConfig::default()
            .with_feature_columns(vec!["price".to_string()])
            .validate()
            .is_err());
    }

    #[test]
    fn test_parse_model_type() {
        assert_eq!("rf".parse::<ModelType>().unwrap(), ModelType::RandomForest);
        assert_eq!("Linear".parse::<ModelType>().unwrap(), ModelType::LinearRegression);
        assert_eq!("tree".parse::<ModelType>().unwrap(), ModelType::DecisionTree);
        assert!("svm".parse::<ModelType>().is_err());
        assert_eq!(ModelType::RandomForest.to_string(), "RandomForestRegressor");
    }

    #[test]
    fn test_parse_variant() {
        assert_eq!("listing".parse::<ModelVariant>().unwrap(), ModelVariant::Listing);
        assert_eq!(" Generic ".parse::<ModelVariant>().unwrap(), ModelVariant::Generic);
        assert!("other".parse::<ModelVariant>().is_err());
    }
}
