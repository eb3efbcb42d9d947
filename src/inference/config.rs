//! Inference configuration

use crate::dataset::AbsentFeaturePolicy;
use serde::{Deserialize, Serialize};

/// Configuration for request-time prediction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Default for trained feature columns the request did not send
    pub absent_features: AbsentFeaturePolicy,
}

impl InferenceConfig {
    /// Builder method to set the absent-feature policy
    pub fn with_absent_features(mut self, policy: AbsentFeaturePolicy) -> Self {
        self.absent_features = policy;
        self
    }
}
