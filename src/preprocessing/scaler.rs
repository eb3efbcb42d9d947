//! Feature scaling

use crate::error::{PricingError, Result};
use serde::{Deserialize, Serialize};

/// Type of scaler to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalerType {
    /// Standard scaling (z-score normalization): (x - mean) / std
    Standard,
    /// No scaling
    None,
}

/// Parameters for a fitted column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ScalerParams {
    center: f64,
    scale: f64,
}

/// Numeric feature scaler, one parameter set per numeric column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    scaler_type: ScalerType,
    params: Vec<ScalerParams>,
    is_fitted: bool,
}

impl Scaler {
    /// Create a new scaler
    pub fn new(scaler_type: ScalerType) -> Self {
        Self {
            scaler_type,
            params: Vec::new(),
            is_fitted: false,
        }
    }

    /// Fit on complete (already imputed) numeric columns
    pub fn fit(&mut self, columns: &[Vec<f64>]) -> Result<&mut Self> {
        self.params = columns.iter().map(|c| self.compute_params(c)).collect();
        self.is_fitted = true;
        Ok(self)
    }

    /// Scale a value of numeric column `idx`
    pub fn transform_value(&self, idx: usize, value: f64) -> Result<f64> {
        if !self.is_fitted {
            return Err(PricingError::ModelNotFitted);
        }

        let params = self.params.get(idx).ok_or_else(|| {
            PricingError::PreprocessingError(format!("no scaler parameters for numeric column {}", idx))
        })?;

        Ok((value - params.center) / params.scale)
    }

    fn compute_params(&self, values: &[f64]) -> ScalerParams {
        match self.scaler_type {
            ScalerType::Standard => {
                if values.is_empty() {
                    return ScalerParams { center: 0.0, scale: 1.0 };
                }
                let n = values.len() as f64;
                let mean = values.iter().sum::<f64>() / n;
                // Population std, matching the usual z-score definition
                let std = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
                ScalerParams {
                    center: mean,
                    scale: if std == 0.0 || !std.is_finite() { 1.0 } else { std },
                }
            }
            ScalerType::None => ScalerParams { center: 0.0, scale: 1.0 },
        }
    }
}
