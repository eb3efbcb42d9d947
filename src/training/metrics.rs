//! Holdout regression metrics

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Metrics for a regressor scored on the holdout partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// R-squared
    pub r2: f64,
    /// R-squared as a percentage
    pub r2_percentage: f64,
    /// Number of scored samples
    pub n_samples: usize,
}

impl RegressionMetrics {
    /// Compute regression metrics.
    ///
    /// R² is 1.0 for a perfect fit of a constant target and 0.0 for any
    /// other fit of a constant target.
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        let n_samples = y_true.len().min(y_pred.len());
        if n_samples == 0 {
            return Self {
                mae: f64::NAN,
                mse: f64::NAN,
                rmse: f64::NAN,
                r2: f64::NAN,
                r2_percentage: f64::NAN,
                n_samples: 0,
            };
        }

        let n = n_samples as f64;
        let errors: Vec<f64> = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| t - p)
            .collect();

        let ss_res: f64 = errors.iter().map(|e| e * e).sum();
        let mse = ss_res / n;
        let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;

        let y_mean: f64 = y_true.iter().take(n_samples).sum::<f64>() / n;
        let ss_tot: f64 = y_true.iter().take(n_samples).map(|y| (y - y_mean).powi(2)).sum();

        let r2 = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else if ss_res == 0.0 {
            1.0
        } else {
            0.0
        };

        Self {
            mae,
            mse,
            rmse: mse.sqrt(),
            r2,
            r2_percentage: r2 * 100.0,
            n_samples,
        }
    }

    /// Whether `self` strictly beats `other`; NaN never wins.
    pub fn beats(&self, other: &RegressionMetrics) -> bool {
        match (self.r2.is_nan(), other.r2.is_nan()) {
            (true, _) => false,
            (false, true) => true,
            (false, false) => self.r2 > other.r2,
        }
    }
}
