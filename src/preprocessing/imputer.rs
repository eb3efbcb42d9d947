//! Missing value imputation

use crate::dataset::{ColumnData, Dataset, FeatureValue};
use crate::error::{PricingError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fitted replacement for a column's missing entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FillValue {
    /// Column mean
    Numeric(f64),
    /// Most frequent category
    Text(String),
}

/// Per-column mean / mode imputer, one fill value per schema column
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Imputer {
    fill_values: Vec<FillValue>,
    is_fitted: bool,
}

impl Imputer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the mean of each numeric column and the mode of each categorical column
    pub fn fit(&mut self, dataset: &Dataset) -> Result<&mut Self> {
        self.fill_values = dataset
            .columns()
            .iter()
            .map(|column| match column {
                ColumnData::Numeric(values) => FillValue::Numeric(column_mean(values)),
                ColumnData::Categorical(values) => FillValue::Text(column_mode(values)),
            })
            .collect();

        self.is_fitted = true;
        Ok(self)
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    /// Replace a missing value of column `idx` with its fill value
    pub fn fill(&self, idx: usize, value: FeatureValue) -> Result<FeatureValue> {
        if !self.is_fitted {
            return Err(PricingError::ModelNotFitted);
        }

        match value {
            FeatureValue::Missing => {
                let fill = self.fill_values.get(idx).ok_or_else(|| {
                    PricingError::PreprocessingError(format!("no fill value for column {}", idx))
                })?;
                Ok(match fill {
                    FillValue::Numeric(v) => FeatureValue::Number(*v),
                    FillValue::Text(s) => FeatureValue::Text(s.clone()),
                })
            }
            other => Ok(other),
        }
    }
}

/// Mean of present values; 0.0 when the column has none
pub(crate) fn column_mean(values: &[Option<f64>]) -> f64 {
    let (sum, count) = values
        .iter()
        .flatten()
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));

    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Most frequent present value; ties go to the lexicographically smallest.
/// Empty string when the column has no values.
pub(crate) fn column_mode(values: &[Option<String>]) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for val in values.iter().flatten() {
        *counts.entry(val.as_str()).or_insert(0) += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for (val, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((val, count));
        }
    }

    best.map(|(v, _)| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{ColumnSpec, Schema};

    #[test]
    fn test_column_mean() {
        assert_eq!(column_mean(&[Some(1.0), None, Some(3.0)]), 2.0);
        assert_eq!(column_mean(&[None, None]), 0.0);
    }

    #[test]
    fn test_column_mode_ties_pick_smallest() {
        let values = vec![Some("b".to_string()), Some("a".to_string()), None, Some("b".to_string()), Some("a".to_string())];
        assert_eq!(column_mode(&values), "a");

        let values = vec![Some("z".to_string()), Some("z".to_string()), Some("a".to_string())];
        assert_eq!(column_mode(&values), "z");
    }

    #[test]
    fn test_mean_and_mode_imputation() {
        let schema = Schema::new(vec![ColumnSpec::numeric("area"), ColumnSpec::categorical("city")]).unwrap();
        let ds = Dataset::new(
            schema,
            vec![
                ColumnData::Numeric(vec![Some(2.0), None, Some(4.0)]),
                ColumnData::Categorical(vec![Some("Lahore".into()), Some("Lahore".into()), None]),
            ],
            vec![1.0, 2.0, 3.0],
        )
        .unwrap();

        let mut imputer = Imputer::new();
        imputer.fit(&ds).unwrap();

        assert_eq!(imputer.fill(0, FeatureValue::Missing).unwrap(), FeatureValue::Number(3.0));
        assert_eq!(imputer.fill(1, FeatureValue::Missing).unwrap(), FeatureValue::Text("Lahore".into()));
        assert_eq!(imputer.fill(0, FeatureValue::Number(7.0)).unwrap(), FeatureValue::Number(7.0));
    }

    #[test]
    fn test_unfitted_imputer_errors() {
        let imputer = Imputer::new();
        assert!(matches!(imputer.fill(0, FeatureValue::Missing), Err(PricingError::ModelNotFitted)));
    }
}
