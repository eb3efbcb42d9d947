//! Property records and feature values

use crate::error::{PricingError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::schema::ColumnType;

/// A single feature value of a listing
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
    Missing,
}

impl FeatureValue {
    /// Convert a JSON value; arrays and objects are rejected.
    pub fn from_json(feature: &str, value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Null => Ok(FeatureValue::Missing),
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(FeatureValue::Number)
                .ok_or_else(|| PricingError::InvalidFeatureValue {
                    feature: feature.to_string(),
                    reason: format!("unrepresentable number {}", n),
                }),
            serde_json::Value::String(s) => Ok(FeatureValue::Text(s.clone())),
            serde_json::Value::Bool(b) => Ok(FeatureValue::Text(b.to_string())),
            other => Err(PricingError::InvalidFeatureValue {
                feature: feature.to_string(),
                reason: format!("expected a scalar, got {}", json_kind(other)),
            }),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, FeatureValue::Missing)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FeatureValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render a number the way it reads in a CSV cell (`3`, not `3.0`).
    pub fn format_number(value: f64) -> String {
        if value.fract() == 0.0 && value.abs() < 1e15 {
            format!("{}", value as i64)
        } else {
            value.to_string()
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
        _ => "scalar",
    }
}

impl From<f64> for FeatureValue {
    fn from(v: f64) -> Self {
        FeatureValue::Number(v)
    }
}

impl From<i64> for FeatureValue {
    fn from(v: i64) -> Self {
        FeatureValue::Number(v as f64)
    }
}

impl From<i32> for FeatureValue {
    fn from(v: i32) -> Self {
        FeatureValue::Number(v as f64)
    }
}

impl From<&str> for FeatureValue {
    fn from(v: &str) -> Self {
        FeatureValue::Text(v.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(v: String) -> Self {
        FeatureValue::Text(v)
    }
}

impl<T: Into<FeatureValue>> From<Option<T>> for FeatureValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(FeatureValue::Missing)
    }
}

/// A listing: feature name to value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyRecord {
    values: BTreeMap<String, FeatureValue>,
}

impl PropertyRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FeatureValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FeatureValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FeatureValue)> {
        self.values.iter()
    }

    /// Parse a JSON object of feature name to scalar
    pub fn from_json_object(object: &serde_json::Map<String, serde_json::Value>) -> Result<Self> {
        let values = object
            .iter()
            .map(|(name, value)| Ok((name.clone(), FeatureValue::from_json(name, value)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(Self { values })
    }
}

impl FromIterator<(String, FeatureValue)> for PropertyRecord {
    fn from_iter<I: IntoIterator<Item = (String, FeatureValue)>>(iter: I) -> Self {
        Self { values: iter.into_iter().collect() }
    }
}

/// Default used for a schema column the caller did not send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AbsentFeaturePolicy {
    /// Numeric columns become `0.0`, categorical columns the text `"0"`
    #[default]
    Zero,
    /// Treat as missing and fill with the fitted mean / mode
    Impute,
}

impl AbsentFeaturePolicy {
    pub fn default_for(&self, column_type: ColumnType) -> FeatureValue {
        match (self, column_type) {
            (AbsentFeaturePolicy::Zero, ColumnType::Numeric) => FeatureValue::Number(0.0),
            (AbsentFeaturePolicy::Zero, ColumnType::Categorical) => FeatureValue::Text("0".to_string()),
            (AbsentFeaturePolicy::Impute, _) => FeatureValue::Missing,
        }
    }
}

/// A record with exactly one type-checked value per schema column, in schema order
#[derive(Debug, Clone, PartialEq)]
pub struct CompleteRecord {
    values: Vec<FeatureValue>,
}

impl CompleteRecord {
    pub(crate) fn new(values: Vec<FeatureValue>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[FeatureValue] {
        &self.values
    }
}
