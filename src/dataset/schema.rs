//! Feature schema: ordered columns with their types

use crate::error::{PricingError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::record::{AbsentFeaturePolicy, CompleteRecord, FeatureValue, PropertyRecord};

/// Column data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    Numeric,
    Categorical,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Numeric => f.write_str("numeric"),
            ColumnType::Categorical => f.write_str("categorical"),
        }
    }
}

/// A single named, typed feature column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub column_type: ColumnType,
}

impl ColumnSpec {
    pub fn numeric(name: impl Into<String>) -> Self {
        Self { name: name.into(), column_type: ColumnType::Numeric }
    }

    pub fn categorical(name: impl Into<String>) -> Self {
        Self { name: name.into(), column_type: ColumnType::Categorical }
    }
}

/// Feature names of the fixed property-listing layout, in fit order.
pub const LISTING_FEATURES: [&str; 7] = [
    "property_type",
    "location",
    "city",
    "baths",
    "purpose",
    "bedrooms",
    "Area_in_Marla",
];

/// Ordered feature columns used at fit time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<ColumnSpec>,
}

impl Schema {
    /// Create a schema; column names must be unique and the list non-empty.
    pub fn new(columns: Vec<ColumnSpec>) -> Result<Self> {
        if columns.is_empty() {
            return Err(PricingError::SchemaError("schema has no feature columns".to_string()));
        }

        let mut seen = HashSet::new();
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(PricingError::SchemaError(format!("duplicate column: {}", col.name)));
            }
        }

        Ok(Self { columns })
    }

    /// The seven-field property listing schema
    pub fn listing() -> Self {
        Self {
            columns: vec![
                ColumnSpec::categorical("property_type"),
                ColumnSpec::categorical("location"),
                ColumnSpec::categorical("city"),
                ColumnSpec::numeric("baths"),
                ColumnSpec::categorical("purpose"),
                ColumnSpec::numeric("bedrooms"),
                ColumnSpec::numeric("Area_in_Marla"),
            ],
        }
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in fit order
    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn numeric_columns(&self) -> Vec<String> {
        self.names_of(ColumnType::Numeric)
    }

    pub fn categorical_columns(&self) -> Vec<String> {
        self.names_of(ColumnType::Categorical)
    }

    fn names_of(&self, column_type: ColumnType) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.column_type == column_type)
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Check that every column of `expected` is present with the same type.
    /// Extra columns are allowed.
    pub fn conforms_to(&self, expected: &Schema) -> Result<()> {
        for spec in &expected.columns {
            let actual = self
                .column(&spec.name)
                .ok_or_else(|| PricingError::SchemaError(format!("missing column: {}", spec.name)))?;

            if actual.column_type != spec.column_type {
                return Err(PricingError::SchemaError(format!(
                    "column '{}' is {}, expected {}",
                    spec.name, actual.column_type, spec.column_type
                )));
            }
        }
        Ok(())
    }

    /// Sub-schema with the named columns, in the order given
    pub fn select(&self, names: &[String]) -> Result<Schema> {
        let columns = names
            .iter()
            .map(|name| {
                self.column(name)
                    .cloned()
                    .ok_or_else(|| PricingError::SchemaError(format!("unknown feature column: {}", name)))
            })
            .collect::<Result<Vec<_>>>()?;

        Schema::new(columns)
    }

    /// Build a typed record in schema order.
    ///
    /// Absent columns are defaulted according to `policy`; keys the schema does
    /// not know are ignored. Values are coerced to the column type: numeric
    /// columns accept numbers and numeric text, categorical columns accept text
    /// and stringify numbers.
    pub fn complete(&self, record: &PropertyRecord, policy: AbsentFeaturePolicy) -> Result<CompleteRecord> {
        let values = self
            .columns
            .iter()
            .map(|spec| match record.get(&spec.name) {
                Some(value) => coerce(spec, value),
                None => Ok(policy.default_for(spec.column_type)),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CompleteRecord::new(values))
    }
}

fn coerce(spec: &ColumnSpec, value: &FeatureValue) -> Result<FeatureValue> {
    match (spec.column_type, value) {
        (_, FeatureValue::Missing) => Ok(FeatureValue::Missing),
        (ColumnType::Numeric, FeatureValue::Number(v)) => {
            if v.is_finite() {
                Ok(FeatureValue::Number(*v))
            } else {
                Err(PricingError::InvalidFeatureValue {
                    feature: spec.name.clone(),
                    reason: "number must be finite".to_string(),
                })
            }
        }
        (ColumnType::Numeric, FeatureValue::Text(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(FeatureValue::Number)
            .ok_or_else(|| PricingError::InvalidFeatureValue {
                feature: spec.name.clone(),
                reason: format!("expected a number, got '{}'", s),
            }),
        (ColumnType::Categorical, FeatureValue::Text(s)) => Ok(FeatureValue::Text(s.clone())),
        (ColumnType::Categorical, FeatureValue::Number(v)) => {
            Ok(FeatureValue::Text(FeatureValue::format_number(*v)))
        }
    }
}
