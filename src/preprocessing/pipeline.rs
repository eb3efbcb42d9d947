//! Data preprocessing pipeline

use crate::dataset::{ColumnData, ColumnType, CompleteRecord, Dataset, FeatureValue, Schema};
use crate::error::{PricingError, Result};
use super::{
    config::{MissingValuePolicy, PreprocessingConfig},
    encoder::{Encoded, Encoder},
    imputer::Imputer,
    scaler::Scaler,
};
use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

/// Turns typed property records into a numeric design matrix.
///
/// Output layout: scaled numeric columns in schema order, followed by the
/// encoded block of each categorical column in schema order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPreprocessor {
    config: PreprocessingConfig,
    schema: Option<Schema>,
    /// Schema positions of numeric columns
    numeric_positions: Vec<usize>,
    /// Schema positions of categorical columns
    categorical_positions: Vec<usize>,
    imputer: Imputer,
    scaler: Scaler,
    encoder: Encoder,
    output_names: Vec<String>,
    is_fitted: bool,
}

impl DataPreprocessor {
    /// Create a new preprocessor with default configuration
    pub fn new() -> Self {
        Self::with_config(PreprocessingConfig::default())
    }

    /// Create a new preprocessor with custom configuration
    pub fn with_config(config: PreprocessingConfig) -> Self {
        Self {
            scaler: Scaler::new(config.scaler_type),
            encoder: Encoder::new(config.encoder_type, config.unknown_categories),
            config,
            schema: None,
            numeric_positions: Vec::new(),
            categorical_positions: Vec::new(),
            imputer: Imputer::new(),
            output_names: Vec::new(),
            is_fitted: false,
        }
    }

    pub fn config(&self) -> &PreprocessingConfig {
        &self.config
    }

    /// Schema the preprocessor was fitted on
    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    /// Fitted mean or mode that replaces a missing value of column `name`
    pub fn fill_value(&self, name: &str) -> Result<FeatureValue> {
        let position = self
            .fitted_schema()?
            .position(name)
            .ok_or_else(|| PricingError::SchemaError(format!("unknown feature column: {}", name)))?;
        self.imputer.fill(position, FeatureValue::Missing)
    }

    /// Apply the fit-time missing-value policy to a dataset
    pub fn prepare_rows(&self, dataset: &Dataset) -> Dataset {
        match self.config.missing_values {
            MissingValuePolicy::DropRows => dataset.drop_incomplete_rows(),
            MissingValuePolicy::Impute => dataset.clone(),
        }
    }

    /// Learn fill values, scaling parameters and vocabularies from `dataset`
    pub fn fit(&mut self, dataset: &Dataset) -> Result<&mut Self> {
        let start = Instant::now();
        self.config.validate()?;

        let dataset = self.prepare_rows(dataset);
        if dataset.is_empty() {
            return Err(PricingError::PreprocessingError(
                "no rows left to fit after applying the missing-value policy".to_string(),
            ));
        }

        let schema = dataset.schema().clone();
        self.numeric_positions = positions_of(&schema, ColumnType::Numeric);
        self.categorical_positions = positions_of(&schema, ColumnType::Categorical);

        self.imputer = Imputer::new();
        self.imputer.fit(&dataset)?;

        let numeric: Vec<Vec<f64>> = self
            .numeric_positions
            .iter()
            .map(|&j| -> Result<Vec<f64>> {
                match &dataset.columns()[j] {
                    ColumnData::Numeric(values) => {
                        let fill = self.imputer.fill(j, FeatureValue::Missing)?.as_number().unwrap_or(0.0);
                        Ok(values.iter().map(|v| v.unwrap_or(fill)).collect())
                    }
                    ColumnData::Categorical(_) => Err(type_mismatch(&schema, j)),
                }
            })
            .collect::<Result<_>>()?;

        let categorical: Vec<Vec<String>> = self
            .categorical_positions
            .iter()
            .map(|&j| -> Result<Vec<String>> {
                match &dataset.columns()[j] {
                    ColumnData::Categorical(values) => {
                        let fill = self.imputer.fill(j, FeatureValue::Missing)?;
                        let fill = fill.as_text().unwrap_or_default().to_string();
                        Ok(values.iter().map(|v| v.clone().unwrap_or_else(|| fill.clone())).collect())
                    }
                    ColumnData::Numeric(_) => Err(type_mismatch(&schema, j)),
                }
            })
            .collect::<Result<_>>()?;

        self.scaler = Scaler::new(self.config.scaler_type);
        self.scaler.fit(&numeric)?;

        self.encoder = Encoder::new(self.config.encoder_type, self.config.unknown_categories);
        self.encoder.fit(&categorical)?;

        let mut names: Vec<String> = self
            .numeric_positions
            .iter()
            .map(|&j| schema.columns()[j].name.clone())
            .collect();
        for (k, &j) in self.categorical_positions.iter().enumerate() {
            names.extend(self.encoder.output_names(k, &schema.columns()[j].name)?);
        }
        self.output_names = names;

        self.schema = Some(schema);
        self.is_fitted = true;

        debug!(
            rows = dataset.n_rows(),
            numeric = self.numeric_positions.len(),
            categorical = self.categorical_positions.len(),
            outputs = self.output_names.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fitted preprocessor"
        );

        Ok(self)
    }

    /// Transform every row of `dataset`; missing values are imputed.
    pub fn transform(&self, dataset: &Dataset) -> Result<Array2<f64>> {
        let schema = self.fitted_schema()?;
        if dataset.schema() != schema {
            return Err(PricingError::SchemaError(format!(
                "dataset columns {:?} do not match fitted columns {:?}",
                dataset.schema().names(),
                schema.names()
            )));
        }

        let columns = dataset.columns();
        let rows = (0..dataset.n_rows())
            .into_par_iter()
            .map(|row| self.encode_row(|j| columns[j].value(row)))
            .collect::<Result<Vec<_>>>()?;

        self.stack(rows)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, dataset: &Dataset) -> Result<Array2<f64>> {
        self.fit(dataset)?;
        self.transform(dataset)
    }

    /// Transform completed records (as built by [`Schema::complete`])
    pub fn transform_records(&self, records: &[CompleteRecord]) -> Result<Array2<f64>> {
        let schema = self.fitted_schema()?;

        let rows = records
            .iter()
            .map(|record| {
                if record.values().len() != schema.len() {
                    return Err(PricingError::ShapeError {
                        expected: format!("{} values", schema.len()),
                        actual: format!("{} values", record.values().len()),
                    });
                }
                self.encode_row(|j| record.values()[j].clone())
            })
            .collect::<Result<Vec<_>>>()?;

        self.stack(rows)
    }

    /// How a categorical value of column `name` would be encoded
    pub fn encode_category(&self, name: &str, value: &str) -> Result<Encoded> {
        let schema = self.fitted_schema()?;
        let k = schema
            .position(name)
            .and_then(|j| self.categorical_positions.iter().position(|&p| p == j))
            .ok_or_else(|| PricingError::SchemaError(format!("'{}' is not a categorical feature", name)))?;

        self.encoder.encode(k, value)
    }

    /// Names of the output columns, in matrix order
    pub fn output_feature_names(&self) -> &[String] {
        &self.output_names
    }

    pub fn n_output_features(&self) -> usize {
        self.output_names.len()
    }

    fn fitted_schema(&self) -> Result<&Schema> {
        match (&self.schema, self.is_fitted) {
            (Some(schema), true) => Ok(schema),
            _ => Err(PricingError::ModelNotFitted),
        }
    }

    fn encode_row<F>(&self, value_at: F) -> Result<Vec<f64>>
    where
        F: Fn(usize) -> FeatureValue,
    {
        let schema = self.fitted_schema()?;
        let mut out = vec![0.0; self.output_names.len()];
        let mut offset = 0;

        for (k, &j) in self.numeric_positions.iter().enumerate() {
            let value = self.imputer.fill(j, value_at(j))?;
            let number = value.as_number().ok_or_else(|| PricingError::InvalidFeatureValue {
                feature: schema.columns()[j].name.clone(),
                reason: "expected a number".to_string(),
            })?;
            out[offset] = self.scaler.transform_value(k, number)?;
            offset += 1;
        }

        for (k, &j) in self.categorical_positions.iter().enumerate() {
            let value = self.imputer.fill(j, value_at(j))?;
            let text = value.as_text().ok_or_else(|| PricingError::InvalidFeatureValue {
                feature: schema.columns()[j].name.clone(),
                reason: "expected text".to_string(),
            })?;
            let width = self.encoder.width(k)?;
            self.encoder.write(k, text, &mut out[offset..offset + width])?;
            offset += width;
        }

        Ok(out)
    }

    fn stack(&self, rows: Vec<Vec<f64>>) -> Result<Array2<f64>> {
        let n_rows = rows.len();
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        Ok(Array2::from_shape_vec((n_rows, self.output_names.len()), flat)?)
    }
}

impl Default for DataPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

fn positions_of(schema: &Schema, column_type: ColumnType) -> Vec<usize> {
    schema
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.column_type == column_type)
        .map(|(j, _)| j)
        .collect()
}

fn type_mismatch(schema: &Schema, j: usize) -> PricingError {
    PricingError::SchemaError(format!("column '{}' does not match its schema type", schema.columns()[j].name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{AbsentFeaturePolicy, ColumnSpec, PropertyRecord};
    use crate::preprocessing::UnknownCategoryPolicy;

    fn create_test_dataset() -> Dataset {
        let schema = Schema::new(vec![
            ColumnSpec::numeric("area"),
            ColumnSpec::categorical("city"),
            ColumnSpec::numeric("baths"),
        ])
        .unwrap();
        Dataset::new(
            schema,
            vec![
                ColumnData::Numeric(vec![Some(2.0), Some(4.0), None, Some(6.0)]),
                ColumnData::Categorical(vec![
                    Some("Lahore".into()),
                    Some("Karachi".into()),
                    Some("Lahore".into()),
                    None,
                ]),
                ColumnData::Numeric(vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]),
            ],
            vec![10.0, 20.0, 30.0, 40.0],
        )
        .unwrap()
    }

    #[test]
    fn test_onehot_layout() {
        let ds = create_test_dataset();
        let mut preprocessor = DataPreprocessor::new();
        let x = preprocessor.fit_transform(&ds).unwrap();

        assert_eq!(
            preprocessor.output_feature_names(),
            &["area", "baths", "city=Karachi", "city=Lahore"]
        );
        assert_eq!(x.dim(), (4, 4));

        // Imputed area equals the mean, which scales to zero
        assert!(x[[2, 0]].abs() < 1e-10);
        // Missing city imputed with the mode
        assert_eq!(x[[3, 3]], 1.0);
        assert_eq!(x[[1, 2]], 1.0);
    }

    #[test]
    fn test_drop_rows_policy() {
        let ds = create_test_dataset();
        let mut preprocessor = DataPreprocessor::with_config(PreprocessingConfig::label_encoded());
        preprocessor.fit(&ds).unwrap();

        let prepared = preprocessor.prepare_rows(&ds);
        assert_eq!(prepared.n_rows(), 2);

        let x = preprocessor.transform(&prepared).unwrap();
        assert_eq!(preprocessor.output_feature_names(), &["area", "baths", "city"]);
        // No scaling under the label preset
        assert_eq!(x[[0, 0]], 2.0);
        assert_eq!(x[[1, 2]], 0.0);
    }

    #[test]
    fn test_transform_records_matches_dataset_rows() {
        let ds = create_test_dataset();
        let mut preprocessor = DataPreprocessor::new();
        let x = preprocessor.fit_transform(&ds).unwrap();

        let record = PropertyRecord::new().with("area", 2.0).with("city", "Lahore").with("baths", 1.0);
        let complete = ds.schema().complete(&record, AbsentFeaturePolicy::Zero).unwrap();
        let row = preprocessor.transform_records(&[complete]).unwrap();

        assert_eq!(row.row(0), x.row(0));
    }

    #[test]
    fn test_unknown_category() {
        let ds = create_test_dataset();
        let mut preprocessor = DataPreprocessor::new();
        preprocessor.fit(&ds).unwrap();

        assert_eq!(preprocessor.encode_category("city", "Quetta").unwrap(), Encoded::Ignored);
        assert_eq!(preprocessor.encode_category("city", "Lahore").unwrap(), Encoded::Known(1));
        assert!(preprocessor.encode_category("area", "x").is_err());

        let mut fallback = DataPreprocessor::with_config(
            PreprocessingConfig::one_hot().with_unknown_categories(UnknownCategoryPolicy::FirstKnown),
        );
        fallback.fit(&ds).unwrap();
        assert_eq!(fallback.encode_category("city", "Quetta").unwrap(), Encoded::Fallback(0));
    }

    #[test]
    fn test_fill_values() {
        let ds = create_test_dataset();
        let mut preprocessor = DataPreprocessor::new();
        assert!(preprocessor.fill_value("area").is_err());

        preprocessor.fit(&ds).unwrap();
        assert_eq!(preprocessor.fill_value("area").unwrap(), FeatureValue::Number(4.0));
        assert_eq!(preprocessor.fill_value("city").unwrap(), FeatureValue::Text("Lahore".into()));
        assert!(matches!(preprocessor.fill_value("garage"), Err(PricingError::SchemaError(_))));
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let ds = create_test_dataset();
        let preprocessor = DataPreprocessor::new();
        assert!(matches!(preprocessor.transform(&ds), Err(PricingError::ModelNotFitted)));
    }

    #[test]
    fn test_schema_mismatch_rejected() {
        let ds = create_test_dataset();
        let mut preprocessor = DataPreprocessor::new();
        preprocessor.fit(&ds).unwrap();

        let other = ds.select_features(&["area".to_string()]).unwrap();
        assert!(matches!(preprocessor.transform(&other), Err(PricingError::SchemaError(_))));
    }

    #[test]
    fn test_serialization_preserves_transform() {
        let ds = create_test_dataset();
        let mut preprocessor = DataPreprocessor::new();
        let x = preprocessor.fit_transform(&ds).unwrap();

        let bytes = bincode::serialize(&preprocessor).unwrap();
        let restored: DataPreprocessor = bincode::deserialize(&bytes).unwrap();
        assert_eq!(restored.transform(&ds).unwrap(), x);
    }
}
