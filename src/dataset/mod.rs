//! Typed, columnar property datasets
//!
//! A [`Dataset`] holds one typed column per [`Schema`] entry plus the parallel
//! price target. Rows can be viewed as [`PropertyRecord`]s, subset by index
//! (for the train/holdout split) or filtered down to complete rows.

mod record;
mod schema;

pub use record::{AbsentFeaturePolicy, CompleteRecord, FeatureValue, PropertyRecord};
pub use schema::{ColumnSpec, ColumnType, Schema, LISTING_FEATURES};

use crate::error::{PricingError, Result};

/// Values of one feature column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Categorical(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            ColumnData::Numeric(_) => ColumnType::Numeric,
            ColumnData::Categorical(_) => ColumnType::Categorical,
        }
    }

    pub fn null_count(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnData::Categorical(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }

    fn is_null(&self, row: usize) -> bool {
        match self {
            ColumnData::Numeric(v) => v[row].is_none(),
            ColumnData::Categorical(v) => v[row].is_none(),
        }
    }

    /// Value at `row` as a [`FeatureValue`]
    pub fn value(&self, row: usize) -> FeatureValue {
        match self {
            ColumnData::Numeric(v) => v[row].into(),
            ColumnData::Categorical(v) => v[row].clone().into(),
        }
    }

    /// Rows at `indices`, in that order
    pub fn take(&self, indices: &[usize]) -> ColumnData {
        match self {
            ColumnData::Numeric(v) => ColumnData::Numeric(indices.iter().map(|&i| v[i]).collect()),
            ColumnData::Categorical(v) => {
                ColumnData::Categorical(indices.iter().map(|&i| v[i].clone()).collect())
            }
        }
    }
}

/// Feature columns plus the parallel price target
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    schema: Schema,
    columns: Vec<ColumnData>,
    target: Vec<f64>,
}

impl Dataset {
    /// Create a dataset; every column must match its schema type and the target length.
    pub fn new(schema: Schema, columns: Vec<ColumnData>, target: Vec<f64>) -> Result<Self> {
        if columns.len() != schema.len() {
            return Err(PricingError::ShapeError {
                expected: format!("{} columns", schema.len()),
                actual: format!("{} columns", columns.len()),
            });
        }

        for (spec, column) in schema.columns().iter().zip(&columns) {
            if column.column_type() != spec.column_type {
                return Err(PricingError::SchemaError(format!(
                    "column '{}' is {:?} but schema says {:?}",
                    spec.name,
                    column.column_type(),
                    spec.column_type
                )));
            }
            if column.len() != target.len() {
                return Err(PricingError::ShapeError {
                    expected: format!("{} rows in '{}'", target.len(), spec.name),
                    actual: format!("{} rows", column.len()),
                });
            }
        }

        Ok(Self { schema, columns, target })
    }

    /// Build a dataset from records; absent keys become missing values.
    pub fn from_records(schema: Schema, records: &[PropertyRecord], target: Vec<f64>) -> Result<Self> {
        if records.len() != target.len() {
            return Err(PricingError::ShapeError {
                expected: format!("{} targets", records.len()),
                actual: format!("{} targets", target.len()),
            });
        }

        let completed = records
            .iter()
            .map(|r| schema.complete(r, AbsentFeaturePolicy::Impute))
            .collect::<Result<Vec<_>>>()?;

        let columns = schema
            .columns()
            .iter()
            .enumerate()
            .map(|(j, spec)| match spec.column_type {
                ColumnType::Numeric => ColumnData::Numeric(
                    completed.iter().map(|r| r.values()[j].as_number()).collect(),
                ),
                ColumnType::Categorical => ColumnData::Categorical(
                    completed
                        .iter()
                        .map(|r| r.values()[j].as_text().map(str::to_string))
                        .collect(),
                ),
            })
            .collect();

        Self::new(schema, columns, target)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn columns(&self) -> &[ColumnData] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnData> {
        self.schema.position(name).map(|i| &self.columns[i])
    }

    pub fn target(&self) -> &[f64] {
        &self.target
    }

    pub fn n_rows(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    /// Row `row` as a record keyed by column name
    pub fn record(&self, row: usize) -> PropertyRecord {
        self.schema
            .columns()
            .iter()
            .zip(&self.columns)
            .map(|(spec, column)| (spec.name.clone(), column.value(row)))
            .collect()
    }

    /// Rows at `indices`, in that order
    pub fn take(&self, indices: &[usize]) -> Dataset {
        Dataset {
            schema: self.schema.clone(),
            columns: self.columns.iter().map(|c| c.take(indices)).collect(),
            target: indices.iter().map(|&i| self.target[i]).collect(),
        }
    }

    /// Restrict to the named feature columns
    pub fn select_features(&self, names: &[String]) -> Result<Dataset> {
        let schema = self.schema.select(names)?;
        let columns = names
            .iter()
            .filter_map(|name| self.column(name).cloned())
            .collect();

        Dataset::new(schema, columns, self.target.clone())
    }

    /// Whether any feature value is missing
    pub fn has_missing(&self) -> bool {
        self.columns.iter().any(|c| c.null_count() > 0)
    }

    /// Drop every row that has at least one missing feature value
    pub fn drop_incomplete_rows(&self) -> Dataset {
        let keep: Vec<usize> = (0..self.n_rows())
            .filter(|&row| !self.columns.iter().any(|c| c.is_null(row)))
            .collect();

        self.take(&keep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_dataset() -> Dataset {
        let schema = Schema::new(vec![ColumnSpec::numeric("area"), ColumnSpec::categorical("city")]).unwrap();
        Dataset::new(
            schema,
            vec![
                ColumnData::Numeric(vec![Some(5.0), None, Some(10.0)]),
                ColumnData::Categorical(vec![Some("Lahore".into()), Some("Karachi".into()), None]),
            ],
            vec![100.0, 200.0, 300.0],
        )
        .unwrap()
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let schema = Schema::new(vec![ColumnSpec::numeric("area")]).unwrap();
        let result = Dataset::new(schema, vec![ColumnData::Numeric(vec![Some(1.0)])], vec![1.0, 2.0]);
        assert!(matches!(result, Err(PricingError::ShapeError { .. })));
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let schema = Schema::new(vec![ColumnSpec::categorical("area")]).unwrap();
        let result = Dataset::new(schema, vec![ColumnData::Numeric(vec![Some(1.0)])], vec![1.0]);
        assert!(matches!(result, Err(PricingError::SchemaError(_))));
    }

    #[test]
    fn test_drop_incomplete_rows() {
        let ds = small_dataset();
        assert!(ds.has_missing());

        let clean = ds.drop_incomplete_rows();
        assert_eq!(clean.n_rows(), 1);
        assert_eq!(clean.target(), &[100.0]);
        assert!(!clean.has_missing());
    }

    #[test]
    fn test_record_roundtrip_through_from_records() {
        let ds = small_dataset();
        let records: Vec<PropertyRecord> = (0..ds.n_rows()).map(|i| ds.record(i)).collect();
        let rebuilt = Dataset::from_records(ds.schema().clone(), &records, ds.target().to_vec()).unwrap();
        assert_eq!(rebuilt, ds);
    }

    #[test]
    fn test_take_and_select() {
        let ds = small_dataset();
        let subset = ds.take(&[2, 0]);
        assert_eq!(subset.target(), &[300.0, 100.0]);

        let only_city = ds.select_features(&["city".to_string()]).unwrap();
        assert_eq!(only_city.schema().names(), vec!["city"]);
        assert_eq!(only_city.n_rows(), 3);
    }
}
