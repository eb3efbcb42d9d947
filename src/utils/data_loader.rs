//! Data loading utilities

use crate::dataset::{ColumnData, ColumnSpec, Dataset, Schema};
use crate::error::{PricingError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Loads property datasets from CSV files
#[derive(Debug, Clone)]
pub struct DataLoader {
    /// Name of the price column
    target_column: String,
    /// Rows scanned to infer column types
    infer_schema_length: usize,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a loader for a `price` target
    pub fn new() -> Self {
        Self {
            target_column: "price".to_string(),
            infer_schema_length: 1000,
        }
    }

    /// Set the target column name
    pub fn with_target(mut self, target_column: impl Into<String>) -> Self {
        self.target_column = target_column.into();
        self
    }

    /// Set how many rows are scanned to infer column types
    pub fn with_infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = rows.max(1);
        self
    }

    pub fn target_column(&self) -> &str {
        &self.target_column
    }

    /// Load a CSV file into a typed dataset
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<Dataset> {
        let path = path.as_ref();
        let start = Instant::now();

        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PricingError::DatasetNotFound(path.to_path_buf()),
            _ => PricingError::IoError(e),
        })?;

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .into_reader_with_file_handle(file)
            .finish()?;

        let dataset = self.from_dataframe(&df)?;

        info!(
            path = %path.display(),
            rows = dataset.n_rows(),
            features = dataset.schema().len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded dataset"
        );

        Ok(dataset)
    }

    /// Convert a polars frame: string and boolean columns become categorical,
    /// everything castable to `Float64` becomes numeric.
    ///
    /// Rows without a finite target are dropped.
    pub fn from_dataframe(&self, df: &DataFrame) -> Result<Dataset> {
        let target_col = df.column(&self.target_column).map_err(|_| {
            PricingError::SchemaError(format!("target column '{}' not found", self.target_column))
        })?;

        let target: Vec<Option<f64>> = target_col
            .cast(&DataType::Float64)?
            .as_materialized_series()
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();

        let keep: Vec<usize> = target
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|_| i))
            .collect();

        let dropped = df.height() - keep.len();
        if dropped > 0 {
            warn!(dropped, target = %self.target_column, "Dropping rows without a numeric target");
        }
        if keep.is_empty() {
            return Err(PricingError::DataError(format!(
                "no rows with a numeric '{}' value",
                self.target_column
            )));
        }

        let mut specs = Vec::new();
        let mut columns = Vec::new();

        for column in df.get_columns() {
            let name = column.name().as_str();
            if name == self.target_column {
                continue;
            }

            let data = Self::convert_column(column)?;
            debug!(column = name, kind = ?data.column_type(), nulls = data.null_count(), "Detected column");

            specs.push(ColumnSpec { name: name.to_string(), column_type: data.column_type() });
            columns.push(data.take(&keep));
        }

        let target = keep.iter().filter_map(|&i| target[i]).collect();
        Dataset::new(Schema::new(specs)?, columns, target)
    }

    fn convert_column(column: &Column) -> Result<ColumnData> {
        match column.dtype() {
            DataType::String => Ok(Self::categorical(column)?),
            DataType::Boolean => Ok(Self::categorical(&column.cast(&DataType::String)?)?),
            _ => match column.cast(&DataType::Float64) {
                Ok(casted) => {
                    let values = casted
                        .as_materialized_series()
                        .f64()?
                        .into_iter()
                        .map(|v| v.filter(|x| x.is_finite()))
                        .collect();
                    Ok(ColumnData::Numeric(values))
                }
                Err(_) => Ok(Self::categorical(&column.cast(&DataType::String)?)?),
            },
        }
    }

    fn categorical(column: &Column) -> PolarsResult<ColumnData> {
        let values = column
            .as_materialized_series()
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect();
        Ok(ColumnData::Categorical(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ColumnType;
    use std::io::Write;

    fn create_test_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    #[test]
    fn test_load_csv_detects_column_types() {
        let file = create_test_csv(
            "area,city,bedrooms,price\n\
             5.0,Lahore,3,100\n\
             ,Karachi,2,200\n\
             10.0,,4,300\n",
        );

        let ds = DataLoader::new().load_csv(file.path()).unwrap();

        assert_eq!(ds.n_rows(), 3);
        assert_eq!(ds.schema().names(), vec!["area", "city", "bedrooms"]);
        assert_eq!(ds.schema().column("city").unwrap().column_type, ColumnType::Categorical);
        assert_eq!(ds.schema().column("bedrooms").unwrap().column_type, ColumnType::Numeric);
        assert_eq!(ds.column("area").unwrap().null_count(), 1);
        assert_eq!(ds.column("city").unwrap().null_count(), 1);
        assert_eq!(ds.target(), &[100.0, 200.0, 300.0]);
    }

    #[test]
    fn test_rows_without_target_dropped() {
        let file = create_test_csv("area,price\n1.0,10\n2.0,\n3.0,30\n");
        let ds = DataLoader::new().load_csv(file.path()).unwrap();
        assert_eq!(ds.n_rows(), 2);
        assert_eq!(ds.target(), &[10.0, 30.0]);
    }

    #[test]
    fn test_missing_file_is_dataset_not_found() {
        let err = DataLoader::new().load_csv("/nonexistent/House_dataset.csv").unwrap_err();
        assert!(matches!(err, PricingError::DatasetNotFound(_)));
    }

    #[test]
    fn test_missing_target_column() {
        let file = create_test_csv("area,city\n1.0,Lahore\n");
        let err = DataLoader::new().load_csv(file.path()).unwrap_err();
        assert!(matches!(err, PricingError::SchemaError(_)));
    }

    #[test]
    fn test_custom_target() {
        let file = create_test_csv("area,cost\n1.0,10\n2.0,20\n");
        let ds = DataLoader::new().with_target("cost").load_csv(file.path()).unwrap();
        assert_eq!(ds.schema().names(), vec!["area"]);
        assert_eq!(ds.target(), &[10.0, 20.0]);
    }
}
