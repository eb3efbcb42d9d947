//! Trained model snapshot and its on-disk format

mod store;

pub use store::ModelStore;

use crate::dataset::Schema;
use crate::error::{PricingError, Result};
use crate::preprocessing::DataPreprocessor;
use crate::training::{CandidateReport, Estimator, ModelType, RegressionMetrics};
use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Bumped whenever the serialized layout of [`TrainedModel`] changes
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Everything needed to turn a property record into a price.
///
/// Immutable once built; a retrain produces a new instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    id: String,
    estimator: Estimator,
    preprocessor: DataPreprocessor,
    schema: Schema,
    target_column: String,
    metrics: RegressionMetrics,
    candidates: Vec<CandidateReport>,
    n_train_samples: usize,
    n_test_samples: usize,
    trained_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct ModelFileRef<'a> {
    format_version: u32,
    model: &'a TrainedModel,
}

#[derive(Deserialize)]
struct ModelFile {
    format_version: u32,
    model: TrainedModel,
}

impl TrainedModel {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        estimator: Estimator,
        preprocessor: DataPreprocessor,
        schema: Schema,
        target_column: String,
        metrics: RegressionMetrics,
        candidates: Vec<CandidateReport>,
        n_train_samples: usize,
        n_test_samples: usize,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            estimator,
            preprocessor,
            schema,
            target_column,
            metrics,
            candidates,
            n_train_samples,
            n_test_samples,
            trained_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn model_type(&self) -> ModelType {
        self.estimator.model_type()
    }

    pub fn estimator(&self) -> &Estimator {
        &self.estimator
    }

    pub fn preprocessor(&self) -> &DataPreprocessor {
        &self.preprocessor
    }

    /// Fit-time feature columns, in order
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn target_column(&self) -> &str {
        &self.target_column
    }

    /// Holdout metrics of the selected estimator
    pub fn metrics(&self) -> &RegressionMetrics {
        &self.metrics
    }

    /// Holdout metrics of every candidate that trained
    pub fn candidates(&self) -> &[CandidateReport] {
        &self.candidates
    }

    pub fn n_train_samples(&self) -> usize {
        self.n_train_samples
    }

    pub fn n_test_samples(&self) -> usize {
        self.n_test_samples
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    /// Predict from an already transformed design matrix
    pub fn predict_matrix(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.estimator.predict(x)
    }

    /// Write the model to `path` as a single bincode file.
    ///
    /// The file is written next to its destination and renamed into place.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = path.with_extension("tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            bincode::serialize_into(
                &mut writer,
                &ModelFileRef { format_version: MODEL_FORMAT_VERSION, model: self },
            )?;
            writer.flush()?;
        }
        fs::rename(&tmp_path, path)?;

        info!(path = %path.display(), model_id = %self.id, "Saved model");
        Ok(())
    }

    /// Read a model written by [`TrainedModel::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let file: ModelFile = bincode::deserialize_from(reader)?;

        if file.format_version != MODEL_FORMAT_VERSION {
            return Err(PricingError::SerializationError(format!(
                "unsupported model format version {} (expected {})",
                file.format_version, MODEL_FORMAT_VERSION
            )));
        }

        info!(path = %path.display(), model_id = %file.model.id, "Loaded model");
        Ok(file.model)
    }
}
