//! Training engine implementation

use crate::dataset::Dataset;
use crate::error::{PricingError, Result};
use crate::model::TrainedModel;
use crate::preprocessing::DataPreprocessor;
use crate::utils::DataLoader;
use super::decision_tree::DecisionTree;
use super::linear_models::LinearRegression;
use super::metrics::RegressionMetrics;
use super::random_forest::RandomForest;
use super::split::train_test_split;
use super::{ModelType, TrainingConfig};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A fitted regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Estimator {
    RandomForest(RandomForest),
    LinearRegression(LinearRegression),
    DecisionTree(DecisionTree),
}

impl Estimator {
    pub fn model_type(&self) -> ModelType {
        match self {
            Estimator::RandomForest(_) => ModelType::RandomForest,
            Estimator::LinearRegression(_) => ModelType::LinearRegression,
            Estimator::DecisionTree(_) => ModelType::DecisionTree,
        }
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            Estimator::RandomForest(m) => m.predict(x),
            Estimator::LinearRegression(m) => m.predict(x),
            Estimator::DecisionTree(m) => m.predict(x),
        }
    }

    /// Feature importances, for tree models
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        match self {
            Estimator::RandomForest(m) => m.feature_importances(),
            Estimator::DecisionTree(m) => m.feature_importances(),
            Estimator::LinearRegression(_) => None,
        }
    }
}

/// Holdout score of one fitted candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateReport {
    pub model_type: ModelType,
    pub metrics: RegressionMetrics,
    pub training_time_secs: f64,
}

/// Fits the configured candidates and keeps the best one
#[derive(Debug, Clone)]
pub struct Trainer {
    config: TrainingConfig,
}

impl Trainer {
    /// Create a new trainer
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Load a CSV and train on it
    pub fn fit_csv(&self, path: impl AsRef<Path>) -> Result<TrainedModel> {
        self.config.validate()?;
        let dataset = DataLoader::new()
            .with_target(&self.config.target_column)
            .load_csv(path)?;
        self.fit(&dataset)
    }

    /// Train every candidate on the training partition, score on the
    /// holdout and return the best as a [`TrainedModel`].
    pub fn fit(&self, dataset: &Dataset) -> Result<TrainedModel> {
        let start = Instant::now();
        self.config.validate()?;

        let dataset = match &self.config.feature_columns {
            Some(columns) => dataset.select_features(columns)?,
            None => dataset.clone(),
        };
        if let Some(expected) = &self.config.expected_schema {
            dataset.schema().conforms_to(expected)?;
        }

        let mut preprocessor = DataPreprocessor::with_config(self.config.preprocessing.clone());
        let dataset = preprocessor.prepare_rows(&dataset);
        if dataset.n_rows() < 2 {
            return Err(PricingError::TrainingError(format!(
                "need at least 2 usable rows to train, got {}",
                dataset.n_rows()
            )));
        }

        let split = train_test_split(dataset.n_rows(), self.config.test_size, self.config.random_seed)?;
        let train = dataset.take(&split.train);
        let test = dataset.take(&split.test);

        preprocessor.fit(&train)?;
        let x_train = preprocessor.transform(&train)?;
        let x_test = preprocessor.transform(&test)?;
        let y_train = Array1::from_vec(train.target().to_vec());
        let y_test = Array1::from_vec(test.target().to_vec());

        info!(
            train_rows = x_train.nrows(),
            test_rows = x_test.nrows(),
            features = x_train.ncols(),
            candidates = self.config.candidates.len(),
            "Training started"
        );

        let mut best: Option<(Estimator, CandidateReport)> = None;
        let mut reports = Vec::with_capacity(self.config.candidates.len());

        for &model_type in &self.config.candidates {
            let model_start = Instant::now();

            let fitted = self
                .fit_candidate(model_type, &x_train, &y_train)
                .and_then(|estimator| {
                    let y_pred = estimator.predict(&x_test)?;
                    Ok((estimator, y_pred))
                });

            let (estimator, y_pred) = match fitted {
                Ok(result) => result,
                Err(e) => {
                    warn!(model = %model_type, error = %e, "Candidate failed to train");
                    continue;
                }
            };

            let report = CandidateReport {
                model_type,
                metrics: RegressionMetrics::compute(&y_test, &y_pred),
                training_time_secs: model_start.elapsed().as_secs_f64(),
            };

            info!(
                model = %model_type,
                mae = report.metrics.mae,
                mse = report.metrics.mse,
                r2 = report.metrics.r2,
                "Candidate scored"
            );

            if best.as_ref().map_or(true, |(_, b)| report.metrics.beats(&b.metrics)) {
                best = Some((estimator, report.clone()));
            }
            reports.push(report);
        }

        let (estimator, report) = best.ok_or_else(|| {
            PricingError::TrainingError("no candidate model could be trained".to_string())
        })?;

        let schema = train.schema().clone();
        let model = TrainedModel::new(
            estimator,
            preprocessor,
            schema,
            self.config.target_column.clone(),
            report.metrics,
            reports,
            train.n_rows(),
            test.n_rows(),
        );

        info!(
            model_id = %model.id(),
            model = %model.model_type(),
            r2 = model.metrics().r2,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Training complete"
        );

        Ok(model)
    }

    fn fit_candidate(&self, model_type: ModelType, x: &Array2<f64>, y: &Array1<f64>) -> Result<Estimator> {
        debug!(model = %model_type, "Fitting candidate");

        let estimator = match model_type {
            ModelType::RandomForest => {
                let mut model = RandomForest::new(self.config.n_estimators)
                    .with_random_state(self.config.random_seed)
                    .with_min_samples_leaf(self.config.min_samples_leaf);
                if let Some(depth) = self.config.max_depth {
                    model = model.with_max_depth(depth);
                }
                model.fit(x, y)?;
                Estimator::RandomForest(model)
            }
            ModelType::LinearRegression => {
                let mut model = LinearRegression::new();
                model.fit(x, y)?;
                Estimator::LinearRegression(model)
            }
            ModelType::DecisionTree => {
                let mut model = DecisionTree::new().with_min_samples_leaf(self.config.min_samples_leaf);
                if let Some(depth) = self.config.max_depth {
                    model = model.with_max_depth(depth);
                }
                model.fit(x, y)?;
                Estimator::DecisionTree(model)
            }
        };

        Ok(estimator)
    }
}
