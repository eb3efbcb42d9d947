//! Application state management

use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::Result;
use crate::inference::PredictionService;
use crate::model::{ModelStore, TrainedModel};
use crate::staging;
use crate::training::Trainer;

use super::ServerConfig;

/// Application state shared across handlers
pub struct AppState {
    pub config: ServerConfig,
    pub store: Arc<ModelStore>,
    pub predictor: PredictionService,
    /// Held for the whole duration of a retrain, by the task doing the work
    pub retrain_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self::with_store(config, Arc::new(ModelStore::new()))
    }

    pub fn with_store(config: ServerConfig, store: Arc<ModelStore>) -> Self {
        let predictor = PredictionService::new(config.inference.clone());
        Self {
            config,
            store,
            predictor,
            retrain_lock: Arc::new(Mutex::new(())),
        }
    }
}

/// Train from the configured dataset, persisting when enabled.
///
/// A failed save is logged and does not discard the freshly trained model.
pub fn train_from_config(config: &ServerConfig) -> Result<TrainedModel> {
    let trainer = Trainer::new(config.training_config());
    let model = trainer.fit_csv(&config.dataset_path)?;

    if config.persist_model {
        if let Err(e) = model.save(&config.model_path) {
            warn!(path = %config.model_path.display(), error = %e, "Failed to persist model");
        }
    }

    Ok(model)
}

/// Resolve the model to serve at startup: an existing model file, a model
/// rebuilt from chunks staged next to it, or a fresh training run.
pub fn load_startup_model(config: &ServerConfig) -> Result<TrainedModel> {
    let model_path = &config.model_path;

    if model_path.is_file() {
        info!(path = %model_path.display(), "Loading persisted model");
        return TrainedModel::load(model_path);
    }

    let dir = match model_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    if staging::has_manifest(dir) {
        let manifest = staging::ChunkManifest::read(dir)?;
        let expected = model_path.file_name().and_then(|n| n.to_str());
        if expected == Some(manifest.original_filename.as_str()) {
            info!(dir = %dir.display(), parts = manifest.total_parts, "Rebuilding model from chunks");
            let rebuilt = staging::reconstruct(dir)?;
            return TrainedModel::load(rebuilt);
        }
        warn!(
            manifest_file = %manifest.original_filename,
            model_path = %model_path.display(),
            "Chunk manifest describes a different file, ignoring"
        );
    }

    info!(dataset = %config.dataset_path.display(), "No persisted model found, training from dataset");
    train_from_config(config)
}
