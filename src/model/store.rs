//! Process-wide published model

use super::TrainedModel;
use parking_lot::RwLock;
use std::sync::Arc;

/// Holds the currently published model.
///
/// Readers take an `Arc` snapshot and keep using it even if a retrain
/// publishes a replacement mid-request.
#[derive(Debug, Default)]
pub struct ModelStore {
    current: RwLock<Option<Arc<TrainedModel>>>,
}

impl ModelStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `model`
    pub fn with_model(model: TrainedModel) -> Self {
        Self {
            current: RwLock::new(Some(Arc::new(model))),
        }
    }

    /// Current model, if any
    pub fn snapshot(&self) -> Option<Arc<TrainedModel>> {
        self.current.read().clone()
    }

    /// Replace the published model; returns the new snapshot
    pub fn publish(&self, model: TrainedModel) -> Arc<TrainedModel> {
        let model = Arc::new(model);
        *self.current.write() = Some(Arc::clone(&model));
        model
    }

    pub fn is_loaded(&self) -> bool {
        self.current.read().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{ColumnData, ColumnSpec, Dataset, Schema};
    use crate::training::{Trainer, TrainingConfig};

    fn model() -> TrainedModel {
        let schema = Schema::new(vec![ColumnSpec::numeric("area")]).unwrap();
        let ds = Dataset::new(
            schema,
            vec![ColumnData::Numeric((0..10).map(|i| Some(i as f64)).collect())],
            (0..10).map(|i| i as f64).collect(),
        )
        .unwrap();
        Trainer::new(TrainingConfig::default().with_n_estimators(3)).fit(&ds).unwrap()
    }

    #[test]
    fn test_empty_store() {
        let store = ModelStore::new();
        assert!(!store.is_loaded());
        assert!(store.snapshot().is_none());
    }

    #[test]
    fn test_publish_swaps_snapshot() {
        let store = ModelStore::with_model(model());
        let first = store.snapshot().unwrap();

        let second = store.publish(model());
        assert_ne!(first.id(), second.id());
        assert_eq!(store.snapshot().unwrap().id(), second.id());

        // The old snapshot stays usable
        assert!(first.metrics().r2.is_finite());
    }
}
