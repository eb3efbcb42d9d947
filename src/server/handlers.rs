//! HTTP request handlers

use std::sync::Arc;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::dataset::PropertyRecord;
use crate::model::{ModelStore, TrainedModel};

use super::error::{Result, ServerError};
use super::state::{train_from_config, AppState};
use super::{PredictBodyLayout, ServerConfig};

fn current_model(state: &AppState) -> Result<Arc<TrainedModel>> {
    state.store.snapshot().ok_or(ServerError::ModelNotLoaded)
}

// ============================================================================
// Service Handlers
// ============================================================================

pub async fn index() -> Json<Value> {
    Json(json!({
        "service": "House Price Prediction API",
        "version": env!("CARGO_PKG_VERSION"),
        "routes": [
            { "method": "GET", "path": "/health", "description": "Service status and whether a model is loaded" },
            { "method": "GET", "path": "/model/info", "description": "Model type and holdout metrics" },
            { "method": "GET", "path": "/features", "description": "Feature columns expected by /predict" },
            { "method": "POST", "path": "/predict", "description": "Predict the price of one listing" },
            { "method": "POST", "path": "/retrain", "description": "Retrain the model from the dataset" },
        ],
    }))
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "model_loaded": state.store.is_loaded(),
    }))
}

// ============================================================================
// Model Handlers
// ============================================================================

pub async fn model_info(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let model = current_model(&state)?;

    Ok(Json(json!({
        "model_id": model.id(),
        "model_type": model.model_type().name(),
        "features_count": model.schema().len(),
        "status": "trained",
        "metrics": model.metrics(),
        "trained_at": model.trained_at().to_rfc3339(),
        "n_train_samples": model.n_train_samples(),
        "n_test_samples": model.n_test_samples(),
    })))
}

pub async fn features(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let model = current_model(&state)?;
    let schema = model.schema();

    Ok(Json(json!({
        "features": schema.names(),
        "numerical": schema.numeric_columns(),
        "categorical": schema.categorical_columns(),
        "total_features": schema.len(),
        "encoded_features": model.preprocessor().output_feature_names(),
    })))
}

// ============================================================================
// Inference Handlers
// ============================================================================

pub async fn predict(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>> {
    let model = current_model(&state)?;

    let Json(body) = body.map_err(|e| ServerError::BadRequest(format!("Invalid JSON body: {}", e.body_text())))?;
    let record = parse_record(&body, state.config.predict_body)?;

    let prediction = state.predictor.predict(&model, &record)?;

    Ok(Json(json!({
        "prediction": prediction,
        "status": "success",
    })))
}

fn parse_record(body: &Value, layout: PredictBodyLayout) -> Result<PropertyRecord> {
    let object = body
        .as_object()
        .ok_or_else(|| ServerError::BadRequest("Request body must be a JSON object".to_string()))?;

    let features = match layout {
        PredictBodyLayout::Wrapped => object
            .get("features")
            .and_then(Value::as_object)
            .ok_or_else(|| ServerError::BadRequest("Missing features in request".to_string()))?,
        PredictBodyLayout::Flat => object,
    };

    Ok(PropertyRecord::from_json_object(features)?)
}

// ============================================================================
// Training Handlers
// ============================================================================

pub async fn retrain(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    info!(dataset = %state.config.dataset_path.display(), "Retrain requested");

    // Detached so the result is published even if the client goes away
    let task = tokio::spawn(retrain_and_publish(
        Arc::clone(&state.retrain_lock),
        Arc::clone(&state.store),
        state.config.clone(),
    ));

    let model = task
        .await
        .map_err(|e| ServerError::Internal(format!("Training task failed: {}", e)))??;

    Ok(Json(json!({
        "status": "Model retrained successfully",
        "model_id": model.id(),
        "model_type": model.model_type().name(),
        "metrics": model.metrics(),
        "candidates": model.candidates(),
        "n_train_samples": model.n_train_samples(),
        "n_test_samples": model.n_test_samples(),
    })))
}

async fn retrain_and_publish(
    lock: Arc<Mutex<()>>,
    store: Arc<ModelStore>,
    config: ServerConfig,
) -> Result<Arc<TrainedModel>> {
    let _guard = lock.lock_owned().await;

    let trained = tokio::task::spawn_blocking(move || train_from_config(&config))
        .await
        .map_err(|e| ServerError::Internal(format!("Training task failed: {}", e)))?;

    let model = match trained {
        Ok(model) => store.publish(model),
        Err(e) => {
            error!(error = %e, model_loaded = store.is_loaded(), "Retrain failed, keeping current model");
            return Err(ServerError::Training(e));
        }
    };

    info!(
        model_id = %model.id(),
        model_type = %model.model_type(),
        r2 = model.metrics().r2,
        "Model retrained"
    );

    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::FeatureValue;

    #[test]
    fn test_parse_wrapped_body() {
        let body = json!({ "features": { "baths": 3, "city": "Lahore" } });
        let record = parse_record(&body, PredictBodyLayout::Wrapped).unwrap();
        assert_eq!(record.get("baths"), Some(&FeatureValue::Number(3.0)));
        assert_eq!(record.get("city"), Some(&FeatureValue::Text("Lahore".into())));
    }

    #[test]
    fn test_wrapped_body_requires_features() {
        let err = parse_record(&json!({ "baths": 3 }), PredictBodyLayout::Wrapped).unwrap_err();
        assert_eq!(err.to_string(), "Missing features in request");

        let err = parse_record(&json!({ "features": [1, 2] }), PredictBodyLayout::Wrapped).unwrap_err();
        assert!(matches!(err, ServerError::BadRequest(_)));
    }

    #[test]
    fn test_flat_body() {
        let record = parse_record(&json!({ "baths": 3 }), PredictBodyLayout::Flat).unwrap();
        assert_eq!(record.len(), 1);
        assert!(parse_record(&json!([1, 2, 3]), PredictBodyLayout::Flat).is_err());
    }

    #[test]
    fn test_nested_value_rejected() {
        let body = json!({ "features": { "baths": { "min": 2 } } });
        let err = parse_record(&body, PredictBodyLayout::Wrapped).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }
}
