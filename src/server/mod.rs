//! House price prediction server
//!
//! JSON API over the published model: health and model introspection,
//! per-listing prediction and synchronous retraining.

mod api;
mod error;
mod handlers;
mod state;

pub use api::create_router;
pub use error::ServerError;
pub use state::{load_startup_model, train_from_config, AppState};

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::dataset::AbsentFeaturePolicy;
use crate::error::PricingError;
use crate::inference::InferenceConfig;
use crate::training::{ModelVariant, TrainingConfig};

/// Shape of the `/predict` request body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PredictBodyLayout {
    /// `{"features": {...}}`
    #[default]
    Wrapped,
    /// The feature object itself
    Flat,
}

impl FromStr for PredictBodyLayout {
    type Err = PricingError;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wrapped" => Ok(PredictBodyLayout::Wrapped),
            "flat" => Ok(PredictBodyLayout::Flat),
            other => Err(PricingError::ConfigError(format!(
                "unknown predict body layout '{}', expected 'wrapped' or 'flat'",
                other
            ))),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub dataset_path: PathBuf,
    pub model_path: PathBuf,
    pub persist_model: bool,
    pub target_column: String,
    pub variant: ModelVariant,
    pub predict_body: PredictBodyLayout,
    pub inference: InferenceConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            dataset_path: std::env::var("DATASET_PATH")
                .unwrap_or_else(|_| "House_dataset.csv".to_string())
                .into(),
            model_path: std::env::var("MODEL_PATH")
                .unwrap_or_else(|_| "models/house_price_model.bin".to_string())
                .into(),
            persist_model: std::env::var("PERSIST_MODEL")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            target_column: std::env::var("TARGET_COLUMN").unwrap_or_else(|_| "price".to_string()),
            variant: env_or_default("MODEL_VARIANT"),
            predict_body: env_or_default("PREDICT_BODY"),
            inference: InferenceConfig::default().with_absent_features(absent_policy_from_env()),
        }
    }
}

impl ServerConfig {
    /// Training setup for the configured variant and target
    pub fn training_config(&self) -> TrainingConfig {
        TrainingConfig::for_variant(self.variant, &self.target_column)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn env_or_default<T>(key: &str) -> T
where
    T: FromStr<Err = PricingError> + Default,
{
    match std::env::var(key) {
        Ok(value) => value.parse().unwrap_or_else(|e| {
            warn!(key, value = %value, error = %e, "Ignoring invalid setting");
            T::default()
        }),
        Err(_) => T::default(),
    }
}

fn absent_policy_from_env() -> AbsentFeaturePolicy {
    match std::env::var("ABSENT_FEATURES") {
        Ok(value) if value.trim().eq_ignore_ascii_case("impute") => AbsentFeaturePolicy::Impute,
        Ok(value) if !value.trim().eq_ignore_ascii_case("zero") => {
            warn!(value = %value, "Ignoring invalid ABSENT_FEATURES, expected 'zero' or 'impute'");
            AbsentFeaturePolicy::Zero
        }
        _ => AbsentFeaturePolicy::Zero,
    }
}

/// Start the server with the given configuration
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let start_time = chrono::Utc::now();
    info!(
        dataset = %config.dataset_path.display(),
        model_path = %config.model_path.display(),
        variant = ?config.variant,
        persist_model = config.persist_model,
        "Preparing model"
    );

    let state = Arc::new(AppState::new(config.clone()));

    let startup_config = config.clone();
    match tokio::task::spawn_blocking(move || load_startup_model(&startup_config)).await? {
        Ok(model) => {
            info!(
                model_id = %model.id(),
                model_type = %model.model_type(),
                mae = model.metrics().mae,
                mse = model.metrics().mse,
                r2 = model.metrics().r2,
                "Model ready"
            );
            state.store.publish(model);
        }
        Err(e) => {
            error!(error = %e, "Error loading model, starting without one");
        }
    }

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, pid = std::process::id(), "House price API listening");

    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
            return;
        }
        let uptime = chrono::Utc::now().signed_duration_since(start_time);
        info!(uptime_secs = uptime.num_seconds(), "Shutdown signal received, stopping server gracefully");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}
