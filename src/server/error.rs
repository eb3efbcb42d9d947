//! Error types for the server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::error::PricingError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Model not loaded")]
    ModelNotLoaded,

    #[error("{0}")]
    Internal(String),

    /// Retrain failure; never the caller's fault, whatever the cause
    #[error(transparent)]
    Training(PricingError),

    #[error(transparent)]
    Pricing(#[from] PricingError),
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Pricing(PricingError::InvalidFeatureValue { .. })
            | ServerError::Pricing(PricingError::SchemaError(_)) => StatusCode::BAD_REQUEST,
            ServerError::ModelNotLoaded
            | ServerError::Internal(_)
            | ServerError::Training(_)
            | ServerError::Pricing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), detail = %message, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), detail = %message, "Rejected request");
        }

        let body = Json(json!({
            "error": message,
            "status": "error",
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
