//! Custom error types for the web service

use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::RegistryError;
use serde_json::json;
use thiserror::Error;

/// Custom error type for JSON endpoints
#[derive(Error, Debug)]
pub enum ApiError {
    /// Bad request with message
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Malformed or oversized multipart body
    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),

    /// Share registry error
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Template rendering error
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Multipart(e) => e.status(),
            ApiError::Registry(e) => match e {
                RegistryError::NotFound => StatusCode::NOT_FOUND,
                RegistryError::Expired => StatusCode::GONE,
                RegistryError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                RegistryError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                RegistryError::CapacityExceeded(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            ApiError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match &self {
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Multipart(e) => e.body_text(),
            ApiError::Registry(e) => e.to_string(),
            ApiError::Template(e) => {
                tracing::error!(error = %e, "Failed to render template");
                "Internal server error".to_string()
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
