//! Error types for concierge-api

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::ServiceError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// No caller identity on the request (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// An AI collaborator failed (502)
    #[error("Upstream service failed: {0}")]
    Upstream(String),

    /// An AI collaborator has no credentials (503)
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// concierge-common error
    #[error("Common error: {0}")]
    Common(#[from] concierge_common::Error),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotConfigured(what) => {
                ApiError::Unavailable(format!("{} is not configured", what))
            }
            // Detail is logged by the caller; clients only see a generic message
            _ => ApiError::Upstream("AI service request failed".to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg),
            ApiError::Unavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", msg)
            }
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
            ),
            ApiError::Common(err) => match err {
                concierge_common::Error::NotFound(msg) => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", msg)
                }
                concierge_common::Error::InvalidInput(msg) => {
                    (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg)
                }
                other => {
                    tracing::error!(error = %other, "Request failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "COMMON_ERROR",
                        "Internal server error".to_string(),
                    )
                }
            },
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
