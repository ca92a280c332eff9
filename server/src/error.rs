use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use cloning_core::JobError;

/// API Error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("Packaging error: {0}")]
    Packaging(String),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::InvalidInput(msg) => ApiError::InvalidInput(msg),
            JobError::Load(msg) => ApiError::ModelUnavailable(msg),
            e @ JobError::Synthesis { .. } => ApiError::Synthesis(e.to_string()),
            JobError::Packaging(msg) => ApiError::Packaging(msg),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Upload(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::ModelUnavailable(msg) => {
                tracing::error!("Model unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    format!("Model unavailable: {}", msg),
                )
            }
            ApiError::Synthesis(msg) => {
                tracing::error!("Synthesis error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            ApiError::Packaging(msg) => {
                tracing::error!("Packaging error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        let body = Json(ErrorResponse { detail });

        (status, body).into_response()
    }
}
