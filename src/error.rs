use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::models::job::JobStatus;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate job: {0}")]
    Duplicate(String),

    #[error("Job {0} is not processed yet")]
    NotProcessed(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Offer generation failed: {0}")]
    GenerationFailed(String),

    #[error("Duplicate check failed: {0}")]
    DuplicateCheckFailed(String),

    #[error("Persistence failed: {0}")]
    PersistenceFailed(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Database(e) => {
                if let sqlx::Error::Database(db_err) = e
                    && db_err.is_unique_violation()
                {
                    return (
                        StatusCode::CONFLICT,
                        axum::Json(json!({ "error": "Resource already exists" })),
                    )
                        .into_response();
                }
                tracing::error!(error = %e, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::InvalidTransition { .. }
            | AppError::Duplicate(_)
            | AppError::NotProcessed(_) => (StatusCode::CONFLICT, self.to_string()),
            AppError::ExtractionFailed(msg) | AppError::GenerationFailed(msg) => {
                tracing::warn!(error = %msg, "Upstream model call failed");
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            AppError::Cancelled => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::DuplicateCheckFailed(msg)
            | AppError::PersistenceFailed(msg)
            | AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = axum::Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
