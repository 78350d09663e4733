//! Error types for the annopy server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::anchoring::AnchorError;
use crate::annotations::{BackendError, CategoryError, MSG_NOT_ALLOWED};
use crate::html::RenderError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A write refused by the store; the message is meant for the user
    #[error("{0}")]
    Rejected(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

impl From<BackendError> for AppError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::Rejected(msg) => AppError::Rejected(msg),
            BackendError::Transport(msg) => AppError::Internal(msg),
        }
    }
}

impl From<AnchorError> for AppError {
    fn from(e: AnchorError) -> Self {
        match e {
            AnchorError::InvalidSelection(_) => AppError::BadRequest(e.to_string()),
            AnchorError::AnchoringFailed => AppError::NotFound(e.to_string()),
        }
    }
}

impl From<CategoryError> for AppError {
    fn from(e: CategoryError) -> Self {
        match e {
            CategoryError::NotFound(_) => AppError::NotFound(e.to_string()),
            CategoryError::NotAllowed(_) => AppError::Rejected(MSG_NOT_ALLOWED.to_string()),
            _ => AppError::BadRequest(e.to_string()),
        }
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::Rejected(msg) => (StatusCode::FORBIDDEN, "rejected", msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Render(e) => {
                tracing::error!("Render error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "render_error",
                    "Failed to render submission".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
        });

        (status, body).into_response()
    }
}
