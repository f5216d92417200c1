//! Error types and handling
//!
//! Every error leaving a handler is converted to a consistent JSON body
//! with a machine-readable error type and an HTTP status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::console::{ConsoleError, DispatchError};

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Conflict - a command is already in flight for this target (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unprocessable entity - the action is not allowed in the current
    /// workflow state (422)
    #[error("Action not allowed: {0}")]
    ActionNotAllowed(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Cluster backend communication error (502)
    #[error("Backend error: {0}")]
    Backend(String),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Error response body
#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    /// Error type identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, should_log) = match &self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", false),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request", false),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict", false),
            AppError::ActionNotAllowed(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "action_not_allowed", false)
            }
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", true),
            AppError::Backend(_) => (StatusCode::BAD_GATEWAY, "backend_error", true),
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error", true),
        };

        // Log server errors
        if should_log {
            error!(error = %self, error_type = error_type, "Request error");
        }

        let body = ErrorResponse::new(error_type, self.to_string());

        (status, Json(body)).into_response()
    }
}

impl From<ConsoleError> for AppError {
    fn from(err: ConsoleError) -> Self {
        match err {
            ConsoleError::ResourceNotFound(_) | ConsoleError::NodeNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            ConsoleError::ActionNotAllowed(msg) => AppError::ActionNotAllowed(msg),
            ConsoleError::AlreadyPending(inner) => AppError::Conflict(inner.to_string()),
        }
    }
}

impl From<DispatchError> for AppError {
    fn from(err: DispatchError) -> Self {
        AppError::Conflict(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Backend("Cluster backend request timed out".to_string())
        } else if err.is_connect() {
            AppError::Backend("Failed to connect to cluster backend".to_string())
        } else {
            AppError::Backend(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(format!("JSON parsing error: {}", err))
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
