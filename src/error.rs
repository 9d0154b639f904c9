//! Error types for Photogram
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` for proper HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application-wide error type
///
/// Validation and authorization failures are detected locally and
/// returned to the caller as typed variants; they are never swallowed.
/// The idempotency guards (`AlreadyExists`, `NotFollowing`,
/// `AlreadyLiked`, `NotLiked`) exist so a retried or duplicated client
/// request surfaces as a recognizable error instead of corrupting state.
#[derive(Debug, Error)]
pub enum AppError {
    /// Referenced account/post/comment absent (404)
    #[error("Resource not found")]
    NotFound,

    /// Authentication required (401)
    #[error("Authentication required")]
    Unauthorized,

    /// Mutation guard rejection (403)
    #[error("Access denied")]
    Forbidden,

    /// Operation is nonsensical, e.g. self-follow (400)
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Duplicate of existing state, e.g. follow twice (409)
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Unfollow without a follow edge (400)
    #[error("You are not following this user")]
    NotFollowing,

    /// Like twice without an intervening unlike (400)
    #[error("Post already liked")]
    AlreadyLiked,

    /// Unlike without a like (400)
    #[error("Post has not yet been liked")]
    NotLiked,

    /// Reserved for optimistic-lock violations (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Validation error (400)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Media storage error (500)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Encryption/signing error (500)
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl AppError {
    /// Stable machine-readable kind for the JSON body and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound => "not_found",
            AppError::Unauthorized => "unauthorized",
            AppError::Forbidden => "forbidden",
            AppError::InvalidOperation(_) => "invalid_operation",
            AppError::AlreadyExists(_) => "already_exists",
            AppError::NotFollowing => "not_following",
            AppError::AlreadyLiked => "already_liked",
            AppError::NotLiked => "not_liked",
            AppError::Conflict(_) => "conflict",
            AppError::Validation(_) => "validation",
            AppError::Database(_) => "database",
            AppError::Storage(_) => "storage",
            AppError::Config(_) => "config",
            AppError::Encryption(_) => "encryption",
            AppError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Maps each error variant to appropriate HTTP status code
    /// and JSON error body with a stable `error_type`.
    fn into_response(self) -> Response {
        use axum::Json;

        let error_type = self.kind();
        let (status, error_message) = match &self {
            AppError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
            AppError::InvalidOperation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::AlreadyExists(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::NotFollowing => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::AlreadyLiked => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::NotLiked => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
            ),
            AppError::Storage(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::Encryption(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        // Record error metric
        use crate::metrics::ERRORS_TOTAL;
        ERRORS_TOTAL
            .with_label_values(&[error_type, "unknown"])
            .inc();

        let body = Json(serde_json::json!({
            "error": error_message,
            "error_type": error_type,
        }));

        (status, body).into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
