//! Startup and HTTP error types.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use epri_core::error::DomainError;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, warn};

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Tracing or span exporter setup failed.
    #[error("telemetry error: {0}")]
    Telemetry(String),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Always `false`.
    pub success: bool,
    /// Human-readable error message.
    pub message: String,
    /// Diagnostic detail, only outside production.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// HTTP-layer error that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    detail: Option<String>,
}

impl ApiError {
    /// Maps a `DomainError` to a response. Client errors carry their own
    /// message; server errors carry `failure_message` and, if
    /// `expose_detail` is set, the underlying error text.
    #[must_use]
    pub fn from_domain(err: DomainError, failure_message: &str, expose_detail: bool) -> Self {
        match err {
            DomainError::Validation(message) => {
                debug!(%message, "rejected invalid request");
                Self {
                    status: StatusCode::BAD_REQUEST,
                    message,
                    detail: None,
                }
            }
            DomainError::Unauthorized => {
                warn!("rejected request without valid admin credentials");
                Self {
                    status: StatusCode::UNAUTHORIZED,
                    message: "Admin credentials required".to_string(),
                    detail: None,
                }
            }
            DomainError::Integrity(_) => {
                error!(error = %err, "integrity violation: {failure_message}");
                Self::internal(failure_message, &err, expose_detail)
            }
            DomainError::Infrastructure(_) => {
                error!(error = %err, "{failure_message}");
                Self::internal(failure_message, &err, expose_detail)
            }
        }
    }

    /// Maps a rejected JSON body to a 400 response.
    #[must_use]
    pub fn from_json_rejection(rejection: &JsonRejection, expose_detail: bool) -> Self {
        debug!(error = %rejection.body_text(), "rejected malformed request body");
        Self {
            status: StatusCode::BAD_REQUEST,
            message: "Invalid request body".to_string(),
            detail: expose_detail.then(|| rejection.body_text()),
        }
    }

    fn internal(failure_message: &str, err: &DomainError, expose_detail: bool) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: failure_message.to_string(),
            detail: expose_detail.then(|| err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            message: self.message,
            error: self.detail,
        };

        (self.status, Json(body)).into_response()
    }
}
