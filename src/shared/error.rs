//! Error handling module
//!
//! Centralized error types for the confirmation service. Only initiation
//! failures and terminal attempt states ever reach the HTTP layer; transient
//! poll errors are absorbed inside the polling loop.

use serde_json::Value;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug, Clone)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// The gateway rejected or could not be reached for the very first
    /// request. Fatal to the attempt; no polling loop is started.
    #[error("Payment initiation failed: {0}")]
    Initiation(String),

    /// A single status-check call failed. Recovered locally by the polling
    /// loop; never surfaced past the controller.
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Entitlement refresh failed after a successful payment. Non-fatal to
    /// the payment outcome.
    #[error("Session refresh failed: {0}")]
    SessionRefresh(String),

    #[error("Unknown payment attempt: {0}")]
    UnknownAttempt(String),

    #[error("JSON serialization error: {0}")]
    Json(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Error payload returned to HTTP clients
    pub fn to_error_body(&self) -> Value {
        serde_json::json!({ "message": self.to_string() })
    }

    /// Get HTTP status code for this error
    pub fn http_status_code(&self) -> warp::http::StatusCode {
        match self {
            AppError::Validation(_) => warp::http::StatusCode::BAD_REQUEST,
            AppError::Json(_) => warp::http::StatusCode::BAD_REQUEST,
            AppError::UnknownAttempt(_) => warp::http::StatusCode::NOT_FOUND,
            AppError::Initiation(_) => warp::http::StatusCode::BAD_GATEWAY,
            AppError::Gateway(_) => warp::http::StatusCode::BAD_GATEWAY,
            _ => warp::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Application result type
pub type AppResult<T> = Result<T, AppError>;

impl warp::reject::Reject for AppError {}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Json(err.to_string())
    }
}
