//! Error type system for CuraLink
//!
//! This module provides:
//! - A single error enum shared by handlers, repositories and the auth layer
//! - HTTP status code mapping
//! - JSON error bodies carrying a trace ID

use axum::{
    extract::rejection::{FormRejection, JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use crate::core::logging::current_trace_id;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Main error type for the CuraLink backend
#[derive(Debug, thiserror::Error)]
pub enum CuraError {
    // System-level errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Task error: {0}")]
    TaskError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    // Request errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    // Auth errors
    #[error("{0}")]
    AuthenticationError(String),

    #[error("Inactive user")]
    AccountInactive,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

impl CuraError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            CuraError::InvalidRequest(_) | CuraError::ValidationError(_) => {
                StatusCode::BAD_REQUEST
            }

            CuraError::AuthenticationError(_) | CuraError::AccountInactive => {
                StatusCode::UNAUTHORIZED
            }

            CuraError::PermissionDenied(_) => StatusCode::FORBIDDEN,

            CuraError::NotFound(_) => StatusCode::NOT_FOUND,

            CuraError::Conflict(_) => StatusCode::CONFLICT,

            CuraError::ConfigError(_)
            | CuraError::DatabaseError(_)
            | CuraError::Internal(_)
            | CuraError::TaskError(_)
            | CuraError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type name for API responses
    pub fn error_type(&self) -> &'static str {
        match self {
            CuraError::ConfigError(_) => "ConfigError",
            CuraError::DatabaseError(_) => "DatabaseError",
            CuraError::Internal(_) => "InternalError",
            CuraError::TaskError(_) => "TaskError",
            CuraError::IoError(_) => "IoError",
            CuraError::InvalidRequest(_) => "InvalidRequest",
            CuraError::ValidationError(_) => "ValidationError",
            CuraError::NotFound(_) => "NotFound",
            CuraError::Conflict(_) => "Conflict",
            CuraError::AuthenticationError(_) => "AuthenticationError",
            CuraError::AccountInactive => "AccountInactive",
            CuraError::PermissionDenied(_) => "PermissionDenied",
        }
    }

    /// Message shown to clients. Internal failures never leak their cause.
    fn public_message(&self) -> String {
        match self.status_code() {
            StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<JsonRejection> for CuraError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            // Well-formed JSON whose fields don't fit the request type
            JsonRejection::JsonDataError(e) => CuraError::ValidationError(e.body_text()),
            other => CuraError::InvalidRequest(other.body_text()),
        }
    }
}

impl From<QueryRejection> for CuraError {
    fn from(rejection: QueryRejection) -> Self {
        CuraError::InvalidRequest(rejection.body_text())
    }
}

impl From<FormRejection> for CuraError {
    fn from(rejection: FormRejection) -> Self {
        CuraError::InvalidRequest(rejection.body_text())
    }
}

/// Error response structure for API endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error type identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Unique trace ID for this error
    pub trace_id: String,
}

impl ErrorResponse {
    /// Create a new error response carrying the current request's trace ID,
    /// or a fresh one outside a request
    pub fn new(error: String, message: String) -> Self {
        Self {
            error,
            message,
            trace_id: current_trace_id().unwrap_or_else(|| Uuid::new_v4().to_string()),
        }
    }

    /// Create an error response from a CuraError
    pub fn from_error(error: &CuraError) -> Self {
        Self::new(error.error_type().to_string(), error.public_message())
    }
}

impl IntoResponse for CuraError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let error_response = ErrorResponse::from_error(&self);

        if status_code.is_server_error() {
            tracing::error!(
                error_type = self.error_type(),
                trace_id = %error_response.trace_id,
                status_code = %status_code,
                "Request failed: {}",
                self
            );
        } else {
            tracing::debug!(
                error_type = self.error_type(),
                trace_id = %error_response.trace_id,
                status_code = %status_code,
                "Request rejected: {}",
                self
            );
        }

        (status_code, Json(error_response)).into_response()
    }
}

/// Result type alias for operations that can fail with CuraError
pub type Result<T> = std::result::Result<T, CuraError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            CuraError::InvalidRequest("test".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CuraError::AuthenticationError("test".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(CuraError::AccountInactive.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            CuraError::PermissionDenied("test".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            CuraError::Conflict("test".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            CuraError::DatabaseError(rusqlite::Error::InvalidQuery).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_errors_hide_cause() {
        let error = CuraError::Internal("bcrypt: invalid hash".into());
        let response = ErrorResponse::from_error(&error);

        assert_eq!(response.error, "InternalError");
        assert_eq!(response.message, "Internal server error");
        assert!(!response.trace_id.is_empty());
    }

    #[test]
    fn test_client_errors_keep_message() {
        let error = CuraError::Conflict("Email already registered".into());
        let response = ErrorResponse::from_error(&error);

        assert_eq!(response.error, "Conflict");
        assert!(response.message.contains("Email already registered"));
    }
}
