//! Error types for tenancy middleware.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use vouch_core::VouchError;

/// Errors that can occur during tenancy extraction.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TenancyError {
    /// No application header was present.
    #[error("Application context required")]
    AppMissing,

    /// One of the tenancy headers did not hold a valid UUID.
    #[error("Invalid value for header {header}: {message}")]
    InvalidFormat {
        header: String,
        message: String,
    },
}

impl TenancyError {
    /// Get the HTTP status code for this error. Both cases are caller errors.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    /// Get the error code string for the JSON response.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AppMissing => "app_context_missing",
            Self::InvalidFormat { .. } => "invalid_tenancy",
        }
    }
}

impl From<TenancyError> for VouchError {
    fn from(err: TenancyError) -> Self {
        match err {
            TenancyError::AppMissing => VouchError::AppContextMissing,
            TenancyError::InvalidFormat { header, message } => VouchError::InvalidInput {
                field: header,
                message,
            },
        }
    }
}

/// Structured JSON error response.
///
/// ```json
/// { "error": "app_context_missing", "message": "Application context required" }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    #[must_use]
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

impl From<TenancyError> for ErrorResponse {
    fn from(err: TenancyError) -> Self {
        Self::new(err.error_code(), err.to_string())
    }
}

impl IntoResponse for TenancyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse::from(self);

        (
            status,
            [("content-type", "application/json")],
            serde_json::to_string(&body).unwrap_or_else(|_| {
                r#"{"error":"internal_error","message":"Failed to serialize error"}"#.to_string()
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_missing() {
        let err = TenancyError::AppMissing;
        assert_eq!(err.to_string(), "Application context required");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "app_context_missing");
        assert_eq!(VouchError::from(err), VouchError::AppContextMissing);
    }

    #[test]
    fn test_invalid_format() {
        let err = TenancyError::InvalidFormat {
            header: "X-App-ID".to_string(),
            message: "'abc' is not a valid UUID".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value for header X-App-ID: 'abc' is not a valid UUID"
        );
        assert_eq!(err.error_code(), "invalid_tenancy");
    }

    #[test]
    fn test_error_response_serialization() {
        let body = ErrorResponse::from(TenancyError::AppMissing);
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains(r#""error":"app_context_missing""#));
        assert!(json.contains(r#""message":"Application context required""#));
    }
}
