//! Error type for the passwordless API.
//!
//! The only place where [`VouchError`] is mapped to an HTTP status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use vouch_core::{ErrorClass, VouchError};

/// Message returned in place of the detail of a system error.
pub const OPAQUE_MESSAGE: &str = "An unexpected error occurred";

/// Errors returned by passwordless handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Vouch(#[from] VouchError),

    /// The request body failed to parse or validate.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Any CSRF failure. The reason is never exposed.
    #[error("CSRF validation failed")]
    CsrfRejected,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Vouch(err) => vouch_status(err),
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::CsrfRejected => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Vouch(err) => err.code(),
            Self::Validation(_) => "invalid_input",
            Self::CsrfRejected => "csrf_rejected",
            Self::Internal(_) => "internal_error",
        }
    }
}

fn vouch_status(err: &VouchError) -> StatusCode {
    match err.class() {
        ErrorClass::Caller => match err {
            VouchError::Cancelled => StatusCode::REQUEST_TIMEOUT,
            _ => StatusCode::BAD_REQUEST,
        },
        ErrorClass::Policy => StatusCode::TOO_MANY_REQUESTS,
        ErrorClass::Authentication => match err {
            VouchError::InvalidCode => StatusCode::UNAUTHORIZED,
            _ => StatusCode::NOT_FOUND,
        },
        ErrorClass::System => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            Self::Vouch(err) if err.is_system() => {
                tracing::error!(error = %err, code = err.code(), "Request failed");
                Some(OPAQUE_MESSAGE.to_string())
            }
            Self::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                Some(OPAQUE_MESSAGE.to_string())
            }
            Self::CsrfRejected => None,
            other => Some(other.to_string()),
        };

        let body = ErrorResponse {
            error: self.error_code().to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}
