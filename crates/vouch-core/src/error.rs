//! Error Types
//!
//! A closed set of error kinds shared by every vouch crate. Transports map
//! them to status codes at the boundary only, through [`VouchError::class`]
//! and [`VouchError::code`].
//!
//! # Example
//!
//! ```
//! use vouch_core::{ErrorClass, VouchError};
//!
//! let err = VouchError::TooManyAttempts;
//! assert_eq!(err.class(), ErrorClass::Policy);
//! assert_eq!(err.code(), "too_many_attempts");
//! ```

use thiserror::Error;

/// Broad category of a [`VouchError`], used for transport mapping and retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// The caller sent an incomplete or malformed request. Never retried.
    Caller,
    /// A policy rejected the request. The caller must wait or request a new code.
    Policy,
    /// The presented credential did not authenticate. Recoverable by the caller.
    Authentication,
    /// Something failed on our side. Surfaced as an opaque failure.
    System,
}

/// Standardized error type for vouch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VouchError {
    /// No application was supplied with the request.
    #[error("Application context required")]
    AppContextMissing,

    /// A session-creating flow was called without an environment.
    #[error("Environment context required")]
    EnvironmentContextMissing,

    /// A required field was absent or empty.
    #[error("Missing required field '{field}'")]
    MissingField {
        /// Name of the missing field
        field: &'static str,
    },

    /// A field was present but failed validation.
    #[error("Validation error on field '{field}': {message}")]
    InvalidInput {
        /// The field that failed validation
        field: String,
        /// Description of the validation failure
        message: String,
    },

    /// The requested verification channel is not configured.
    #[error("Unknown verification channel '{0}'")]
    UnknownChannel(String),

    /// The caller cancelled the operation before it took effect.
    #[error("Operation cancelled")]
    Cancelled,

    /// Too many codes were requested for this identifier.
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// The code exhausted its verification attempts. A new code is required.
    #[error("Too many verification attempts; request a new code")]
    TooManyAttempts,

    /// No active code exists. Covers never-issued, expired and consumed codes alike.
    #[error("Verification code not found")]
    CodeNotFound,

    /// The presented secret does not match the active code.
    #[error("Invalid verification code")]
    InvalidCode,

    /// The identifier has no user and implicit signup is disabled.
    #[error("User not found")]
    UserNotFound,

    /// Creating a user during implicit signup failed.
    #[error("User creation failed: {0}")]
    UserCreationFailed(String),

    /// Creating the session failed after the code was consumed.
    #[error("Session creation failed: {0}")]
    SessionCreationFailed(String),

    /// A repository call failed.
    #[error("Repository error: {0}")]
    Repository(String),

    /// Any other internal failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl VouchError {
    /// The broad category of this error.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::AppContextMissing
            | Self::EnvironmentContextMissing
            | Self::MissingField { .. }
            | Self::InvalidInput { .. }
            | Self::UnknownChannel(_)
            | Self::Cancelled => ErrorClass::Caller,
            Self::RateLimitExceeded | Self::TooManyAttempts => ErrorClass::Policy,
            Self::CodeNotFound | Self::InvalidCode | Self::UserNotFound => {
                ErrorClass::Authentication
            }
            Self::UserCreationFailed(_)
            | Self::SessionCreationFailed(_)
            | Self::Repository(_)
            | Self::Internal(_) => ErrorClass::System,
        }
    }

    /// Stable machine-readable code for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::AppContextMissing => "app_context_missing",
            Self::EnvironmentContextMissing => "environment_context_missing",
            Self::MissingField { .. } => "missing_field",
            Self::InvalidInput { .. } => "invalid_input",
            Self::UnknownChannel(_) => "unknown_channel",
            Self::Cancelled => "cancelled",
            Self::RateLimitExceeded => "rate_limit_exceeded",
            Self::TooManyAttempts => "too_many_attempts",
            Self::CodeNotFound => "code_not_found",
            Self::InvalidCode => "invalid_code",
            Self::UserNotFound => "user_not_found",
            Self::UserCreationFailed(_) => "user_creation_failed",
            Self::SessionCreationFailed(_) => "session_creation_failed",
            Self::Repository(_) => "repository_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// True for errors whose detail must not reach the caller.
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.class() == ErrorClass::System
    }
}

/// Type alias for Results using `VouchError`.
pub type Result<T> = std::result::Result<T, VouchError>;
