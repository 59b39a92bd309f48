//! CSRF service configuration.

use chrono::Duration;
use thiserror::Error;

/// Length of the HMAC signing secret in bytes.
pub const SECRET_LEN: usize = 32;

/// Length of the random nonce in bytes.
pub const NONCE_LEN: usize = 32;

/// Default token lifetime in seconds (1 hour).
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

/// Longest accepted token lifetime in seconds (7 days).
pub const MAX_TOKEN_TTL_SECS: i64 = 7 * 24 * 3600;

/// Errors raised by the CSRF service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CsrfError {
    /// Tokens must be bound to a session.
    #[error("session id must not be empty")]
    EmptySession,

    #[error("token_ttl must be positive and at most {MAX_TOKEN_TTL_SECS} seconds")]
    InvalidTtl,

    #[error("failed to initialize signer")]
    Signing,
}

/// Settings for [`CsrfTokenService`](crate::CsrfTokenService).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsrfConfig {
    pub token_ttl: Duration,
}

impl CsrfConfig {
    #[must_use]
    pub fn with_ttl(token_ttl: Duration) -> Self {
        Self { token_ttl }
    }

    /// # Errors
    ///
    /// Returns `CsrfError::InvalidTtl` for a zero, negative or oversized lifetime.
    pub fn validate(&self) -> Result<(), CsrfError> {
        if self.token_ttl <= Duration::zero()
            || self.token_ttl > Duration::seconds(MAX_TOKEN_TTL_SECS)
        {
            return Err(CsrfError::InvalidTtl);
        }
        Ok(())
    }
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            token_ttl: Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ttl() {
        assert_eq!(CsrfConfig::default().token_ttl, Duration::hours(1));
        assert!(CsrfConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_ttl() {
        let config = CsrfConfig::with_ttl(Duration::zero());
        assert_eq!(config.validate(), Err(CsrfError::InvalidTtl));
    }

    #[test]
    fn test_oversized_ttl() {
        let config = CsrfConfig::with_ttl(Duration::days(200_000_000));
        assert_eq!(config.validate(), Err(CsrfError::InvalidTtl));

        let config = CsrfConfig::with_ttl(Duration::seconds(MAX_TOKEN_TTL_SECS));
        assert!(config.validate().is_ok());
    }
}
