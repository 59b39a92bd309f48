//! Engine configuration.

use crate::channel::ChannelKind;
use crate::secret::{MAX_CODE_LENGTH, MIN_CODE_LENGTH};
use chrono::Duration;
use thiserror::Error;

/// Default OTP length.
pub const DEFAULT_SECRET_LENGTH: usize = 6;

/// Default OTP lifetime in minutes.
pub const DEFAULT_OTP_EXPIRY_MINUTES: i64 = 10;

/// Default magic link lifetime in minutes.
pub const DEFAULT_MAGIC_LINK_EXPIRY_MINUTES: i64 = 15;

/// Longest accepted code lifetime in minutes (one week).
pub const MAX_EXPIRY_MINUTES: i64 = 7 * 24 * 60;

/// Default verification attempts per code.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Errors raised by [`EngineConfig::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("secret_length must be between 4 and 12, got {0}")]
    SecretLength(usize),

    #[error("expiry must be positive and at most {MAX_EXPIRY_MINUTES} minutes")]
    Expiry,

    #[error("max_attempts must be at least 1")]
    MaxAttempts,
}

/// Per-channel settings for a `CodeVerificationEngine`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Length of numeric codes. Ignored by link channels.
    pub secret_length: usize,
    /// How long an issued code stays usable.
    pub expiry: Duration,
    /// Wrong guesses allowed before the code is dead.
    pub max_attempts: u32,
    /// Create a user on first successful verification.
    pub allow_implicit_signup: bool,
    /// Return the secret from `issue_code`. Development only.
    pub dev_expose_secret: bool,
}

impl EngineConfig {
    /// Defaults appropriate for `channel`: magic links live a little longer.
    #[must_use]
    pub fn for_channel(channel: ChannelKind) -> Self {
        let expiry_minutes = if channel.is_otp() {
            DEFAULT_OTP_EXPIRY_MINUTES
        } else {
            DEFAULT_MAGIC_LINK_EXPIRY_MINUTES
        };
        Self {
            expiry: Duration::minutes(expiry_minutes),
            ..Self::default()
        }
    }

    /// Check the configuration for values the engine cannot honor.
    ///
    /// # Errors
    ///
    /// Returns the first offending setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&self.secret_length) {
            return Err(ConfigError::SecretLength(self.secret_length));
        }
        if self.expiry <= Duration::zero() || self.expiry > Duration::minutes(MAX_EXPIRY_MINUTES) {
            return Err(ConfigError::Expiry);
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::MaxAttempts);
        }
        Ok(())
    }

    /// Lifetime in whole minutes, as passed to notification adapters.
    #[must_use]
    pub fn expiry_minutes(&self) -> i64 {
        self.expiry.num_minutes()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            secret_length: DEFAULT_SECRET_LENGTH,
            expiry: Duration::minutes(DEFAULT_OTP_EXPIRY_MINUTES),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            allow_implicit_signup: false,
            dev_expose_secret: false,
        }
    }
}
