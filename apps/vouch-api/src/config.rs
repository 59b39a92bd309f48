//! Application configuration loaded from environment variables.
//!
//! Loading is fail-fast: a variable that is present but unparsable stops
//! startup with a clear message. Insecure settings are tolerated with
//! warnings in development and refused in production.

use chrono::Duration as ChronoDuration;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use vouch_api_passwordless::ApiSettings;
use vouch_csrf::{CsrfConfig, SECRET_LEN};
use vouch_verification::memory::RateLimitConfig;
use vouch_verification::{ChannelKind, EngineConfig};

/// Application environment mode.
///
/// - `Development`: insecure settings are allowed with WARN-level logging.
/// - `Production`: insecure settings cause the application to refuse startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Production,
}

impl AppEnvironment {
    /// Parse the `APP_ENV` value. Defaults to `Development` if unrecognized.
    pub fn from_env_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => {
                tracing::warn!(
                    value = other,
                    "Unrecognized APP_ENV value, defaulting to Development"
                );
                Self::Development
            }
        }
    }

    #[must_use]
    pub fn is_production(&self) -> bool {
        *self == Self::Production
    }
}

impl std::fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Configuration errors that can occur during environment loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },
}

impl ConfigError {
    fn invalid(var: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            var: var.to_string(),
            message: message.into(),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub app_env: AppEnvironment,
    pub host: String,
    pub port: u16,
    pub rust_log: String,

    pub otp_secret_length: usize,
    pub otp_expiry_minutes: i64,
    pub magic_link_expiry_minutes: i64,
    pub max_attempts: u32,
    /// Sends allowed per identifier per window.
    pub rate_limit: usize,
    pub rate_window_secs: u64,
    pub allow_implicit_signup: bool,
    pub dev_expose_secret: bool,
    pub magic_link_base_url: String,

    /// `None` means a random secret is generated at startup.
    pub csrf_secret: Option<[u8; SECRET_LEN]>,
    pub csrf_token_ttl_secs: i64,
    pub csrf_enforce: bool,
    pub csrf_cleanup_interval_secs: u64,
    pub secure_cookies: bool,
}

impl Config {
    /// Load from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for any value that is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for any value that is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let app_env = get("APP_ENV")
            .map(|v| AppEnvironment::from_env_str(&v))
            .unwrap_or(AppEnvironment::Development);

        let csrf_secret = get("CSRF_SECRET")
            .map(|v| parse_hex_secret("CSRF_SECRET", v.trim()))
            .transpose()?;

        let config = Self {
            app_env,
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_var(&get, "PORT", 8080)?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info,vouch=debug".to_string()),

            otp_secret_length: parse_var(&get, "OTP_SECRET_LENGTH", 6)?,
            otp_expiry_minutes: parse_var(&get, "OTP_EXPIRY_MINUTES", 10)?,
            magic_link_expiry_minutes: parse_var(&get, "MAGIC_LINK_EXPIRY_MINUTES", 15)?,
            max_attempts: parse_var(&get, "VERIFICATION_MAX_ATTEMPTS", 5)?,
            rate_limit: parse_var(&get, "VERIFICATION_RATE_LIMIT", 5)?,
            rate_window_secs: parse_var(&get, "VERIFICATION_RATE_WINDOW_SECS", 900)?,
            allow_implicit_signup: parse_bool(&get, "ALLOW_IMPLICIT_SIGNUP", false)?,
            dev_expose_secret: parse_bool(&get, "DEV_EXPOSE_SECRET", false)?,
            magic_link_base_url: get("MAGIC_LINK_BASE_URL")
                .unwrap_or_else(|| "http://localhost:3000/auth/magic-link".to_string()),

            csrf_secret,
            csrf_token_ttl_secs: parse_var(&get, "CSRF_TOKEN_TTL_SECS", 3600)?,
            csrf_enforce: parse_bool(&get, "CSRF_ENFORCE", true)?,
            csrf_cleanup_interval_secs: parse_var(&get, "CSRF_CLEANUP_INTERVAL_SECS", 300)?,
            secure_cookies: parse_bool(&get, "SECURE_COOKIES", app_env.is_production())?,
        };

        config.validate_ranges()?;
        Ok(config)
    }

    fn validate_ranges(&self) -> Result<(), ConfigError> {
        for channel in ChannelKind::ALL {
            self.engine_config(channel)
                .validate()
                .map_err(|e| ConfigError::invalid(channel_var(channel), e.to_string()))?;
        }
        if self.rate_limit == 0 {
            return Err(ConfigError::invalid("VERIFICATION_RATE_LIMIT", "must be at least 1"));
        }
        if self.rate_window_secs == 0 {
            return Err(ConfigError::invalid(
                "VERIFICATION_RATE_WINDOW_SECS",
                "must be at least 1",
            ));
        }
        self.csrf_config()
            .validate()
            .map_err(|e| ConfigError::invalid("CSRF_TOKEN_TTL_SECS", e.to_string()))?;
        if self.csrf_cleanup_interval_secs == 0 {
            return Err(ConfigError::invalid(
                "CSRF_CLEANUP_INTERVAL_SECS",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Check for insecure settings.
    ///
    /// Returns `Ok(warnings)` in development (possibly empty) and `Err(errors)`
    /// in production when any insecure setting is found.
    pub fn validate_security_config(&self) -> Result<Vec<String>, Vec<String>> {
        let mut issues = Vec::new();

        if self.dev_expose_secret {
            issues.push(
                "DEV_EXPOSE_SECRET is enabled; secrets are returned in responses".to_string(),
            );
        }

        match &self.csrf_secret {
            None => issues.push(
                "CSRF_SECRET is not set; a random secret will be generated at startup".to_string(),
            ),
            Some(secret) if secret.iter().all(|b| *b == secret[0]) => {
                issues.push("CSRF_SECRET is a repeated single byte".to_string());
            }
            Some(_) => {}
        }

        if issues.is_empty() {
            return Ok(Vec::new());
        }

        if self.app_env.is_production() {
            Err(issues)
        } else {
            Ok(issues)
        }
    }

    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Engine configuration for one channel.
    #[must_use]
    pub fn engine_config(&self, channel: ChannelKind) -> EngineConfig {
        let expiry_minutes = if channel.is_otp() {
            self.otp_expiry_minutes
        } else {
            self.magic_link_expiry_minutes
        };
        EngineConfig {
            secret_length: self.otp_secret_length,
            expiry: ChronoDuration::minutes(saturate(expiry_minutes)),
            max_attempts: self.max_attempts,
            allow_implicit_signup: self.allow_implicit_signup,
            dev_expose_secret: self.dev_expose_secret,
        }
    }

    #[must_use]
    pub fn rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig::new(self.rate_limit, Duration::from_secs(self.rate_window_secs))
    }

    #[must_use]
    pub fn csrf_config(&self) -> CsrfConfig {
        CsrfConfig::with_ttl(ChronoDuration::seconds(saturate(self.csrf_token_ttl_secs)))
    }

    #[must_use]
    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            csrf_enforce: self.csrf_enforce,
            secure_cookies: self.secure_cookies,
        }
    }
}

/// Pin a raw env value into a range chrono can represent. Values outside it
/// are still rejected by the library `validate()` calls.
fn saturate(value: i64) -> i64 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX))
}

fn channel_var(channel: ChannelKind) -> &'static str {
    if channel.is_otp() {
        "OTP_SECRET_LENGTH/OTP_EXPIRY_MINUTES/VERIFICATION_MAX_ATTEMPTS"
    } else {
        "MAGIC_LINK_EXPIRY_MINUTES/VERIFICATION_MAX_ATTEMPTS"
    }
}

fn parse_var<T, G>(get: &G, var: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::invalid(var, e.to_string())),
        None => Ok(default),
    }
}

fn parse_bool<G>(get: &G, var: &str, default: bool) -> Result<bool, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        Some(raw) => match raw.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            other => Err(ConfigError::invalid(var, format!("expected a boolean, got '{other}'"))),
        },
        None => Ok(default),
    }
}

fn parse_hex_secret(var_name: &str, hex_str: &str) -> Result<[u8; SECRET_LEN], ConfigError> {
    let bytes = hex::decode(hex_str)
        .map_err(|_| ConfigError::invalid(var_name, "Must be 64 hex characters (32 bytes)"))?;

    if bytes.len() != SECRET_LEN {
        return Err(ConfigError::invalid(
            var_name,
            format!("Expected {SECRET_LEN} bytes, got {}", bytes.len()),
        ));
    }

    let mut key = [0u8; SECRET_LEN];
    key.copy_from_slice(&bytes);
    Ok(key)
}
