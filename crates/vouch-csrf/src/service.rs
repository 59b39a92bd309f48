//! Session-bound CSRF tokens.
//!
//! A token is `base64url(nonce) "." base64url(sig)` where
//! `sig = HMAC-SHA256(secret, nonce || session_id)`. A token validates only
//! when the signature recomputes for the supplied session under the current
//! secret AND the store holds a live entry bound to that same session.

use crate::config::{CsrfConfig, CsrfError, NONCE_LEN, SECRET_LEN};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use parking_lot::Mutex;
use serde::Serialize;
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::Arc;
use vouch_core::{Clock, EntropySource, OsEntropy, SystemClock};
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// Token store counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CsrfStats {
    /// Entries in the store, expired or not.
    pub total_tokens: usize,
    /// Entries that have not expired.
    pub valid_tokens: usize,
}

#[derive(Debug, Clone)]
struct TokenEntry {
    session_id: String,
    expires_at: DateTime<Utc>,
}

struct CsrfState {
    secret: Zeroizing<[u8; SECRET_LEN]>,
    tokens: HashMap<String, TokenEntry>,
}

/// Issues and validates CSRF tokens.
///
/// The signing secret and the token map sit behind one mutex, so rotation
/// never interleaves with generation or validation. No I/O happens under it.
pub struct CsrfTokenService {
    state: Mutex<CsrfState>,
    config: CsrfConfig,
    entropy: Arc<dyn EntropySource>,
    clock: Arc<dyn Clock>,
}

impl CsrfTokenService {
    /// Create a service with a fresh random secret.
    ///
    /// # Errors
    ///
    /// Returns `CsrfError::InvalidTtl` for a non-positive or oversized lifetime.
    pub fn new(config: CsrfConfig) -> Result<Self, CsrfError> {
        let entropy: Arc<dyn EntropySource> = Arc::new(OsEntropy);
        let secret = random_secret(entropy.as_ref());
        Self::with_sources(config, secret, entropy, Arc::new(SystemClock))
    }

    /// Create a service with a known secret, e.g. shared across replicas.
    ///
    /// # Errors
    ///
    /// Returns `CsrfError::InvalidTtl` for a non-positive or oversized lifetime.
    pub fn with_secret(config: CsrfConfig, secret: [u8; SECRET_LEN]) -> Result<Self, CsrfError> {
        Self::with_sources(config, secret, Arc::new(OsEntropy), Arc::new(SystemClock))
    }

    /// Create a service with explicit randomness and time sources.
    ///
    /// # Errors
    ///
    /// Returns `CsrfError::InvalidTtl` for a non-positive or oversized lifetime.
    pub fn with_sources(
        config: CsrfConfig,
        secret: [u8; SECRET_LEN],
        entropy: Arc<dyn EntropySource>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, CsrfError> {
        config.validate()?;
        Ok(Self {
            state: Mutex::new(CsrfState {
                secret: Zeroizing::new(secret),
                tokens: HashMap::new(),
            }),
            config,
            entropy,
            clock,
        })
    }

    #[must_use]
    pub fn config(&self) -> &CsrfConfig {
        &self.config
    }

    /// Issue a token bound to `session_id`.
    ///
    /// # Errors
    ///
    /// Returns `CsrfError::EmptySession` for an empty session id.
    pub fn generate_token(&self, session_id: &str) -> Result<String, CsrfError> {
        if session_id.is_empty() {
            return Err(CsrfError::EmptySession);
        }

        let mut nonce = [0u8; NONCE_LEN];
        self.entropy.fill_bytes(&mut nonce);
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(self.config.token_ttl)
            .ok_or(CsrfError::InvalidTtl)?;

        let mut state = self.state.lock();
        let signature = sign(&state.secret, &nonce, session_id)
            .ok_or(CsrfError::Signing)?
            .finalize()
            .into_bytes();
        let token = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(nonce),
            URL_SAFE_NO_PAD.encode(signature)
        );
        state.tokens.insert(
            token.clone(),
            TokenEntry {
                session_id: session_id.to_string(),
                expires_at,
            },
        );
        Ok(token)
    }

    /// Check `token` against `session_id`. Every failure is a plain `false`.
    #[must_use]
    pub fn validate_token(&self, token: &str, session_id: &str) -> bool {
        if token.is_empty() || session_id.is_empty() {
            tracing::debug!("CSRF rejected: empty token or session");
            return false;
        }

        let mut parts = token.split('.');
        let (Some(nonce_b64), Some(sig_b64), None) = (parts.next(), parts.next(), parts.next())
        else {
            tracing::debug!("CSRF rejected: malformed token");
            return false;
        };
        let (Ok(nonce), Ok(signature)) = (
            URL_SAFE_NO_PAD.decode(nonce_b64),
            URL_SAFE_NO_PAD.decode(sig_b64),
        ) else {
            tracing::debug!("CSRF rejected: undecodable token");
            return false;
        };

        let now = self.clock.now();
        let state = self.state.lock();

        let verified = sign(&state.secret, &nonce, session_id)
            .is_some_and(|mac| mac.verify_slice(&signature).is_ok());
        if !verified {
            tracing::debug!("CSRF rejected: signature mismatch");
            return false;
        }

        match state.tokens.get(token) {
            Some(entry) if entry.expires_at <= now => {
                tracing::debug!("CSRF rejected: token expired");
                false
            }
            Some(entry) if entry.session_id != session_id => {
                tracing::debug!("CSRF rejected: session mismatch");
                false
            }
            Some(_) => true,
            None => {
                tracing::debug!("CSRF rejected: unknown token");
                false
            }
        }
    }

    /// Replace the signing secret. Outstanding tokens stop validating but
    /// stay in the store until invalidated or swept.
    pub fn rotate_secret(&self) {
        let secret = random_secret(self.entropy.as_ref());
        let mut state = self.state.lock();
        state.secret = Zeroizing::new(secret);
        tracing::info!(tokens = state.tokens.len(), "CSRF signing secret rotated");
    }

    /// Remove one token. Returns whether it was present.
    pub fn invalidate_token(&self, token: &str) -> bool {
        self.state.lock().tokens.remove(token).is_some()
    }

    /// Drop expired entries. Returns how many were dropped.
    pub fn cleanup_expired_tokens(&self) -> usize {
        let now = self.clock.now();
        let mut state = self.state.lock();
        let before = state.tokens.len();
        state.tokens.retain(|_, entry| entry.expires_at > now);
        let removed = before - state.tokens.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = state.tokens.len(), "Expired CSRF tokens swept");
        }
        removed
    }

    #[must_use]
    pub fn stats(&self) -> CsrfStats {
        let now = self.clock.now();
        let state = self.state.lock();
        CsrfStats {
            total_tokens: state.tokens.len(),
            valid_tokens: state
                .tokens
                .values()
                .filter(|entry| entry.expires_at > now)
                .count(),
        }
    }
}

impl std::fmt::Debug for CsrfTokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsrfTokenService")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

fn random_secret(entropy: &dyn EntropySource) -> [u8; SECRET_LEN] {
    let mut secret = [0u8; SECRET_LEN];
    entropy.fill_bytes(&mut secret);
    secret
}

fn sign(secret: &[u8; SECRET_LEN], nonce: &[u8], session_id: &str) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(nonce);
    mac.update(session_id.as_bytes());
    Some(mac)
}
