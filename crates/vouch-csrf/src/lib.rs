//! # vouch-csrf
//!
//! Session-bound CSRF tokens signed with HMAC-SHA256.
//!
//! ```
//! use vouch_csrf::{CsrfConfig, CsrfTokenService};
//!
//! let service = CsrfTokenService::new(CsrfConfig::default()).unwrap();
//! let token = service.generate_token("session-1").unwrap();
//! assert!(service.validate_token(&token, "session-1"));
//! assert!(!service.validate_token(&token, "session-2"));
//! ```

mod config;
mod service;

pub use config::{
    CsrfConfig, CsrfError, DEFAULT_TOKEN_TTL_SECS, MAX_TOKEN_TTL_SECS, NONCE_LEN, SECRET_LEN,
};
pub use service::{CsrfStats, CsrfTokenService};
