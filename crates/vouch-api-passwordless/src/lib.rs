//! HTTP API for vouch passwordless verification.
//!
//! Endpoints:
//! - POST /{channel}/send: issue a one-time code or magic link
//! - POST /{channel}/verify: verify a secret and open a session
//! - GET /csrf-token: mint a CSRF token bound to a pre-session cookie
//! - GET /csrf/stats: CSRF token store counters
//! - GET /health
//!
//! Channel routes require the tenancy headers and, unless disabled, a CSRF
//! token.
//!
//! # Example
//!
//! ```rust,ignore
//! use vouch_api_passwordless::{passwordless_router, ApiSettings, PasswordlessState};
//!
//! let state = PasswordlessState::new(registry, csrf, ApiSettings::default());
//! let app = axum::Router::new().nest("/auth", passwordless_router(state));
//! ```

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod router;

pub use error::{ApiError, ErrorResponse};
pub use extract::JsonOrForm;
pub use middleware::{ValidatedCsrfToken, CSRF_HEADER, CSRF_SESSION_COOKIE_NAME, SESSION_HEADER};
pub use openapi::PasswordlessApiDoc;
pub use router::{
    passwordless_router, passwordless_router_with_tenancy, ApiSettings, PasswordlessState,
};
