//! Passwordless API router configuration.
//!
//! - POST /{channel}/send (tenancy headers, CSRF)
//! - POST /{channel}/verify (tenancy headers, CSRF)
//! - GET /csrf-token
//! - GET /csrf/stats
//! - GET /health
//! - GET /openapi.json

use crate::handlers::{
    csrf_stats_handler, csrf_token_handler, health_handler, send_code_handler,
    verify_code_handler,
};
use crate::middleware::csrf_middleware;
use crate::openapi::PasswordlessApiDoc;
use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use utoipa::OpenApi;
use vouch_csrf::CsrfTokenService;
use vouch_tenant::{TenancyConfig, TenancyLayer};
use vouch_verification::EngineRegistry;

/// Transport-level switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiSettings {
    /// Enforce CSRF tokens on state-changing requests.
    pub csrf_enforce: bool,
    /// Mark cookies `Secure`.
    pub secure_cookies: bool,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            csrf_enforce: true,
            secure_cookies: true,
        }
    }
}

/// Shared state for passwordless handlers.
#[derive(Clone)]
pub struct PasswordlessState {
    pub engines: Arc<EngineRegistry>,
    pub csrf: Arc<CsrfTokenService>,
    pub settings: ApiSettings,
    /// Parent of every per-request cancellation token.
    pub shutdown: CancellationToken,
}

impl PasswordlessState {
    #[must_use]
    pub fn new(
        engines: EngineRegistry,
        csrf: Arc<CsrfTokenService>,
        settings: ApiSettings,
    ) -> Self {
        Self {
            engines: Arc::new(engines),
            csrf,
            settings,
            shutdown: CancellationToken::new(),
        }
    }

    /// Cancel in-flight engine calls when `shutdown` fires.
    #[must_use]
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }
}

/// Create the passwordless router with default tenancy headers.
pub fn passwordless_router(state: PasswordlessState) -> Router {
    passwordless_router_with_tenancy(state, TenancyConfig::default())
}

/// Create the passwordless router with custom tenancy header configuration.
pub fn passwordless_router_with_tenancy(
    state: PasswordlessState,
    tenancy: TenancyConfig,
) -> Router {
    // Tenancy runs first, then CSRF, then the handler.
    let channel_routes = Router::new()
        .route("/:channel/send", post(send_code_handler))
        .route("/:channel/verify", post(verify_code_handler))
        .layer(middleware::from_fn_with_state(state.clone(), csrf_middleware))
        .layer(TenancyLayer::with_config(tenancy));

    Router::new()
        .route("/csrf-token", get(csrf_token_handler))
        .route("/csrf/stats", get(csrf_stats_handler))
        .route("/health", get(health_handler))
        .route(
            "/openapi.json",
            get(|| async { Json(PasswordlessApiDoc::openapi()) }),
        )
        .merge(channel_routes)
        .with_state(state)
}
