//! CSRF token endpoints.
//!
//! - GET /csrf-token: Mint a token bound to the caller's CSRF session
//! - GET /csrf/stats: Token store counters

use crate::error::ApiError;
use crate::middleware::session_cookie::{create_csrf_session_cookie, extract_csrf_session};
use crate::models::{CsrfStatsResponse, CsrfTokenResponse};
use crate::router::PasswordlessState;
use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

/// GET /csrf-token
///
/// Reuses the `vouch_csrf_session` cookie when present, otherwise starts a
/// new CSRF session and sets the cookie.
#[utoipa::path(
    get,
    path = "/csrf-token",
    responses(
        (status = 200, description = "Token issued", body = CsrfTokenResponse),
    ),
    tag = "CSRF"
)]
pub async fn csrf_token_handler(
    State(state): State<PasswordlessState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let existing = extract_csrf_session(&headers);
    let session_id = existing
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let token = state
        .csrf
        .generate_token(&session_id)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let body = Json(CsrfTokenResponse {
        csrf_token: token,
        expires_in_seconds: state.csrf.config().token_ttl.num_seconds(),
    });

    let mut response = body.into_response();
    if existing.is_none() {
        let cookie = create_csrf_session_cookie(&session_id, state.settings.secure_cookies);
        let value =
            HeaderValue::from_str(&cookie).map_err(|e| ApiError::Internal(e.to_string()))?;
        response.headers_mut().insert(SET_COOKIE, value);
        tracing::debug!("CSRF session started");
    }

    Ok(response)
}

/// GET /csrf/stats
#[utoipa::path(
    get,
    path = "/csrf/stats",
    responses(
        (status = 200, description = "Token store counters", body = CsrfStatsResponse),
    ),
    tag = "CSRF"
)]
pub async fn csrf_stats_handler(State(state): State<PasswordlessState>) -> Json<CsrfStatsResponse> {
    Json(state.csrf.stats().into())
}
