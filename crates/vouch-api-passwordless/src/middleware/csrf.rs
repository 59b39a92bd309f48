//! CSRF enforcement for state-changing requests.
//!
//! `POST`, `PUT`, `PATCH` and `DELETE` must carry a token bound to the
//! caller's CSRF session. The token is read from `X-CSRF-Token` or, for form
//! submissions, from the `csrf_token` field. The session comes from the
//! `vouch_csrf_session` cookie or `X-Session-ID`.
//!
//! Every failure produces the same `403 {"error":"csrf_rejected"}`.

use crate::error::ApiError;
use crate::extract::is_form;
use crate::middleware::session_cookie::extract_csrf_session;
use crate::router::PasswordlessState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

/// Header carrying the CSRF token.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Header carrying the CSRF session for non-browser clients.
pub const SESSION_HEADER: &str = "x-session-id";

/// Form field carrying the CSRF token.
pub const CSRF_FORM_FIELD: &str = "csrf_token";

/// Largest form body buffered to look for the token.
const MAX_FORM_BYTES: usize = 64 * 1024;

/// The token that passed validation, for handlers that retire it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCsrfToken(pub String);

#[derive(Deserialize)]
struct CsrfFormField {
    csrf_token: Option<String>,
}

fn requires_csrf(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn session_id(headers: &HeaderMap) -> Option<String> {
    extract_csrf_session(headers).or_else(|| header_value(headers, SESSION_HEADER))
}

/// Pull the token out of a form body, handing back a request with the body restored.
async fn token_from_form(request: Request) -> Result<(Option<String>, Request), ApiError> {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_FORM_BYTES)
        .await
        .map_err(|_| ApiError::CsrfRejected)?;

    let token = serde_urlencoded::from_bytes::<CsrfFormField>(&bytes)
        .ok()
        .and_then(|form| form.csrf_token)
        .filter(|token| !token.is_empty());

    Ok((token, Request::from_parts(parts, Body::from(bytes))))
}

/// Axum middleware enforcing CSRF tokens. Disabled when
/// `ApiSettings::csrf_enforce` is off.
pub async fn csrf_middleware(
    State(state): State<PasswordlessState>,
    request: Request,
    next: Next,
) -> Response {
    if !state.settings.csrf_enforce || !requires_csrf(request.method()) {
        return next.run(request).await;
    }

    let Some(session) = session_id(request.headers()) else {
        tracing::warn!(path = %request.uri().path(), "CSRF rejected: no session");
        return ApiError::CsrfRejected.into_response();
    };

    let (token, mut request) = match header_value(request.headers(), CSRF_HEADER) {
        Some(token) => (Some(token), request),
        None if is_form(&request) => match token_from_form(request).await {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!("CSRF rejected: unreadable form body");
                return err.into_response();
            }
        },
        None => (None, request),
    };

    let Some(token) = token else {
        tracing::warn!(path = %request.uri().path(), "CSRF rejected: no token");
        return ApiError::CsrfRejected.into_response();
    };

    if !state.csrf.validate_token(&token, &session) {
        tracing::warn!(path = %request.uri().path(), "CSRF rejected: invalid token");
        return ApiError::CsrfRejected.into_response();
    }

    request.extensions_mut().insert(ValidatedCsrfToken(token));
    next.run(request).await
}
