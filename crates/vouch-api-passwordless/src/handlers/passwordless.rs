//! Handlers for passwordless verification endpoints.
//!
//! - POST /{channel}/send: Issue a code or link
//! - POST /{channel}/verify: Verify a secret and open a session

use crate::error::{ApiError, ErrorResponse};
use crate::extract::JsonOrForm;
use crate::middleware::ValidatedCsrfToken;
use crate::models::{SendCodeRequest, SendCodeResponse, VerifyCodeRequest, VerifyCodeResponse};
use crate::router::PasswordlessState;
use axum::{
    extract::{ConnectInfo, Path, State},
    http::{header::USER_AGENT, HeaderMap},
    Extension, Json,
};
use std::net::SocketAddr;
use validator::Validate;
use vouch_core::{RequestContext, TenancyContext, VouchError};

/// Client metadata for audit and session records.
///
/// The context carries a child of the server shutdown token. A client
/// disconnect drops the handler future outright, so shutdown is the only
/// signal that reaches the engine's checkpoints.
fn request_context(
    state: &PasswordlessState,
    connect: Option<ConnectInfo<SocketAddr>>,
    headers: &HeaderMap,
) -> RequestContext {
    let mut ctx = RequestContext::new()
        .with_cancellation(state.shutdown.child_token());
    if let Some(ConnectInfo(addr)) = connect {
        ctx = ctx.with_ip(addr.ip());
    }
    if let Some(agent) = headers.get(USER_AGENT).and_then(|v| v.to_str().ok()) {
        ctx = ctx.with_user_agent(agent);
    }
    ctx
}

fn require_tenancy(
    tenancy: Option<Extension<TenancyContext>>,
) -> Result<TenancyContext, ApiError> {
    tenancy
        .map(|Extension(t)| t)
        .ok_or(ApiError::Vouch(VouchError::AppContextMissing))
}

/// POST /{channel}/send
///
/// Issue a fresh secret for the identifier, retiring any active one.
#[utoipa::path(
    post,
    path = "/{channel}/send",
    params(("channel" = String, Path, description = "email_otp, sms_otp or magic_link")),
    request_body = SendCodeRequest,
    responses(
        (status = 200, description = "Secret issued", body = SendCodeResponse),
        (status = 400, description = "Missing tenancy or invalid input", body = ErrorResponse),
        (status = 403, description = "CSRF validation failed", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = ErrorResponse),
    ),
    tag = "Passwordless"
)]
pub async fn send_code_handler(
    State(state): State<PasswordlessState>,
    Path(channel): Path<String>,
    tenancy: Option<Extension<TenancyContext>>,
    connect: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    JsonOrForm(body): JsonOrForm<SendCodeRequest>,
) -> Result<Json<SendCodeResponse>, ApiError> {
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let tenancy = require_tenancy(tenancy)?;
    let engine = state.engines.resolve(&channel)?;
    let ctx = request_context(&state, connect, &headers);

    let issued = engine.issue_code(&ctx, &tenancy, &body.identifier).await?;

    Ok(Json(issued.into()))
}

/// POST /{channel}/verify
///
/// Verify a secret. On success the CSRF token that guarded the request is retired.
#[utoipa::path(
    post,
    path = "/{channel}/verify",
    params(("channel" = String, Path, description = "email_otp, sms_otp or magic_link")),
    request_body = VerifyCodeRequest,
    responses(
        (status = 200, description = "Verified, session issued", body = VerifyCodeResponse),
        (status = 400, description = "Missing tenancy or invalid input", body = ErrorResponse),
        (status = 401, description = "Invalid code", body = ErrorResponse),
        (status = 403, description = "CSRF validation failed", body = ErrorResponse),
        (status = 404, description = "No active code or no user", body = ErrorResponse),
        (status = 429, description = "Too many attempts", body = ErrorResponse),
    ),
    tag = "Passwordless"
)]
pub async fn verify_code_handler(
    State(state): State<PasswordlessState>,
    Path(channel): Path<String>,
    tenancy: Option<Extension<TenancyContext>>,
    csrf_token: Option<Extension<ValidatedCsrfToken>>,
    connect: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    JsonOrForm(body): JsonOrForm<VerifyCodeRequest>,
) -> Result<Json<VerifyCodeResponse>, ApiError> {
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let tenancy = require_tenancy(tenancy)?;
    let engine = state.engines.resolve(&channel)?;
    let ctx = request_context(&state, connect, &headers);

    let bundle = engine
        .verify_code(
            &ctx,
            &tenancy,
            &body.identifier,
            &body.secret,
            body.remember,
        )
        .await?;

    if let Some(Extension(ValidatedCsrfToken(token))) = csrf_token {
        state.csrf.invalidate_token(&token);
    }

    Ok(Json(bundle.into()))
}
