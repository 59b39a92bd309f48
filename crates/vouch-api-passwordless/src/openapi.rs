//! OpenAPI document for the passwordless API.

use crate::error::ErrorResponse;
use crate::handlers;
use crate::models::{
    CsrfStatsResponse, CsrfTokenResponse, HealthResponse, SendCodeRequest, SendCodeResponse,
    SessionResponse, UserResponse, VerifyCodeRequest, VerifyCodeResponse,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::passwordless::send_code_handler,
        handlers::passwordless::verify_code_handler,
        handlers::csrf::csrf_token_handler,
        handlers::csrf::csrf_stats_handler,
        handlers::health::health_handler,
    ),
    components(schemas(
        SendCodeRequest,
        SendCodeResponse,
        VerifyCodeRequest,
        VerifyCodeResponse,
        UserResponse,
        SessionResponse,
        CsrfTokenResponse,
        CsrfStatsResponse,
        HealthResponse,
        ErrorResponse,
    )),
    tags(
        (name = "Passwordless", description = "One-time code and magic link verification"),
        (name = "CSRF", description = "Session-bound CSRF tokens"),
        (name = "Health", description = "Liveness"),
    )
)]
pub struct PasswordlessApiDoc;
