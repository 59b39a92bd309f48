//! Request and response DTOs.

pub mod requests;
pub mod responses;

pub use requests::{SendCodeRequest, VerifyCodeRequest};
pub use responses::{
    CsrfStatsResponse, CsrfTokenResponse, HealthResponse, SendCodeResponse, SessionResponse,
    UserResponse, VerifyCodeResponse,
};
