//! Middleware for the passwordless API.

pub mod csrf;
pub mod session_cookie;

pub use csrf::{csrf_middleware, ValidatedCsrfToken, CSRF_FORM_FIELD, CSRF_HEADER, SESSION_HEADER};
pub use session_cookie::{
    create_csrf_session_cookie, extract_csrf_session, CSRF_SESSION_COOKIE_NAME,
};
