//! Pre-session cookie that CSRF tokens are bound to.
//!
//! `HttpOnly`, SameSite=Strict, and Secure when configured.

use axum::http::{header::COOKIE, HeaderMap};

/// Cookie carrying the CSRF session identifier.
pub const CSRF_SESSION_COOKIE_NAME: &str = "vouch_csrf_session";

/// Cookie max age in seconds (24 hours).
pub const CSRF_SESSION_COOKIE_MAX_AGE: i64 = 86400;

/// Render the `Set-Cookie` value for a CSRF session.
#[must_use]
pub fn create_csrf_session_cookie(session_id: &str, secure: bool) -> String {
    let secure_flag = if secure { "; Secure" } else { "" };
    format!(
        "{CSRF_SESSION_COOKIE_NAME}={session_id}; HttpOnly{secure_flag}; SameSite=Strict; Path=/; Max-Age={CSRF_SESSION_COOKIE_MAX_AGE}"
    )
}

/// Read the CSRF session identifier from the `Cookie` header.
pub fn extract_csrf_session(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .find_map(|part| {
            let (name, value) = part.trim().split_once('=')?;
            (name == CSRF_SESSION_COOKIE_NAME && !value.trim().is_empty())
                .then(|| value.trim().to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_cookie_flags() {
        let cookie = create_csrf_session_cookie("abc", true);
        assert!(cookie.starts_with("vouch_csrf_session=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("; Secure"));

        let insecure = create_csrf_session_cookie("abc", false);
        assert!(!insecure.contains("Secure"));
    }

    #[test]
    fn test_extract_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; vouch_csrf_session=s-123; lang=en"),
        );
        assert_eq!(extract_csrf_session(&headers).as_deref(), Some("s-123"));
    }

    #[test]
    fn test_extract_missing_or_empty() {
        let mut headers = HeaderMap::new();
        assert!(extract_csrf_session(&headers).is_none());

        headers.insert(COOKIE, HeaderValue::from_static("vouch_csrf_session="));
        assert!(extract_csrf_session(&headers).is_none());
    }
}
