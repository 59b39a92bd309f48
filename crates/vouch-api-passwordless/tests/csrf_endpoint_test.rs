//! Tests for the CSRF token and stats endpoints.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use vouch_api_passwordless::ApiSettings;

mod common;
use common::{body_json, TestApp};

#[tokio::test]
async fn test_csrf_token_sets_session_cookie() {
    let app = TestApp::new();
    let response = app
        .send(Request::get("/csrf-token").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("vouch_csrf_session="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Secure"));

    let body = body_json(response).await;
    assert_eq!(body["expires_in_seconds"], 3600);
    assert_eq!(body["csrf_token"].as_str().unwrap().split('.').count(), 2);
}

#[tokio::test]
async fn test_csrf_token_reuses_existing_session() {
    let app = TestApp::new();
    let request = Request::get("/csrf-token")
        .header(header::COOKIE, "vouch_csrf_session=existing-session")
        .body(Body::empty())
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());

    let token = body_json(response).await["csrf_token"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(app.csrf.validate_token(&token, "existing-session"));
}

#[tokio::test]
async fn test_insecure_cookie_when_configured() {
    let app = TestApp::with_settings(ApiSettings {
        csrf_enforce: true,
        secure_cookies: false,
    });
    let response = app
        .send(Request::get("/csrf-token").body(Body::empty()).unwrap())
        .await;
    let cookie = response.headers().get(header::SET_COOKIE).unwrap();
    assert!(!cookie.to_str().unwrap().contains("Secure"));
}

#[tokio::test]
async fn test_csrf_stats() {
    let app = TestApp::new();
    for _ in 0..3 {
        app.csrf_pair().await;
    }

    let response = app
        .send(Request::get("/csrf/stats").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total_tokens"], 3);
    assert_eq!(body["valid_tokens"], 3);
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = TestApp::new();
    let response = app
        .send(Request::get("/openapi.json").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["paths"]["/{channel}/send"].is_object());
}
