//! Test helpers for vouch-api-passwordless integration tests.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use vouch_api_passwordless::{passwordless_router, ApiSettings, PasswordlessState};
use vouch_core::{AppId, EnvironmentId, SystemClock};
use vouch_csrf::{CsrfConfig, CsrfTokenService};
use vouch_verification::memory::{
    InMemoryAuditSink, InMemoryCodeRepository, InMemorySessionStore, InMemoryUserDirectory,
    MockNotifier, RateLimitConfig, SessionTtl, SlidingWindowRateLimiter,
};
use vouch_verification::{
    ChannelKind, CodeVerificationEngine, EngineCollaborators, EngineConfig, EngineRegistry,
    OsEntropy,
};

/// A router plus handles on the state behind it.
pub struct TestApp {
    pub router: Router,
    pub csrf: Arc<CsrfTokenService>,
    pub notifier: Arc<MockNotifier>,
    pub users: Arc<InMemoryUserDirectory>,
    pub shutdown: CancellationToken,
    pub app_id: AppId,
    pub environment_id: EnvironmentId,
}

/// Credentials a browser would hold after GET /csrf-token.
#[derive(Debug, Clone)]
pub struct CsrfPair {
    pub session: String,
    pub token: String,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(ApiSettings::default(), 100)
    }

    pub fn with_settings(settings: ApiSettings) -> Self {
        Self::build(settings, 100)
    }

    pub fn build(settings: ApiSettings, sends_per_window: usize) -> Self {
        let codes = Arc::new(InMemoryCodeRepository::new());
        let users = Arc::new(InMemoryUserDirectory::new());
        let sessions = Arc::new(InMemorySessionStore::new(SessionTtl::default()));
        let audit = Arc::new(InMemoryAuditSink::new());
        let notifier = Arc::new(MockNotifier::new());
        let rate_limiter = Arc::new(SlidingWindowRateLimiter::new(RateLimitConfig::new(
            sends_per_window,
            Duration::from_secs(900),
        )));

        let deps = EngineCollaborators {
            codes,
            users: users.clone(),
            sessions,
            audit,
            notifier: notifier.clone(),
            rate_limiter,
            entropy: Arc::new(OsEntropy),
            clock: Arc::new(SystemClock),
        };

        let mut registry = EngineRegistry::new();
        for channel in [ChannelKind::EmailOtp, ChannelKind::MagicLink] {
            let config = EngineConfig {
                allow_implicit_signup: true,
                dev_expose_secret: true,
                ..EngineConfig::for_channel(channel)
            };
            registry.register(
                CodeVerificationEngine::new(channel, config, deps.clone()).expect("valid config"),
            );
        }

        let csrf = Arc::new(CsrfTokenService::new(CsrfConfig::default()).expect("valid config"));
        let shutdown = CancellationToken::new();
        let state = PasswordlessState::new(registry, csrf.clone(), settings)
            .with_shutdown(shutdown.clone());

        Self {
            router: passwordless_router(state),
            csrf,
            notifier,
            users,
            shutdown,
            app_id: AppId::new(),
            environment_id: EnvironmentId::new(),
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// GET /csrf-token without a cookie and return the pair the browser would keep.
    pub async fn csrf_pair(&self) -> CsrfPair {
        let response = self
            .send(Request::get("/csrf-token").body(Body::empty()).unwrap())
            .await;
        assert_eq!(response.status(), 200);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("cookie set")
            .to_str()
            .unwrap()
            .to_string();
        let session = cookie
            .split(';')
            .next()
            .and_then(|kv| kv.strip_prefix("vouch_csrf_session="))
            .expect("session cookie")
            .to_string();
        let body = body_json(response).await;
        CsrfPair {
            session,
            token: body["csrf_token"].as_str().unwrap().to_string(),
        }
    }

    /// JSON POST with tenancy headers and, when given, CSRF credentials.
    pub fn post(&self, uri: &str, body: Value, csrf: Option<&CsrfPair>) -> Request<Body> {
        let mut builder = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header("X-App-ID", self.app_id.to_string())
            .header("X-Environment-ID", self.environment_id.to_string());
        if let Some(pair) = csrf {
            builder = builder
                .header(
                    header::COOKIE,
                    format!("vouch_csrf_session={}", pair.session),
                )
                .header("X-CSRF-Token", &pair.token);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    /// POST /{channel}/send with a fresh CSRF pair; returns the exposed secret.
    pub async fn issue(&self, channel: &str, identifier: &str) -> String {
        let pair = self.csrf_pair().await;
        let response = self
            .send(self.post(
                &format!("/{channel}/send"),
                serde_json::json!({ "identifier": identifier }),
                Some(&pair),
            ))
            .await;
        assert_eq!(response.status(), 200);
        body_json(response).await["dev_secret"]
            .as_str()
            .expect("dev secret exposed")
            .to_string()
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
