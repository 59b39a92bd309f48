//! Test helpers for vouch-verification integration tests.
//!
//! Builds engines wired to in-memory collaborators, a manual clock and
//! seeded entropy.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;
use vouch_core::{AppId, EnvironmentId, ManualClock, RequestContext, SeededEntropy, TenancyContext};
use vouch_verification::memory::{
    InMemoryAuditSink, InMemoryCodeRepository, InMemorySessionStore, InMemoryUserDirectory,
    MockNotifier, RateLimitConfig, SessionTtl, SlidingWindowRateLimiter,
};
use vouch_verification::{
    ChannelKind, CodeVerificationEngine, EngineCollaborators, EngineConfig,
    VerificationCodeRepository,
};

pub const EMAIL: &str = "a@b.com";

const ENGINE_SEED: u64 = 0x5eed;
const SESSION_SEED: u64 = 0x5e55;

/// An engine plus handles on every in-memory collaborator.
pub struct Harness {
    pub engine: Arc<CodeVerificationEngine>,
    pub codes: Arc<InMemoryCodeRepository>,
    pub users: Arc<InMemoryUserDirectory>,
    pub sessions: Arc<InMemorySessionStore>,
    pub audit: Arc<InMemoryAuditSink>,
    pub notifier: Arc<MockNotifier>,
    pub clock: Arc<ManualClock>,
    pub deps: EngineCollaborators,
    pub tenancy: TenancyContext,
}

impl Harness {
    pub fn new(channel: ChannelKind) -> Self {
        Self::with_config(channel, test_config(channel))
    }

    pub fn with_config(channel: ChannelKind, config: EngineConfig) -> Self {
        Self::build(
            channel,
            config,
            RateLimitConfig::new(100, Duration::from_secs(900)),
        )
    }

    pub fn build(channel: ChannelKind, config: EngineConfig, limit: RateLimitConfig) -> Self {
        Self::build_with(channel, config, limit, |codes| codes)
    }

    /// Like [`Harness::build`], but the engine talks to the code store
    /// through `wrap`. Assertions still read the in-memory store directly.
    pub fn build_with<F>(
        channel: ChannelKind,
        config: EngineConfig,
        limit: RateLimitConfig,
        wrap: F,
    ) -> Self
    where
        F: FnOnce(Arc<InMemoryCodeRepository>) -> Arc<dyn VerificationCodeRepository>,
    {
        let codes = Arc::new(InMemoryCodeRepository::new());
        let users = Arc::new(InMemoryUserDirectory::new());
        let clock = Arc::new(ManualClock::default());
        let sessions = Arc::new(InMemorySessionStore::with_sources(
            SessionTtl::default(),
            Arc::new(SeededEntropy::new(SESSION_SEED)),
            clock.clone(),
        ));
        let audit = Arc::new(InMemoryAuditSink::new());
        let notifier = Arc::new(MockNotifier::new());
        let rate_limiter = Arc::new(SlidingWindowRateLimiter::new(limit));

        let deps = EngineCollaborators {
            codes: wrap(codes.clone()),
            users: users.clone(),
            sessions: sessions.clone(),
            audit: audit.clone(),
            notifier: notifier.clone(),
            rate_limiter,
            entropy: Arc::new(SeededEntropy::new(ENGINE_SEED)),
            clock: clock.clone(),
        };
        let engine = Arc::new(
            CodeVerificationEngine::new(channel, config, deps.clone())
                .expect("valid engine config"),
        );

        Self {
            engine,
            codes,
            users,
            sessions,
            audit,
            notifier,
            clock,
            deps,
            tenancy: tenancy(),
        }
    }

    /// Issue a code for `identifier` and return the delivered secret.
    pub async fn issue(&self, identifier: &str) -> String {
        self.engine
            .issue_code(&RequestContext::new(), &self.tenancy, identifier)
            .await
            .expect("issue should succeed");
        let normalized = self.engine.channel().normalize_identifier(identifier);
        self.notifier
            .last_secret_for(&normalized)
            .expect("secret should have been delivered")
    }

    /// Seed a user under the harness app.
    pub fn seed_user(&self, identifier: &str) {
        self.users
            .insert(self.tenancy.app_id(), identifier, "seeded");
    }
}

/// App + environment, no organization.
pub fn tenancy() -> TenancyContext {
    TenancyContext::new(AppId::new()).with_environment(EnvironmentId::new())
}

/// Defaults with implicit signup on, so tests need not seed users.
pub fn test_config(channel: ChannelKind) -> EngineConfig {
    EngineConfig {
        allow_implicit_signup: true,
        ..EngineConfig::for_channel(channel)
    }
}

/// A secret guaranteed to differ from `secret` with the same shape.
pub fn wrong_secret(secret: &str) -> String {
    secret
        .chars()
        .map(|c| match c {
            '0'..='8' => char::from(c as u8 + 1),
            '9' => '0',
            'a' => 'b',
            _ => 'a',
        })
        .collect()
}
