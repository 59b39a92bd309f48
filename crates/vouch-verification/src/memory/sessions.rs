use crate::model::{CreatedSession, NewSession, Session};
use crate::repository::{CollaboratorError, SessionStore};
use crate::secret::{hash_secret, random_token, EntropySource, OsEntropy};
use async_trait::async_trait;
use chrono::Duration;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use vouch_core::{Clock, SessionId, SystemClock};

const SESSION_TOKEN_BYTES: usize = 32;

/// Session lifetimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTtl {
    pub standard: Duration,
    /// Used when the caller asked to be remembered.
    pub remembered: Duration,
}

impl Default for SessionTtl {
    fn default() -> Self {
        Self {
            standard: Duration::hours(24),
            remembered: Duration::days(30),
        }
    }
}

/// Session store that keeps sessions indexed by the digest of their bearer token.
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    ttl: SessionTtl,
    entropy: Arc<dyn EntropySource>,
    clock: Arc<dyn Clock>,
    failing: AtomicBool,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new(ttl: SessionTtl) -> Self {
        Self::with_sources(ttl, Arc::new(OsEntropy), Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_sources(
        ttl: SessionTtl,
        entropy: Arc<dyn EntropySource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
            entropy,
            clock,
            failing: AtomicBool::new(false),
        }
    }

    /// Make every subsequent `create` call fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Resolve a bearer token to a live session.
    #[must_use]
    pub fn find_by_token(&self, token: &str) -> Option<Session> {
        let now = self.clock.now();
        self.sessions
            .lock()
            .get(&hash_secret(token))
            .filter(|s| s.expires_at > now)
            .cloned()
    }

    /// Drop sessions past their expiry. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at > now);
        before - sessions.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(SessionTtl::default())
    }
}

impl std::fmt::Debug for InMemorySessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemorySessionStore")
            .field("sessions", &self.len())
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, new_session: NewSession) -> Result<CreatedSession, CollaboratorError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Unavailable(
                "session store offline".to_string(),
            ));
        }

        let now = self.clock.now();
        let ttl = if new_session.remember {
            self.ttl.remembered
        } else {
            self.ttl.standard
        };
        let session = Session {
            id: SessionId::new(),
            user_id: new_session.user_id,
            scope: new_session.scope,
            remember: new_session.remember,
            ip_address: new_session.ip_address,
            user_agent: new_session.user_agent,
            created_at: now,
            expires_at: now
                .checked_add_signed(ttl)
                .ok_or_else(|| CollaboratorError::Other("session ttl out of range".to_string()))?,
        };
        let token = random_token(self.entropy.as_ref(), SESSION_TOKEN_BYTES);

        self.sessions
            .lock()
            .insert(hash_secret(&token), session.clone());
        Ok(CreatedSession { session, token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vouch_core::{AppId, EnvironmentId, ManualClock, SessionScope, UserId};

    fn new_session(remember: bool) -> NewSession {
        NewSession {
            scope: SessionScope {
                app_id: AppId::new(),
                environment_id: EnvironmentId::new(),
                organization_id: None,
            },
            user_id: UserId::new(),
            remember,
            ip_address: None,
            user_agent: Some("test".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_and_resolve() {
        let store = InMemorySessionStore::default();
        let created = store.create(new_session(false)).await.unwrap();

        assert_eq!(created.token.len(), 43);
        assert!(created.session.expires_at > created.session.created_at);
        assert_eq!(store.find_by_token(&created.token), Some(created.session));
        assert!(store.find_by_token("unknown").is_none());
    }

    #[tokio::test]
    async fn test_remember_extends_ttl() {
        let store = InMemorySessionStore::default();
        let short = store.create(new_session(false)).await.unwrap().session;
        let long = store.create(new_session(true)).await.unwrap().session;

        assert_eq!(short.expires_at - short.created_at, Duration::hours(24));
        assert_eq!(long.expires_at - long.created_at, Duration::days(30));
    }

    #[tokio::test]
    async fn test_expired_session_not_resolved() {
        let clock = Arc::new(ManualClock::default());
        let store = InMemorySessionStore::with_sources(
            SessionTtl::default(),
            Arc::new(OsEntropy),
            clock.clone(),
        );
        let created = store.create(new_session(false)).await.unwrap();

        clock.advance(Duration::hours(25));
        assert!(store.find_by_token(&created.token).is_none());
    }

    #[tokio::test]
    async fn test_purge_expired_keeps_live_sessions() {
        let clock = Arc::new(ManualClock::default());
        let store = InMemorySessionStore::with_sources(
            SessionTtl::default(),
            Arc::new(OsEntropy),
            clock.clone(),
        );
        store.create(new_session(false)).await.unwrap();
        let remembered = store.create(new_session(true)).await.unwrap();

        assert_eq!(store.purge_expired(), 0);
        clock.advance(Duration::hours(25));
        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.find_by_token(&remembered.token).is_some());

        clock.advance(Duration::days(30));
        assert_eq!(store.purge_expired(), 1);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_failing_store() {
        let store = InMemorySessionStore::default();
        store.set_failing(true);
        assert!(store.create(new_session(false)).await.is_err());
        assert!(store.is_empty());
    }
}
