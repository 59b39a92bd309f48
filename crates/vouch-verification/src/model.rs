//! Records produced and consumed by the engine.

use crate::channel::ChannelKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use vouch_core::{AppId, SessionId, SessionScope, TenancyContext, UserId, VerificationCodeId};

/// A stored one-time secret.
///
/// Only the SHA-256 digest of the secret is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationCode {
    pub id: VerificationCodeId,
    pub tenancy: TenancyContext,
    pub channel: ChannelKind,
    pub identifier: String,
    pub secret_hash: String,
    pub attempts: u32,
    pub max_attempts: u32,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl VerificationCode {
    #[must_use]
    pub fn is_consumed(&self) -> bool {
        self.consumed_at.is_some()
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Unconsumed and unexpired. Exhausted codes are still active; they fail
    /// with `TooManyAttempts` rather than `CodeNotFound`.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.is_consumed() && !self.is_expired(now)
    }

    #[must_use]
    pub fn attempts_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    #[must_use]
    pub fn remaining_attempts(&self) -> u32 {
        self.max_attempts.saturating_sub(self.attempts)
    }

    /// True when the code was issued under the same app and environment.
    #[must_use]
    pub fn matches_scope(&self, tenancy: &TenancyContext) -> bool {
        self.tenancy.app_id() == tenancy.app_id()
            && self.tenancy.environment_id() == tenancy.environment_id()
    }
}

/// Input for [`VerificationCodeRepository::create`](crate::VerificationCodeRepository::create).
#[derive(Debug, Clone)]
pub struct NewVerificationCode {
    pub tenancy: TenancyContext,
    pub channel: ChannelKind,
    pub identifier: String,
    pub secret_hash: String,
    pub max_attempts: u32,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Result of an atomic consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// This call consumed the code.
    Consumed,
    /// The code ran out of attempts before it could be consumed.
    Exhausted,
    /// The code is already consumed, expired or unknown.
    Gone,
}

/// A user account as seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub app_id: AppId,
    pub identifier: String,
    pub display_name: String,
    /// Digest of a credential the user never sees.
    #[serde(skip_serializing, default)]
    pub credential_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Input for [`UserDirectory::create_implicit`](crate::UserDirectory::create_implicit).
#[derive(Debug, Clone)]
pub struct NewUser {
    pub app_id: AppId,
    pub identifier: String,
    pub display_name: String,
    pub credential_hash: String,
}

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub scope: SessionScope,
    pub remember: bool,
    pub ip_address: Option<IpAddr>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Input for [`SessionStore::create`](crate::SessionStore::create).
#[derive(Debug, Clone)]
pub struct NewSession {
    pub scope: SessionScope,
    pub user_id: UserId,
    pub remember: bool,
    pub ip_address: Option<IpAddr>,
    pub user_agent: Option<String>,
}

/// A freshly created session together with its bearer token.
#[derive(Debug, Clone)]
pub struct CreatedSession {
    pub session: Session,
    pub token: String,
}

/// What a successful verification hands back.
#[derive(Debug, Clone)]
pub struct SessionBundle {
    pub user: User,
    pub session: Session,
    pub token: String,
}

/// What a successful issue hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCode {
    /// The secret itself, only when development exposure is enabled.
    pub dev_secret: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub expires_in_seconds: i64,
}

/// One audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub user_id: Option<UserId>,
    pub tenancy: TenancyContext,
    pub action: String,
    pub resource: String,
    pub ip_address: Option<IpAddr>,
    pub user_agent: Option<String>,
    pub detail: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use vouch_core::EnvironmentId;

    fn code(now: DateTime<Utc>) -> VerificationCode {
        VerificationCode {
            id: VerificationCodeId::new(),
            tenancy: TenancyContext::new(AppId::new()).with_environment(EnvironmentId::new()),
            channel: ChannelKind::EmailOtp,
            identifier: "a@b.com".to_string(),
            secret_hash: String::new(),
            attempts: 0,
            max_attempts: 3,
            expires_at: now + Duration::minutes(10),
            consumed_at: None,
            created_at: now,
        }
    }

    #[test]
    fn test_lifecycle_predicates() {
        let now = Utc::now();
        let mut record = code(now);
        assert!(record.is_active(now));
        assert!(!record.is_active(now + Duration::minutes(10)));

        record.attempts = 3;
        assert!(record.attempts_exhausted());
        assert_eq!(record.remaining_attempts(), 0);
        assert!(record.is_active(now));

        record.consumed_at = Some(now);
        assert!(!record.is_active(now));
    }

    #[test]
    fn test_scope_match_ignores_organization() {
        let now = Utc::now();
        let record = code(now);
        let with_org = record
            .tenancy
            .with_organization(vouch_core::OrganizationId::new());
        assert!(record.matches_scope(&with_org));

        let other_env = TenancyContext::new(record.tenancy.app_id())
            .with_environment(EnvironmentId::new());
        assert!(!record.matches_scope(&other_env));
    }

    #[test]
    fn test_user_serialization_hides_credential() {
        let user = User {
            id: UserId::new(),
            app_id: AppId::new(),
            identifier: "a@b.com".to_string(),
            display_name: "a".to_string(),
            credential_hash: "secret-digest".to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-digest"));
    }
}
