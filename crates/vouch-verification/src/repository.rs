//! Collaborator interfaces consumed by the engine.
//!
//! Each trait hides an I/O-bound dependency (database, directory, mail
//! provider). In-memory implementations live in [`crate::memory`].

use crate::channel::ChannelKind;
use crate::model::{
    AuditEntry, ConsumeOutcome, CreatedSession, NewSession, NewUser, NewVerificationCode, User,
    VerificationCode,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use vouch_core::{AppId, TenancyContext, VerificationCodeId};

/// Failure reported by a collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CollaboratorError {
    /// The backing store could not be reached or refused the operation.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The write conflicted with existing data.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A downstream provider (mail, SMS) failed.
    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("{0}")]
    Other(String),
}

/// Persistence for one-time secrets.
///
/// `increment_attempts` and `consume` are compare-and-set operations: they
/// must be atomic with respect to each other for the same record.
#[async_trait]
pub trait VerificationCodeRepository: Send + Sync {
    /// Store a new code and retire every other active code for the same
    /// tenancy, channel and identifier, in one atomic step.
    ///
    /// Two concurrent creates for one identifier must leave exactly one
    /// active code behind.
    async fn create(&self, code: NewVerificationCode)
        -> Result<VerificationCode, CollaboratorError>;

    /// Newest unconsumed, unexpired code for the identifier in the app and
    /// environment of `tenancy`.
    async fn find_active_by_identifier(
        &self,
        tenancy: &TenancyContext,
        channel: ChannelKind,
        identifier: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<VerificationCode>, CollaboratorError>;

    /// Increment the attempt counter of an unconsumed code that is still
    /// below its budget. Returns the new count, or `None` if nothing changed.
    async fn increment_attempts(
        &self,
        id: VerificationCodeId,
    ) -> Result<Option<u32>, CollaboratorError>;

    /// Mark the code consumed if it is unconsumed, unexpired and below its budget.
    async fn consume(
        &self,
        id: VerificationCodeId,
        now: DateTime<Utc>,
    ) -> Result<ConsumeOutcome, CollaboratorError>;

    /// Retire every active code for the identifier. Returns how many were retired.
    async fn invalidate_active(
        &self,
        tenancy: &TenancyContext,
        channel: ChannelKind,
        identifier: &str,
        now: DateTime<Utc>,
    ) -> Result<u64, CollaboratorError>;
}

/// Lookup and implicit creation of users.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_identifier(
        &self,
        app_id: AppId,
        identifier: &str,
    ) -> Result<Option<User>, CollaboratorError>;

    async fn create_implicit(&self, user: NewUser) -> Result<User, CollaboratorError>;
}

/// Creates sessions after a successful verification.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, session: NewSession) -> Result<CreatedSession, CollaboratorError>;
}

/// Append-only audit trail.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn log(&self, entry: AuditEntry) -> Result<(), CollaboratorError>;
}

/// Delivers a secret to its owner.
#[async_trait]
pub trait NotificationAdapter: Send + Sync {
    async fn send(
        &self,
        tenancy: &TenancyContext,
        channel: ChannelKind,
        identifier: &str,
        secret: &str,
        ttl_minutes: i64,
    ) -> Result<(), CollaboratorError>;
}

/// Decides whether another request for `key` fits the window of `route_key`.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Returns `true` when the request is allowed, and records it.
    async fn check_limit_for_path(
        &self,
        key: &str,
        route_key: &str,
    ) -> Result<bool, CollaboratorError>;
}
