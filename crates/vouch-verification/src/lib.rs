//! # vouch-verification
//!
//! Turns a delivered, time-limited, single-use secret into an authenticated
//! session.
//!
//! A [`CodeVerificationEngine`] runs the whole flow for one channel:
//!
//! 1. **Issue**: rate limit, retire the previous code, generate a secret with
//!    the channel's [`SecretStrategy`], store its digest, deliver it, audit.
//! 2. **Verify**: look up the active code, enforce the attempt budget,
//!    compare in constant time, consume atomically.
//! 3. **Session**: resolve or implicitly create the user, open a session
//!    bound to the tenancy, audit.
//!
//! Storage, delivery, auditing and rate limiting are collaborator traits
//! (see [`repository`]). The [`memory`] module ships in-memory versions used
//! by the development server and the tests.
//!
//! ```rust,ignore
//! use vouch_verification::{ChannelKind, CodeVerificationEngine, EngineConfig, EngineRegistry};
//!
//! let engine = CodeVerificationEngine::new(
//!     ChannelKind::EmailOtp,
//!     EngineConfig::for_channel(ChannelKind::EmailOtp),
//!     collaborators,
//! )?;
//! let registry = EngineRegistry::new().with_engine(engine);
//!
//! let issued = registry.resolve("email_otp")?.issue_code(&ctx, &tenancy, "a@b.com").await?;
//! ```

pub mod channel;
pub mod config;
pub mod engine;
pub mod memory;
pub mod model;
pub mod registry;
pub mod repository;
pub mod secret;

pub use channel::ChannelKind;
pub use config::{ConfigError, EngineConfig};
pub use engine::{CodeVerificationEngine, EngineCollaborators};
pub use model::{
    AuditEntry, ConsumeOutcome, CreatedSession, IssuedCode, NewSession, NewUser,
    NewVerificationCode, Session, SessionBundle, User, VerificationCode,
};
pub use registry::EngineRegistry;
pub use repository::{
    AuditSink, CollaboratorError, NotificationAdapter, RateLimiter, SessionStore, UserDirectory,
    VerificationCodeRepository,
};
pub use secret::{
    hash_secret, verify_secret, EntropySource, LinkToken, NumericCode, OsEntropy, SecretStrategy,
    SeededEntropy,
};
