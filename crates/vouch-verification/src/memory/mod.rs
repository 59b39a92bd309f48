//! In-memory collaborators for development servers and tests.
//!
//! Each store guards its state with a single `parking_lot::Mutex` and never
//! awaits while holding it.

mod audit;
mod codes;
mod notifier;
mod rate_limit;
mod sessions;
mod users;

pub use audit::{InMemoryAuditSink, DEFAULT_AUDIT_CAPACITY};
pub use codes::InMemoryCodeRepository;
pub use notifier::{Delivery, LogNotifier, MockNotifier, REDACTED};
pub use rate_limit::{RateLimitConfig, SlidingWindowRateLimiter};
pub use sessions::{InMemorySessionStore, SessionTtl};
pub use users::InMemoryUserDirectory;
