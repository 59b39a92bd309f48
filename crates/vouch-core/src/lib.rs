//! vouch Core Library
//!
//! Shared types for the vouch credential verification platform.
//!
//! # Modules
//!
//! - [`ids`] - Strongly typed identifiers (AppId, EnvironmentId, UserId, ...)
//! - [`tenancy`] - The (app, environment, organization) scoping triple
//! - [`error`] - The closed error taxonomy (VouchError)
//! - [`request`] - Per-request client metadata and cancellation
//! - [`clock`] - Injectable time source
//! - [`entropy`] - Injectable randomness
//!
//! # Example
//!
//! ```
//! use vouch_core::{AppId, EnvironmentId, TenancyContext, VouchError, Result};
//!
//! fn scoped() -> Result<TenancyContext> {
//!     TenancyContext::resolve(Some(AppId::new()), Some(EnvironmentId::new()), None)
//! }
//!
//! assert!(scoped().is_ok());
//! assert_eq!(
//!     TenancyContext::resolve(None, None, None).unwrap_err(),
//!     VouchError::AppContextMissing
//! );
//! ```

pub mod clock;
pub mod entropy;
pub mod error;
pub mod ids;
pub mod request;
pub mod tenancy;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entropy::{EntropySource, OsEntropy, SeededEntropy};
pub use error::{ErrorClass, Result, VouchError};
pub use ids::{
    AppId, EnvironmentId, OrganizationId, ParseIdError, SessionId, UserId, VerificationCodeId,
};
pub use request::RequestContext;
pub use tenancy::{SessionScope, TenancyContext};
