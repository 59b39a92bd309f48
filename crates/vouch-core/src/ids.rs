//! Strongly Typed Identifiers
//!
//! Newtype wrappers around UUIDs so that an `AppId` can never be passed where
//! an `EnvironmentId` or `UserId` is expected.
//!
//! # Example
//!
//! ```
//! use vouch_core::{AppId, EnvironmentId};
//!
//! let app = AppId::new();
//! let env = EnvironmentId::new();
//!
//! fn requires_app(id: AppId) -> String {
//!     id.to_string()
//! }
//!
//! let _ = requires_app(app);
//! // requires_app(env); // This would not compile!
//! # let _ = env;
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Error type for ID parsing failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse
    pub id_type: &'static str,
    /// The underlying UUID parse error message
    pub message: String,
}

impl Display for ParseIdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to parse {}: {}", self.id_type, self.message)
    }
}

impl std::error::Error for ParseIdError {}

/// Macro to define a strongly-typed ID type
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random ID using UUID v4.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns a reference to the underlying UUID.
            #[must_use]
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Returns true for the all-zero UUID.
            #[must_use]
            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|e| ParseIdError {
                        id_type: stringify!($name),
                        message: e.to_string(),
                    })
            }
        }
    };
}

define_id!(
    /// Identifier of an application, the outermost unit of tenant isolation.
    ///
    /// ```
    /// use vouch_core::AppId;
    /// use uuid::Uuid;
    ///
    /// let uuid = Uuid::new_v4();
    /// let app_id = AppId::from_uuid(uuid);
    /// assert_eq!(app_id.as_uuid(), &uuid);
    ///
    /// let parsed: AppId = "550e8400-e29b-41d4-a716-446655440000".parse().unwrap();
    /// assert_eq!(parsed.to_string(), "550e8400-e29b-41d4-a716-446655440000");
    /// ```
    AppId
);

define_id!(
    /// Identifier of an environment (e.g. staging, production) inside an app.
    EnvironmentId
);

define_id!(
    /// Identifier of an organization inside an app.
    OrganizationId
);

define_id!(
    /// Identifier of a user.
    UserId
);

define_id!(
    /// Identifier of an authenticated session.
    SessionId
);

define_id!(
    /// Identifier of a stored verification code record.
    VerificationCodeId
);
