//! Tenancy Context
//!
//! Every operation is scoped by an (app, environment, organization) triple.
//! The app is mandatory and is therefore a plain field; environment and
//! organization are optional at extraction time. Flows that create sessions
//! narrow the context to a [`SessionScope`], whose environment is mandatory.
//!
//! # Example
//!
//! ```
//! use vouch_core::{AppId, EnvironmentId, TenancyContext, VouchError};
//!
//! let app = AppId::new();
//! let tenancy = TenancyContext::resolve(Some(app), None, None).unwrap();
//! assert!(matches!(
//!     tenancy.session_scope(),
//!     Err(VouchError::EnvironmentContextMissing)
//! ));
//!
//! let tenancy = tenancy.with_environment(EnvironmentId::new());
//! assert!(tenancy.session_scope().is_ok());
//! ```

use crate::error::VouchError;
use crate::ids::{AppId, EnvironmentId, OrganizationId};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// The tenancy triple threaded through every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenancyContext {
    app_id: AppId,
    environment_id: Option<EnvironmentId>,
    organization_id: Option<OrganizationId>,
}

impl TenancyContext {
    /// Create a context for an app with no environment or organization.
    #[must_use]
    pub fn new(app_id: AppId) -> Self {
        Self {
            app_id,
            environment_id: None,
            organization_id: None,
        }
    }

    /// Build a context from optional parts, as they arrive from a transport.
    ///
    /// # Errors
    ///
    /// Returns `VouchError::AppContextMissing` when no app is given or the
    /// app is the nil UUID.
    pub fn resolve(
        app_id: Option<AppId>,
        environment_id: Option<EnvironmentId>,
        organization_id: Option<OrganizationId>,
    ) -> Result<Self, VouchError> {
        let app_id = app_id
            .filter(|id| !id.is_nil())
            .ok_or(VouchError::AppContextMissing)?;

        Ok(Self {
            app_id,
            environment_id: environment_id.filter(|id| !id.is_nil()),
            organization_id: organization_id.filter(|id| !id.is_nil()),
        })
    }

    /// Return a copy bound to the given environment.
    #[must_use]
    pub fn with_environment(mut self, environment_id: EnvironmentId) -> Self {
        self.environment_id = Some(environment_id);
        self
    }

    /// Return a copy bound to the given organization.
    #[must_use]
    pub fn with_organization(mut self, organization_id: OrganizationId) -> Self {
        self.organization_id = Some(organization_id);
        self
    }

    #[must_use]
    pub fn app_id(&self) -> AppId {
        self.app_id
    }

    #[must_use]
    pub fn environment_id(&self) -> Option<EnvironmentId> {
        self.environment_id
    }

    #[must_use]
    pub fn organization_id(&self) -> Option<OrganizationId> {
        self.organization_id
    }

    /// Narrow this context to the scope a session is created in.
    ///
    /// # Errors
    ///
    /// Returns `VouchError::EnvironmentContextMissing` when no environment is set.
    pub fn session_scope(&self) -> Result<SessionScope, VouchError> {
        let environment_id = self
            .environment_id
            .ok_or(VouchError::EnvironmentContextMissing)?;

        Ok(SessionScope {
            app_id: self.app_id,
            environment_id,
            organization_id: self.organization_id,
        })
    }
}

impl Display for TenancyContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "app={}", self.app_id)?;
        if let Some(env) = self.environment_id {
            write!(f, " env={env}")?;
        }
        if let Some(org) = self.organization_id {
            write!(f, " org={org}")?;
        }
        Ok(())
    }
}

/// Scope of an authenticated session. The environment is always present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionScope {
    pub app_id: AppId,
    pub environment_id: EnvironmentId,
    pub organization_id: Option<OrganizationId>,
}

impl From<SessionScope> for TenancyContext {
    fn from(scope: SessionScope) -> Self {
        Self {
            app_id: scope.app_id,
            environment_id: Some(scope.environment_id),
            organization_id: scope.organization_id,
        }
    }
}
