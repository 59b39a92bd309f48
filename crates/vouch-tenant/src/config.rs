//! Configuration for tenancy extraction.

/// Default header carrying the application ID.
pub const DEFAULT_APP_HEADER: &str = "X-App-ID";

/// Default header carrying the environment ID.
pub const DEFAULT_ENVIRONMENT_HEADER: &str = "X-Environment-ID";

/// Default header carrying the organization ID.
pub const DEFAULT_ORGANIZATION_HEADER: &str = "X-Organization-ID";

/// Header names and enforcement policy for [`TenancyLayer`](crate::TenancyLayer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenancyConfig {
    pub app_header: String,
    pub environment_header: String,
    pub organization_header: String,
    /// Reject requests without an app. When false, such requests pass through
    /// without a `TenancyContext` extension.
    pub require_app: bool,
}

impl TenancyConfig {
    #[must_use]
    pub fn builder() -> TenancyConfigBuilder {
        TenancyConfigBuilder::default()
    }
}

impl Default for TenancyConfig {
    fn default() -> Self {
        Self {
            app_header: DEFAULT_APP_HEADER.to_string(),
            environment_header: DEFAULT_ENVIRONMENT_HEADER.to_string(),
            organization_header: DEFAULT_ORGANIZATION_HEADER.to_string(),
            require_app: true,
        }
    }
}

/// Builder for [`TenancyConfig`].
///
/// ```rust
/// use vouch_tenant::TenancyConfig;
///
/// let config = TenancyConfig::builder()
///     .app_header("X-Client-App")
///     .require_app(false)
///     .build();
/// assert_eq!(config.app_header, "X-Client-App");
/// assert_eq!(config.environment_header, "X-Environment-ID");
/// ```
#[derive(Debug, Clone, Default)]
pub struct TenancyConfigBuilder {
    config: TenancyConfig,
}

impl TenancyConfigBuilder {
    #[must_use]
    pub fn app_header(mut self, name: impl Into<String>) -> Self {
        self.config.app_header = name.into();
        self
    }

    #[must_use]
    pub fn environment_header(mut self, name: impl Into<String>) -> Self {
        self.config.environment_header = name.into();
        self
    }

    #[must_use]
    pub fn organization_header(mut self, name: impl Into<String>) -> Self {
        self.config.organization_header = name.into();
        self
    }

    #[must_use]
    pub fn require_app(mut self, required: bool) -> Self {
        self.config.require_app = required;
        self
    }

    #[must_use]
    pub fn build(self) -> TenancyConfig {
        self.config
    }
}
