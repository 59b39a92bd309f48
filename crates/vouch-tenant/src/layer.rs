//! Tower Layer implementation for tenancy middleware.

use crate::config::TenancyConfig;
use crate::service::TenancyService;
use std::sync::Arc;
use tower_layer::Layer;

/// Tower Layer that extracts the tenancy context.
///
/// ```rust,ignore
/// use vouch_tenant::TenancyLayer;
///
/// let app = Router::new()
///     .route("/email_otp/send", post(send))
///     .layer(TenancyLayer::new());
/// ```
#[derive(Debug, Clone)]
pub struct TenancyLayer {
    config: Arc<TenancyConfig>,
}

impl TenancyLayer {
    /// Create a layer with default header names and a required app.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(TenancyConfig::default())
    }

    #[must_use]
    pub fn with_config(config: TenancyConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    #[must_use]
    pub fn config(&self) -> &TenancyConfig {
        &self.config
    }
}

impl Default for TenancyLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Layer<S> for TenancyLayer {
    type Service = TenancyService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TenancyService::new(inner, Arc::clone(&self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_new() {
        let layer = TenancyLayer::new();
        assert_eq!(layer.config().app_header, "X-App-ID");
        assert!(layer.config().require_app);
    }

    #[test]
    fn test_layer_with_config() {
        let config = TenancyConfig::builder().require_app(false).build();
        let layer = TenancyLayer::with_config(config);
        assert!(!layer.config().require_app);
    }
}
