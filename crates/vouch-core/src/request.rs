//! Per-request context: client metadata plus a cancellation handle.

use crate::error::VouchError;
use std::net::IpAddr;
use tokio_util::sync::CancellationToken;

/// Information about the calling client and a handle the caller can use to
/// abandon the operation.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    ip_address: Option<IpAddr>,
    user_agent: Option<String>,
    cancellation: CancellationToken,
}

impl RequestContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_ip(mut self, ip: IpAddr) -> Self {
        self.ip_address = Some(ip);
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Attach an externally owned cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    #[must_use]
    pub fn ip_address(&self) -> Option<IpAddr> {
        self.ip_address
    }

    #[must_use]
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Fail with `VouchError::Cancelled` once the caller has given up.
    ///
    /// # Errors
    ///
    /// Returns `VouchError::Cancelled` if the token was cancelled.
    pub fn ensure_active(&self) -> Result<(), VouchError> {
        if self.cancellation.is_cancelled() {
            return Err(VouchError::Cancelled);
        }
        Ok(())
    }
}
