use crate::channel::ChannelKind;
use crate::repository::{CollaboratorError, NotificationAdapter};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use vouch_core::TenancyContext;

/// One recorded delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub tenancy: TenancyContext,
    pub channel: ChannelKind,
    pub identifier: String,
    pub secret: String,
    pub ttl_minutes: i64,
}

/// Notifier that records deliveries instead of sending them.
#[derive(Debug, Default)]
pub struct MockNotifier {
    deliveries: Mutex<Vec<Delivery>>,
    failing: AtomicBool,
}

impl MockNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `send` fail. Failed sends are not recorded.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    #[must_use]
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().clone()
    }

    /// The most recent secret sent to `identifier`.
    #[must_use]
    pub fn last_secret_for(&self, identifier: &str) -> Option<String> {
        self.deliveries
            .lock()
            .iter()
            .rev()
            .find(|d| d.identifier == identifier)
            .map(|d| d.secret.clone())
    }
}

#[async_trait]
impl NotificationAdapter for MockNotifier {
    async fn send(
        &self,
        tenancy: &TenancyContext,
        channel: ChannelKind,
        identifier: &str,
        secret: &str,
        ttl_minutes: i64,
    ) -> Result<(), CollaboratorError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Delivery(
                "provider not configured".to_string(),
            ));
        }
        self.deliveries.lock().push(Delivery {
            tenancy: *tenancy,
            channel,
            identifier: identifier.to_string(),
            secret: secret.to_string(),
            ttl_minutes,
        });
        Ok(())
    }
}

/// Placeholder written to the log in place of a secret.
pub const REDACTED: &str = "[redacted]";

/// Notifier for development servers: records each delivery in the log.
///
/// The secret itself is never logged. Magic links are rendered with the
/// token replaced by [`REDACTED`]; developers read secrets from the
/// `dev_secret` response field instead.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    magic_link_base_url: String,
}

impl LogNotifier {
    #[must_use]
    pub fn new(magic_link_base_url: impl Into<String>) -> Self {
        Self {
            magic_link_base_url: magic_link_base_url.into(),
        }
    }

    /// The link a magic link email would carry.
    ///
    /// # Errors
    ///
    /// Returns `CollaboratorError::Other` if the query cannot be encoded.
    pub fn magic_link_url(
        &self,
        identifier: &str,
        token: &str,
    ) -> Result<String, CollaboratorError> {
        let query = serde_urlencoded::to_string([("identifier", identifier), ("token", token)])
            .map_err(|e| CollaboratorError::Other(format!("cannot encode link: {e}")))?;
        Ok(format!("{}?{query}", self.magic_link_base_url))
    }
}

#[async_trait]
impl NotificationAdapter for LogNotifier {
    async fn send(
        &self,
        tenancy: &TenancyContext,
        channel: ChannelKind,
        identifier: &str,
        secret: &str,
        ttl_minutes: i64,
    ) -> Result<(), CollaboratorError> {
        match channel {
            ChannelKind::MagicLink => {
                let link = self.magic_link_url(identifier, REDACTED)?;
                tracing::info!(
                    tenancy = %tenancy,
                    identifier = identifier,
                    link = %link,
                    ttl_minutes,
                    "Magic link (log delivery)"
                );
            }
            ChannelKind::EmailOtp | ChannelKind::SmsOtp => {
                tracing::info!(
                    tenancy = %tenancy,
                    channel = %channel,
                    identifier = identifier,
                    code_length = secret.len(),
                    ttl_minutes,
                    "One-time code (log delivery)"
                );
            }
        }
        Ok(())
    }
}
