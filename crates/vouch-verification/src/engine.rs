//! The code verification engine.
//!
//! One engine per channel. It issues a secret (rate limit, generate, store,
//! deliver, audit), verifies a presented secret (lookup, attempt budget,
//! constant-time compare, atomic consume) and turns a successful verification
//! into a session. Channels differ only in their [`SecretStrategy`] and the
//! notification adapter that delivers the secret.

use crate::channel::ChannelKind;
use crate::config::{ConfigError, EngineConfig};
use crate::model::{
    AuditEntry, ConsumeOutcome, IssuedCode, NewSession, NewUser, NewVerificationCode,
    SessionBundle, User, VerificationCode,
};
use crate::repository::{
    AuditSink, NotificationAdapter, RateLimiter, SessionStore, UserDirectory,
    VerificationCodeRepository,
};
use crate::secret::{
    hash_secret, random_token, verify_secret, EntropySource, LinkToken, NumericCode,
    SecretStrategy,
};
use serde_json::json;
use std::sync::Arc;
use vouch_core::{Clock, RequestContext, Result, SessionScope, TenancyContext, UserId, VouchError};
use zeroize::Zeroizing;

const IMPLICIT_CREDENTIAL_BYTES: usize = 32;

/// Everything an engine talks to.
#[derive(Clone)]
pub struct EngineCollaborators {
    pub codes: Arc<dyn VerificationCodeRepository>,
    pub users: Arc<dyn UserDirectory>,
    pub sessions: Arc<dyn SessionStore>,
    pub audit: Arc<dyn AuditSink>,
    pub notifier: Arc<dyn NotificationAdapter>,
    pub rate_limiter: Arc<dyn RateLimiter>,
    pub entropy: Arc<dyn EntropySource>,
    pub clock: Arc<dyn Clock>,
}

/// Issues and verifies one-time secrets for a single channel.
pub struct CodeVerificationEngine {
    channel: ChannelKind,
    strategy: Arc<dyn SecretStrategy>,
    config: EngineConfig,
    deps: EngineCollaborators,
}

impl std::fmt::Debug for CodeVerificationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeVerificationEngine")
            .field("channel", &self.channel)
            .field("strategy", &self.strategy.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CodeVerificationEngine {
    /// Build an engine with the channel's standard secret format: numeric
    /// codes of `config.secret_length` for OTP channels, 32-byte link tokens
    /// for magic links.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is invalid.
    pub fn new(
        channel: ChannelKind,
        config: EngineConfig,
        deps: EngineCollaborators,
    ) -> std::result::Result<Self, ConfigError> {
        let strategy: Arc<dyn SecretStrategy> = if channel.is_otp() {
            Arc::new(NumericCode::new(config.secret_length))
        } else {
            Arc::new(LinkToken::default())
        };
        Self::with_strategy(channel, strategy, config, deps)
    }

    /// Build an engine with a custom secret format.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is invalid.
    pub fn with_strategy(
        channel: ChannelKind,
        strategy: Arc<dyn SecretStrategy>,
        config: EngineConfig,
        deps: EngineCollaborators,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            channel,
            strategy,
            config,
            deps,
        })
    }

    #[must_use]
    pub fn channel(&self) -> ChannelKind {
        self.channel
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Issue a new secret for `identifier` and deliver it.
    ///
    /// The repository retires any still-active code for the same identifier
    /// in the same step that stores the new one. A delivery failure is
    /// logged and does not fail the call.
    ///
    /// # Errors
    ///
    /// - `Cancelled` if the request was abandoned before anything was stored
    /// - `MissingField` for an empty identifier
    /// - `RateLimitExceeded` when the limiter rejects the send
    /// - `Repository` / `Internal` on collaborator failures
    pub async fn issue_code(
        &self,
        ctx: &RequestContext,
        tenancy: &TenancyContext,
        identifier: &str,
    ) -> Result<IssuedCode> {
        ctx.ensure_active()?;

        let identifier = self.normalize(identifier)?;

        let allowed = self
            .deps
            .rate_limiter
            .check_limit_for_path(
                &self.channel.send_key(&identifier),
                &self.channel.send_route(),
            )
            .await
            .map_err(|e| VouchError::Internal(format!("rate limiter unavailable: {e}")))?;
        if !allowed {
            tracing::warn!(
                channel = %self.channel,
                tenancy = %tenancy,
                "Verification send rate limit exceeded"
            );
            return Err(VouchError::RateLimitExceeded);
        }

        ctx.ensure_active()?;

        let now = self.deps.clock.now();
        let expires_at = now
            .checked_add_signed(self.config.expiry)
            .ok_or_else(|| VouchError::Internal("code expiry out of range".to_string()))?;

        let secret = Zeroizing::new(self.strategy.generate(self.deps.entropy.as_ref()));

        let code = self
            .deps
            .codes
            .create(NewVerificationCode {
                tenancy: *tenancy,
                channel: self.channel,
                identifier: identifier.clone(),
                secret_hash: hash_secret(&secret),
                max_attempts: self.config.max_attempts,
                issued_at: now,
                expires_at,
            })
            .await
            .map_err(repository_error)?;

        if let Err(e) = self
            .deps
            .notifier
            .send(
                tenancy,
                self.channel,
                &identifier,
                &secret,
                self.config.expiry_minutes(),
            )
            .await
        {
            tracing::error!(
                channel = %self.channel,
                tenancy = %tenancy,
                code_id = %code.id,
                error = %e,
                "Failed to deliver verification secret"
            );
        }

        self.audit(
            ctx,
            tenancy,
            None,
            self.channel.sent_action(),
            json!({ "code_id": code.id, "expires_at": expires_at }),
        )
        .await;

        tracing::info!(
            channel = %self.channel,
            tenancy = %tenancy,
            code_id = %code.id,
            "Verification code issued"
        );

        let expose = self.config.dev_expose_secret;
        Ok(IssuedCode {
            dev_secret: expose.then(|| secret.as_str().to_owned()),
            expires_at,
            expires_in_seconds: self.config.expiry.num_seconds(),
        })
    }

    /// Verify a presented secret and, on success, open a session.
    ///
    /// # Errors
    ///
    /// - `EnvironmentContextMissing` when the tenancy has no environment
    /// - `MissingField` for an empty identifier or secret
    /// - `CodeNotFound` when no active code exists (never sent, expired or used)
    /// - `TooManyAttempts` once the code's attempt budget is spent
    /// - `InvalidCode` on a mismatch, which also spends one attempt
    /// - `Cancelled` if the request was abandoned before the code was consumed
    /// - `UserNotFound`, `UserCreationFailed`, `SessionCreationFailed` from session issuance
    pub async fn verify_code(
        &self,
        ctx: &RequestContext,
        tenancy: &TenancyContext,
        identifier: &str,
        presented: &str,
        remember: bool,
    ) -> Result<SessionBundle> {
        let scope = tenancy.session_scope()?;
        let identifier = self.normalize(identifier)?;
        let presented = presented.trim();
        if presented.is_empty() {
            return Err(VouchError::MissingField { field: "secret" });
        }

        let now = self.deps.clock.now();
        let code = self
            .deps
            .codes
            .find_active_by_identifier(tenancy, self.channel, &identifier, now)
            .await
            .map_err(repository_error)?
            .ok_or(VouchError::CodeNotFound)?;

        if code.attempts_exhausted() {
            tracing::warn!(
                channel = %self.channel,
                code_id = %code.id,
                "Verification attempted on exhausted code"
            );
            return Err(VouchError::TooManyAttempts);
        }

        // Non-short-circuiting: the digest is compared even for malformed input.
        let matched =
            verify_secret(presented, &code.secret_hash) & self.strategy.is_well_formed(presented);
        if !matched {
            return Err(self.record_mismatch(ctx, tenancy, &code).await);
        }

        ctx.ensure_active()?;

        match self
            .deps
            .codes
            .consume(code.id, self.deps.clock.now())
            .await
            .map_err(repository_error)?
        {
            ConsumeOutcome::Consumed => {}
            ConsumeOutcome::Exhausted => return Err(VouchError::TooManyAttempts),
            ConsumeOutcome::Gone => return Err(VouchError::CodeNotFound),
        }

        self.audit(
            ctx,
            tenancy,
            None,
            self.channel.verify_success_action(),
            json!({ "code_id": code.id }),
        )
        .await;

        self.issue_session(ctx, scope, &identifier, remember).await
    }

    async fn record_mismatch(
        &self,
        ctx: &RequestContext,
        tenancy: &TenancyContext,
        code: &VerificationCode,
    ) -> VouchError {
        let attempts = match self.deps.codes.increment_attempts(code.id).await {
            Ok(Some(attempts)) => attempts,
            // Consumed or exhausted by a concurrent call; the guess is still wrong.
            Ok(None) => code.max_attempts,
            Err(e) => return repository_error(e),
        };
        let remaining = code.max_attempts.saturating_sub(attempts);

        tracing::info!(
            channel = %self.channel,
            code_id = %code.id,
            attempts,
            remaining,
            "Verification code mismatch"
        );

        self.audit(
            ctx,
            tenancy,
            None,
            self.channel.verify_failed_action(),
            json!({ "code_id": code.id, "remaining_attempts": remaining }),
        )
        .await;

        VouchError::InvalidCode
    }

    /// Resolve or create the user and open a session. The code is already
    /// consumed at this point, so every failure here is final for it.
    async fn issue_session(
        &self,
        ctx: &RequestContext,
        scope: SessionScope,
        identifier: &str,
        remember: bool,
    ) -> Result<SessionBundle> {
        let tenancy = TenancyContext::from(scope);
        let user = self.resolve_user(scope, identifier).await?;

        let created = self
            .deps
            .sessions
            .create(NewSession {
                scope,
                user_id: user.id,
                remember,
                ip_address: ctx.ip_address(),
                user_agent: ctx.user_agent().map(str::to_string),
            })
            .await
            .map_err(|e| {
                tracing::error!(
                    channel = %self.channel,
                    tenancy = %tenancy,
                    user_id = %user.id,
                    error = %e,
                    "Session creation failed after code was consumed"
                );
                VouchError::SessionCreationFailed(e.to_string())
            })?;

        self.audit(
            ctx,
            &tenancy,
            Some(user.id),
            self.channel.login_action(),
            json!({ "session_id": created.session.id, "remember": remember }),
        )
        .await;

        tracing::info!(
            channel = %self.channel,
            tenancy = %tenancy,
            user_id = %user.id,
            session_id = %created.session.id,
            "Session issued"
        );

        Ok(SessionBundle {
            user,
            session: created.session,
            token: created.token,
        })
    }

    async fn resolve_user(&self, scope: SessionScope, identifier: &str) -> Result<User> {
        if let Some(user) = self
            .deps
            .users
            .find_by_identifier(scope.app_id, identifier)
            .await
            .map_err(repository_error)?
        {
            return Ok(user);
        }

        if !self.config.allow_implicit_signup {
            return Err(VouchError::UserNotFound);
        }

        let credential = Zeroizing::new(random_token(
            self.deps.entropy.as_ref(),
            IMPLICIT_CREDENTIAL_BYTES,
        ));
        let user = self
            .deps
            .users
            .create_implicit(NewUser {
                app_id: scope.app_id,
                identifier: identifier.to_string(),
                display_name: display_name_for(identifier),
                credential_hash: hash_secret(&credential),
            })
            .await
            .map_err(|e| {
                tracing::error!(
                    channel = %self.channel,
                    app_id = %scope.app_id,
                    error = %e,
                    "Implicit signup failed"
                );
                VouchError::UserCreationFailed(e.to_string())
            })?;

        tracing::info!(
            channel = %self.channel,
            app_id = %scope.app_id,
            user_id = %user.id,
            "User created by implicit signup"
        );
        Ok(user)
    }

    fn normalize(&self, identifier: &str) -> Result<String> {
        let normalized = self.channel.normalize_identifier(identifier);
        if normalized.is_empty() {
            return Err(VouchError::MissingField { field: "identifier" });
        }
        Ok(normalized)
    }

    /// Audit failures are logged, never surfaced.
    async fn audit(
        &self,
        ctx: &RequestContext,
        tenancy: &TenancyContext,
        user_id: Option<UserId>,
        action: String,
        detail: serde_json::Value,
    ) {
        let entry = AuditEntry {
            user_id,
            tenancy: *tenancy,
            action,
            resource: self.channel.as_str().to_string(),
            ip_address: ctx.ip_address(),
            user_agent: ctx.user_agent().map(str::to_string),
            detail,
            created_at: self.deps.clock.now(),
        };
        let action = entry.action.clone();
        if let Err(e) = self.deps.audit.log(entry).await {
            tracing::warn!(action = %action, error = %e, "Failed to write audit entry");
        }
    }
}

fn repository_error(e: crate::repository::CollaboratorError) -> VouchError {
    tracing::error!(error = %e, "Verification code repository failure");
    VouchError::Repository(e.to_string())
}

/// Local part of an email address, or the identifier itself.
fn display_name_for(identifier: &str) -> String {
    match identifier.split_once('@') {
        Some((local, _)) if !local.is_empty() => local.to_string(),
        _ => identifier.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_for_email() {
        assert_eq!(display_name_for("alice@example.com"), "alice");
    }

    #[test]
    fn test_display_name_for_phone() {
        assert_eq!(display_name_for("+15550100"), "+15550100");
    }

    #[test]
    fn test_display_name_for_degenerate_email() {
        assert_eq!(display_name_for("@example.com"), "@example.com");
    }
}
