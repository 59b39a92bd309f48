use crate::channel::ChannelKind;
use crate::model::{ConsumeOutcome, NewVerificationCode, VerificationCode};
use crate::repository::{CollaboratorError, VerificationCodeRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use vouch_core::{TenancyContext, VerificationCodeId};

/// Code repository backed by a `HashMap`.
///
/// Every operation runs under one lock, which gives `increment_attempts` and
/// `consume` their compare-and-set semantics and makes `create` retire the
/// previous code in the same step that stores the new one.
#[derive(Debug, Default)]
pub struct InMemoryCodeRepository {
    codes: Mutex<HashMap<VerificationCodeId, VerificationCode>>,
}

impl InMemoryCodeRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a record, for assertions and diagnostics.
    #[must_use]
    pub fn get(&self, id: VerificationCodeId) -> Option<VerificationCode> {
        self.codes.lock().get(&id).cloned()
    }

    /// Every record stored for an identifier, newest first. Among records
    /// issued at the same instant the active one comes first.
    #[must_use]
    pub fn all_for(&self, identifier: &str) -> Vec<VerificationCode> {
        let mut records: Vec<_> = self
            .codes
            .lock()
            .values()
            .filter(|c| c.identifier == identifier)
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.is_consumed().cmp(&b.is_consumed()))
        });
        records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop consumed and expired records.
    pub fn purge(&self, now: DateTime<Utc>) -> usize {
        let mut codes = self.codes.lock();
        let before = codes.len();
        codes.retain(|_, c| c.is_active(now));
        before - codes.len()
    }
}

fn same_slot(
    code: &VerificationCode,
    tenancy: &TenancyContext,
    channel: ChannelKind,
    identifier: &str,
) -> bool {
    code.channel == channel && code.identifier == identifier && code.matches_scope(tenancy)
}

fn retire_slot(
    codes: &mut HashMap<VerificationCodeId, VerificationCode>,
    tenancy: &TenancyContext,
    channel: ChannelKind,
    identifier: &str,
    now: DateTime<Utc>,
) -> u64 {
    let mut retired = 0;
    for code in codes.values_mut() {
        if same_slot(code, tenancy, channel, identifier) && code.is_active(now) {
            code.consumed_at = Some(now);
            retired += 1;
        }
    }
    retired
}

#[async_trait]
impl VerificationCodeRepository for InMemoryCodeRepository {
    async fn create(
        &self,
        code: NewVerificationCode,
    ) -> Result<VerificationCode, CollaboratorError> {
        let record = VerificationCode {
            id: VerificationCodeId::new(),
            tenancy: code.tenancy,
            channel: code.channel,
            identifier: code.identifier,
            secret_hash: code.secret_hash,
            attempts: 0,
            max_attempts: code.max_attempts,
            expires_at: code.expires_at,
            consumed_at: None,
            created_at: code.issued_at,
        };

        let mut codes = self.codes.lock();
        let retired = retire_slot(
            &mut codes,
            &record.tenancy,
            record.channel,
            &record.identifier,
            record.created_at,
        );
        if retired > 0 {
            tracing::debug!(channel = %record.channel, retired, "Retired previous codes");
        }
        codes.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_active_by_identifier(
        &self,
        tenancy: &TenancyContext,
        channel: ChannelKind,
        identifier: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<VerificationCode>, CollaboratorError> {
        let codes = self.codes.lock();
        Ok(codes
            .values()
            .filter(|c| same_slot(c, tenancy, channel, identifier) && c.is_active(now))
            .max_by_key(|c| c.created_at)
            .cloned())
    }

    async fn increment_attempts(
        &self,
        id: VerificationCodeId,
    ) -> Result<Option<u32>, CollaboratorError> {
        let mut codes = self.codes.lock();
        let Some(code) = codes.get_mut(&id) else {
            return Ok(None);
        };
        if code.is_consumed() || code.attempts_exhausted() {
            return Ok(None);
        }
        code.attempts += 1;
        Ok(Some(code.attempts))
    }

    async fn consume(
        &self,
        id: VerificationCodeId,
        now: DateTime<Utc>,
    ) -> Result<ConsumeOutcome, CollaboratorError> {
        let mut codes = self.codes.lock();
        let Some(code) = codes.get_mut(&id) else {
            return Ok(ConsumeOutcome::Gone);
        };
        if !code.is_active(now) {
            return Ok(ConsumeOutcome::Gone);
        }
        if code.attempts_exhausted() {
            return Ok(ConsumeOutcome::Exhausted);
        }
        code.consumed_at = Some(now);
        Ok(ConsumeOutcome::Consumed)
    }

    async fn invalidate_active(
        &self,
        tenancy: &TenancyContext,
        channel: ChannelKind,
        identifier: &str,
        now: DateTime<Utc>,
    ) -> Result<u64, CollaboratorError> {
        let mut codes = self.codes.lock();
        Ok(retire_slot(&mut codes, tenancy, channel, identifier, now))
    }
}
