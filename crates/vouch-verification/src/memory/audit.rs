use crate::model::AuditEntry;
use crate::repository::{AuditSink, CollaboratorError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use vouch_core::UserId;

/// Entries kept by [`InMemoryAuditSink::new`].
pub const DEFAULT_AUDIT_CAPACITY: usize = 10_000;

/// Audit log kept in memory as a ring buffer.
///
/// Once `capacity` entries are held, each new entry evicts the oldest.
#[derive(Debug)]
pub struct InMemoryAuditSink {
    entries: Mutex<VecDeque<AuditEntry>>,
    capacity: usize,
    evicted: AtomicU64,
    failing: AtomicBool,
}

impl InMemoryAuditSink {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_AUDIT_CAPACITY)
    }

    /// A sink holding at most `capacity` entries (at least one).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
            evicted: AtomicU64::new(0),
            failing: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries dropped to make room since the sink was created.
    #[must_use]
    pub fn evicted(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }

    /// Make every subsequent `log` call fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    #[must_use]
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    /// Actions in the order they were logged.
    #[must_use]
    pub fn actions(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .map(|e| e.action.clone())
            .collect()
    }

    #[must_use]
    pub fn by_action(&self, action: &str) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.action == action)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn for_user(&self, user_id: UserId) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.user_id == Some(user_id))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn log(&self, entry: AuditEntry) -> Result<(), CollaboratorError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Unavailable("audit log offline".to_string()));
        }
        tracing::debug!(action = %entry.action, tenancy = %entry.tenancy, "Audit entry recorded");
        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
            self.evicted.fetch_add(1, Ordering::Relaxed);
        }
        entries.push_back(entry);
        Ok(())
    }
}

impl Default for InMemoryAuditSink {
    fn default() -> Self {
        Self::new()
    }
}
