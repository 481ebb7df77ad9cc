//! In-memory session log.
//!
//! Keeps the folded snapshot behind a shared handle so the owner of the
//! session and an observer (typically a test) can both see it.

use super::log::{LogSnapshot, PersistedLogRecord, SessionLog};
use crate::error::{ParleyError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MemoryLogInner {
    snapshot: Option<LogSnapshot>,
    revisions: usize,
    failing: bool,
    /// Remaining `update` calls allowed to succeed, when limited
    update_budget: Option<usize>,
}

/// Volatile [`SessionLog`]; clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionLog {
    inner: Arc<Mutex<MemoryLogInner>>,
}

impl MemorySessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail with `Persistence` until reset.
    pub fn set_failing(&self, failing: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.failing = failing;
        }
    }

    /// Lets only `limit` further `update` calls succeed; `None` lifts the limit.
    pub fn limit_updates(&self, limit: Option<usize>) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.update_budget = limit;
        }
    }

    /// Returns the current folded view, if the log was initialized.
    pub fn snapshot(&self) -> Option<LogSnapshot> {
        self.inner.lock().ok().and_then(|inner| inner.snapshot.clone())
    }

    /// Number of `update` calls recorded so far.
    pub fn revision_count(&self) -> usize {
        self.inner.lock().map(|inner| inner.revisions).unwrap_or(0)
    }

    fn guard(&self, operation: &str) -> Result<MutexGuard<'_, MemoryLogInner>> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| ParleyError::internal("memory log lock poisoned"))?;
        if inner.failing {
            return Err(ParleyError::persistence(operation, "memory", "write rejected"));
        }
        Ok(inner)
    }
}

fn opened<'a>(inner: &'a mut MemoryLogInner, operation: &str) -> Result<&'a mut LogSnapshot> {
    inner
        .snapshot
        .as_mut()
        .ok_or_else(|| ParleyError::persistence(operation, "memory", "log not initialized"))
}

#[async_trait]
impl SessionLog for MemorySessionLog {
    async fn initialize(&mut self, session_id: &str, start_time: DateTime<Utc>) -> Result<()> {
        let mut inner = self.guard("initializing log")?;
        if inner.snapshot.is_some() {
            return Err(ParleyError::persistence(
                "initializing log",
                "memory",
                "log already initialized",
            ));
        }
        inner.snapshot = Some(LogSnapshot {
            session_id: session_id.to_string(),
            start_time,
            end_time: None,
            messages: Vec::new(),
        });
        Ok(())
    }

    async fn append(&mut self, record: &PersistedLogRecord) -> Result<()> {
        let mut inner = self.guard("appending message")?;
        let snapshot = opened(&mut inner, "appending message")?;
        if record.message_number != snapshot.messages.len() {
            return Err(ParleyError::persistence(
                "appending message",
                "memory",
                format!(
                    "expected message number {}, got {}",
                    snapshot.messages.len(),
                    record.message_number
                ),
            ));
        }
        snapshot.messages.push(record.clone());
        Ok(())
    }

    async fn update(&mut self, index: usize, record: &PersistedLogRecord) -> Result<()> {
        let mut inner = self.guard("revising message")?;
        let budget = inner.update_budget;
        match budget {
            Some(0) => {
                return Err(ParleyError::persistence(
                    "revising message",
                    "memory",
                    "write rejected",
                ));
            }
            Some(remaining) => inner.update_budget = Some(remaining - 1),
            None => {}
        }
        let snapshot = opened(&mut inner, "revising message")?;
        let slot = snapshot
            .messages
            .get_mut(index)
            .filter(|existing| existing.message_id == record.message_id)
            .ok_or_else(|| {
                ParleyError::persistence(
                    "revising message",
                    "memory",
                    format!("no message {} with id {}", index, record.message_id),
                )
            })?;
        *slot = record.clone();
        inner.revisions += 1;
        Ok(())
    }

    async fn close(&mut self, end_time: DateTime<Utc>) -> Result<()> {
        let mut inner = self.guard("closing log")?;
        opened(&mut inner, "closing log")?.end_time = Some(end_time);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
