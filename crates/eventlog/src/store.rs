use std::sync::{Arc, RwLock};

use thiserror::Error;

use pharmaflow_core::DomainError;

use super::record::EventLogRecord;

/// Event log operation error. An append that fails leaves no partial state
/// behind.
#[derive(Debug, Error)]
pub enum EventLogError {
    /// The record itself was rejected before touching storage.
    #[error("append rejected: {0}")]
    InvalidAppend(#[from] DomainError),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Append-only audit log store.
///
/// Implementations must:
/// - never modify or delete a record once appended
/// - preserve append order when listing
pub trait EventLogStore: Send + Sync {
    /// Append one record (append-only).
    fn append(&self, record: EventLogRecord) -> Result<(), EventLogError>;

    /// List records of one kind, oldest-first, optionally filtered by body
    /// substring containment, up to `limit`.
    fn list(
        &self,
        kind: &str,
        contains: Option<&str>,
        limit: usize,
    ) -> Result<Vec<EventLogRecord>, EventLogError>;
}

impl<S> EventLogStore for Arc<S>
where
    S: EventLogStore + ?Sized,
{
    fn append(&self, record: EventLogRecord) -> Result<(), EventLogError> {
        (**self).append(record)
    }

    fn list(
        &self,
        kind: &str,
        contains: Option<&str>,
        limit: usize,
    ) -> Result<Vec<EventLogRecord>, EventLogError> {
        (**self).list(kind, contains, limit)
    }
}

/// In-memory append-only log.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryEventLog {
    records: RwLock<Vec<EventLogRecord>>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Total record count (all kinds).
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventLogStore for InMemoryEventLog {
    fn append(&self, record: EventLogRecord) -> Result<(), EventLogError> {
        if record.kind.trim().is_empty() {
            return Err(DomainError::validation("record kind cannot be empty").into());
        }

        let mut records = self
            .records
            .write()
            .map_err(|_| EventLogError::Storage("lock poisoned".to_string()))?;

        records.push(record);
        Ok(())
    }

    fn list(
        &self,
        kind: &str,
        contains: Option<&str>,
        limit: usize,
    ) -> Result<Vec<EventLogRecord>, EventLogError> {
        let records = self
            .records
            .read()
            .map_err(|_| EventLogError::Storage("lock poisoned".to_string()))?;

        Ok(records
            .iter()
            .filter(|r| r.kind == kind)
            .filter(|r| contains.map_or(true, |needle| r.body.contains(needle)))
            .take(limit)
            .cloned()
            .collect())
    }
}
