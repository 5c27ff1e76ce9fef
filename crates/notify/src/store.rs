use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use thiserror::Error;

use pharmaflow_core::PlanId;

use super::job::ScheduledNotification;

/// Notification job store error.
#[derive(Debug, Clone, Error)]
pub enum JobStoreError {
    #[error("job not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Outcome of an idempotent insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A job with the same dedup key already exists; nothing was written.
    Duplicate,
}

/// Notification job persistence boundary.
///
/// `dedup_key` is the unique index: `insert_if_absent` enforces at most one
/// row per key, and `mark_sent` flips `sent_at` exactly once. Jobs are never
/// deleted.
pub trait NotificationJobStore: Send + Sync {
    /// Insert unless a job with the same dedup key exists.
    fn insert_if_absent(
        &self,
        job: ScheduledNotification,
    ) -> Result<InsertOutcome, JobStoreError>;

    /// Unsent jobs with `send_on_utc <= now`, oldest send instant first,
    /// up to `limit`.
    fn due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ScheduledNotification>, JobStoreError>;

    /// Record delivery for a dedup key. Errors if the key is unknown;
    /// a second call for an already-sent key is a no-op.
    fn mark_sent(&self, dedup_key: &str, at: DateTime<Utc>) -> Result<(), JobStoreError>;

    fn get(&self, dedup_key: &str) -> Result<Option<ScheduledNotification>, JobStoreError>;

    /// All jobs for one plan, in offset order.
    fn for_plan(&self, plan_id: PlanId) -> Result<Vec<ScheduledNotification>, JobStoreError>;
}

impl<S> NotificationJobStore for Arc<S>
where
    S: NotificationJobStore + ?Sized,
{
    fn insert_if_absent(
        &self,
        job: ScheduledNotification,
    ) -> Result<InsertOutcome, JobStoreError> {
        (**self).insert_if_absent(job)
    }

    fn due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ScheduledNotification>, JobStoreError> {
        (**self).due(now, limit)
    }

    fn mark_sent(&self, dedup_key: &str, at: DateTime<Utc>) -> Result<(), JobStoreError> {
        (**self).mark_sent(dedup_key, at)
    }

    fn get(&self, dedup_key: &str) -> Result<Option<ScheduledNotification>, JobStoreError> {
        (**self).get(dedup_key)
    }

    fn for_plan(&self, plan_id: PlanId) -> Result<Vec<ScheduledNotification>, JobStoreError> {
        (**self).for_plan(plan_id)
    }
}

/// In-memory notification job store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryNotificationJobs {
    jobs: RwLock<Vec<ScheduledNotification>>,
}

impl InMemoryNotificationJobs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn poisoned() -> JobStoreError {
        JobStoreError::Storage("lock poisoned".to_string())
    }
}

impl NotificationJobStore for InMemoryNotificationJobs {
    fn insert_if_absent(
        &self,
        job: ScheduledNotification,
    ) -> Result<InsertOutcome, JobStoreError> {
        // Single write lock spans the uniqueness check and the insert.
        let mut jobs = self.jobs.write().map_err(|_| Self::poisoned())?;

        if jobs.iter().any(|j| j.dedup_key == job.dedup_key) {
            return Ok(InsertOutcome::Duplicate);
        }
        jobs.push(job);
        Ok(InsertOutcome::Inserted)
    }

    fn due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ScheduledNotification>, JobStoreError> {
        let jobs = self.jobs.read().map_err(|_| Self::poisoned())?;

        let mut due: Vec<_> = jobs
            .iter()
            .filter(|j| j.is_dispatchable(now))
            .cloned()
            .collect();

        due.sort_by(|a, b| {
            a.send_on_utc
                .cmp(&b.send_on_utc)
                .then_with(|| a.dedup_key.cmp(&b.dedup_key))
        });
        due.truncate(limit);
        Ok(due)
    }

    fn mark_sent(&self, dedup_key: &str, at: DateTime<Utc>) -> Result<(), JobStoreError> {
        let mut jobs = self.jobs.write().map_err(|_| Self::poisoned())?;

        let job = jobs
            .iter_mut()
            .find(|j| j.dedup_key == dedup_key)
            .ok_or_else(|| JobStoreError::NotFound(dedup_key.to_string()))?;

        if job.sent_at.is_none() {
            job.sent_at = Some(at);
        }
        Ok(())
    }

    fn get(&self, dedup_key: &str) -> Result<Option<ScheduledNotification>, JobStoreError> {
        let jobs = self.jobs.read().map_err(|_| Self::poisoned())?;
        Ok(jobs.iter().find(|j| j.dedup_key == dedup_key).cloned())
    }

    fn for_plan(&self, plan_id: PlanId) -> Result<Vec<ScheduledNotification>, JobStoreError> {
        let jobs = self.jobs.read().map_err(|_| Self::poisoned())?;

        let mut result: Vec<_> = jobs
            .iter()
            .filter(|j| j.plan_id == plan_id)
            .cloned()
            .collect();
        result.sort_by_key(|j| j.offset_days);
        Ok(result)
    }
}
