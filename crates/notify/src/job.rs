use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pharmaflow_core::{PlanId, UserId};

/// A notification's role in the plan's monthly cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStage {
    /// The renewal is ready now or next.
    DueSoon,
    /// Advance notice before the next renewal.
    Reminder,
}

impl NotificationStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStage::DueSoon => "due_soon",
            NotificationStage::Reminder => "reminder",
        }
    }
}

impl core::fmt::Display for NotificationStage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deterministic identifier for one schedulable unit of work.
///
/// Two scheduling passes over the same plan derive the same keys, which is
/// what makes scheduling and delivery idempotent.
pub fn dedup_key(plan_id: PlanId, stage: NotificationStage, offset_days: u64) -> String {
    format!("renewal:{plan_id}:{stage}:{offset_days}")
}

/// One persisted notification job.
///
/// `dedup_key` is unique in the store; `sent_at` flips exactly once. A job is
/// dispatchable iff `send_on_utc <= now` and `sent_at` is `None`. There is no
/// cancelled state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledNotification {
    pub plan_id: PlanId,
    pub user_id: UserId,
    pub stage: NotificationStage,
    /// Days after plan creation this job fires.
    pub offset_days: u64,
    pub send_on_utc: DateTime<Utc>,
    pub dedup_key: String,
    pub sent_at: Option<DateTime<Utc>>,
}

impl ScheduledNotification {
    pub fn new(
        plan_id: PlanId,
        user_id: UserId,
        stage: NotificationStage,
        offset_days: u64,
        send_on_utc: DateTime<Utc>,
    ) -> Self {
        Self {
            plan_id,
            user_id,
            stage,
            offset_days,
            send_on_utc,
            dedup_key: dedup_key(plan_id, stage, offset_days),
            sent_at: None,
        }
    }

    pub fn is_sent(&self) -> bool {
        self.sent_at.is_some()
    }

    /// Due and not yet sent.
    pub fn is_dispatchable(&self, now: DateTime<Utc>) -> bool {
        self.sent_at.is_none() && self.send_on_utc <= now
    }
}
