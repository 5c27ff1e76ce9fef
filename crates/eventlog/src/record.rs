use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pharmaflow_core::UserId;

/// Well-known record kinds written by the dispatch engine.
///
/// The log itself is generic; kinds are plain strings so unrelated parts of
/// the platform can write their own without touching this crate.
pub mod record_kind {
    /// An automated replenishment order was created.
    pub const REORDER_CREATED: &str = "reorder.created";
    /// A renewal notification email was delivered.
    pub const RENEWAL_SENT: &str = "renewal.sent";
}

/// One immutable audit record.
///
/// `body` is free text by convention JSON, produced by the writer; the log
/// supports substring containment queries over it but imposes no schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLogRecord {
    pub id: Uuid,
    /// Acting user, when one is attributable.
    pub user_id: Option<UserId>,
    /// Record kind tag, e.g. [`record_kind::REORDER_CREATED`].
    pub kind: String,
    pub recorded_at: DateTime<Utc>,
    pub body: String,
}

impl EventLogRecord {
    pub fn new(
        user_id: Option<UserId>,
        kind: impl Into<String>,
        recorded_at: DateTime<Utc>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            kind: kind.into(),
            recorded_at,
            body: body.into(),
        }
    }
}
