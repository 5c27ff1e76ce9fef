//! Append-only audit log boundary.
//!
//! Every durable action the dispatch engine takes (an automated reorder, a
//! renewal email) leaves a record here. Records are immutable once appended;
//! "what happened" is answered by querying, never by updating in place.

pub mod record;
pub mod store;

pub use record::{EventLogRecord, record_kind};
pub use store::{EventLogError, EventLogStore, InMemoryEventLog};
