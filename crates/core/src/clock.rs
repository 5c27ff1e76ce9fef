//! Injectable time source.
//!
//! The background pollers compare persisted instants against "now" in every
//! cycle. Owning the clock behind a trait keeps `run_cycle` deterministic in
//! tests, with no real sleeps.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, Utc};

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;

    /// Current UTC calendar date.
    fn today_utc(&self) -> NaiveDate {
        self.now_utc().date_naive()
    }
}

impl<C> Clock for Arc<C>
where
    C: Clock + ?Sized,
{
    fn now_utc(&self) -> DateTime<Utc> {
        (**self).now_utc()
    }
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-advanced clock for tests/dev.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn arc(start: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self::new(start))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += by;
        }
    }
}

impl Clock for ManualClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.now.lock().map(|g| *g).unwrap_or_else(|p| *p.into_inner())
    }
}
