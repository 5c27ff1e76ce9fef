use std::time::Duration;

use chrono_tz::Tz;

use pharmaflow_inventory::DEFAULT_EXPIRY_GRACE_DAYS;
use pharmaflow_notify::{NotificationJobStore, NotificationScheduler};

/// Engine configuration.
///
/// Defaults suit production pacing; tests drive `run_cycle` directly and
/// rarely need the intervals at all.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How often the threshold monitor runs.
    pub monitor_interval: Duration,
    /// How often the notification dispatch loop runs.
    pub dispatch_interval: Duration,
    /// Maximum due jobs loaded per dispatch cycle.
    pub dispatch_batch_size: usize,
    /// Lots expiring within this many days stop counting as sellable.
    pub expiry_grace_days: u64,
    /// Named zone used to interpret plan-local dates.
    pub local_zone: Tz,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            monitor_interval: Duration::from_secs(60),
            dispatch_interval: Duration::from_secs(30),
            dispatch_batch_size: 50,
            expiry_grace_days: DEFAULT_EXPIRY_GRACE_DAYS,
            local_zone: chrono_tz::Asia::Bahrain,
        }
    }
}

impl EngineConfig {
    pub fn with_monitor_interval(mut self, interval: Duration) -> Self {
        self.monitor_interval = interval;
        self
    }

    pub fn with_dispatch_interval(mut self, interval: Duration) -> Self {
        self.dispatch_interval = interval;
        self
    }

    pub fn with_dispatch_batch_size(mut self, size: usize) -> Self {
        self.dispatch_batch_size = size;
        self
    }

    pub fn with_expiry_grace_days(mut self, days: u64) -> Self {
        self.expiry_grace_days = days;
        self
    }

    pub fn with_local_zone(mut self, zone: Tz) -> Self {
        self.local_zone = zone;
        self
    }

    /// Scheduler interpreting plan dates in this config's zone.
    pub fn scheduler<J>(&self, jobs: J) -> NotificationScheduler<J>
    where
        J: NotificationJobStore,
    {
        NotificationScheduler::new(jobs, self.local_zone)
    }
}
