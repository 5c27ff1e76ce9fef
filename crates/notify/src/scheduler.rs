use chrono::{Days, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;
use tracing::debug;

use pharmaflow_core::{PlanId, UserId};

use super::job::{NotificationStage, ScheduledNotification};
use super::store::{InsertOutcome, JobStoreError, NotificationJobStore};

/// The three jobs derived for a plan's monthly cycle, as (offset days, stage):
/// "ready tomorrow", an advance reminder near the end of the month, and
/// "ready again" when the next cycle opens.
pub const RENEWAL_OFFSETS: [(u64, NotificationStage); 3] = [
    (1, NotificationStage::DueSoon),
    (27, NotificationStage::Reminder),
    (30, NotificationStage::DueSoon),
];

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error(transparent)]
    Jobs(#[from] JobStoreError),

    /// Local midnight did not exist in the configured zone (DST gap) or the
    /// offset date overflowed the calendar.
    #[error("unrepresentable local send date: {0}")]
    LocalTime(String),
}

/// Derives and persists a plan's notification jobs.
///
/// Scheduling is idempotent: send instants and dedup keys are pure functions
/// of (plan, offset), and the store's unique dedup key turns repeat calls for
/// the same plan into no-ops.
pub struct NotificationScheduler<J> {
    jobs: J,
    zone: Tz,
}

impl<J> NotificationScheduler<J>
where
    J: NotificationJobStore,
{
    pub fn new(jobs: J, zone: Tz) -> Self {
        Self { jobs, zone }
    }

    /// Schedule the monthly cycle for a plan created on `creation_date_local`
    /// (the calendar date in the configured zone).
    ///
    /// Returns the number of jobs actually inserted (0 on a repeat call).
    pub fn schedule_for_plan(
        &self,
        plan_id: PlanId,
        user_id: UserId,
        creation_date_local: NaiveDate,
    ) -> Result<usize, ScheduleError> {
        let mut inserted = 0;

        for (offset_days, stage) in RENEWAL_OFFSETS {
            let send_on_utc = self.local_midnight_utc(creation_date_local, offset_days)?;
            let job =
                ScheduledNotification::new(plan_id, user_id, stage, offset_days, send_on_utc);

            match self.jobs.insert_if_absent(job)? {
                InsertOutcome::Inserted => inserted += 1,
                InsertOutcome::Duplicate => {
                    debug!(plan = %plan_id, stage = %stage, offset_days, "job already scheduled");
                }
            }
        }

        Ok(inserted)
    }

    /// Local midnight of `creation + offset_days` in the configured zone,
    /// converted to UTC.
    fn local_midnight_utc(
        &self,
        creation_date_local: NaiveDate,
        offset_days: u64,
    ) -> Result<chrono::DateTime<Utc>, ScheduleError> {
        let send_date = creation_date_local
            .checked_add_days(Days::new(offset_days))
            .ok_or_else(|| {
                ScheduleError::LocalTime(format!("{creation_date_local} + {offset_days} days"))
            })?;

        let midnight = send_date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| ScheduleError::LocalTime(send_date.to_string()))?;

        // `earliest` resolves DST ambiguity; a gap at midnight yields None.
        self.zone
            .from_local_datetime(&midnight)
            .earliest()
            .map(|local| local.with_timezone(&Utc))
            .ok_or_else(|| {
                ScheduleError::LocalTime(format!("{midnight} does not exist in {}", self.zone))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryNotificationJobs;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn scheduler(jobs: Arc<InMemoryNotificationJobs>) -> NotificationScheduler<Arc<InMemoryNotificationJobs>> {
        NotificationScheduler::new(jobs, chrono_tz::Asia::Bahrain)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn derives_the_three_monthly_jobs() {
        let jobs = InMemoryNotificationJobs::arc();
        let sched = scheduler(jobs.clone());

        let inserted = sched
            .schedule_for_plan(PlanId::new(1), UserId::new(2), date(2024, 1, 1))
            .unwrap();
        assert_eq!(inserted, 3);

        let stored = jobs.for_plan(PlanId::new(1)).unwrap();
        assert_eq!(stored.len(), 3);

        // Bahrain is UTC+3 year-round: local midnight is 21:00 UTC the day before.
        assert_eq!(stored[0].stage, NotificationStage::DueSoon);
        assert_eq!(
            stored[0].send_on_utc,
            Utc.with_ymd_and_hms(2024, 1, 1, 21, 0, 0).unwrap()
        );
        assert_eq!(stored[1].stage, NotificationStage::Reminder);
        assert_eq!(
            stored[1].send_on_utc,
            Utc.with_ymd_and_hms(2024, 1, 27, 21, 0, 0).unwrap()
        );
        assert_eq!(stored[2].stage, NotificationStage::DueSoon);
        assert_eq!(
            stored[2].send_on_utc,
            Utc.with_ymd_and_hms(2024, 1, 30, 21, 0, 0).unwrap()
        );
    }

    #[test]
    fn repeat_scheduling_is_idempotent() {
        let jobs = InMemoryNotificationJobs::arc();
        let sched = scheduler(jobs.clone());

        sched
            .schedule_for_plan(PlanId::new(1), UserId::new(2), date(2024, 1, 1))
            .unwrap();
        let second = sched
            .schedule_for_plan(PlanId::new(1), UserId::new(2), date(2024, 1, 1))
            .unwrap();

        assert_eq!(second, 0);
        assert_eq!(jobs.for_plan(PlanId::new(1)).unwrap().len(), 3);
    }

    #[test]
    fn distinct_plans_do_not_collide() {
        let jobs = InMemoryNotificationJobs::arc();
        let sched = scheduler(jobs.clone());

        sched
            .schedule_for_plan(PlanId::new(1), UserId::new(2), date(2024, 1, 1))
            .unwrap();
        sched
            .schedule_for_plan(PlanId::new(2), UserId::new(2), date(2024, 1, 1))
            .unwrap();

        assert_eq!(jobs.for_plan(PlanId::new(1)).unwrap().len(), 3);
        assert_eq!(jobs.for_plan(PlanId::new(2)).unwrap().len(), 3);
    }
}
