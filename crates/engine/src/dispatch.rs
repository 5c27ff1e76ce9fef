use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use pharmaflow_core::Clock;
use pharmaflow_eventlog::{EventLogRecord, EventLogStore, record_kind};
use pharmaflow_inventory::InventorySource;
use pharmaflow_notify::{
    BranchDirectory, EmailGateway, NotificationJobStore, PlanDirectory, ScheduledNotification,
    UserDirectory, build_renewal_email,
};

use super::worker::{WorkerHandle, spawn_polling_worker};

/// What one dispatch cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchCycleReport {
    /// Due jobs loaded this cycle.
    pub due: usize,
    pub sent: usize,
    /// `can_send = false`: left pending for a future cycle.
    pub ineligible: usize,
    /// Unresolvable plan or recipient; skipped this cycle.
    pub anomalies: usize,
    /// Gateway or store failures; the job stays unsent.
    pub failures: usize,
}

/// Delivers due renewal notifications.
///
/// Eligibility is re-validated against current business state at send time;
/// the schedule only decides *when* a job becomes a candidate.
///
/// Known limitations, kept deliberately:
/// - Delivery is at-least-once: the email goes out before the sent mark is
///   recorded, so a crash between the two redelivers on the next cycle.
/// - Jobs for deleted plans are never cancelled; they fail plan resolution
///   and are skipped every cycle.
pub struct DispatchLoop<J, P, B, I, U, G, L> {
    jobs: J,
    plans: P,
    branches: B,
    inventory: I,
    users: U,
    gateway: G,
    audit: L,
    clock: Arc<dyn Clock>,
    batch_size: usize,
    grace_days: u64,
}

impl<J, P, B, I, U, G, L> DispatchLoop<J, P, B, I, U, G, L>
where
    J: NotificationJobStore,
    P: PlanDirectory,
    B: BranchDirectory,
    I: InventorySource,
    U: UserDirectory,
    G: EmailGateway,
    L: EventLogStore,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        jobs: J,
        plans: P,
        branches: B,
        inventory: I,
        users: U,
        gateway: G,
        audit: L,
        clock: Arc<dyn Clock>,
        batch_size: usize,
        grace_days: u64,
    ) -> Self {
        Self {
            jobs,
            plans,
            branches,
            inventory,
            users,
            gateway,
            audit,
            clock,
            batch_size,
            grace_days,
        }
    }

    /// Run one pass over the due batch. Pure of sleeping; the interval loop
    /// lives in [`DispatchLoop::spawn`].
    pub fn run_cycle(&self) -> DispatchCycleReport {
        let now = self.clock.now_utc();
        let mut report = DispatchCycleReport::default();

        let due = match self.jobs.due(now, self.batch_size) {
            Ok(due) => due,
            Err(e) => {
                warn!(error = %e, "failed to load due notification jobs");
                report.failures += 1;
                return report;
            }
        };
        report.due = due.len();

        for job in due {
            self.process_job(&job, &mut report);
        }

        report
    }

    /// One job, with every failure contained to it.
    fn process_job(&self, job: &ScheduledNotification, report: &mut DispatchCycleReport) {
        let now = self.clock.now_utc();

        let Some(plan) = self.plans.plan(job.plan_id) else {
            // Possibly a deleted plan; its jobs linger and are re-skipped.
            warn!(key = %job.dedup_key, plan = %job.plan_id, "plan not found; skipping job");
            report.anomalies += 1;
            return;
        };

        let Some(to) = self.users.email(job.user_id) else {
            warn!(key = %job.dedup_key, user = %job.user_id, "recipient has no email; skipping job");
            report.anomalies += 1;
            return;
        };

        let email = build_renewal_email(
            &plan,
            job.stage,
            &to,
            &self.branches,
            &self.inventory,
            now.date_naive(),
            self.grace_days,
        );

        if !email.can_send {
            debug!(key = %job.dedup_key, "job ineligible this cycle; left pending");
            report.ineligible += 1;
            return;
        }

        if let Err(e) = self.gateway.send(&email.message) {
            warn!(key = %job.dedup_key, error = %e, "send failed; job stays unsent");
            report.failures += 1;
            return;
        }

        if let Err(e) = self.jobs.mark_sent(&job.dedup_key, now) {
            // The email is already out; next cycle may redeliver.
            warn!(key = %job.dedup_key, error = %e, "sent mark failed after delivery");
            report.failures += 1;
            return;
        }

        report.sent += 1;
        self.append_send_audit(job, &to, now);
    }

    /// Audit append is best-effort: the sent mark already stands.
    fn append_send_audit(&self, job: &ScheduledNotification, to: &str, now: chrono::DateTime<chrono::Utc>) {
        let body = serde_json::json!({
            "dedup_key": job.dedup_key,
            "plan_id": job.plan_id,
            "stage": job.stage,
            "offset_days": job.offset_days,
            "recipient": to,
        });

        let record = EventLogRecord::new(
            Some(job.user_id),
            record_kind::RENEWAL_SENT,
            now,
            body.to_string(),
        );

        if let Err(e) = self.audit.append(record) {
            warn!(key = %job.dedup_key, error = %e, "send audit append failed");
        }
    }

    /// Spawn the fixed-interval polling loop.
    pub fn spawn(self, interval: Duration) -> WorkerHandle
    where
        J: Send + Sync + 'static,
        P: Send + Sync + 'static,
        B: Send + Sync + 'static,
        I: Send + Sync + 'static,
        U: Send + Sync + 'static,
        G: Send + Sync + 'static,
        L: Send + Sync + 'static,
    {
        spawn_polling_worker("notification-dispatch", interval, move || {
            let report = self.run_cycle();
            debug!(
                due = report.due,
                sent = report.sent,
                ineligible = report.ineligible,
                anomalies = report.anomalies,
                failures = report.failures,
                "dispatch cycle finished"
            );
        })
    }
}
