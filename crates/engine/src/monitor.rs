use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use pharmaflow_core::Clock;
use pharmaflow_eventlog::EventLogStore;
use pharmaflow_inventory::{InventorySource, ReorderRuleSource};
use pharmaflow_notify::{EmailGateway, UserDirectory};
use pharmaflow_purchasing::SupplierOrderStore;

use super::reorder::{DispatchOutcome, ReorderDispatcher};
use super::worker::{WorkerHandle, spawn_polling_worker};

/// What one monitor cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorCycleReport {
    pub rules_seen: usize,
    /// Rules with a placeholder product or branch.
    pub skipped_invalid: usize,
    /// Rules at or below threshold.
    pub breaches: usize,
    pub orders_created: usize,
    pub already_pending: usize,
    pub failures: usize,
}

/// Polls reorder rules against sellable inventory.
///
/// The comparison is inclusive: stock exactly at the threshold triggers a
/// reorder, one unit above does not. One rule's failure is isolated; the
/// cycle continues with the remaining rules.
pub struct ThresholdMonitor<R, I, O, L, G, U> {
    rules: R,
    inventory: I,
    dispatcher: ReorderDispatcher<O, L, G, U>,
    clock: Arc<dyn Clock>,
    grace_days: u64,
}

impl<R, I, O, L, G, U> ThresholdMonitor<R, I, O, L, G, U>
where
    R: ReorderRuleSource,
    I: InventorySource,
    O: SupplierOrderStore,
    L: EventLogStore,
    G: EmailGateway,
    U: UserDirectory,
{
    pub fn new(
        rules: R,
        inventory: I,
        dispatcher: ReorderDispatcher<O, L, G, U>,
        clock: Arc<dyn Clock>,
        grace_days: u64,
    ) -> Self {
        Self {
            rules,
            inventory,
            dispatcher,
            clock,
            grace_days,
        }
    }

    /// Run one pass over all rules. Pure of sleeping; the interval loop
    /// lives in [`ThresholdMonitor::spawn`].
    pub fn run_cycle(&self) -> MonitorCycleReport {
        let today = self.clock.today_utc();
        let mut report = MonitorCycleReport::default();

        for rule in self.rules.rules() {
            report.rules_seen += 1;

            if !rule.has_valid_target() {
                debug!(
                    product = %rule.product_id,
                    branch = %rule.branch_id,
                    "skipping rule with unassigned target"
                );
                report.skipped_invalid += 1;
                continue;
            }

            let sellable =
                self.inventory
                    .sellable(rule.product_id, rule.branch_id, today, self.grace_days);

            if sellable > rule.threshold_quantity {
                continue;
            }
            report.breaches += 1;

            match self
                .dispatcher
                .dispatch(&rule, sellable, self.clock.now_utc())
            {
                Ok(DispatchOutcome::Created(_)) => report.orders_created += 1,
                Ok(DispatchOutcome::AlreadyPending) => report.already_pending += 1,
                Err(e) => {
                    warn!(
                        product = %rule.product_id,
                        branch = %rule.branch_id,
                        error = %e,
                        "reorder dispatch failed; continuing with remaining rules"
                    );
                    report.failures += 1;
                }
            }
        }

        report
    }

    /// Spawn the fixed-interval polling loop.
    pub fn spawn(self, interval: Duration) -> WorkerHandle
    where
        R: Send + Sync + 'static,
        I: Send + Sync + 'static,
        O: Send + Sync + 'static,
        L: Send + Sync + 'static,
        G: Send + Sync + 'static,
        U: Send + Sync + 'static,
    {
        spawn_polling_worker("threshold-monitor", interval, move || {
            let report = self.run_cycle();
            debug!(
                rules = report.rules_seen,
                breaches = report.breaches,
                created = report.orders_created,
                failures = report.failures,
                "monitor cycle finished"
            );
        })
    }
}
