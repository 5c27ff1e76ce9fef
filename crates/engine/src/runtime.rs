//! Composition root: spawns both pollers from one config.

use pharmaflow_eventlog::EventLogStore;
use pharmaflow_inventory::{InventorySource, ReorderRuleSource};
use pharmaflow_notify::{
    BranchDirectory, EmailGateway, NotificationJobStore, PlanDirectory, UserDirectory,
};
use pharmaflow_purchasing::SupplierOrderStore;

use super::config::EngineConfig;
use super::dispatch::DispatchLoop;
use super::monitor::ThresholdMonitor;
use super::worker::WorkerHandle;

/// Both running pollers, as one unit.
///
/// Dropping the handle without calling [`Engine::shutdown`] also stops the
/// workers (the shutdown channels disconnect), but without joining them.
pub struct Engine {
    monitor: WorkerHandle,
    dispatch: WorkerHandle,
}

impl Engine {
    /// Spawn the threshold monitor and the notification dispatch loop at the
    /// intervals in `config`.
    ///
    /// Batch size, grace window and zone are consumed earlier, when the
    /// pollers and the scheduler are constructed.
    pub fn start<R, I, O, L, G, U, J, P, B, I2, U2, G2, L2>(
        config: &EngineConfig,
        monitor: ThresholdMonitor<R, I, O, L, G, U>,
        dispatch: DispatchLoop<J, P, B, I2, U2, G2, L2>,
    ) -> Self
    where
        R: ReorderRuleSource + 'static,
        I: InventorySource + 'static,
        O: SupplierOrderStore + 'static,
        L: EventLogStore + 'static,
        G: EmailGateway + 'static,
        U: UserDirectory + 'static,
        J: NotificationJobStore + 'static,
        P: PlanDirectory + 'static,
        B: BranchDirectory + 'static,
        I2: InventorySource + 'static,
        U2: UserDirectory + 'static,
        G2: EmailGateway + 'static,
        L2: EventLogStore + 'static,
    {
        Self {
            monitor: monitor.spawn(config.monitor_interval),
            dispatch: dispatch.spawn(config.dispatch_interval),
        }
    }

    /// Stop both pollers and wait for them to finish their in-flight cycles.
    pub fn shutdown(self) {
        self.monitor.shutdown();
        self.dispatch.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reorder::ReorderDispatcher;
    use pharmaflow_core::SystemClock;
    use pharmaflow_eventlog::InMemoryEventLog;
    use pharmaflow_inventory::{InMemoryInventory, InMemoryRuleSource};
    use pharmaflow_notify::{InMemoryDirectory, InMemoryNotificationJobs, RecordingGateway};
    use pharmaflow_purchasing::InMemorySupplierOrders;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn engine_starts_and_shuts_down_cleanly() {
        let config = EngineConfig::default()
            .with_monitor_interval(Duration::from_millis(5))
            .with_dispatch_interval(Duration::from_millis(5));
        let clock: Arc<SystemClock> = Arc::new(SystemClock);
        let directory = InMemoryDirectory::arc();
        let inventory = InMemoryInventory::arc();
        let audit = InMemoryEventLog::arc();
        let gateway = RecordingGateway::arc();

        let dispatcher = ReorderDispatcher::new(
            InMemorySupplierOrders::arc(),
            audit.clone(),
            gateway.clone(),
            directory.clone(),
        );
        let monitor = ThresholdMonitor::new(
            InMemoryRuleSource::arc(),
            inventory.clone(),
            dispatcher,
            clock.clone(),
            config.expiry_grace_days,
        );
        let dispatch = DispatchLoop::new(
            InMemoryNotificationJobs::arc(),
            directory.clone(),
            directory.clone(),
            inventory,
            directory,
            gateway,
            audit,
            clock,
            config.dispatch_batch_size,
            config.expiry_grace_days,
        );

        let engine = Engine::start(&config, monitor, dispatch);
        std::thread::sleep(Duration::from_millis(20));
        engine.shutdown();
    }
}
