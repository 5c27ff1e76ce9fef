//! The scheduled dispatch engine: two cooperating background pollers.
//!
//! - [`ThresholdMonitor`] watches sellable inventory against reorder rules
//!   and creates automated replenishment orders through [`ReorderDispatcher`].
//! - [`DispatchLoop`] delivers due renewal notifications, re-validating
//!   eligibility against live business state at send time.
//!
//! Each poller exposes a pure `run_cycle` plus a `spawn` wrapper that owns
//! the interval loop; all state lives in the injected stores.

pub mod config;
pub mod dispatch;
pub mod monitor;
pub mod reorder;
pub mod runtime;
pub mod worker;

pub use config::EngineConfig;
pub use dispatch::{DispatchCycleReport, DispatchLoop};
pub use monitor::{MonitorCycleReport, ThresholdMonitor};
pub use reorder::{DispatchOutcome, ReorderDispatcher};
pub use runtime::Engine;
pub use worker::WorkerHandle;

#[cfg(test)]
mod integration_tests;
