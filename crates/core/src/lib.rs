//! `pharmaflow-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod clock;
pub mod error;
pub mod id;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::DomainError;
pub use id::{BranchId, PlanId, ProductId, SupplierId, UserId};
