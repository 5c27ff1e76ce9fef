//! Inventory domain: stock lots, reorder rules, sellable quantity.

pub mod lot;
pub mod rule;
pub mod source;

pub use lot::{DEFAULT_EXPIRY_GRACE_DAYS, InventoryLot, sellable_quantity};
pub use rule::{InMemoryRuleSource, ReorderRule, ReorderRuleSource};
pub use source::{InMemoryInventory, InventorySource};
