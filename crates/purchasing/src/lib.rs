//! Supplier orders: domain types and the order store boundary.

pub mod order;
pub mod store;

pub use order::{OrderKind, OrderStatus, SupplierOrder, SupplierOrderId};
pub use store::{CreateOutcome, InMemorySupplierOrders, OrderStoreError, SupplierOrderStore};
