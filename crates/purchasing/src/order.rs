use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pharmaflow_core::{BranchId, ProductId, SupplierId, UserId};

/// Supplier order identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SupplierOrderId(pub Uuid);

impl SupplierOrderId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SupplierOrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for SupplierOrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Supplier order status lifecycle.
///
/// The dispatch engine only ever creates `Pending` orders; later transitions
/// belong to the purchasing workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Approved,
    Received,
    Cancelled,
}

/// How the order came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    /// Placed by staff through the purchasing UI.
    Manual,
    /// Created by the threshold monitor.
    Automated,
}

/// A replenishment order against one supplier for one product at one branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierOrder {
    pub id: SupplierOrderId,
    pub supplier_id: SupplierId,
    pub product_id: ProductId,
    pub branch_id: BranchId,
    /// Staff member the order is attributed to.
    pub employee_id: UserId,
    pub quantity: i64,
    pub status: OrderStatus,
    pub kind: OrderKind,
    pub created_at: DateTime<Utc>,
}

impl SupplierOrder {
    /// Build a pending automated order (the only shape the engine creates).
    pub fn automated(
        supplier_id: SupplierId,
        product_id: ProductId,
        branch_id: BranchId,
        employee_id: UserId,
        quantity: i64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SupplierOrderId::new(),
            supplier_id,
            product_id,
            branch_id,
            employee_id,
            quantity,
            status: OrderStatus::Pending,
            kind: OrderKind::Automated,
            created_at,
        }
    }

    /// Whether this order blocks another automated order for the same target.
    pub fn is_open_automated(&self) -> bool {
        self.status == OrderStatus::Pending && self.kind == OrderKind::Automated
    }
}
