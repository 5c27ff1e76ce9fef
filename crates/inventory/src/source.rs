use std::sync::{Arc, RwLock};

use chrono::NaiveDate;

use pharmaflow_core::{BranchId, ProductId};

use super::lot::{InventoryLot, sellable_quantity};

/// Read-only view of current stock.
///
/// The engine re-reads stock at decision time (threshold checks, pickup
/// eligibility) rather than caching it across cycles.
pub trait InventorySource: Send + Sync {
    /// Total sellable units of `product` at `branch` on `today`.
    fn sellable(
        &self,
        product: ProductId,
        branch: BranchId,
        today: NaiveDate,
        grace_days: u64,
    ) -> i64;
}

impl<S> InventorySource for Arc<S>
where
    S: InventorySource + ?Sized,
{
    fn sellable(
        &self,
        product: ProductId,
        branch: BranchId,
        today: NaiveDate,
        grace_days: u64,
    ) -> i64 {
        (**self).sellable(product, branch, today, grace_days)
    }
}

/// In-memory lot store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryInventory {
    lots: RwLock<Vec<InventoryLot>>,
}

impl InMemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn add_lot(&self, lot: InventoryLot) {
        if let Ok(mut lots) = self.lots.write() {
            lots.push(lot);
        }
    }

    /// Drop all lots for one (product, branch) and insert a single fresh lot.
    pub fn set_stock(&self, product: ProductId, branch: BranchId, quantity: i64) {
        if let Ok(mut lots) = self.lots.write() {
            lots.retain(|l| !(l.product_id == product && l.branch_id == branch));
            lots.push(InventoryLot {
                product_id: product,
                branch_id: branch,
                quantity,
                expiry: None,
            });
        }
    }
}

impl InventorySource for InMemoryInventory {
    fn sellable(
        &self,
        product: ProductId,
        branch: BranchId,
        today: NaiveDate,
        grace_days: u64,
    ) -> i64 {
        let lots = match self.lots.read() {
            Ok(l) => l,
            Err(_) => return 0,
        };

        sellable_quantity(
            lots.iter()
                .filter(|l| l.product_id == product && l.branch_id == branch),
            today,
            grace_days,
        )
    }
}
