use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use pharmaflow_core::{BranchId, ProductId};

/// Default grace window: a lot expiring within this many days of today is no
/// longer counted as sellable.
pub const DEFAULT_EXPIRY_GRACE_DAYS: u64 = 29;

/// One received batch of a product at a branch.
///
/// Stock for a product is spread across lots with distinct expiry dates;
/// dispensing draws lots down independently, so quantities can hit zero while
/// the row remains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLot {
    pub product_id: ProductId,
    pub branch_id: BranchId,
    pub quantity: i64,
    /// `None` for products without an expiry (e.g. durables).
    pub expiry: Option<NaiveDate>,
}

impl InventoryLot {
    /// Whether this lot counts toward sellable stock on `today`.
    ///
    /// A lot is sellable when it holds units and either never expires or
    /// expires strictly beyond `today + grace_days`.
    pub fn is_sellable(&self, today: NaiveDate, grace_days: u64) -> bool {
        if self.quantity <= 0 {
            return false;
        }
        match self.expiry {
            None => true,
            Some(expiry) => {
                let cutoff = today.checked_add_days(Days::new(grace_days)).unwrap_or(today);
                expiry > cutoff
            }
        }
    }
}

/// Sum of sellable units across `lots` for a single (product, branch).
///
/// Callers are expected to pre-filter `lots` to the target product and
/// branch; this function only applies the quantity/expiry rules.
pub fn sellable_quantity<'a, I>(lots: I, today: NaiveDate, grace_days: u64) -> i64
where
    I: IntoIterator<Item = &'a InventoryLot>,
{
    lots.into_iter()
        .filter(|lot| lot.is_sellable(today, grace_days))
        .map(|lot| lot.quantity)
        .sum()
}
