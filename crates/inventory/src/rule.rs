use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use pharmaflow_core::{BranchId, ProductId, SupplierId, UserId};

/// Per-product-per-branch replenishment policy.
///
/// Created and edited by staff; the dispatch engine only reads these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderRule {
    pub product_id: ProductId,
    pub branch_id: BranchId,
    pub supplier_id: SupplierId,
    /// Staff member who owns the rule; automated orders are attributed to them.
    pub owner_user_id: UserId,
    /// Reorder when sellable stock drops to this level (inclusive).
    pub threshold_quantity: i64,
    /// Units to order when the threshold is breached.
    pub reorder_quantity: i64,
}

impl ReorderRule {
    /// Rules saved with a placeholder product or branch are not actionable.
    pub fn has_valid_target(&self) -> bool {
        self.product_id.is_assigned() && self.branch_id.is_assigned()
    }
}

/// Read-only source of reorder rules.
pub trait ReorderRuleSource: Send + Sync {
    fn rules(&self) -> Vec<ReorderRule>;
}

impl<S> ReorderRuleSource for Arc<S>
where
    S: ReorderRuleSource + ?Sized,
{
    fn rules(&self) -> Vec<ReorderRule> {
        (**self).rules()
    }
}

/// In-memory rule source for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryRuleSource {
    rules: RwLock<Vec<ReorderRule>>,
}

impl InMemoryRuleSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn add(&self, rule: ReorderRule) {
        if let Ok(mut rules) = self.rules.write() {
            rules.push(rule);
        }
    }
}

impl ReorderRuleSource for InMemoryRuleSource {
    fn rules(&self) -> Vec<ReorderRule> {
        self.rules.read().map(|r| r.clone()).unwrap_or_default()
    }
}
