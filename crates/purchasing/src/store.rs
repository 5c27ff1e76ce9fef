use std::sync::{Arc, RwLock};

use thiserror::Error;

use pharmaflow_core::{BranchId, DomainError, ProductId};

use super::order::{OrderKind, SupplierOrder, SupplierOrderId};

/// Order store error.
#[derive(Debug, Clone, Error)]
pub enum OrderStoreError {
    #[error("order not found: {0}")]
    NotFound(SupplierOrderId),

    #[error("order already exists: {0}")]
    AlreadyExists(SupplierOrderId),

    /// The order itself was rejected, independent of storage.
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Outcome of an insert-if-absent attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The order was persisted.
    Created(SupplierOrderId),
    /// An open automated order for the same (product, branch) already exists;
    /// nothing was written.
    AlreadyPending(SupplierOrderId),
}

/// Supplier order persistence boundary.
///
/// The duplicate guard lives here, not in the caller: `create_automated_if_absent`
/// must check and insert under one critical section (or a store-level unique
/// constraint), so overlapping cycles cannot both create an order for the same
/// (product, branch).
pub trait SupplierOrderStore: Send + Sync {
    /// Persist a new order unconditionally.
    fn create(&self, order: SupplierOrder) -> Result<SupplierOrderId, OrderStoreError>;

    /// Atomically persist `order` unless an open (Pending, Automated) order
    /// for the same (product, branch) already exists.
    fn create_automated_if_absent(
        &self,
        order: SupplierOrder,
    ) -> Result<CreateOutcome, OrderStoreError>;

    /// Whether an open (Pending, Automated) order exists for the target.
    fn open_automated_exists(
        &self,
        product: ProductId,
        branch: BranchId,
    ) -> Result<bool, OrderStoreError>;

    fn get(&self, id: SupplierOrderId) -> Result<Option<SupplierOrder>, OrderStoreError>;
}

impl<S> SupplierOrderStore for Arc<S>
where
    S: SupplierOrderStore + ?Sized,
{
    fn create(&self, order: SupplierOrder) -> Result<SupplierOrderId, OrderStoreError> {
        (**self).create(order)
    }

    fn create_automated_if_absent(
        &self,
        order: SupplierOrder,
    ) -> Result<CreateOutcome, OrderStoreError> {
        (**self).create_automated_if_absent(order)
    }

    fn open_automated_exists(
        &self,
        product: ProductId,
        branch: BranchId,
    ) -> Result<bool, OrderStoreError> {
        (**self).open_automated_exists(product, branch)
    }

    fn get(&self, id: SupplierOrderId) -> Result<Option<SupplierOrder>, OrderStoreError> {
        (**self).get(id)
    }
}

/// In-memory order store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemorySupplierOrders {
    orders: RwLock<Vec<SupplierOrder>>,
}

impl InMemorySupplierOrders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn all(&self) -> Vec<SupplierOrder> {
        self.orders.read().map(|o| o.clone()).unwrap_or_default()
    }

    /// Count of orders for one (product, branch), any status/kind.
    pub fn count_for(&self, product: ProductId, branch: BranchId) -> usize {
        self.all()
            .iter()
            .filter(|o| o.product_id == product && o.branch_id == branch)
            .count()
    }

    fn poisoned() -> OrderStoreError {
        OrderStoreError::Storage("lock poisoned".to_string())
    }
}

impl SupplierOrderStore for InMemorySupplierOrders {
    fn create(&self, order: SupplierOrder) -> Result<SupplierOrderId, OrderStoreError> {
        let mut orders = self.orders.write().map_err(|_| Self::poisoned())?;
        if orders.iter().any(|o| o.id == order.id) {
            return Err(OrderStoreError::AlreadyExists(order.id));
        }
        let id = order.id;
        orders.push(order);
        Ok(id)
    }

    fn create_automated_if_absent(
        &self,
        order: SupplierOrder,
    ) -> Result<CreateOutcome, OrderStoreError> {
        if order.kind != OrderKind::Automated {
            return Err(DomainError::invariant(
                "create_automated_if_absent requires an automated order",
            )
            .into());
        }

        // Single write lock spans the existence check and the insert.
        let mut orders = self.orders.write().map_err(|_| Self::poisoned())?;

        if let Some(open) = orders.iter().find(|o| {
            o.product_id == order.product_id
                && o.branch_id == order.branch_id
                && o.is_open_automated()
        }) {
            return Ok(CreateOutcome::AlreadyPending(open.id));
        }

        let id = order.id;
        orders.push(order);
        Ok(CreateOutcome::Created(id))
    }

    fn open_automated_exists(
        &self,
        product: ProductId,
        branch: BranchId,
    ) -> Result<bool, OrderStoreError> {
        let orders = self.orders.read().map_err(|_| Self::poisoned())?;
        Ok(orders
            .iter()
            .any(|o| o.product_id == product && o.branch_id == branch && o.is_open_automated()))
    }

    fn get(&self, id: SupplierOrderId) -> Result<Option<SupplierOrder>, OrderStoreError> {
        let orders = self.orders.read().map_err(|_| Self::poisoned())?;
        Ok(orders.iter().find(|o| o.id == id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pharmaflow_core::{SupplierId, UserId};

    fn automated(product: i64, branch: i64) -> SupplierOrder {
        SupplierOrder::automated(
            SupplierId::new(1),
            ProductId::new(product),
            BranchId::new(branch),
            UserId::new(9),
            50,
            Utc::now(),
        )
    }

    #[test]
    fn if_absent_creates_once_per_target() {
        let store = InMemorySupplierOrders::new();

        let first = store.create_automated_if_absent(automated(1, 1)).unwrap();
        assert!(matches!(first, CreateOutcome::Created(_)));

        let second = store.create_automated_if_absent(automated(1, 1)).unwrap();
        assert!(matches!(second, CreateOutcome::AlreadyPending(_)));

        assert_eq!(store.count_for(ProductId::new(1), BranchId::new(1)), 1);
    }

    #[test]
    fn distinct_targets_do_not_block_each_other() {
        let store = InMemorySupplierOrders::new();

        store.create_automated_if_absent(automated(1, 1)).unwrap();
        let other_branch = store.create_automated_if_absent(automated(1, 2)).unwrap();
        let other_product = store.create_automated_if_absent(automated(2, 1)).unwrap();

        assert!(matches!(other_branch, CreateOutcome::Created(_)));
        assert!(matches!(other_product, CreateOutcome::Created(_)));
    }

    #[test]
    fn closed_orders_do_not_block_new_automated_orders() {
        let store = InMemorySupplierOrders::new();

        let mut order = automated(1, 1);
        order.status = crate::order::OrderStatus::Received;
        store.create(order).unwrap();

        let outcome = store.create_automated_if_absent(automated(1, 1)).unwrap();
        assert!(matches!(outcome, CreateOutcome::Created(_)));
    }

    #[test]
    fn manual_orders_are_rejected_by_the_guard() {
        let store = InMemorySupplierOrders::new();

        let mut order = automated(1, 1);
        order.kind = OrderKind::Manual;
        assert!(matches!(
            store.create_automated_if_absent(order),
            Err(OrderStoreError::Domain(DomainError::InvariantViolation(_)))
        ));
    }

    #[test]
    fn open_automated_exists_tracks_state() {
        let store = InMemorySupplierOrders::new();
        let (p, b) = (ProductId::new(1), BranchId::new(1));

        assert!(!store.open_automated_exists(p, b).unwrap());
        store.create_automated_if_absent(automated(1, 1)).unwrap();
        assert!(store.open_automated_exists(p, b).unwrap());
    }
}
