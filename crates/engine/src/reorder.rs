use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use pharmaflow_eventlog::{EventLogRecord, EventLogStore, record_kind};
use pharmaflow_inventory::ReorderRule;
use pharmaflow_notify::{EmailGateway, EmailMessage, UserDirectory};
use pharmaflow_purchasing::{
    CreateOutcome, OrderStoreError, SupplierOrder, SupplierOrderId, SupplierOrderStore,
};

/// What a dispatch attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Created(SupplierOrderId),
    /// An open automated order already covers this (product, branch).
    AlreadyPending,
}

/// Creates automated replenishment orders with their audit trail.
///
/// Order persistence is the durable step; the audit record and the staff
/// notification are layered behind it and must never undo or block it.
pub struct ReorderDispatcher<O, L, G, U> {
    orders: O,
    audit: L,
    gateway: G,
    users: U,
}

impl<O, L, G, U> ReorderDispatcher<O, L, G, U>
where
    O: SupplierOrderStore,
    L: EventLogStore,
    G: EmailGateway,
    U: UserDirectory,
{
    pub fn new(orders: O, audit: L, gateway: G, users: U) -> Self {
        Self {
            orders,
            audit,
            gateway,
            users,
        }
    }

    /// Create the automated order for a breached rule.
    ///
    /// `sellable` is the inventory level that triggered the breach; it is
    /// recorded in the audit trail. The store's insert-if-absent guard makes
    /// repeats for a still-open target no-ops.
    pub fn dispatch(
        &self,
        rule: &ReorderRule,
        sellable: i64,
        now: DateTime<Utc>,
    ) -> Result<DispatchOutcome, OrderStoreError> {
        let order = SupplierOrder::automated(
            rule.supplier_id,
            rule.product_id,
            rule.branch_id,
            rule.owner_user_id,
            rule.reorder_quantity,
            now,
        );

        let order_id = match self.orders.create_automated_if_absent(order)? {
            CreateOutcome::AlreadyPending(id) => {
                debug!(
                    product = %rule.product_id,
                    branch = %rule.branch_id,
                    existing_order = %id,
                    "automated order already pending"
                );
                return Ok(DispatchOutcome::AlreadyPending);
            }
            CreateOutcome::Created(id) => id,
        };

        info!(
            order = %order_id,
            product = %rule.product_id,
            branch = %rule.branch_id,
            quantity = rule.reorder_quantity,
            sellable,
            threshold = rule.threshold_quantity,
            "automated reorder created"
        );

        self.append_audit(rule, order_id, sellable, now);
        self.notify_staff(rule, sellable);

        Ok(DispatchOutcome::Created(order_id))
    }

    /// Audit append is best-effort: the order is already durable.
    fn append_audit(
        &self,
        rule: &ReorderRule,
        order_id: SupplierOrderId,
        sellable: i64,
        now: DateTime<Utc>,
    ) {
        let body = serde_json::json!({
            "order_id": order_id,
            "product_id": rule.product_id,
            "supplier_id": rule.supplier_id,
            "branch_id": rule.branch_id,
            "quantity": rule.reorder_quantity,
            "sellable_at_trigger": sellable,
            "threshold": rule.threshold_quantity,
            "rule_owner": rule.owner_user_id,
        });

        let record = EventLogRecord::new(
            Some(rule.owner_user_id),
            record_kind::REORDER_CREATED,
            now,
            body.to_string(),
        );

        if let Err(e) = self.audit.append(record) {
            warn!(order = %order_id, error = %e, "reorder audit append failed");
        }
    }

    /// Email the branch manager and all admins. Failures are logged and
    /// swallowed; whether anyone got told is independent of whether the
    /// order exists.
    fn notify_staff(&self, rule: &ReorderRule, sellable: i64) {
        let mut recipients = Vec::new();
        if let Some(manager) = self.users.branch_manager_email(rule.branch_id) {
            recipients.push(manager);
        }
        recipients.extend(self.users.admin_emails());

        let subject = format!(
            "Low stock: automated reorder placed for product {} at branch {}",
            rule.product_id, rule.branch_id
        );
        let html_body = format!(
            "<p>Sellable stock fell to {sellable} (threshold {}).</p>\
             <p>An automated order for {} units was placed with supplier {}.</p>",
            rule.threshold_quantity, rule.reorder_quantity, rule.supplier_id
        );

        for to in recipients {
            let message = EmailMessage {
                to,
                subject: subject.clone(),
                html_body: html_body.clone(),
            };
            if let Err(e) = self.gateway.send(&message) {
                warn!(
                    recipient = %message.to,
                    product = %rule.product_id,
                    error = %e,
                    "reorder notification failed"
                );
            }
        }
    }
}
