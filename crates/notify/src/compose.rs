//! Renewal email composition and send-time eligibility.
//!
//! Content is resolved against *current* business state (shipping method,
//! branch, stock), not the state at scheduling time.

use chrono::NaiveDate;

use pharmaflow_core::BranchId;
use pharmaflow_inventory::InventorySource;

use super::directory::{BranchDirectory, RenewalPlan, ShippingMethod};
use super::email::EmailMessage;
use super::job::NotificationStage;

/// Fallback display text when neither the prescription nor the approved
/// product carries a name.
const GENERIC_PRESCRIPTION_NAME: &str = "your prescription";

/// Fallback location text when a delivery address is entirely blank.
const ADDRESS_ON_FILE: &str = "the address on file";

/// A composed renewal email plus its send-time eligibility.
///
/// `can_send = false` is not an error: the job stays pending and is
/// re-evaluated on the next cycle.
#[derive(Debug, Clone)]
pub struct RenewalEmail {
    pub can_send: bool,
    pub message: EmailMessage,
}

/// Compose the email for one due job.
///
/// - Delivery plans: the address composes from city/block/road/building,
///   falling back to "the address on file" when every part is blank.
/// - Pickup plans: the location is the branch's city, then the branch row's
///   name, then "Branch #id".
/// - Stage `DueSoon` on a pickup plan additionally requires the pickup
///   branch's sellable stock to cover the approved quantity; `Reminder` and
///   delivery plans carry no stock requirement.
pub fn build_renewal_email<B, I>(
    plan: &RenewalPlan,
    stage: NotificationStage,
    to: &str,
    branches: &B,
    inventory: &I,
    today: NaiveDate,
    grace_days: u64,
) -> RenewalEmail
where
    B: BranchDirectory,
    I: InventorySource,
{
    let display_name = display_name(plan);

    let (fulfilment_line, can_send) = match &plan.shipping {
        ShippingMethod::Delivery { address } => {
            let destination = address
                .composed()
                .unwrap_or_else(|| ADDRESS_ON_FILE.to_string());
            (
                format!("It will be delivered to {destination}."),
                true,
            )
        }
        ShippingMethod::Pickup { branch_id } => {
            let location = pickup_location(branches, *branch_id);
            let in_stock = match (stage, plan.approved_product_id) {
                (NotificationStage::DueSoon, Some(product)) => {
                    inventory.sellable(product, *branch_id, today, grace_days)
                        >= plan.approved_quantity
                }
                // Reminders never gate on stock; without an approved product
                // there is nothing to check.
                _ => true,
            };
            (
                format!("It will be ready for pickup at our {location} branch."),
                in_stock,
            )
        }
    };

    let subject = match stage {
        NotificationStage::DueSoon => format!("{display_name} is ready for renewal"),
        NotificationStage::Reminder => format!("Upcoming renewal for {display_name}"),
    };

    let lead = match stage {
        NotificationStage::DueSoon => format!(
            "Your renewal of {display_name} is due and can be dispensed now."
        ),
        NotificationStage::Reminder => format!(
            "Your next renewal of {display_name} is coming up in a few days."
        ),
    };

    let html_body = format!("<p>{lead}</p><p>{fulfilment_line}</p>");

    RenewalEmail {
        can_send,
        message: EmailMessage {
            to: to.to_string(),
            subject,
            html_body,
        },
    }
}

/// Prescription name, then approved product name, then the generic fallback.
fn display_name(plan: &RenewalPlan) -> String {
    plan.prescription_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| {
            plan.approved_product_name
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
        })
        .unwrap_or(GENERIC_PRESCRIPTION_NAME)
        .to_string()
}

/// City from the joined read model, then the branch row's own city, then its
/// name, then "Branch #id".
fn pickup_location<B: BranchDirectory>(branches: &B, branch_id: BranchId) -> String {
    if let Some(city) = branches.branch_city(branch_id) {
        return city;
    }
    if let Some(branch) = branches.branch(branch_id) {
        return branch.city.unwrap_or(branch.name);
    }
    format!("Branch #{branch_id}")
}
