use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use pharmaflow_core::{BranchId, PlanId, ProductId, UserId};

/// Bahrain-style delivery address: city, block, road, building.
///
/// Any part may be blank; customers often save partial addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub city: String,
    pub block: String,
    pub road: String,
    pub building: String,
}

impl DeliveryAddress {
    /// Non-blank parts joined for display; `None` when every part is blank.
    pub fn composed(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.city, &self.block, &self.road, &self.building]
            .into_iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

/// How a plan's renewals reach the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ShippingMethod {
    Pickup { branch_id: BranchId },
    Delivery { address: DeliveryAddress },
}

/// Read-model row for a prescription renewal plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenewalPlan {
    pub id: PlanId,
    pub user_id: UserId,
    /// Name the prescriber gave the prescription, when present.
    pub prescription_name: Option<String>,
    pub approved_product_id: Option<ProductId>,
    pub approved_product_name: Option<String>,
    /// Units dispensed per renewal.
    pub approved_quantity: i64,
    pub shipping: ShippingMethod,
}

/// Read-model row for a branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchInfo {
    pub id: BranchId,
    pub name: String,
    pub city: Option<String>,
}

/// Read-only plan lookups.
pub trait PlanDirectory: Send + Sync {
    fn plan(&self, id: PlanId) -> Option<RenewalPlan>;
}

/// Read-only branch lookups.
pub trait BranchDirectory: Send + Sync {
    /// City name from the joined branch/city read model.
    fn branch_city(&self, id: BranchId) -> Option<String>;

    /// Direct branch row lookup (fallback when the join has no city).
    fn branch(&self, id: BranchId) -> Option<BranchInfo>;
}

/// Read-only user/recipient lookups.
pub trait UserDirectory: Send + Sync {
    fn email(&self, id: UserId) -> Option<String>;

    /// Addresses of all admin-role users.
    fn admin_emails(&self) -> Vec<String>;

    fn branch_manager_email(&self, branch: BranchId) -> Option<String>;
}

impl<D> PlanDirectory for Arc<D>
where
    D: PlanDirectory + ?Sized,
{
    fn plan(&self, id: PlanId) -> Option<RenewalPlan> {
        (**self).plan(id)
    }
}

impl<D> BranchDirectory for Arc<D>
where
    D: BranchDirectory + ?Sized,
{
    fn branch_city(&self, id: BranchId) -> Option<String> {
        (**self).branch_city(id)
    }

    fn branch(&self, id: BranchId) -> Option<BranchInfo> {
        (**self).branch(id)
    }
}

impl<D> UserDirectory for Arc<D>
where
    D: UserDirectory + ?Sized,
{
    fn email(&self, id: UserId) -> Option<String> {
        (**self).email(id)
    }

    fn admin_emails(&self) -> Vec<String> {
        (**self).admin_emails()
    }

    fn branch_manager_email(&self, branch: BranchId) -> Option<String> {
        (**self).branch_manager_email(branch)
    }
}

/// In-memory directory for tests/dev, backing all three lookup traits.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    plans: RwLock<HashMap<PlanId, RenewalPlan>>,
    branches: RwLock<HashMap<BranchId, BranchInfo>>,
    branch_cities: RwLock<HashMap<BranchId, String>>,
    user_emails: RwLock<HashMap<UserId, String>>,
    admin_emails: RwLock<Vec<String>>,
    branch_managers: RwLock<HashMap<BranchId, String>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn upsert_plan(&self, plan: RenewalPlan) {
        if let Ok(mut plans) = self.plans.write() {
            plans.insert(plan.id, plan);
        }
    }

    pub fn remove_plan(&self, id: PlanId) {
        if let Ok(mut plans) = self.plans.write() {
            plans.remove(&id);
        }
    }

    pub fn upsert_branch(&self, branch: BranchInfo) {
        if let Ok(mut branches) = self.branches.write() {
            branches.insert(branch.id, branch);
        }
    }

    pub fn set_branch_city(&self, id: BranchId, city: impl Into<String>) {
        if let Ok(mut cities) = self.branch_cities.write() {
            cities.insert(id, city.into());
        }
    }

    pub fn set_user_email(&self, id: UserId, email: impl Into<String>) {
        if let Ok(mut emails) = self.user_emails.write() {
            emails.insert(id, email.into());
        }
    }

    pub fn add_admin_email(&self, email: impl Into<String>) {
        if let Ok(mut emails) = self.admin_emails.write() {
            emails.push(email.into());
        }
    }

    pub fn set_branch_manager_email(&self, id: BranchId, email: impl Into<String>) {
        if let Ok(mut managers) = self.branch_managers.write() {
            managers.insert(id, email.into());
        }
    }
}

impl PlanDirectory for InMemoryDirectory {
    fn plan(&self, id: PlanId) -> Option<RenewalPlan> {
        self.plans.read().ok()?.get(&id).cloned()
    }
}

impl BranchDirectory for InMemoryDirectory {
    fn branch_city(&self, id: BranchId) -> Option<String> {
        self.branch_cities.read().ok()?.get(&id).cloned()
    }

    fn branch(&self, id: BranchId) -> Option<BranchInfo> {
        self.branches.read().ok()?.get(&id).cloned()
    }
}

impl UserDirectory for InMemoryDirectory {
    fn email(&self, id: UserId) -> Option<String> {
        self.user_emails.read().ok()?.get(&id).cloned()
    }

    fn admin_emails(&self) -> Vec<String> {
        self.admin_emails.read().map(|e| e.clone()).unwrap_or_default()
    }

    fn branch_manager_email(&self, branch: BranchId) -> Option<String> {
        self.branch_managers.read().ok()?.get(&branch).cloned()
    }
}
