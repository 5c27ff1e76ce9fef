//! Strongly-typed identifiers used across the domain.
//!
//! The platform's relational store keys rows with positive integers; zero and
//! negative values are placeholders left by half-filled forms and must never
//! reach the engine.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of a catalog product.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(i64);

/// Identifier of a pharmacy branch.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchId(i64);

/// Identifier of a supplier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SupplierId(i64);

/// Identifier of a user (staff or customer).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

/// Identifier of a prescription renewal plan.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(i64);

macro_rules! impl_i64_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            pub const fn get(&self) -> i64 {
                self.0
            }

            /// Whether this id refers to a persisted row.
            ///
            /// The store assigns ids starting at 1; non-positive values are
            /// unassigned placeholders.
            pub const fn is_assigned(&self) -> bool {
                self.0 > 0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $t {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for i64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = i64::from_str(s)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(raw))
            }
        }
    };
}

impl_i64_newtype!(ProductId, "ProductId");
impl_i64_newtype!(BranchId, "BranchId");
impl_i64_newtype!(SupplierId, "SupplierId");
impl_i64_newtype!(UserId, "UserId");
impl_i64_newtype!(PlanId, "PlanId");
