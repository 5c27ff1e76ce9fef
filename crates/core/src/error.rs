//! Deterministic domain failures.
//!
//! Store and gateway errors carry their own enums next to their traits; this
//! type covers what the domain itself can reject: bad input, a broken call
//! contract, an unparseable identifier.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Input failed a validation rule (blank required field, bad shape).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A caller broke an operation's contract.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier could not be parsed.
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
