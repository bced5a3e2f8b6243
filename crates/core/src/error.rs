//! Domain error model.

use thiserror::Error;

/// Result type used by the pure domain crates.
pub type DomainResult<T> = Result<T, DomainError>;

/// Deterministic failure of a billing rule.
///
/// Disk, lock, and encoding failures are `StoreError`s in `printworks-infra` and never
/// show up here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Rejected input: empty names, non-positive meters, percentages outside 0..=100.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The record is in a state that forbids the change (approved run, paid invoice).
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An id string did not parse.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The referenced customer, run, order, or invoice does not exist.
    #[error("not found")]
    NotFound,

    /// Another write got there first: a run already invoiced, an order id already taken.
    #[error("conflict: {0}")]
    Conflict(String),
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

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}
