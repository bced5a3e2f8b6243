//! `printworks-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! typed identifiers, the domain error model, the entity trait used by storage,
//! free-text match keys, and money rounding.

pub mod entity;
pub mod error;
pub mod id;
pub mod key;
pub mod money;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{CustomerId, InvoiceId, OrderId, PricingRuleId, RunId, UserId};
pub use key::MatchKey;
pub use money::{percent_of, round2};
