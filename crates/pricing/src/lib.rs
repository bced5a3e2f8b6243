//! Pricing domain module: per-customer price rules and their precedence.
//!
//! Resolution is a pure function over a customer's rules; loading rules and
//! customers is the caller's job.

pub mod rule;

pub use rule::{
    resolve_price, NewPricingRule, PriceResolution, PriceSource, PricingRule,
    FALLBACK_PRICE_PER_METER,
};
