//! Money arithmetic on `rust_decimal::Decimal`.
//!
//! Amounts are rounded to two decimal places, half away from zero, at every step
//! that produces a stored amount (line totals, discount, VAT, grand total).

use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places kept for monetary amounts.
pub const DECIMAL_PLACES: u32 = 2;

/// Round to two decimal places (half away from zero).
#[inline]
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// `round2(amount × pct / 100)`, or `None` when the product leaves `Decimal`'s range.
#[inline]
pub fn percent_of(amount: Decimal, pct: Decimal) -> Option<Decimal> {
    amount
        .checked_mul(pct)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .map(round2)
}
