//! Invoice draft computation.
//!
//! Approved runs are grouped by normalized design and fabric, priced, and summed.
//! Discount and VAT are applied to the subtotal in that order, rounding each
//! stored amount to two places.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use printworks_core::{percent_of, round2, CustomerId, DomainError, DomainResult, MatchKey};
use printworks_production::ProductionRun;

use crate::invoice::InvoiceLineItem;

/// Discount applied when neither the caller nor the customer supplies one.
pub const DEFAULT_DISCOUNT_PCT: Decimal = Decimal::ZERO;
/// VAT applied when the caller supplies none.
pub const DEFAULT_VAT_PCT: Decimal = Decimal::from_parts(14, 0, 0, false, 0);

/// Computed, unpersisted invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub customer_id: CustomerId,
    pub period_from: Option<NaiveDate>,
    pub period_to: Option<NaiveDate>,
    pub lines: Vec<InvoiceLineItem>,
    pub subtotal: Decimal,
    pub discount_pct: Decimal,
    pub discount_amount: Decimal,
    pub after_discount: Decimal,
    pub vat_pct: Decimal,
    pub vat_amount: Decimal,
    pub total: Decimal,
}

/// Effective `(discount_pct, vat_pct)`.
///
/// Discount: explicit, else the customer default, else [`DEFAULT_DISCOUNT_PCT`].
/// VAT: explicit, else [`DEFAULT_VAT_PCT`].
/// Explicit rates outside 0..=100 are rejected.
pub fn resolve_rates(
    explicit_discount: Option<Decimal>,
    customer_default_discount: Option<Decimal>,
    explicit_vat: Option<Decimal>,
) -> DomainResult<(Decimal, Decimal)> {
    check_rate("discount", explicit_discount)?;
    check_rate("VAT", explicit_vat)?;
    let discount = explicit_discount
        .or(customer_default_discount)
        .unwrap_or(DEFAULT_DISCOUNT_PCT);
    let vat = explicit_vat.unwrap_or(DEFAULT_VAT_PCT);
    Ok((discount, vat))
}

fn check_rate(label: &str, rate: Option<Decimal>) -> DomainResult<()> {
    match rate {
        Some(r) if r.is_sign_negative() || r > Decimal::ONE_HUNDRED => Err(DomainError::validation(format!(
            "{label} must be between 0 and 100 percent"
        ))),
        _ => Ok(()),
    }
}

fn too_large() -> DomainError {
    DomainError::validation("invoice amounts exceed the supported range")
}

/// Group `runs` into priced lines and compute the totals.
///
/// `runs` is expected to already be the customer's approved runs for the period.
/// `price_for(fabric, design)` is called once per group with the first-seen labels.
/// Fails with a validation error when any sum or product overflows `Decimal`.
pub fn build_draft(
    customer_id: CustomerId,
    period_from: Option<NaiveDate>,
    period_to: Option<NaiveDate>,
    runs: &[ProductionRun],
    discount_pct: Decimal,
    vat_pct: Decimal,
    mut price_for: impl FnMut(&str, &str) -> Decimal,
) -> DomainResult<InvoiceDraft> {
    let mut keys: Vec<(MatchKey, MatchKey)> = Vec::new();
    let mut lines: Vec<InvoiceLineItem> = Vec::new();

    for run in runs {
        let key = (MatchKey::new(&run.design_ref), MatchKey::new(&run.fabric));
        match keys.iter().position(|k| *k == key) {
            Some(idx) => {
                let line = &mut lines[idx];
                line.total_meters = line.total_meters.checked_add(run.meters).ok_or_else(too_large)?;
                line.run_ids.push(run.id);
            }
            None => {
                keys.push(key);
                lines.push(InvoiceLineItem {
                    design_ref: run.design_ref.clone(),
                    fabric: run.fabric.clone(),
                    total_meters: run.meters,
                    price_per_meter: Decimal::ZERO,
                    line_total: Decimal::ZERO,
                    run_ids: vec![run.id],
                });
            }
        }
    }

    let mut subtotal = Decimal::ZERO;
    for line in &mut lines {
        line.price_per_meter = price_for(&line.fabric, &line.design_ref);
        line.line_total = line
            .total_meters
            .checked_mul(line.price_per_meter)
            .map(round2)
            .ok_or_else(too_large)?;
        subtotal = subtotal.checked_add(line.line_total).ok_or_else(too_large)?;
    }

    let discount_amount = percent_of(subtotal, discount_pct).ok_or_else(too_large)?;
    let after_discount = subtotal.checked_sub(discount_amount).ok_or_else(too_large)?;
    let vat_amount = percent_of(after_discount, vat_pct).ok_or_else(too_large)?;
    let total = after_discount
        .checked_add(vat_amount)
        .map(round2)
        .ok_or_else(too_large)?;

    Ok(InvoiceDraft {
        customer_id,
        period_from,
        period_to,
        lines,
        subtotal,
        discount_pct,
        discount_amount,
        after_discount,
        vat_pct,
        vat_amount,
        total,
    })
}
