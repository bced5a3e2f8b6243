use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use printworks_core::{CustomerId, DomainError, DomainResult, Entity, InvoiceId, RunId};

use crate::draft::InvoiceDraft;

/// Invoice status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Draft,
    Issued,
    Paid,
    Cancelled,
}

impl InvoiceStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, InvoiceStatus::Paid | InvoiceStatus::Cancelled)
    }

    fn can_become(self, next: InvoiceStatus) -> bool {
        use InvoiceStatus::*;
        matches!(
            (self, next),
            (Draft, Issued) | (Draft, Cancelled) | (Issued, Paid) | (Issued, Cancelled)
        )
    }
}

/// One design/fabric group of an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLineItem {
    pub design_ref: String,
    pub fabric: String,
    pub total_meters: Decimal,
    pub price_per_meter: Decimal,
    pub line_total: Decimal,
    pub run_ids: Vec<RunId>,
}

/// Finalized billing artefact for one customer over a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDocument {
    pub id: InvoiceId,
    /// Per-customer sequence number, starting at 1.
    pub bill_number: u32,
    pub customer_id: CustomerId,
    /// Customer display name at the time of issue.
    pub customer_name: String,
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
    pub status: InvoiceStatus,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for InvoiceDocument {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl InvoiceDocument {
    /// Freeze a computed draft into an issued invoice.
    pub fn issue(
        id: InvoiceId,
        bill_number: u32,
        customer_name: impl Into<String>,
        draft: InvoiceDraft,
        notes: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            bill_number,
            customer_id: draft.customer_id,
            customer_name: customer_name.into(),
            period_from: draft.period_from,
            period_to: draft.period_to,
            lines: draft.lines,
            subtotal: draft.subtotal,
            discount_pct: draft.discount_pct,
            discount_amount: draft.discount_amount,
            after_discount: draft.after_discount,
            vat_pct: draft.vat_pct,
            vat_amount: draft.vat_amount,
            total: draft.total,
            status: InvoiceStatus::Issued,
            notes: notes.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Every run billed by this invoice, in line order.
    pub fn run_ids(&self) -> Vec<RunId> {
        self.lines.iter().flat_map(|l| l.run_ids.iter().copied()).collect()
    }

    /// Move to `next`. Returns whether the status changed.
    ///
    /// Allowed: draft → issued | cancelled, issued → paid | cancelled.
    pub fn transition(&mut self, next: InvoiceStatus, now: DateTime<Utc>) -> DomainResult<bool> {
        if self.status == next {
            return Ok(false);
        }
        if self.status.is_terminal() {
            return Err(DomainError::invariant(format!(
                "invoice is {:?} and can no longer change status",
                self.status
            )));
        }
        if !self.status.can_become(next) {
            return Err(DomainError::invariant(format!(
                "cannot move invoice from {:?} to {:?}",
                self.status, next
            )));
        }
        self.status = next;
        self.updated_at = now;
        Ok(true)
    }
}

/// Next bill number for `customer_id`: highest existing number + 1, or 1.
pub fn next_bill_number<'a>(
    invoices: impl IntoIterator<Item = &'a InvoiceDocument>,
    customer_id: CustomerId,
) -> DomainResult<u32> {
    match invoices
        .into_iter()
        .filter(|i| i.customer_id == customer_id)
        .map(|i| i.bill_number)
        .max()
    {
        None => Ok(1),
        Some(n) => n
            .checked_add(1)
            .ok_or_else(|| DomainError::validation("bill numbers exhausted for customer")),
    }
}

/// Sum of totals of issued (unpaid) invoices.
pub fn receivables<'a>(invoices: impl IntoIterator<Item = &'a InvoiceDocument>) -> Decimal {
    sum_with_status(invoices, InvoiceStatus::Issued)
}

/// Sum of totals of paid invoices.
pub fn collected<'a>(invoices: impl IntoIterator<Item = &'a InvoiceDocument>) -> Decimal {
    sum_with_status(invoices, InvoiceStatus::Paid)
}

fn sum_with_status<'a>(invoices: impl IntoIterator<Item = &'a InvoiceDocument>, status: InvoiceStatus) -> Decimal {
    invoices
        .into_iter()
        .filter(|i| i.status == status)
        .fold(Decimal::ZERO, |acc, i| acc.saturating_add(i.total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::build_draft;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn empty_invoice(customer_id: CustomerId, bill_number: u32, total: i64, status: InvoiceStatus) -> InvoiceDocument {
        let draft = build_draft(customer_id, None, None, &[], Decimal::ZERO, Decimal::ZERO, |_, _| Decimal::ZERO).unwrap();
        let mut doc = InvoiceDocument::issue(InvoiceId::new(), bill_number, "Nile", draft, "", test_time());
        doc.total = Decimal::from(total);
        doc.status = status;
        doc
    }

    #[test]
    fn first_bill_number_is_one() {
        assert_eq!(next_bill_number(&Vec::<InvoiceDocument>::new(), CustomerId::new()).unwrap(), 1);
    }

    #[test]
    fn bill_number_is_max_plus_one_per_customer() {
        let a = CustomerId::new();
        let b = CustomerId::new();
        // Gaps from deleted invoices do not matter; only the maximum does.
        let invoices = vec![
            empty_invoice(a, 3, 0, InvoiceStatus::Issued),
            empty_invoice(a, 1, 0, InvoiceStatus::Issued),
            empty_invoice(b, 9, 0, InvoiceStatus::Issued),
        ];

        assert_eq!(next_bill_number(&invoices, a).unwrap(), 4);
        assert_eq!(next_bill_number(&invoices, b).unwrap(), 10);
        assert_eq!(next_bill_number(&invoices, CustomerId::new()).unwrap(), 1);
    }

    #[test]
    fn exhausted_bill_numbers_are_rejected() {
        let customer = CustomerId::new();
        let invoices = vec![empty_invoice(customer, u32::MAX, 0, InvoiceStatus::Issued)];

        let err = next_bill_number(&invoices, customer).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(next_bill_number(&invoices, CustomerId::new()).unwrap(), 1);
    }

    #[test]
    fn issue_sets_issued_status() {
        let doc = empty_invoice(CustomerId::new(), 1, 0, InvoiceStatus::Issued);
        assert_eq!(doc.status, InvoiceStatus::Issued);
        assert!(doc.lines.is_empty());
        assert!(doc.run_ids().is_empty());
    }

    #[test]
    fn lifecycle_allows_pay_and_cancel_from_issued_only() {
        let mut doc = empty_invoice(CustomerId::new(), 1, 10, InvoiceStatus::Issued);
        assert!(!doc.transition(InvoiceStatus::Issued, test_time()).unwrap());

        let err = doc.transition(InvoiceStatus::Draft, test_time()).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));

        assert!(doc.transition(InvoiceStatus::Paid, test_time()).unwrap());
        let err = doc.transition(InvoiceStatus::Cancelled, test_time()).unwrap_err();
        match err {
            DomainError::InvariantViolation(msg) if msg.contains("can no longer change status") => {}
            _ => panic!("Expected InvariantViolation for changing paid invoice"),
        }
        assert_eq!(doc.status, InvoiceStatus::Paid);
    }

    #[test]
    fn receivables_and_collected_split_by_status() {
        let c = CustomerId::new();
        let invoices = vec![
            empty_invoice(c, 1, 100, InvoiceStatus::Issued),
            empty_invoice(c, 2, 50, InvoiceStatus::Issued),
            empty_invoice(c, 3, 70, InvoiceStatus::Paid),
            empty_invoice(c, 4, 999, InvoiceStatus::Cancelled),
        ];

        assert_eq!(receivables(&invoices), Decimal::from(150));
        assert_eq!(collected(&invoices), Decimal::from(70));
    }
}
