use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use printworks_core::{CustomerId, DomainError, DomainResult, InvoiceId};
use printworks_customers::CustomerEntity;
use printworks_invoicing::{
    build_draft, collected, next_bill_number, receivables, resolve_rates, InvoiceDocument, InvoiceDraft,
    InvoiceStatus,
};
use printworks_production::RunFilter;

use crate::error::{ServiceError, ServiceResult};
use crate::services::ledger::ProductionLedger;
use crate::services::pricing::PricingResolver;
use crate::store::Collection;

/// Parameters for computing an invoice over a customer's approved runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftRequest {
    pub customer_id: CustomerId,
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
    /// Overrides the customer's default discount.
    #[serde(default)]
    pub discount_pct: Option<Decimal>,
    #[serde(default)]
    pub vat_pct: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateInvoice {
    #[serde(flatten)]
    pub draft: DraftRequest,
    #[serde(default)]
    pub notes: String,
}

/// Outstanding vs. collected amounts across all invoices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceSummary {
    pub receivables: Decimal,
    pub collected: Decimal,
}

/// Turns approved runs into invoices and keeps run status in step.
pub struct InvoiceAggregator {
    invoices: Arc<dyn Collection<InvoiceDocument>>,
    customers: Arc<dyn Collection<CustomerEntity>>,
    ledger: Arc<ProductionLedger>,
    pricing: Arc<PricingResolver>,
}

impl InvoiceAggregator {
    pub fn new(
        invoices: Arc<dyn Collection<InvoiceDocument>>,
        customers: Arc<dyn Collection<CustomerEntity>>,
        ledger: Arc<ProductionLedger>,
        pricing: Arc<PricingResolver>,
    ) -> Self {
        Self {
            invoices,
            customers,
            ledger,
            pricing,
        }
    }

    /// Compute, without persisting, the invoice for a customer's approved runs.
    pub fn build_draft(&self, req: &DraftRequest) -> ServiceResult<InvoiceDraft> {
        let customer = self.customer(req.customer_id)?;
        self.draft_for(&customer, req)
    }

    /// Persist an issued invoice and mark its runs invoiced.
    ///
    /// If any run stopped being approved in the meantime, the invoice is removed
    /// again and the conflict is returned.
    pub fn create_invoice(&self, input: CreateInvoice) -> ServiceResult<InvoiceDocument> {
        let customer = self.customer(input.draft.customer_id)?;
        let draft = self.draft_for(&customer, &input.draft)?;

        let invoice_id = InvoiceId::new();
        let mut created: Option<DomainResult<InvoiceDocument>> = None;
        let mut draft = Some(draft);
        self.invoices.modify(&mut |docs| {
            let Some(draft) = draft.take() else {
                return false;
            };
            let bill_number = match next_bill_number(docs.iter(), customer.id) {
                Ok(n) => n,
                Err(e) => {
                    created = Some(Err(e));
                    return false;
                }
            };
            let doc = InvoiceDocument::issue(invoice_id, bill_number, &customer.name, draft, &input.notes, Utc::now());
            created = Some(Ok(doc.clone()));
            docs.push(doc);
            true
        })?;
        let invoice = created.ok_or_else(|| DomainError::invariant("invoice was not stored"))??;

        let run_ids = invoice.run_ids();
        if let Err(e) = self.ledger.mark_invoiced(&run_ids, invoice.id) {
            tracing::warn!(invoice_id = %invoice.id, error = %e, "marking runs failed; removing invoice");
            self.invoices.remove(&invoice.id)?;
            return Err(e);
        }

        tracing::info!(
            invoice_id = %invoice.id,
            customer_id = %invoice.customer_id,
            bill_number = invoice.bill_number,
            lines = invoice.lines.len(),
            runs = run_ids.len(),
            total = %invoice.total,
            "invoice created"
        );
        Ok(invoice)
    }

    /// Move an invoice through its lifecycle. `None` when it does not exist.
    pub fn update_status(&self, id: InvoiceId, status: InvoiceStatus) -> ServiceResult<Option<InvoiceDocument>> {
        let mut outcome = None;
        self.invoices.modify(&mut |docs| {
            let Some(doc) = docs.iter_mut().find(|d| d.id == id) else {
                return false;
            };
            let result = doc.transition(status, Utc::now()).map(|changed| (doc.clone(), changed));
            let changed = matches!(result, Ok((_, true)));
            outcome = Some(result);
            changed
        })?;

        match outcome {
            Some(Ok((doc, changed))) => {
                if changed {
                    tracing::info!(invoice_id = %id, status = ?status, "invoice status changed");
                }
                Ok(Some(doc))
            }
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    /// Delete an invoice and return its runs to `Approved`.
    ///
    /// If the runs cannot be released the invoice is stored again and the error
    /// is returned.
    pub fn delete_invoice(&self, id: InvoiceId) -> ServiceResult<bool> {
        let Some(doc) = self.invoices.remove(&id)? else {
            return Ok(false);
        };
        let released = match self.ledger.release_invoice(doc.id) {
            Ok(released) => released,
            Err(e) => {
                tracing::warn!(invoice_id = %id, error = %e, "releasing runs failed; restoring invoice");
                self.invoices.insert(doc)?;
                return Err(e);
            }
        };
        tracing::info!(invoice_id = %id, bill_number = doc.bill_number, released, "invoice deleted");
        Ok(true)
    }

    pub fn get(&self, id: InvoiceId) -> ServiceResult<Option<InvoiceDocument>> {
        Ok(self.invoices.get(&id)?)
    }

    pub fn list(&self) -> ServiceResult<Vec<InvoiceDocument>> {
        Ok(self.invoices.snapshot()?)
    }

    pub fn list_for_customer(&self, customer_id: CustomerId) -> ServiceResult<Vec<InvoiceDocument>> {
        Ok(self
            .invoices
            .snapshot()?
            .into_iter()
            .filter(|d| d.customer_id == customer_id)
            .collect())
    }

    pub fn summary(&self) -> ServiceResult<InvoiceSummary> {
        let docs = self.invoices.snapshot()?;
        Ok(InvoiceSummary {
            receivables: receivables(&docs),
            collected: collected(&docs),
        })
    }

    fn customer(&self, id: CustomerId) -> ServiceResult<CustomerEntity> {
        self.customers.get(&id)?.ok_or_else(ServiceError::not_found)
    }

    fn draft_for(&self, customer: &CustomerEntity, req: &DraftRequest) -> ServiceResult<InvoiceDraft> {
        if let (Some(from), Some(to)) = (req.from, req.to) {
            if from > to {
                return Err(DomainError::validation("period start is after period end").into());
            }
        }

        let runs = self
            .ledger
            .approvable(RunFilter::for_customer(customer.id, req.from, req.to))?;
        let (discount_pct, vat_pct) = resolve_rates(req.discount_pct, customer.default_discount_pct, req.vat_pct)?;
        let price_for = self.pricing.price_table(customer.id)?;

        let draft = build_draft(customer.id, req.from, req.to, &runs, discount_pct, vat_pct, price_for)?;
        tracing::debug!(
            customer_id = %customer.id,
            runs = runs.len(),
            lines = draft.lines.len(),
            total = %draft.total,
            "invoice draft computed"
        );
        Ok(draft)
    }
}
