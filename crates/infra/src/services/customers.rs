use std::sync::Arc;

use chrono::Utc;

use printworks_core::{CustomerId, DomainError};
use printworks_customers::{find_by_name, CustomerEntity, CustomerUpdate, NewCustomer};
use printworks_invoicing::InvoiceDocument;
use printworks_pricing::PricingRule;
use printworks_production::ProductionRun;

use crate::error::ServiceResult;
use crate::store::Collection;

/// Customer administration and name matching.
pub struct CustomerDirectory {
    customers: Arc<dyn Collection<CustomerEntity>>,
    pricing_rules: Arc<dyn Collection<PricingRule>>,
    runs: Arc<dyn Collection<ProductionRun>>,
    invoices: Arc<dyn Collection<InvoiceDocument>>,
}

impl CustomerDirectory {
    pub fn new(
        customers: Arc<dyn Collection<CustomerEntity>>,
        pricing_rules: Arc<dyn Collection<PricingRule>>,
        runs: Arc<dyn Collection<ProductionRun>>,
        invoices: Arc<dyn Collection<InvoiceDocument>>,
    ) -> Self {
        Self {
            customers,
            pricing_rules,
            runs,
            invoices,
        }
    }

    pub fn create(&self, input: NewCustomer) -> ServiceResult<CustomerEntity> {
        let customer = CustomerEntity::register(CustomerId::new(), input, Utc::now())?;
        self.customers.insert(customer.clone())?;
        tracing::info!(customer_id = %customer.id, name = %customer.name, "customer created");
        Ok(customer)
    }

    pub fn get(&self, id: CustomerId) -> ServiceResult<Option<CustomerEntity>> {
        Ok(self.customers.get(&id)?)
    }

    pub fn list(&self) -> ServiceResult<Vec<CustomerEntity>> {
        Ok(self.customers.snapshot()?)
    }

    /// Returns `None` when the customer does not exist.
    pub fn update(&self, id: CustomerId, update: CustomerUpdate) -> ServiceResult<Option<CustomerEntity>> {
        let mut outcome: Option<Result<CustomerEntity, DomainError>> = None;
        let mut update = Some(update);

        self.customers.modify(&mut |records| {
            let (Some(customer), Some(update)) = (records.iter_mut().find(|c| c.id == id), update.take()) else {
                return false;
            };
            match customer.apply_update(update, Utc::now()) {
                Ok(()) => {
                    outcome = Some(Ok(customer.clone()));
                    true
                }
                Err(e) => {
                    outcome = Some(Err(e));
                    false
                }
            }
        })?;

        match outcome {
            Some(Ok(customer)) => {
                tracing::info!(customer_id = %id, "customer updated");
                Ok(Some(customer))
            }
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    /// Delete a customer and its pricing rules.
    ///
    /// Refused with a conflict while any run or invoice references the customer.
    pub fn delete(&self, id: CustomerId) -> ServiceResult<bool> {
        let run_refs = self.runs.snapshot()?.iter().filter(|r| r.customer_id == id).count();
        let invoice_refs = self
            .invoices
            .snapshot()?
            .iter()
            .filter(|i| i.customer_id == id)
            .count();
        if run_refs > 0 || invoice_refs > 0 {
            return Err(DomainError::conflict(format!(
                "customer {id} is referenced by {run_refs} runs and {invoice_refs} invoices"
            ))
            .into());
        }

        if self.customers.remove(&id)?.is_none() {
            return Ok(false);
        }
        self.pricing_rules.modify(&mut |rules| {
            let before = rules.len();
            rules.retain(|r| r.customer_id != id);
            rules.len() != before
        })?;

        tracing::info!(customer_id = %id, "customer deleted");
        Ok(true)
    }

    /// Match by display name first, then alias.
    pub fn find_by_name(&self, raw: &str) -> ServiceResult<Option<CustomerEntity>> {
        let customers = self.customers.snapshot()?;
        Ok(find_by_name(&customers, raw).cloned())
    }

    /// The reserved web-orders customer, created on first use.
    pub fn ensure_web_orders_customer(&self) -> ServiceResult<CustomerEntity> {
        let mut found: Option<CustomerEntity> = None;

        self.customers.modify(&mut |records| {
            if let Some(existing) = records.iter().find(|c| c.is_web_orders()) {
                found = Some(existing.clone());
                return false;
            }
            let created = CustomerEntity::web_orders(Utc::now());
            found = Some(created.clone());
            records.push(created);
            true
        })?;

        found.ok_or_else(|| DomainError::invariant("web orders customer could not be resolved").into())
    }
}
