use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use printworks_core::{CustomerId, DomainError, InvoiceId, OrderId, RunId};
use printworks_customers::{find_by_name, CustomerEntity};
use printworks_production::{
    prepare_import, total_meters, BillingStatus, ImportOptions, ImportReport, ImportRow, NewRun,
    ProductionRun, RunFilter, RunPatch,
};

use crate::error::{ServiceError, ServiceResult};
use crate::store::Collection;

/// Production run ledger: manual entry, import, approval, and invoicing write-back.
pub struct ProductionLedger {
    runs: Arc<dyn Collection<ProductionRun>>,
    customers: Arc<dyn Collection<CustomerEntity>>,
}

impl ProductionLedger {
    pub fn new(runs: Arc<dyn Collection<ProductionRun>>, customers: Arc<dyn Collection<CustomerEntity>>) -> Self {
        Self { runs, customers }
    }

    pub fn create(&self, input: NewRun) -> ServiceResult<ProductionRun> {
        if self.customers.get(&input.customer_id)?.is_none() {
            return Err(DomainError::validation(format!("unknown customer {}", input.customer_id)).into());
        }
        let run = ProductionRun::record(RunId::new(), input, Utc::now())?;
        self.runs.insert(run.clone())?;
        tracing::info!(
            run_id = %run.id,
            customer_id = %run.customer_id,
            meters = %run.meters,
            status = ?run.billing_status,
            "production run recorded"
        );
        Ok(run)
    }

    /// Patch a draft run. `None` when the run does not exist.
    pub fn update(&self, id: RunId, patch: RunPatch) -> ServiceResult<Option<ProductionRun>> {
        if let Some(customer_id) = patch.customer_id {
            if self.customers.get(&customer_id)?.is_none() {
                return Err(DomainError::validation(format!("unknown customer {customer_id}")).into());
            }
        }

        let mut outcome: Option<Result<ProductionRun, DomainError>> = None;
        let mut patch = Some(patch);
        self.runs.modify(&mut |runs| {
            let (Some(run), Some(patch)) = (runs.iter_mut().find(|r| r.id == id), patch.take()) else {
                return false;
            };
            let result = run.apply_patch(patch, Utc::now()).map(|()| run.clone());
            let changed = result.is_ok();
            outcome = Some(result);
            changed
        })?;

        match outcome {
            Some(Ok(run)) => {
                tracing::info!(run_id = %id, "production run updated");
                Ok(Some(run))
            }
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    /// Delete a draft run. `false` when the run does not exist.
    pub fn delete(&self, id: RunId) -> ServiceResult<bool> {
        let mut outcome: Result<bool, DomainError> = Ok(false);
        self.runs.modify(&mut |runs| {
            let Some(idx) = runs.iter().position(|r| r.id == id) else {
                return false;
            };
            if !runs[idx].is_modifiable() {
                outcome = Err(DomainError::invariant(
                    "cannot delete run once it is approved or invoiced",
                ));
                return false;
            }
            runs.remove(idx);
            outcome = Ok(true);
            true
        })?;

        let deleted = outcome?;
        if deleted {
            tracing::info!(run_id = %id, "production run deleted");
        }
        Ok(deleted)
    }

    /// Approve draft runs. Unknown and non-draft ids are skipped.
    /// Returns the ids actually approved.
    pub fn approve_runs(&self, ids: &[RunId]) -> ServiceResult<Vec<RunId>> {
        let wanted: HashSet<RunId> = ids.iter().copied().collect();
        let mut approved = Vec::new();
        self.runs.modify(&mut |runs| {
            let now = Utc::now();
            approved = runs
                .iter_mut()
                .filter(|r| wanted.contains(&r.id))
                .filter_map(|r| r.approve(now).then_some(r.id))
                .collect();
            !approved.is_empty()
        })?;

        tracing::info!(requested = ids.len(), approved = approved.len(), "runs approved");
        Ok(approved)
    }

    /// Stamp runs as invoiced. All-or-nothing: a conflict is returned and nothing
    /// changes if any id is unknown or not currently approved.
    pub fn mark_invoiced(&self, ids: &[RunId], invoice_id: InvoiceId) -> ServiceResult<()> {
        let mut outcome: Result<(), DomainError> = Ok(());
        self.runs.modify(&mut |runs| {
            let now = Utc::now();
            for id in ids {
                let Some(run) = runs.iter_mut().find(|r| r.id == *id) else {
                    outcome = Err(DomainError::conflict(format!("run {id} no longer exists")));
                    return false;
                };
                if let Err(e) = run.mark_invoiced(invoice_id, now) {
                    outcome = Err(e);
                    return false;
                }
            }
            !ids.is_empty()
        })?;

        outcome?;
        tracing::info!(invoice_id = %invoice_id, runs = ids.len(), "runs marked invoiced");
        Ok(())
    }

    /// Return the runs of a deleted invoice to `Approved`. Returns how many changed.
    pub fn release_invoice(&self, invoice_id: InvoiceId) -> ServiceResult<usize> {
        let mut released = 0;
        self.runs.modify(&mut |runs| {
            let now = Utc::now();
            released = runs
                .iter_mut()
                .map(|r| r.release(invoice_id, now))
                .filter(|changed| *changed)
                .count();
            released > 0
        })?;

        tracing::info!(invoice_id = %invoice_id, released, "runs released from invoice");
        Ok(released)
    }

    /// Validate and write a batch of spreadsheet rows in one pass.
    pub fn import_runs(&self, rows: Vec<ImportRow>, options: ImportOptions) -> ServiceResult<ImportReport> {
        if let Some(default_customer) = options.default_customer {
            if self.customers.get(&default_customer)?.is_none() {
                return Err(DomainError::validation(format!(
                    "unknown default customer {default_customer}"
                ))
                .into());
            }
        }

        let customers = self.customers.snapshot()?;
        let total = rows.len();
        let prepared = prepare_import(rows, &options, |name| find_by_name(&customers, name).map(|c| c.id));

        let now = Utc::now();
        let mut accepted = Vec::with_capacity(prepared.accepted.len());
        for input in prepared.accepted {
            accepted.push(ProductionRun::record(RunId::new(), input, now)?);
        }
        let imported: Vec<RunId> = accepted.iter().map(|r| r.id).collect();

        let mut batch = Some(accepted);
        self.runs.modify(&mut |runs| match batch.take() {
            Some(batch) if !batch.is_empty() => {
                runs.extend(batch);
                true
            }
            _ => false,
        })?;

        for rejected in &prepared.rejected {
            tracing::warn!(row = rejected.row, reason = %rejected.reason, "import row rejected");
        }
        tracing::info!(
            rows = total,
            imported = imported.len(),
            rejected = prepared.rejected.len(),
            status = ?options.status,
            "runs imported"
        );

        Ok(ImportReport {
            imported,
            rejected: prepared.rejected,
        })
    }

    /// Insert a run for `order_id` unless one already exists.
    /// Returns the run and whether it was created.
    pub fn upsert_from_order(&self, order_id: OrderId, input: NewRun) -> ServiceResult<(ProductionRun, bool)> {
        let mut input = Some(NewRun {
            source_order_id: Some(order_id),
            ..input
        });
        let mut outcome: Option<Result<(ProductionRun, bool), DomainError>> = None;

        self.runs.modify(&mut |runs| {
            if let Some(existing) = runs.iter().find(|r| r.source_order_id == Some(order_id)) {
                outcome = Some(Ok((existing.clone(), false)));
                return false;
            }
            let Some(input) = input.take() else {
                return false;
            };
            match ProductionRun::record(RunId::new(), input, Utc::now()) {
                Ok(run) => {
                    runs.push(run.clone());
                    outcome = Some(Ok((run, true)));
                    true
                }
                Err(e) => {
                    outcome = Some(Err(e));
                    false
                }
            }
        })?;

        let (run, created) = outcome.ok_or_else(ServiceError::not_found)??;
        if created {
            tracing::info!(run_id = %run.id, order_id = %order_id, "run derived from order");
        } else {
            tracing::debug!(run_id = %run.id, order_id = %order_id, "run for order already exists");
        }
        Ok((run, created))
    }

    /// Remove every run regardless of status. Returns the removed count.
    pub fn clear_all(&self) -> ServiceResult<usize> {
        let mut removed = 0;
        self.runs.modify(&mut |runs| {
            removed = runs.len();
            runs.clear();
            removed > 0
        })?;
        tracing::warn!(removed, "all production runs cleared");
        Ok(removed)
    }

    pub fn get(&self, id: RunId) -> ServiceResult<Option<ProductionRun>> {
        Ok(self.runs.get(&id)?)
    }

    pub fn list(&self) -> ServiceResult<Vec<ProductionRun>> {
        Ok(self.runs.snapshot()?)
    }

    pub fn list_by_customer(&self, customer_id: CustomerId) -> ServiceResult<Vec<ProductionRun>> {
        self.list_where(|r| r.customer_id == customer_id)
    }

    pub fn list_by_status(&self, status: BillingStatus) -> ServiceResult<Vec<ProductionRun>> {
        self.list_where(|r| r.billing_status == status)
    }

    /// Approved runs matching the filter (inclusive dates).
    pub fn approvable(&self, filter: RunFilter) -> ServiceResult<Vec<ProductionRun>> {
        self.list_where(|r| filter.matches_approvable(r))
    }

    /// Meters printed for a customer in an optional date range, any status.
    pub fn total_meters(
        &self,
        customer_id: CustomerId,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> ServiceResult<Decimal> {
        let range = RunFilter::for_customer(customer_id, from, to);
        let runs = self.list_where(|r| r.customer_id == customer_id && range.in_range(r.date))?;
        Ok(total_meters(&runs))
    }

    /// Meters already billed to a customer.
    pub fn invoiced_meters(&self, customer_id: CustomerId) -> ServiceResult<Decimal> {
        let runs = self.list_where(|r| r.customer_id == customer_id && r.billing_status == BillingStatus::Invoiced)?;
        Ok(total_meters(&runs))
    }

    fn list_where(&self, keep: impl Fn(&ProductionRun) -> bool) -> ServiceResult<Vec<ProductionRun>> {
        Ok(self.runs.snapshot()?.into_iter().filter(|r| keep(r)).collect())
    }
}
