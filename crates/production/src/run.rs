use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use printworks_core::{CustomerId, DomainError, DomainResult, Entity, InvoiceId, OrderId, RunId};

/// Billing status lifecycle. Only ever advances `Draft → Approved → Invoiced`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingStatus {
    Draft,
    Approved,
    Invoiced,
}

/// One unit of billable factory work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionRun {
    pub id: RunId,
    pub date: NaiveDate,
    pub machine: String,
    pub customer_id: CustomerId,
    pub design_ref: String,
    pub fabric: String,
    /// Printed length in meters.
    pub meters: Decimal,
    #[serde(default)]
    pub notes: String,
    pub source_order_id: Option<OrderId>,
    pub billing_status: BillingStatus,
    /// Set if and only if `billing_status` is `Invoiced`.
    pub invoice_id: Option<InvoiceId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for ProductionRun {
    type Id = RunId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for recording a run (manual entry, import, or order derivation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRun {
    pub date: NaiveDate,
    pub machine: String,
    pub customer_id: CustomerId,
    pub design_ref: String,
    pub fabric: String,
    pub meters: Decimal,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub source_order_id: Option<OrderId>,
    /// Defaults to `Draft`. Only `Draft` and `Approved` are accepted.
    #[serde(default)]
    pub status: Option<BillingStatus>,
}

/// Partial update of a draft run; `None` keeps the existing value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunPatch {
    pub date: Option<NaiveDate>,
    pub machine: Option<String>,
    pub customer_id: Option<CustomerId>,
    pub design_ref: Option<String>,
    pub fabric: Option<String>,
    pub meters: Option<Decimal>,
    pub notes: Option<String>,
}

impl ProductionRun {
    pub fn record(id: RunId, input: NewRun, now: DateTime<Utc>) -> DomainResult<Self> {
        ensure_positive_meters(input.meters)?;

        let billing_status = input.status.unwrap_or(BillingStatus::Draft);
        if billing_status == BillingStatus::Invoiced {
            return Err(DomainError::validation(
                "runs can only become invoiced through invoice creation",
            ));
        }

        Ok(Self {
            id,
            date: input.date,
            machine: input.machine.trim().to_string(),
            customer_id: input.customer_id,
            design_ref: input.design_ref.trim().to_string(),
            fabric: input.fabric.trim().to_string(),
            meters: input.meters,
            notes: input.notes,
            source_order_id: input.source_order_id,
            billing_status,
            invoice_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_modifiable(&self) -> bool {
        matches!(self.billing_status, BillingStatus::Draft)
    }

    /// Apply a partial update. Only draft runs may change.
    pub fn apply_patch(&mut self, patch: RunPatch, now: DateTime<Utc>) -> DomainResult<()> {
        if !self.is_modifiable() {
            return Err(DomainError::invariant(
                "cannot modify run once it is approved or invoiced",
            ));
        }
        if let Some(meters) = patch.meters {
            ensure_positive_meters(meters)?;
            self.meters = meters;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(machine) = patch.machine {
            self.machine = machine.trim().to_string();
        }
        if let Some(customer_id) = patch.customer_id {
            self.customer_id = customer_id;
        }
        if let Some(design_ref) = patch.design_ref {
            self.design_ref = design_ref.trim().to_string();
        }
        if let Some(fabric) = patch.fabric {
            self.fabric = fabric.trim().to_string();
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Advance `Draft → Approved`. Returns whether the run changed.
    pub fn approve(&mut self, now: DateTime<Utc>) -> bool {
        if self.billing_status != BillingStatus::Draft {
            return false;
        }
        self.billing_status = BillingStatus::Approved;
        self.updated_at = now;
        true
    }

    /// Advance `Approved → Invoiced`, stamping the invoice id.
    pub fn mark_invoiced(&mut self, invoice_id: InvoiceId, now: DateTime<Utc>) -> DomainResult<()> {
        if self.billing_status != BillingStatus::Approved {
            return Err(DomainError::conflict(format!(
                "run {} is {:?}, expected Approved",
                self.id, self.billing_status
            )));
        }
        self.billing_status = BillingStatus::Invoiced;
        self.invoice_id = Some(invoice_id);
        self.updated_at = now;
        Ok(())
    }

    /// Undo invoicing after the owning invoice was deleted. Returns whether the run changed.
    ///
    /// This is the only transition that moves a run backwards.
    pub fn release(&mut self, invoice_id: InvoiceId, now: DateTime<Utc>) -> bool {
        if self.billing_status != BillingStatus::Invoiced || self.invoice_id != Some(invoice_id) {
            return false;
        }
        self.billing_status = BillingStatus::Approved;
        self.invoice_id = None;
        self.updated_at = now;
        true
    }
}

/// Filter for runs eligible for invoicing: status `Approved`, optional customer,
/// inclusive date bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFilter {
    pub customer_id: Option<CustomerId>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl RunFilter {
    pub fn for_customer(customer_id: CustomerId, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self {
            customer_id: Some(customer_id),
            from,
            to,
        }
    }

    pub fn in_range(&self, date: NaiveDate) -> bool {
        self.from.is_none_or(|f| date >= f) && self.to.is_none_or(|t| date <= t)
    }

    pub fn matches_approvable(&self, run: &ProductionRun) -> bool {
        run.billing_status == BillingStatus::Approved
            && self.customer_id.is_none_or(|c| run.customer_id == c)
            && self.in_range(run.date)
    }
}

/// Sum of printed meters, saturating at `Decimal::MAX`.
pub fn total_meters<'a>(runs: impl IntoIterator<Item = &'a ProductionRun>) -> Decimal {
    runs.into_iter()
        .fold(Decimal::ZERO, |acc, r| acc.saturating_add(r.meters))
}

fn ensure_positive_meters(meters: Decimal) -> DomainResult<()> {
    if meters <= Decimal::ZERO {
        return Err(DomainError::validation("meters must be positive"));
    }
    Ok(())
}
