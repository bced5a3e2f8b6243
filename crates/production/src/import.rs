//! Validation of spreadsheet rows before bulk import.
//!
//! Parsing the spreadsheet itself happens elsewhere; rows arrive here as raw
//! strings. Each row either becomes a [`NewRun`] or a [`RejectedRow`] with a
//! reason, so operators can see which lines were dropped.

use chrono::NaiveDate;
use core::str::FromStr;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use printworks_core::{CustomerId, RunId};

use crate::run::{BillingStatus, NewRun};

/// One spreadsheet row, already split into columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRow {
    pub date: String,
    #[serde(default)]
    pub machine: Option<String>,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub design_ref: String,
    #[serde(default)]
    pub fabric: String,
    pub meters: String,
    #[serde(default)]
    pub notes: String,
}

/// Caller-chosen defaults applied to every imported row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOptions {
    /// Status assigned to imported runs (historical backfill is often `Approved`).
    pub status: BillingStatus,
    /// Customer used when a row's customer name does not match anyone.
    pub default_customer: Option<CustomerId>,
    /// Machine used when a row has none.
    pub default_machine: String,
}

/// A row that was not imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRow {
    /// 1-based position in the submitted batch.
    pub row: usize,
    pub reason: String,
}

/// Outcome of a bulk import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub imported: Vec<RunId>,
    pub rejected: Vec<RejectedRow>,
}

/// Rows split into importable runs and rejections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreparedImport {
    pub accepted: Vec<NewRun>,
    pub rejected: Vec<RejectedRow>,
}

/// Validate `rows` against `options`.
///
/// `lookup_customer` maps a free-text customer name to a customer id (by name or
/// alias); unmatched or missing names fall back to `options.default_customer`.
pub fn prepare_import<F>(rows: Vec<ImportRow>, options: &ImportOptions, lookup_customer: F) -> PreparedImport
where
    F: Fn(&str) -> Option<CustomerId>,
{
    let mut out = PreparedImport::default();

    if options.status == BillingStatus::Invoiced {
        out.rejected = (1..=rows.len())
            .map(|row| RejectedRow {
                row,
                reason: "runs cannot be imported as invoiced".to_string(),
            })
            .collect();
        return out;
    }

    for (idx, row) in rows.into_iter().enumerate() {
        match prepare_row(row, options, &lookup_customer) {
            Ok(run) => out.accepted.push(run),
            Err(reason) => out.rejected.push(RejectedRow { row: idx + 1, reason }),
        }
    }
    out
}

fn prepare_row<F>(row: ImportRow, options: &ImportOptions, lookup_customer: &F) -> Result<NewRun, String>
where
    F: Fn(&str) -> Option<CustomerId>,
{
    let meters = Decimal::from_str(row.meters.trim())
        .map_err(|_| format!("meters '{}' is not a number", row.meters.trim()))?;
    if meters <= Decimal::ZERO {
        return Err(format!("meters must be positive, got {meters}"));
    }

    let date = NaiveDate::parse_from_str(row.date.trim(), "%Y-%m-%d")
        .map_err(|_| format!("date '{}' is not YYYY-MM-DD", row.date.trim()))?;

    let customer_id = row
        .customer
        .as_deref()
        .and_then(lookup_customer)
        .or(options.default_customer)
        .ok_or_else(|| {
            format!(
                "customer '{}' not found and no default customer given",
                row.customer.as_deref().unwrap_or("").trim()
            )
        })?;

    let machine = row
        .machine
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| options.default_machine.clone());

    Ok(NewRun {
        date,
        machine,
        customer_id,
        design_ref: row.design_ref,
        fabric: row.fabric,
        meters,
        notes: row.notes,
        source_order_id: None,
        status: Some(options.status),
    })
}
