//! Production runs domain module.
//!
//! A production run is one machine/date/customer/design/fabric work entry. This
//! crate owns the billing-status lifecycle (draft → approved → invoiced) and the
//! validation of spreadsheet rows fed into bulk import. Pure domain logic (no IO).

pub mod import;
pub mod run;

pub use import::{prepare_import, ImportOptions, ImportReport, ImportRow, PreparedImport, RejectedRow};
pub use run::{total_meters, BillingStatus, NewRun, ProductionRun, RunFilter, RunPatch};
