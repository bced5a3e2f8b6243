//! Invoicing domain module.
//!
//! Turns approved production runs into priced invoice documents: grouping by
//! design and fabric, discount and VAT arithmetic, bill numbering, and the invoice
//! status lifecycle. Implemented purely as deterministic domain logic (no IO).

pub mod draft;
pub mod invoice;

pub use draft::{build_draft, resolve_rates, InvoiceDraft, DEFAULT_DISCOUNT_PCT, DEFAULT_VAT_PCT};
pub use invoice::{collected, next_bill_number, receivables, InvoiceDocument, InvoiceLineItem, InvoiceStatus};
