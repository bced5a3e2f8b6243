//! Record storage boundary.
//!
//! Services read and write whole collections through the [`Collection`] trait,
//! backed either by memory or by one JSON file per collection.

pub mod in_memory;
pub mod json_file;
pub mod r#trait;

use std::path::Path;
use std::sync::Arc;

use printworks_customers::CustomerEntity;
use printworks_invoicing::InvoiceDocument;
use printworks_orders::Order;
use printworks_pricing::PricingRule;
use printworks_production::ProductionRun;

pub use in_memory::InMemoryCollection;
pub use json_file::JsonFileCollection;
pub use r#trait::{Collection, StoreError};

use crate::config::AppConfig;

pub const CUSTOMERS: &str = "customers";
pub const PRICING_RULES: &str = "pricing_rules";
pub const RUNS: &str = "production_runs";
pub const INVOICES: &str = "invoices";
pub const ORDERS: &str = "orders";

/// The five independent collections the services work on.
#[derive(Clone)]
pub struct Stores {
    pub customers: Arc<dyn Collection<CustomerEntity>>,
    pub pricing_rules: Arc<dyn Collection<PricingRule>>,
    pub runs: Arc<dyn Collection<ProductionRun>>,
    pub invoices: Arc<dyn Collection<InvoiceDocument>>,
    pub orders: Arc<dyn Collection<Order>>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            customers: Arc::new(InMemoryCollection::new(CUSTOMERS)),
            pricing_rules: Arc::new(InMemoryCollection::new(PRICING_RULES)),
            runs: Arc::new(InMemoryCollection::new(RUNS)),
            invoices: Arc::new(InMemoryCollection::new(INVOICES)),
            orders: Arc::new(InMemoryCollection::new(ORDERS)),
        }
    }

    /// Open every collection as `<dir>/<collection>.json`.
    pub fn open_dir(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        Ok(Self {
            customers: Arc::new(JsonFileCollection::open(dir, CUSTOMERS)?),
            pricing_rules: Arc::new(JsonFileCollection::open(dir, PRICING_RULES)?),
            runs: Arc::new(JsonFileCollection::open(dir, RUNS)?),
            invoices: Arc::new(JsonFileCollection::open(dir, INVOICES)?),
            orders: Arc::new(JsonFileCollection::open(dir, ORDERS)?),
        })
    }

    /// File-backed when a data directory is configured, otherwise in memory.
    pub fn from_config(config: &AppConfig) -> Result<Self, StoreError> {
        match &config.data_dir {
            Some(dir) => {
                tracing::info!(data_dir = %dir.display(), "using json file stores");
                Self::open_dir(dir)
            }
            None => {
                tracing::warn!("no data directory configured; records are kept in memory only");
                Ok(Self::in_memory())
            }
        }
    }
}
