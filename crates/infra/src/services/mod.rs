//! Application services over the pure domain crates.
//!
//! Each service owns the collections it writes and composes the domain
//! functions; none of them keeps state outside the injected stores.

pub mod customers;
pub mod invoicing;
pub mod ledger;
pub mod notifier;
pub mod orders;
pub mod pricing;

use std::sync::Arc;

use printworks_orders::{Catalog, UserDirectory};

pub use customers::CustomerDirectory;
pub use invoicing::{CreateInvoice, DraftRequest, InvoiceAggregator, InvoiceSummary};
pub use ledger::ProductionLedger;
pub use notifier::{NotifyError, OrderNotifier, TracingNotifier};
pub use orders::{OrderEngine, WEB_ORDER_MACHINE};
pub use pricing::PricingResolver;

use crate::store::Stores;

/// All services wired over one set of stores.
#[derive(Clone)]
pub struct Services {
    pub customers: Arc<CustomerDirectory>,
    pub pricing: Arc<PricingResolver>,
    pub ledger: Arc<ProductionLedger>,
    pub orders: Arc<OrderEngine>,
    pub invoicing: Arc<InvoiceAggregator>,
}

impl Services {
    pub fn new(
        stores: Stores,
        catalog: Arc<dyn Catalog>,
        users: Arc<dyn UserDirectory>,
        notifier: Arc<dyn OrderNotifier>,
    ) -> Self {
        let customers = Arc::new(CustomerDirectory::new(
            stores.customers.clone(),
            stores.pricing_rules.clone(),
            stores.runs.clone(),
            stores.invoices.clone(),
        ));
        let pricing = Arc::new(PricingResolver::new(
            stores.pricing_rules.clone(),
            stores.customers.clone(),
        ));
        let ledger = Arc::new(ProductionLedger::new(stores.runs.clone(), stores.customers.clone()));
        let orders = Arc::new(OrderEngine::new(
            stores.orders.clone(),
            ledger.clone(),
            customers.clone(),
            catalog,
            users,
            notifier,
        ));
        let invoicing = Arc::new(InvoiceAggregator::new(
            stores.invoices.clone(),
            stores.customers.clone(),
            ledger.clone(),
            pricing.clone(),
        ));

        Self {
            customers,
            pricing,
            ledger,
            orders,
            invoicing,
        }
    }
}
