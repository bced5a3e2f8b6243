//! Web-shop orders domain module.
//!
//! Order pricing, the creation-time status decision table, and the production-run
//! labels derived from an order. Catalog data is consumed through the
//! [`catalog::Catalog`] trait. Pure domain logic (no IO).

pub mod catalog;
pub mod derive;
pub mod order;
pub mod pricing;

pub use catalog::{
    Catalog, CatalogSeed, FactoryFabric, InMemoryCatalog, InMemoryUserDirectory, LibraryDesign, Preset,
    UserContact, UserDirectory,
};
pub use derive::{derived_design_ref, derived_fabric_label, UNKNOWN_DESIGN, UNKNOWN_FABRIC};
pub use order::{
    initial_statuses, CustomerType, DesignChoice, FabricChoice, FabricSource, FabricType,
    InvoiceStub, Order, OrderItem, OrderItemRequest, OrderStatus, PaymentMethod, PlaceOrder,
    StubStatus,
};
pub use pricing::{
    unit_price, DEFAULT_TIER, NATURAL_SURCHARGE, REPEAT_TIER, SYNTHETIC_SURCHARGE, UPLOAD_TIER,
};
