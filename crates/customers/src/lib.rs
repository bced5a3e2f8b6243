//! Customers domain module (billing-side customer entities).
//!
//! A customer entity is the aggregation root for production runs and invoices. It is
//! distinct from a web-shop user account. This crate is pure domain logic (no IO).

pub mod customer;

pub use customer::{
    find_by_name, ContactInfo, CustomerEntity, CustomerUpdate, NewCustomer,
    WEB_ORDERS_CUSTOMER_ID, WEB_ORDERS_CUSTOMER_NAME,
};
