use axum::Router;

pub mod common;
pub mod customers;
pub mod invoices;
pub mod orders;
pub mod runs;
pub mod system;

/// Router for all business endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/customers", customers::router())
        .nest("/runs", runs::router())
        .nest("/orders", orders::router())
        .nest("/invoices", invoices::router())
}
