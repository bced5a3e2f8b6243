use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use printworks_core::InvoiceId;
use printworks_infra::services::{CreateInvoice, DraftRequest};

use crate::app::dto;
use crate::app::routes::common::{blocking, parse_id, respond, respond_found, respond_removed};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_invoices).post(create_invoice))
        .route("/draft", post(preview_draft))
        .route("/summary", get(summary))
        .route("/:id", get(get_invoice).delete(delete_invoice))
        .route("/:id/status", post(update_invoice_status))
}

/// Compute an invoice without saving it or touching any run.
pub async fn preview_draft(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<DraftRequest>,
) -> axum::response::Response {
    blocking(services, move |svc| respond(StatusCode::OK, svc.invoicing.build_draft(&body))).await
}

pub async fn create_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<CreateInvoice>,
) -> axum::response::Response {
    blocking(services, move |svc| respond(StatusCode::CREATED, svc.invoicing.create_invoice(body))).await
}

pub async fn list_invoices(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::InvoiceListQuery>,
) -> axum::response::Response {
    blocking(services, move |svc| {
        let result = match query.customer {
            Some(customer_id) => svc.invoicing.list_for_customer(customer_id),
            None => svc.invoicing.list(),
        };
        respond(StatusCode::OK, result.map(dto::ItemsResponse::from))
    })
    .await
}

pub async fn summary(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    blocking(services, |svc| respond(StatusCode::OK, svc.invoicing.summary())).await
}

pub async fn get_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: InvoiceId = match parse_id(&id, "invoice") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    blocking(services, move |svc| respond_found("invoice", svc.invoicing.get(id))).await
}

pub async fn update_invoice_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::InvoiceStatusRequest>,
) -> axum::response::Response {
    let id: InvoiceId = match parse_id(&id, "invoice") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    blocking(services, move |svc| {
        respond_found("invoice", svc.invoicing.update_status(id, body.status))
    })
    .await
}

/// Delete an invoice; its runs go back to approved.
pub async fn delete_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: InvoiceId = match parse_id(&id, "invoice") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    blocking(services, move |svc| respond_removed("invoice", svc.invoicing.delete_invoice(id))).await
}
