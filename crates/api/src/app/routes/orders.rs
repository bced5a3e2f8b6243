use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use printworks_core::OrderId;
use printworks_orders::PlaceOrder;

use crate::app::dto;
use crate::app::routes::common::{blocking, parse_id, respond, respond_found};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_orders).post(place_order))
        .route("/:id", get(get_order))
        .route("/:id/repeat", post(repeat_order))
        .route("/:id/status", post(update_order_status))
}

/// Checkout. Every placed order also lands in the production ledger as a draft run.
pub async fn place_order(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<PlaceOrder>,
) -> axum::response::Response {
    blocking(services, move |svc| respond(StatusCode::CREATED, svc.orders.place_order(body))).await
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::OrderListQuery>,
) -> axum::response::Response {
    blocking(services, move |svc| {
        let result = match query.user {
            Some(user_id) => svc.orders.list_for_user(user_id),
            None => svc.orders.list(),
        };
        respond(StatusCode::OK, result.map(dto::ItemsResponse::from))
    })
    .await
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: OrderId = match parse_id(&id, "order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    blocking(services, move |svc| respond_found("order", svc.orders.get(id))).await
}

pub async fn repeat_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::RepeatOrderRequest>,
) -> axum::response::Response {
    let id: OrderId = match parse_id(&id, "order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    blocking(services, move |svc| match svc.orders.repeat_order(id, body.user_id) {
        Ok(Some(order)) => respond(StatusCode::CREATED, Ok(order)),
        other => respond_found("order", other),
    })
    .await
}

pub async fn update_order_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::OrderStatusRequest>,
) -> axum::response::Response {
    let id: OrderId = match parse_id(&id, "order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    blocking(services, move |svc| respond_found("order", svc.orders.update_status(id, body.status))).await
}
