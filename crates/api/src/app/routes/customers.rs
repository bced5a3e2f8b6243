use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};

use printworks_core::{CustomerId, PricingRuleId};
use printworks_customers::{CustomerUpdate, NewCustomer};
use printworks_pricing::NewPricingRule;

use crate::app::dto;
use crate::app::routes::common::{blocking, parse_id, respond, respond_found, respond_removed};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route(
            "/:id",
            get(get_customer).patch(update_customer).delete(delete_customer),
        )
        .route("/:id/rules", get(list_rules).post(add_rule))
        .route("/:id/rules/:rule_id", delete(remove_rule))
        .route("/:id/price", get(lookup_price))
}

pub async fn create_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<NewCustomer>,
) -> axum::response::Response {
    blocking(services, move |svc| respond(StatusCode::CREATED, svc.customers.create(body))).await
}

pub async fn list_customers(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::CustomerListQuery>,
) -> axum::response::Response {
    blocking(services, move |svc| {
        let result = match query.name.as_deref() {
            Some(name) => svc
                .customers
                .find_by_name(name)
                .map(|found| found.into_iter().collect::<Vec<_>>()),
            None => svc.customers.list(),
        };
        respond(StatusCode::OK, result.map(dto::ItemsResponse::from))
    })
    .await
}

pub async fn get_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CustomerId = match parse_id(&id, "customer") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    blocking(services, move |svc| respond_found("customer", svc.customers.get(id))).await
}

pub async fn update_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<CustomerUpdate>,
) -> axum::response::Response {
    let id: CustomerId = match parse_id(&id, "customer") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    blocking(services, move |svc| respond_found("customer", svc.customers.update(id, body))).await
}

pub async fn delete_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CustomerId = match parse_id(&id, "customer") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    blocking(services, move |svc| respond_removed("customer", svc.customers.delete(id))).await
}

pub async fn list_rules(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CustomerId = match parse_id(&id, "customer") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    blocking(services, move |svc| {
        respond(StatusCode::OK, svc.pricing.rules_for(id).map(dto::ItemsResponse::from))
    })
    .await
}

pub async fn add_rule(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::AddRuleRequest>,
) -> axum::response::Response {
    let customer_id: CustomerId = match parse_id(&id, "customer") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let input = NewPricingRule {
        customer_id,
        fabric: body.fabric,
        design: body.design,
        price_per_meter: body.price_per_meter,
    };
    blocking(services, move |svc| respond(StatusCode::CREATED, svc.pricing.add_rule(input))).await
}

pub async fn remove_rule(
    Extension(services): Extension<Arc<AppServices>>,
    Path((customer, rule_id)): Path<(String, String)>,
) -> axum::response::Response {
    let customer_id: CustomerId = match parse_id(&customer, "customer") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let rule_id: PricingRuleId = match parse_id(&rule_id, "pricing rule") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    blocking(services, move |svc| {
        respond_removed("pricing rule", svc.pricing.remove_rule(customer_id, rule_id))
    })
    .await
}

/// Resolved price per meter for one fabric/design pair, with the rule tier that won.
pub async fn lookup_price(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Query(query): Query<dto::PriceQuery>,
) -> axum::response::Response {
    let id: CustomerId = match parse_id(&id, "customer") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    blocking(services, move |svc| {
        respond(StatusCode::OK, svc.pricing.resolve(id, &query.fabric, &query.design))
    })
    .await
}
