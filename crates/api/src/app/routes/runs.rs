use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use printworks_core::{CustomerId, RunId};
use printworks_production::{NewRun, RunFilter, RunPatch};

use crate::app::routes::common::{blocking, parse_id, respond, respond_found, respond_removed};
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_runs).post(create_run).delete(clear_runs))
        .route("/approve", post(approve_runs))
        .route("/approvable", get(list_approvable))
        .route("/import", post(import_runs))
        .route("/totals/:customer", get(meter_totals))
        .route("/:id", get(get_run).patch(update_run).delete(delete_run))
}

pub async fn create_run(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<NewRun>,
) -> axum::response::Response {
    blocking(services, move |svc| respond(StatusCode::CREATED, svc.ledger.create(body))).await
}

pub async fn list_runs(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::RunListQuery>,
) -> axum::response::Response {
    blocking(services, move |svc| {
        let result = match (query.status, query.customer) {
            (Some(status), customer) => svc.ledger.list_by_status(status).map(|runs| {
                runs.into_iter()
                    .filter(|r| customer.is_none_or(|c| r.customer_id == c))
                    .collect::<Vec<_>>()
            }),
            (None, Some(customer)) => svc.ledger.list_by_customer(customer),
            (None, None) => svc.ledger.list(),
        };
        respond(StatusCode::OK, result.map(dto::ItemsResponse::from))
    })
    .await
}

/// Approved runs not yet invoiced, optionally narrowed by customer and dates.
pub async fn list_approvable(
    Extension(services): Extension<Arc<AppServices>>,
    Query(filter): Query<RunFilter>,
) -> axum::response::Response {
    blocking(services, move |svc| {
        respond(StatusCode::OK, svc.ledger.approvable(filter).map(dto::ItemsResponse::from))
    })
    .await
}

pub async fn get_run(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: RunId = match parse_id(&id, "run") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    blocking(services, move |svc| respond_found("run", svc.ledger.get(id))).await
}

pub async fn update_run(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<RunPatch>,
) -> axum::response::Response {
    let id: RunId = match parse_id(&id, "run") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    blocking(services, move |svc| respond_found("run", svc.ledger.update(id, body))).await
}

pub async fn delete_run(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: RunId = match parse_id(&id, "run") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    blocking(services, move |svc| respond_removed("run", svc.ledger.delete(id))).await
}

pub async fn approve_runs(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ApproveRunsRequest>,
) -> axum::response::Response {
    blocking(services, move |svc| {
        respond(
            StatusCode::OK,
            svc.ledger
                .approve_runs(&body.ids)
                .map(|approved| dto::ApproveRunsResponse { approved }),
        )
    })
    .await
}

pub async fn import_runs(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ImportRunsRequest>,
) -> axum::response::Response {
    blocking(services, move |svc| {
        respond(StatusCode::OK, svc.ledger.import_runs(body.rows, body.options))
    })
    .await
}

/// Wipe the whole ledger. Requires `?confirm=true`.
pub async fn clear_runs(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ClearRunsQuery>,
) -> axum::response::Response {
    if !query.confirm {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "confirmation_required",
            "pass confirm=true to delete every production run",
        );
    }
    blocking(services, |svc| match svc.ledger.clear_all() {
        Ok(removed) => (StatusCode::OK, Json(json!({ "removed": removed }))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    })
    .await
}

pub async fn meter_totals(
    Extension(services): Extension<Arc<AppServices>>,
    Path(customer): Path<String>,
    Query(period): Query<dto::PeriodQuery>,
) -> axum::response::Response {
    let customer_id: CustomerId = match parse_id(&customer, "customer") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    blocking(services, move |svc| {
        let totals = svc
            .ledger
            .total_meters(customer_id, period.from, period.to)
            .and_then(|total_meters| {
                Ok(dto::MeterTotalsResponse {
                    customer_id,
                    from: period.from,
                    to: period.to,
                    total_meters,
                    invoiced_meters: svc.ledger.invoiced_meters(customer_id)?,
                })
            });
        respond(StatusCode::OK, totals)
    })
    .await
}
