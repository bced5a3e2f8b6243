use std::str::FromStr;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use printworks_infra::ServiceResult;

use crate::app::errors;
use crate::app::services::AppServices;

/// Parse a path id, or build the `400 invalid_id` response naming `what`.
pub fn parse_id<T: FromStr>(raw: &str, what: &str) -> Result<T, axum::response::Response> {
    raw.parse().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid {what} id"))
    })
}

/// Run a service call on the blocking pool. Stores may do synchronous file I/O.
pub async fn blocking<F>(services: Arc<AppServices>, call: F) -> axum::response::Response
where
    F: FnOnce(&AppServices) -> axum::response::Response + Send + 'static,
{
    match tokio::task::spawn_blocking(move || call(&services)).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "service task failed");
            errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "service task failed",
            )
        }
    }
}

/// Map a service result to `status` + JSON body, or to the error response.
pub fn respond<T: Serialize>(status: StatusCode, result: ServiceResult<T>) -> axum::response::Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Like [`respond`] for lookups where `None` means 404.
pub fn respond_found<T: Serialize>(what: &str, result: ServiceResult<Option<T>>) -> axum::response::Response {
    match result {
        Ok(Some(body)) => (StatusCode::OK, Json(body)).into_response(),
        Ok(None) => errors::not_found(what),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// `204` when something was removed, `404` otherwise.
pub fn respond_removed(what: &str, result: ServiceResult<bool>) -> axum::response::Response {
    match result {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => errors::not_found(what),
        Err(e) => errors::service_error_to_response(e),
    }
}
