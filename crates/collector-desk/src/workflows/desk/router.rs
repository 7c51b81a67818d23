use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};

use super::service::{
    calculation_request, unwrap_payload, CalculationRequestInput, CollectorDeskService,
    DeskServiceError,
};
use crate::workflows::custody::StatusSource;

/// Routes exposing day state, navigation gating and request building.
pub fn desk_router<S>(service: Arc<CollectorDeskService<S>>) -> Router
where
    S: StatusSource + 'static,
{
    Router::new()
        .route(
            "/api/v1/collectors/:collector_id/day-state",
            get(day_state_handler::<S>),
        )
        .route(
            "/api/v1/collectors/:collector_id/gate/:destination",
            get(gate_handler::<S>),
        )
        .route("/api/v1/calculations/request", post(calculation_handler))
        .route("/api/v1/payloads/unwrap", post(unwrap_handler))
        .with_state(service)
}

pub(crate) async fn day_state_handler<S>(
    State(service): State<Arc<CollectorDeskService<S>>>,
    Path(collector_id): Path<String>,
) -> Response
where
    S: StatusSource + 'static,
{
    match service.day_state(&collector_id).await {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn gate_handler<S>(
    State(service): State<Arc<CollectorDeskService<S>>>,
    Path((collector_id, destination)): Path<(String, String)>,
) -> Response
where
    S: StatusSource + 'static,
{
    match service.gate_decision(&collector_id, &destination).await {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn calculation_handler(
    axum::Json(input): axum::Json<CalculationRequestInput>,
) -> Response {
    match calculation_request(input, Utc::now()) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn unwrap_handler(axum::Json(body): axum::Json<Value>) -> Response {
    (StatusCode::OK, axum::Json(unwrap_payload(body))).into_response()
}

fn error_response(err: DeskServiceError) -> Response {
    let status = match err {
        DeskServiceError::UnknownDestination(_) => StatusCode::NOT_FOUND,
        DeskServiceError::InvalidCollector | DeskServiceError::InvalidApplication => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    };
    let payload = json!({
        "error": err.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
