use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use axum::Json;
use chrono::Utc;
use collector_desk::workflows::calculation::{CalculationPreview, CalculationRequest};
use collector_desk::workflows::custody::StatusSource;
use collector_desk::workflows::desk::{
    calculation_request, desk_router, CalculationRequestInput, CollectorDeskService,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PreviewResponse {
    pub(crate) request: CalculationRequest,
    pub(crate) preview: CalculationPreview,
}

pub(crate) fn with_desk_routes<S>(service: Arc<CollectorDeskService<S>>) -> axum::Router
where
    S: StatusSource + 'static,
{
    desk_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/calculations/preview",
            axum::routing::post(preview_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Builds the request and calls the calculator straight away; the debounce
/// window belongs to the form on the client, not to this endpoint.
pub(crate) async fn preview_endpoint(
    Extension(state): Extension<AppState>,
    Json(input): Json<CalculationRequestInput>,
) -> Response {
    let view = match calculation_request(input, Utc::now()) {
        Ok(view) => view,
        Err(err) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response()
        }
    };
    if !view.valid {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": "amount, term and interest rate must all be positive" })),
        )
            .into_response();
    }

    match state.calculator.calculate(&view.request).await {
        Ok(preview) => (
            StatusCode::OK,
            Json(PreviewResponse {
                request: view.request,
                preview,
            }),
        )
            .into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "calculator preview failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": err.user_message() })),
            )
                .into_response()
        }
    }
}
