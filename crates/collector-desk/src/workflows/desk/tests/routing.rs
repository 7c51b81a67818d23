use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::workflows::custody::{StatusFailurePolicy, CASH_FLOAT_PATH};
use crate::workflows::desk::desk_router;

#[tokio::test]
async fn day_state_reports_pending_handover() {
    let app = desk_router(service(
        FixedSource {
            handover_owner: Some("42"),
            ..FixedSource::default()
        },
        StatusFailurePolicy::FailOpen,
    ));

    let response = app
        .oneshot(get("/api/v1/collectors/42/day-state"))
        .await
        .expect("router responds");
    let body = json_body(response, StatusCode::OK).await;

    assert_eq!(body["snapshot"]["dayState"], json!("pending_confirmation"));
    assert_eq!(body["gate"]["actionsLocked"], json!(true));
    assert_eq!(
        body["gate"]["handoverLabel"],
        json!("Awaiting Cashier Confirmation")
    );
    assert_eq!(body["expectedHandover"], json!(3500.0));
}

#[tokio::test]
async fn gate_redirects_disbursements_to_float_screen() {
    let app = desk_router(service(
        FixedSource {
            floats: 2,
            ..FixedSource::default()
        },
        StatusFailurePolicy::FailOpen,
    ));

    let response = app
        .oneshot(get("/api/v1/collectors/42/gate/disbursements"))
        .await
        .expect("router responds");
    let body = json_body(response, StatusCode::OK).await;

    assert_eq!(body["decision"]["decision"], json!("redirect"));
    assert_eq!(body["decision"]["to"], json!(CASH_FLOAT_PATH));
    assert_eq!(body["decision"]["reason"]["code"], json!("float_pending"));
}

#[tokio::test]
async fn unknown_destination_is_not_found() {
    let app = desk_router(service(FixedSource::default(), StatusFailurePolicy::FailOpen));

    let response = app
        .oneshot(get("/api/v1/collectors/42/gate/reports"))
        .await
        .expect("router responds");
    let body = json_body(response, StatusCode::NOT_FOUND).await;
    assert_eq!(body["error"], json!("unknown destination 'reports'"));
}

#[tokio::test]
async fn encoded_path_characters_in_collector_id_are_unprocessable() {
    let source = FixedSource::default();
    let app = desk_router(service(source.clone(), StatusFailurePolicy::FailOpen));

    let response = app
        .clone()
        .oneshot(get(
            "/api/v1/collectors/..%2F..%2F..%2Fadmin%2Fusers%3F/day-state",
        ))
        .await
        .expect("router responds");
    let body = json_body(response, StatusCode::UNPROCESSABLE_ENTITY).await;
    assert_eq!(
        body["error"],
        json!("collector id must be letters, digits, '-' or '_'")
    );

    let response = app
        .oneshot(get("/api/v1/collectors/42%2Foverdue/gate/visits"))
        .await
        .expect("router responds");
    json_body(response, StatusCode::UNPROCESSABLE_ENTITY).await;
    assert_eq!(source.balance_reads(), 0);
}

#[tokio::test]
async fn calculation_request_applies_overrides() {
    let app = desk_router(service(FixedSource::default(), StatusFailurePolicy::FailOpen));
    let payload = json!({
        "application": {
            "requestedAmount": "10000",
            "requestedTermDays": 30,
            "productInterestRate": 10,
            "productPaymentFrequency": "Weekly",
        },
        "overrides": { "approvedTermDays": 45 }
    });

    let response = app
        .oneshot(post_json("/api/v1/calculations/request", &payload))
        .await
        .expect("router responds");
    let body = json_body(response, StatusCode::OK).await;

    assert_eq!(body["valid"], json!(true));
    assert_eq!(body["termDays"], json!(45));
    assert_eq!(body["request"]["termMonths"], json!(2));
    assert_eq!(body["request"]["paymentFrequency"], json!("weekly"));
    assert_eq!(body["request"]["loanAmount"], json!(10000.0));
}

#[tokio::test]
async fn calculation_request_rejects_non_objects() {
    let app = desk_router(service(FixedSource::default(), StatusFailurePolicy::FailOpen));

    let response = app
        .oneshot(post_json(
            "/api/v1/calculations/request",
            &json!({ "application": [1, 2] }),
        ))
        .await
        .expect("router responds");
    json_body(response, StatusCode::UNPROCESSABLE_ENTITY).await;
}

#[tokio::test]
async fn unwrap_endpoint_reports_shape() {
    let app = desk_router(service(FixedSource::default(), StatusFailurePolicy::FailOpen));

    let response = app
        .oneshot(post_json(
            "/api/v1/payloads/unwrap",
            &json!({ "data": { "items": [{ "id": 1 }] } }),
        ))
        .await
        .expect("router responds");
    let body = json_body(response, StatusCode::OK).await;

    assert_eq!(body["shape"], json!("data.items"));
    assert_eq!(body["count"], json!(1));
}
