use axum::http::StatusCode;
use http_body_util::BodyExt;
use manga_reader::{controllers::health::Health, response::ApiResponse};

use crate::{AppStateTest, empty_request, read_body};

#[tokio::test]
async fn health_reports_ok_without_envelope() {
    let test_state = AppStateTest::new(false).await;

    let response = test_state
        .generate_response(empty_request("GET", "/api/health", None))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let health: Health = serde_json::from_slice(&body).unwrap();

    assert_eq!(health.status, "OK");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn unknown_route_is_enveloped_not_found() {
    let test_state = AppStateTest::new(false).await;

    let response = test_state
        .generate_response(empty_request("GET", "/api/unknown", None))
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: ApiResponse<()> = read_body(response).await;
    assert!(!body.success);
    assert_eq!(body.error.as_deref(), Some("Route not found"));
}
