use axum::http::StatusCode;
use chrono::{Duration, Utc};
use manga_reader::{auth::jwt::encode_jwt_at, model::Role, response::ApiResponse};

use crate::{AppStateTest, detached_identity, empty_request, read_body};

#[tokio::test]
async fn should_throw_error_when_request_does_not_contain_header_authorization() {
    let test_state = AppStateTest::new(false).await;

    let response = test_state
        .generate_response(empty_request("GET", "/api/users/profile", None))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: ApiResponse<()> = read_body(response).await;
    assert!(!body.success);
    assert_eq!(body.error.as_deref(), Some("Access denied. No token provided."));
}

#[tokio::test]
async fn should_throw_error_when_auth_header_does_not_contain_bearer() {
    let test_state = AppStateTest::new(false).await;

    let request = axum::http::Request::builder()
        .uri("/api/users/profile")
        .header(axum::http::header::AUTHORIZATION, "Basic random-string")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = test_state.generate_response(request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn should_throw_error_when_jwt_token_is_invalid() {
    let test_state = AppStateTest::new(false).await;

    let response = test_state
        .generate_response(empty_request("GET", "/api/users/stats", Some("random-string")))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: ApiResponse<()> = read_body(response).await;
    assert_eq!(body.error.as_deref(), Some("Invalid token."));
}

#[tokio::test]
async fn should_throw_error_when_jwt_token_is_expired() {
    let test_state = AppStateTest::new(false).await;
    let identity = detached_identity(Role::User);

    let token = encode_jwt_at(
        &identity,
        &test_state.app_state.config.jwt,
        Utc::now() - Duration::days(8),
    )
    .unwrap();

    let response = test_state
        .generate_response(empty_request("GET", "/api/users/favorites", Some(&token)))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn should_throw_error_when_jwt_signed_with_other_secret() {
    let test_state = AppStateTest::new(false).await;
    let identity = detached_identity(Role::User);

    let mut jwt = test_state.app_state.config.jwt.clone();
    jwt.secret = "another-secret-that-is-long-enough-to-pass".into();
    let token = manga_reader::auth::encode_jwt(&identity, &jwt).unwrap();

    let response = test_state
        .generate_response(empty_request("GET", "/api/users/favorites", Some(&token)))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn should_pass_valid_token_to_the_handler() {
    let test_state = AppStateTest::new(false).await;
    let token = test_state.generate_jwt(&detached_identity(Role::User));

    // Handler-level validation runs only once the gate lets the request through.
    let response = test_state
        .generate_response(crate::json_request(
            "POST",
            "/api/users/favorites",
            Some(&token),
            serde_json::json!({"manga_id": 0}),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
