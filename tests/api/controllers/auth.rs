use axum::http::StatusCode;
use manga_reader::{
    auth::decode_jwt,
    model::{PublicUser, Role, Session},
    response::ApiResponse,
};
use serde_json::json;

use crate::{AppStateTest, empty_request, fixtures::fake_username_and_email, json_request, read_body};

#[tokio::test]
async fn should_be_error_when_body_is_missing() {
    let test_state = AppStateTest::new(false).await;

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/auth/register")
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = test_state.generate_response(request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ApiResponse<()> = read_body(response).await;
    assert!(!body.success);
}

#[tokio::test]
async fn should_be_error_when_register_body_is_invalid() {
    let test_state = AppStateTest::new(false).await;

    let response = test_state
        .generate_response(json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({"username": "ab", "email": "not-an-email", "password": "123"}),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: ApiResponse<()> = read_body(response).await;
    let fields: Vec<String> = body
        .details
        .unwrap()
        .into_iter()
        .map(|detail| detail.field)
        .collect();
    assert_eq!(fields, vec!["email", "password", "username"]);
}

#[tokio::test]
async fn should_be_error_when_email_exceeds_column_width() {
    let test_state = AppStateTest::new(false).await;
    let label = "a".repeat(60);
    let email = format!("{}@{label}.{label}.{label}.{label}.com", "b".repeat(64));

    let response = test_state
        .generate_response(json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({"username": "reader", "email": email, "password": "secret123"}),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ApiResponse<()> = read_body(response).await;
    let fields: Vec<String> = body
        .details
        .unwrap()
        .into_iter()
        .map(|detail| detail.field)
        .collect();
    assert_eq!(fields, vec!["email"]);
}

#[tokio::test]
async fn should_be_error_when_login_field_is_missing() {
    let test_state = AppStateTest::new(false).await;

    let response = test_state
        .generate_response(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({"password": "password"}),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn refresh_is_not_implemented() {
    let test_state = AppStateTest::new(false).await;

    let response = test_state
        .generate_response(empty_request("POST", "/api/auth/refresh", None))
        .await;

    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
}

#[tokio::test]
async fn logout_is_acknowledged() {
    let test_state = AppStateTest::new(false).await;

    let response = test_state
        .generate_response(empty_request("POST", "/api/auth/logout", None))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: ApiResponse<()> = read_body(response).await;
    assert!(body.success);
    assert!(body.message.is_some());
}

#[tokio::test]
#[ignore = "requires a running postgres instance"]
async fn should_register_and_login_with_username_or_email() {
    let test_state = AppStateTest::new(true).await;
    let (username, email) = fake_username_and_email();

    let response = test_state
        .generate_response(json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({"username": username, "email": email, "password": "secret123"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: ApiResponse<PublicUser> = read_body(response).await;
    let user = body.data.unwrap();
    assert_eq!(user.username, username);
    assert_eq!(user.role, Role::User);

    for login in [&username, &email] {
        let response = test_state
            .generate_response(json_request(
                "POST",
                "/api/auth/login",
                None,
                json!({"login": login, "password": "secret123"}),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let session = read_body::<Session>(response).await.data.unwrap();
        assert_eq!(session.id, user.id);

        let claims = decode_jwt(&session.token, &test_state.app_state.config.jwt)
            .unwrap()
            .claims;
        assert_eq!(claims.user.id, user.id);
        assert_eq!(claims.user.email, email);
    }

    test_state.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a running postgres instance"]
async fn should_conflict_on_duplicate_username_or_email() {
    let test_state = AppStateTest::new(true).await;
    let (username, email) = fake_username_and_email();
    let (other_username, other_email) = fake_username_and_email();

    let first = test_state
        .generate_response(json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({"username": username, "email": email, "password": "secret123"}),
        ))
        .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let cases = [
        (other_username.clone(), email.clone(), "A user with this email already exists"),
        (username.clone(), other_email.clone(), "A user with this username already exists"),
    ];

    for (username, email, message) in cases {
        let response = test_state
            .generate_response(json_request(
                "POST",
                "/api/auth/register",
                None,
                json!({"username": username, "email": email, "password": "secret123"}),
            ))
            .await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body: ApiResponse<()> = read_body(response).await;
        assert_eq!(body.error.as_deref(), Some(message));
    }

    test_state.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a running postgres instance"]
async fn unknown_user_and_wrong_password_are_indistinguishable() {
    let test_state = AppStateTest::new(true).await;
    let (identity, _) = test_state.generate_jwt_with_user(Role::User).await;

    let mut errors = Vec::new();
    for (login, password) in [(identity.username.as_str(), "wrongpass"), ("nonexistent", "anything")] {
        let response = test_state
            .generate_response(json_request(
                "POST",
                "/api/auth/login",
                None,
                json!({"login": login, "password": password}),
            ))
            .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        errors.push(read_body::<()>(response).await.error);
    }

    assert_eq!(errors[0], errors[1]);

    test_state.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a running postgres instance"]
async fn should_store_trimmed_username_and_email() {
    let test_state = AppStateTest::new(true).await;
    let (username, email) = fake_username_and_email();

    let response = test_state
        .generate_response(json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({
                "username": format!(" {username} "),
                "email": format!(" {email}"),
                "password": "secret123"
            }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let user = read_body::<PublicUser>(response).await.data.unwrap();
    assert_eq!(user.username, username);
    assert_eq!(user.email, email);

    let response = test_state
        .generate_response(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({"login": format!(" {username} "), "password": "secret123"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    test_state.cleanup().await;
}
