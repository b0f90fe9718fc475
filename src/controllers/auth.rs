use std::borrow::Cow;

use anyhow::Context;
use axum::{extract::State, http::StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use validator::{Validate, ValidateLength, ValidationError, ValidationErrors};

use crate::{
    auth::{encode_jwt, error::AuthError, verify_password_hash},
    db::user::{create_user, find_credential_by_login},
    error::Error,
    extract::Json,
    model::{Identity, PublicUser, Session},
    payload::{is_valid_email, trimmed},
    response::ApiResponse,
    state::SharedAppState,
    telemetry::spawn_blocking_with_tracing,
};

pub const MIN_PASSWORD_LEN: u64 = 6;

/// Username and email are trimmed on the way in, matching how login looks them up.
#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(deserialize_with = "trimmed")]
    pub username: String,
    #[serde(deserialize_with = "trimmed")]
    pub email: String,
    pub password: SecretString,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !self.username.validate_length(Some(3), Some(30), None) {
            errors.add(
                "username",
                ValidationError::new("username_length")
                    .with_message(Cow::from("Username length must be between 3 and 30")),
            );
        }
        if !is_valid_email(&self.email) {
            errors.add(
                "email",
                ValidationError::new("email_email")
                    .with_message(Cow::from("Incorrect email format")),
            );
        }

        let password = self.password.expose_secret();
        if !password.validate_length(Some(MIN_PASSWORD_LEN), None, None) {
            errors.add(
                "password",
                ValidationError::new("password_length")
                    .with_message(Cow::from("Password must be at least 6 characters")),
            );
        }

        if !errors.errors().is_empty() {
            return Err(errors);
        }

        Ok(())
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    /// Username or email.
    pub login: String,
    pub password: SecretString,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !self.login.trim().validate_length(Some(1), None, None) {
            errors.add(
                "login",
                ValidationError::new("login_required")
                    .with_message(Cow::from("Email or username is required")),
            );
        }
        if !self.password.expose_secret().validate_length(Some(1), None, None) {
            errors.add(
                "password",
                ValidationError::new("password_required")
                    .with_message(Cow::from("Password is required")),
            );
        }

        if !errors.errors().is_empty() {
            return Err(errors);
        }

        Ok(())
    }
}

#[tracing::instrument(name = "[POST] auth/register", skip_all)]
pub async fn register(
    State(app_state): State<SharedAppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, ApiResponse<PublicUser>), Error> {
    request.validate().map_err(Error::Validation)?;

    let user = create_user(
        &app_state.pool,
        &request.username,
        &request.email,
        request.password,
    )
    .await?;

    tracing::info!(user_id = user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        ApiResponse::data(user).with_message("User registered successfully"),
    ))
}

/// Unknown login and wrong password produce the same response.
#[tracing::instrument(name = "[POST] auth/login", skip_all)]
pub async fn login(
    State(app_state): State<SharedAppState>,
    Json(request): Json<LoginRequest>,
) -> Result<ApiResponse<Session>, Error> {
    request.validate().map_err(Error::Validation)?;

    let credential = find_credential_by_login(&app_state.pool, request.login.trim())
        .await?
        .ok_or(Error::Auth(AuthError::IncorrectCredential))?;

    let password_hash = credential.password_hash.clone();
    let is_valid =
        spawn_blocking_with_tracing(move || verify_password_hash(password_hash, request.password))
            .await
            .context("verify password hash")
            .map_err(Error::Other)??;

    if !is_valid {
        return Err(Error::Auth(AuthError::IncorrectCredential));
    }

    let identity = Identity::from(&credential);
    let token = encode_jwt(&identity, &app_state.config.jwt)?;

    Ok(ApiResponse::data(Session {
        id: identity.id,
        username: identity.username,
        email: identity.email,
        role: identity.role,
        avatar: identity.avatar,
        token,
    })
    .with_message("Login successful"))
}

#[tracing::instrument(name = "[POST] auth/refresh", skip_all)]
pub async fn refresh() -> Result<ApiResponse<()>, Error> {
    Err(Error::NotImplemented("Token refresh is not implemented"))
}

/// Tokens are stateless; nothing is revoked server-side.
#[tracing::instrument(name = "[POST] auth/logout", skip_all)]
pub async fn logout() -> ApiResponse<()> {
    ApiResponse::message("Logged out successfully")
}
