use std::{borrow::Cow, sync::Arc};

use anyhow::Context;
use axum::{Extension, extract::State, http::StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use validator::{Validate, ValidateLength, ValidationError, ValidationErrors};

use crate::{
    auth::{error::AuthError, verify_password_hash},
    db::{
        favorite::{add_favorite, list_favorites, remove_favorite},
        reading_history::{get_user_stats, list_reading_history, upsert_reading_progress},
        user::{self, get_password_hash, get_profile, hash_password, list_users, update_password_hash},
    },
    error::Error,
    extract::{Json, Path},
    model::{
        FavoriteManga, Identity, Profile, ReadingHistoryItem, ReadingProgress, UserStats,
        UserSummary,
    },
    payload::{FavoriteRequest, ProfileChanges, ReadingProgressRequest},
    response::ApiResponse,
    state::SharedAppState,
    telemetry::spawn_blocking_with_tracing,
};

use super::{UrlPath, auth::MIN_PASSWORD_LEN};

#[derive(Deserialize)]
pub struct PasswordChangeRequest {
    #[serde(alias = "currentPassword")]
    pub current_password: SecretString,
    #[serde(alias = "newPassword")]
    pub new_password: SecretString,
}

impl Validate for PasswordChangeRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let fields = [
            ("current_password", &self.current_password),
            ("new_password", &self.new_password),
        ];
        for (field, password) in fields {
            if !password
                .expose_secret()
                .validate_length(Some(MIN_PASSWORD_LEN), None, None)
            {
                errors.add(
                    field,
                    ValidationError::new("password_length")
                        .with_message(Cow::from("Password must be at least 6 characters")),
                );
            }
        }

        if !errors.errors().is_empty() {
            return Err(errors);
        }

        Ok(())
    }
}

#[tracing::instrument(name = "[GET] users", skip_all)]
pub async fn index(
    State(app_state): State<SharedAppState>,
) -> Result<ApiResponse<Vec<UserSummary>>, Error> {
    let users = list_users(&app_state.pool).await?;

    Ok(ApiResponse::data(users))
}

#[tracing::instrument(name = "[GET] users/profile", skip_all)]
pub async fn profile(
    Extension(identity): Extension<Arc<Identity>>,
    State(app_state): State<SharedAppState>,
) -> Result<ApiResponse<Profile>, Error> {
    let profile = get_profile(&app_state.pool, identity.id).await?;

    Ok(ApiResponse::data(profile))
}

#[tracing::instrument(name = "[PUT] users/profile", skip_all)]
pub async fn update_profile(
    Extension(identity): Extension<Arc<Identity>>,
    State(app_state): State<SharedAppState>,
    Json(changes): Json<ProfileChanges>,
) -> Result<ApiResponse<Profile>, Error> {
    changes.validate().map_err(Error::Validation)?;

    let profile = user::update_profile(&app_state.pool, identity.id, &changes).await?;

    Ok(ApiResponse::data(profile).with_message("Profile updated successfully"))
}

/// Existing tokens stay valid after a password change.
#[tracing::instrument(name = "[PUT] users/password", skip_all)]
pub async fn password(
    Extension(identity): Extension<Arc<Identity>>,
    State(app_state): State<SharedAppState>,
    Json(request): Json<PasswordChangeRequest>,
) -> Result<ApiResponse<()>, Error> {
    request.validate().map_err(Error::Validation)?;

    let password_hash = get_password_hash(&app_state.pool, identity.id).await?;
    let current_password = request.current_password;
    let is_valid = spawn_blocking_with_tracing(move || {
        verify_password_hash(password_hash, current_password)
    })
    .await
    .context("verify password hash")
    .map_err(Error::Other)??;

    if !is_valid {
        return Err(Error::Auth(AuthError::IncorrectPassword));
    }

    let new_hash = hash_password(request.new_password).await?;
    update_password_hash(&app_state.pool, identity.id, new_hash).await?;

    tracing::info!(user_id = identity.id, "Password changed");

    Ok(ApiResponse::message("Password changed successfully"))
}

#[tracing::instrument(name = "[GET] users/stats", skip_all)]
pub async fn stats(
    Extension(identity): Extension<Arc<Identity>>,
    State(app_state): State<SharedAppState>,
) -> Result<ApiResponse<UserStats>, Error> {
    let stats = get_user_stats(&app_state.pool, identity.id).await?;

    Ok(ApiResponse::data(stats))
}

#[tracing::instrument(name = "[GET] users/favorites", skip_all)]
pub async fn favorites(
    Extension(identity): Extension<Arc<Identity>>,
    State(app_state): State<SharedAppState>,
) -> Result<ApiResponse<Vec<FavoriteManga>>, Error> {
    let favorites = list_favorites(&app_state.pool, identity.id).await?;

    Ok(ApiResponse::data(favorites))
}

#[tracing::instrument(name = "[POST] users/favorites", skip_all)]
pub async fn store_favorite(
    Extension(identity): Extension<Arc<Identity>>,
    State(app_state): State<SharedAppState>,
    Json(request): Json<FavoriteRequest>,
) -> Result<(StatusCode, ApiResponse<()>), Error> {
    request.validate().map_err(Error::Validation)?;

    add_favorite(&app_state.pool, identity.id, request.manga_id).await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::message("Manga added to favorites"),
    ))
}

#[tracing::instrument(name = "[DELETE] users/favorites/{id}", skip_all, fields(path.id))]
pub async fn destroy_favorite(
    Extension(identity): Extension<Arc<Identity>>,
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
) -> Result<ApiResponse<()>, Error> {
    path.validate().map_err(Error::Validation)?;

    remove_favorite(&app_state.pool, identity.id, path.id).await?;

    Ok(ApiResponse::message("Manga removed from favorites"))
}

#[tracing::instrument(name = "[GET] users/reading-history", skip_all)]
pub async fn reading_history(
    Extension(identity): Extension<Arc<Identity>>,
    State(app_state): State<SharedAppState>,
) -> Result<ApiResponse<Vec<ReadingHistoryItem>>, Error> {
    let history = list_reading_history(&app_state.pool, identity.id).await?;

    Ok(ApiResponse::data(history))
}

#[tracing::instrument(name = "[POST] users/reading-history", skip_all)]
pub async fn store_reading_progress(
    Extension(identity): Extension<Arc<Identity>>,
    State(app_state): State<SharedAppState>,
    Json(request): Json<ReadingProgressRequest>,
) -> Result<ApiResponse<ReadingProgress>, Error> {
    request.validate().map_err(Error::Validation)?;

    let progress = upsert_reading_progress(&app_state.pool, identity.id, &request).await?;

    Ok(ApiResponse::data(progress).with_message("Reading progress saved"))
}
