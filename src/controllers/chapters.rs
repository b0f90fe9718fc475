use std::sync::Arc;

use axum::{Extension, extract::State, http::StatusCode};
use serde_json::json;
use validator::Validate;

use crate::{
    db::{
        audit::append_audit,
        chapter::{delete_chapter, get_chapter_by_id, insert_chapter, replace_pages, update_chapter},
        error::DatabaseError,
        manga::ensure_manga_exists,
    },
    error::Error,
    extract::{Json, Path},
    model::{AuditAction, Chapter, Identity},
    payload::{ChapterChanges, NewChapter, PagesUpload},
    response::ApiResponse,
    state::SharedAppState,
};

use super::{UrlPath, audit_details};

#[tracing::instrument(name = "[GET] chapters/{id}", skip_all, fields(path.id))]
pub async fn show(
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
) -> Result<ApiResponse<Chapter>, Error> {
    path.validate().map_err(Error::Validation)?;

    let chapter = get_chapter_by_id(&app_state.pool, path.id).await?;

    Ok(ApiResponse::data(chapter))
}

#[tracing::instrument(name = "[POST] chapters", skip_all)]
pub async fn store(
    Extension(identity): Extension<Arc<Identity>>,
    State(app_state): State<SharedAppState>,
    Json(request): Json<NewChapter>,
) -> Result<(StatusCode, ApiResponse<Chapter>), Error> {
    request.validate().map_err(Error::Validation)?;

    let mut tx = app_state.pool.begin().await.map_err(DatabaseError::from)?;

    ensure_manga_exists(&mut tx, request.manga_id).await?;
    let chapter = insert_chapter(&mut tx, &request).await?;
    append_audit(
        &mut tx,
        Some(identity.id),
        chapter.manga_id,
        AuditAction::AddChapter,
        Some(audit_details(&chapter)?),
    )
    .await?;

    tx.commit().await.map_err(DatabaseError::from)?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::data(chapter).with_message("Chapter created successfully"),
    ))
}

#[tracing::instrument(name = "[PUT] chapters/{id}", skip_all, fields(path.id))]
pub async fn update(
    Extension(identity): Extension<Arc<Identity>>,
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
    Json(changes): Json<ChapterChanges>,
) -> Result<ApiResponse<Chapter>, Error> {
    path.validate().map_err(Error::Validation)?;
    if changes.is_empty() {
        return Err(Error::InvalidInput("No valid fields to update".into()));
    }
    changes.validate().map_err(Error::Validation)?;

    let mut tx = app_state.pool.begin().await.map_err(DatabaseError::from)?;

    let chapter = update_chapter(&mut tx, path.id, &changes).await?;
    append_audit(
        &mut tx,
        Some(identity.id),
        chapter.manga_id,
        AuditAction::UpdateChapter,
        Some(json!({
            "chapter_id": chapter.id,
            "changes": audit_details(&changes)?,
        })),
    )
    .await?;

    tx.commit().await.map_err(DatabaseError::from)?;

    Ok(ApiResponse::data(chapter).with_message("Chapter updated successfully"))
}

#[tracing::instrument(name = "[DELETE] chapters/{id}", skip_all, fields(path.id))]
pub async fn destroy(
    Extension(identity): Extension<Arc<Identity>>,
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
) -> Result<ApiResponse<()>, Error> {
    path.validate().map_err(Error::Validation)?;

    let mut tx = app_state.pool.begin().await.map_err(DatabaseError::from)?;

    let chapter = delete_chapter(&mut tx, path.id).await?;
    append_audit(
        &mut tx,
        Some(identity.id),
        chapter.manga_id,
        AuditAction::DeleteChapter,
        Some(audit_details(&chapter)?),
    )
    .await?;

    tx.commit().await.map_err(DatabaseError::from)?;

    Ok(ApiResponse::message("Chapter deleted successfully"))
}

#[tracing::instrument(name = "[POST] chapters/{id}/pages", skip_all, fields(path.id))]
pub async fn pages(
    Extension(identity): Extension<Arc<Identity>>,
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
    Json(request): Json<PagesUpload>,
) -> Result<ApiResponse<Chapter>, Error> {
    path.validate().map_err(Error::Validation)?;

    let mut tx = app_state.pool.begin().await.map_err(DatabaseError::from)?;

    let chapter = replace_pages(&mut tx, path.id, &request.pages).await?;
    append_audit(
        &mut tx,
        Some(identity.id),
        chapter.manga_id,
        AuditAction::UpdatePages,
        Some(json!({
            "chapter_id": chapter.id,
            "pages_count": request.pages.len(),
        })),
    )
    .await?;

    tx.commit().await.map_err(DatabaseError::from)?;

    Ok(ApiResponse::data(chapter).with_message("Pages uploaded successfully"))
}
