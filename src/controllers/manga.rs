use std::sync::Arc;

use axum::{
    Extension,
    extract::State,
    http::StatusCode,
};
use validator::Validate;

use crate::{
    db::{
        audit::{append_audit, get_audit_log},
        chapter::get_chapters_by_manga,
        error::DatabaseError,
        manga::{
            count_manga, delete_manga, get_manga_by_id, get_manga_with_pagination, insert_manga,
            update_cover, update_manga,
        },
    },
    error::Error,
    extract::{Json, Path, Query},
    model::{AuditAction, AuditEntry, Chapter, Cover, Identity, Manga, MangaPage, PaginationMeta},
    payload::{AuditLogParams, CoverUpload, MangaChanges, MangaListParams, NewManga},
    response::ApiResponse,
    state::SharedAppState,
};

use super::{UrlPath, audit_details};

#[tracing::instrument(name = "[GET] manga", skip_all, fields(page, limit))]
pub async fn index(
    State(app_state): State<SharedAppState>,
    Query(params): Query<MangaListParams>,
) -> Result<ApiResponse<MangaPage>, Error> {
    params.validate().map_err(Error::Validation)?;

    let (page, limit) = (params.page(), params.limit());
    let span = tracing::Span::current();
    span.record("page", page);
    span.record("limit", limit);

    let filter = params.filter();
    let total = count_manga(&app_state.pool, &filter).await?;
    let manga =
        get_manga_with_pagination(&app_state.pool, &filter, limit, params.offset()).await?;

    Ok(ApiResponse::data(MangaPage {
        manga,
        pagination: PaginationMeta::new(page, limit, total),
    }))
}

#[tracing::instrument(name = "[GET] manga/{id}", skip_all, fields(path.id))]
pub async fn show(
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
) -> Result<ApiResponse<Manga>, Error> {
    path.validate().map_err(Error::Validation)?;

    let manga = get_manga_by_id(&app_state.pool, path.id).await?;

    Ok(ApiResponse::data(manga))
}

#[tracing::instrument(name = "[GET] manga/{id}/chapters", skip_all, fields(path.id))]
pub async fn chapters(
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
) -> Result<ApiResponse<Vec<Chapter>>, Error> {
    path.validate().map_err(Error::Validation)?;

    get_manga_by_id(&app_state.pool, path.id).await?;
    let chapters = get_chapters_by_manga(&app_state.pool, path.id).await?;

    Ok(ApiResponse::data(chapters))
}

#[tracing::instrument(name = "[POST] manga", skip_all)]
pub async fn store(
    Extension(identity): Extension<Arc<Identity>>,
    State(app_state): State<SharedAppState>,
    Json(request): Json<NewManga>,
) -> Result<(StatusCode, ApiResponse<Manga>), Error> {
    request.validate().map_err(Error::Validation)?;

    let mut tx = app_state.pool.begin().await.map_err(DatabaseError::from)?;

    let manga = insert_manga(&mut tx, &request).await?;
    append_audit(
        &mut tx,
        Some(identity.id),
        manga.id,
        AuditAction::Create,
        Some(audit_details(&manga)?),
    )
    .await?;

    tx.commit().await.map_err(DatabaseError::from)?;

    tracing::info!(manga_id = manga.id, "Manga created");

    Ok((
        StatusCode::CREATED,
        ApiResponse::data(manga).with_message("Manga created successfully"),
    ))
}

#[tracing::instrument(name = "[PUT] manga/{id}", skip_all, fields(path.id))]
pub async fn update(
    Extension(identity): Extension<Arc<Identity>>,
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
    Json(changes): Json<MangaChanges>,
) -> Result<ApiResponse<Manga>, Error> {
    path.validate().map_err(Error::Validation)?;
    if changes.is_empty() {
        return Err(Error::InvalidInput("No valid fields to update".into()));
    }
    changes.validate().map_err(Error::Validation)?;

    let mut tx = app_state.pool.begin().await.map_err(DatabaseError::from)?;

    let manga = update_manga(&mut tx, path.id, &changes).await?;
    append_audit(
        &mut tx,
        Some(identity.id),
        manga.id,
        AuditAction::Update,
        Some(audit_details(&changes)?),
    )
    .await?;

    tx.commit().await.map_err(DatabaseError::from)?;

    Ok(ApiResponse::data(manga).with_message("Manga updated successfully"))
}

#[tracing::instrument(name = "[DELETE] manga/{id}", skip_all, fields(path.id))]
pub async fn destroy(
    Extension(identity): Extension<Arc<Identity>>,
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
) -> Result<ApiResponse<()>, Error> {
    path.validate().map_err(Error::Validation)?;

    let mut tx = app_state.pool.begin().await.map_err(DatabaseError::from)?;

    let manga = delete_manga(&mut tx, path.id).await?;
    append_audit(
        &mut tx,
        Some(identity.id),
        manga.id,
        AuditAction::Delete,
        Some(audit_details(&manga)?),
    )
    .await?;

    tx.commit().await.map_err(DatabaseError::from)?;

    tracing::info!(manga_id = manga.id, "Manga deleted");

    Ok(ApiResponse::message("Manga deleted successfully"))
}

#[tracing::instrument(name = "[POST] manga/{id}/cover", skip_all, fields(path.id))]
pub async fn cover(
    Extension(identity): Extension<Arc<Identity>>,
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
    Json(request): Json<CoverUpload>,
) -> Result<ApiResponse<Cover>, Error> {
    path.validate().map_err(Error::Validation)?;
    request.validate().map_err(Error::Validation)?;

    let mut tx = app_state.pool.begin().await.map_err(DatabaseError::from)?;

    let cover = update_cover(&mut tx, path.id, &request.cover_image).await?;
    append_audit(
        &mut tx,
        Some(identity.id),
        path.id,
        AuditAction::Update,
        Some(audit_details(&cover)?),
    )
    .await?;

    tx.commit().await.map_err(DatabaseError::from)?;

    Ok(ApiResponse::data(cover).with_message("Cover uploaded successfully"))
}

#[tracing::instrument(name = "[GET] manga/history", skip_all)]
pub async fn history(
    State(app_state): State<SharedAppState>,
    Query(params): Query<AuditLogParams>,
) -> Result<ApiResponse<Vec<AuditEntry>>, Error> {
    params.validate().map_err(Error::Validation)?;

    let entries = get_audit_log(&app_state.pool, params.limit()).await?;

    Ok(ApiResponse::data(entries))
}
