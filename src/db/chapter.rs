use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::Error,
    model::Chapter,
    payload::{ChapterChanges, NewChapter},
};

use super::{PostgresTransaction, error::DatabaseError};

#[tracing::instrument(name = "get chapter by id", skip(pool))]
pub async fn get_chapter_by_id(pool: &PgPool, chapter_id: i64) -> Result<Chapter, Error> {
    sqlx::query_as::<_, Chapter>("SELECT * FROM chapters WHERE id = $1")
        .bind(chapter_id)
        .fetch_optional(pool)
        .await
        .map_err(DatabaseError::from)?
        .ok_or(Error::Database(DatabaseError::NotFound("Chapter")))
}

#[tracing::instrument(name = "get chapters by manga", skip(pool))]
pub async fn get_chapters_by_manga(pool: &PgPool, manga_id: i64) -> Result<Vec<Chapter>, Error> {
    let chapters = sqlx::query_as::<_, Chapter>(
        r#"
        SELECT
            *
        FROM
            chapters
        WHERE
            manga_id = $1
        ORDER BY chapter_number ASC
    "#,
    )
    .bind(manga_id)
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::from)?;

    Ok(chapters)
}

#[tracing::instrument(name = "insert chapter", skip_all)]
pub async fn insert_chapter(
    tx: &mut PostgresTransaction,
    chapter: &NewChapter,
) -> Result<Chapter, Error> {
    let chapter = sqlx::query_as::<_, Chapter>(
        r#"
        INSERT INTO chapters
            (manga_id, chapter_number, title, pages)
        VALUES
            ($1, $2, $3, $4)
        RETURNING *
    "#,
    )
    .bind(chapter.manga_id)
    .bind(chapter.chapter_number)
    .bind(&chapter.title)
    .bind(&chapter.pages)
    .fetch_one(&mut **tx)
    .await
    .map_err(DatabaseError::from)?;

    Ok(chapter)
}

#[tracing::instrument(name = "update chapter", skip(tx, changes))]
pub async fn update_chapter(
    tx: &mut PostgresTransaction,
    chapter_id: i64,
    changes: &ChapterChanges,
) -> Result<Chapter, Error> {
    let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE chapters SET ");
    let mut set = query_builder.separated(", ");

    if let Some(chapter_number) = changes.chapter_number {
        set.push("chapter_number = ").push_bind_unseparated(chapter_number);
    }
    if let Some(title) = &changes.title {
        set.push("title = ").push_bind_unseparated(title);
    }
    if let Some(pages) = &changes.pages {
        set.push("pages = ").push_bind_unseparated(pages);
    }
    set.push("updated_at = now()");

    query_builder
        .push(" WHERE id = ")
        .push_bind(chapter_id)
        .push(" RETURNING *");

    query_builder
        .build_query_as::<Chapter>()
        .fetch_optional(&mut **tx)
        .await
        .map_err(DatabaseError::from)?
        .ok_or(Error::Database(DatabaseError::NotFound("Chapter")))
}

/// Replaces the whole page list; the previous list is not kept.
#[tracing::instrument(name = "replace chapter pages", skip(tx, pages))]
pub async fn replace_pages(
    tx: &mut PostgresTransaction,
    chapter_id: i64,
    pages: &[String],
) -> Result<Chapter, Error> {
    sqlx::query_as::<_, Chapter>(
        r#"
        UPDATE chapters
        SET
            pages = $1,
            updated_at = now()
        WHERE
            id = $2
        RETURNING *
    "#,
    )
    .bind(pages)
    .bind(chapter_id)
    .fetch_optional(&mut **tx)
    .await
    .map_err(DatabaseError::from)?
    .ok_or(Error::Database(DatabaseError::NotFound("Chapter")))
}

#[tracing::instrument(name = "delete chapter", skip(tx))]
pub async fn delete_chapter(tx: &mut PostgresTransaction, chapter_id: i64) -> Result<Chapter, Error> {
    sqlx::query_as::<_, Chapter>("DELETE FROM chapters WHERE id = $1 RETURNING *")
        .bind(chapter_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(DatabaseError::from)?
        .ok_or(Error::Database(DatabaseError::NotFound("Chapter")))
}
