use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{
    error::Error,
    model::{GenreCount, ReadingHistoryItem, ReadingProgress, UserStats},
    payload::ReadingProgressRequest,
};

use super::error::DatabaseError;

pub const READING_HISTORY_LIMIT: i64 = 20;
pub const FAVORITE_GENRES_LIMIT: i64 = 5;

/// Records the current page for (user, manga, chapter); a repeat read moves the
/// existing entry instead of adding another one.
#[tracing::instrument(name = "upsert reading progress", skip(pool))]
pub async fn upsert_reading_progress(
    pool: &PgPool,
    user_id: i64,
    progress: &ReadingProgressRequest,
) -> Result<ReadingProgress, Error> {
    let mut tx = pool.begin().await.map_err(DatabaseError::from)?;

    let chapter_matches = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM chapters WHERE id = $1 AND manga_id = $2)",
    )
    .bind(progress.chapter_id)
    .bind(progress.manga_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(DatabaseError::from)?;

    if !chapter_matches {
        return Err(Error::Database(DatabaseError::NotFound("Chapter")));
    }

    let progress = sqlx::query_as::<_, ReadingProgress>(
        r#"
        INSERT INTO reading_history
            (user_id, manga_id, chapter_id, page_number)
        VALUES
            ($1, $2, $3, $4)
        ON CONFLICT (user_id, manga_id, chapter_id)
        DO UPDATE SET
            page_number = EXCLUDED.page_number,
            read_at = now()
        RETURNING *
    "#,
    )
    .bind(user_id)
    .bind(progress.manga_id)
    .bind(progress.chapter_id)
    .bind(progress.page_number)
    .fetch_one(&mut *tx)
    .await
    .map_err(DatabaseError::from)?;

    tx.commit().await.map_err(DatabaseError::from)?;

    Ok(progress)
}

#[tracing::instrument(name = "list reading history", skip(pool))]
pub async fn list_reading_history(
    pool: &PgPool,
    user_id: i64,
) -> Result<Vec<ReadingHistoryItem>, Error> {
    let history = sqlx::query_as::<_, ReadingHistoryItem>(
        r#"
        SELECT
            m.*,
            rh.chapter_id, c.chapter_number, c.title AS chapter_title,
            rh.page_number, rh.read_at
        FROM
            reading_history rh
        INNER JOIN manga m ON m.id = rh.manga_id
        INNER JOIN chapters c ON c.id = rh.chapter_id
        WHERE
            rh.user_id = $1
        ORDER BY rh.read_at DESC, rh.id DESC
        LIMIT $2
    "#,
    )
    .bind(user_id)
    .bind(READING_HISTORY_LIMIT)
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::from)?;

    Ok(history)
}

#[tracing::instrument(name = "get user stats", skip(pool))]
pub async fn get_user_stats(pool: &PgPool, user_id: i64) -> Result<UserStats, Error> {
    let favorites_count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM favorites WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
            .map_err(DatabaseError::from)?;

    let (chapters_read, last_activity) = sqlx::query_as::<_, (i64, Option<DateTime<Utc>>)>(
        r#"
        SELECT
            COUNT(DISTINCT chapter_id), MAX(read_at)
        FROM
            reading_history
        WHERE
            user_id = $1
    "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
    .map_err(DatabaseError::from)?;

    // Genres are weighted by favorited manga; ties resolve alphabetically.
    let favorite_genres = sqlx::query_as::<_, GenreCount>(
        r#"
        SELECT
            genre, COUNT(*) AS count
        FROM
            favorites f
        INNER JOIN manga m ON m.id = f.manga_id
        CROSS JOIN LATERAL unnest(m.genres) AS genre
        WHERE
            f.user_id = $1
        GROUP BY genre
        ORDER BY count DESC, genre ASC
        LIMIT $2
    "#,
    )
    .bind(user_id)
    .bind(FAVORITE_GENRES_LIMIT)
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::from)?;

    Ok(UserStats {
        favorites_count,
        chapters_read,
        favorite_genres,
        last_activity,
    })
}
