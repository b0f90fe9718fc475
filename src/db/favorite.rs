use sqlx::PgPool;

use crate::{error::Error, model::FavoriteManga};

use super::{error::DatabaseError, manga::ensure_manga_exists};

#[tracing::instrument(name = "add favorite", skip(pool))]
pub async fn add_favorite(pool: &PgPool, user_id: i64, manga_id: i64) -> Result<(), Error> {
    let mut tx = pool.begin().await.map_err(DatabaseError::from)?;

    ensure_manga_exists(&mut tx, manga_id).await?;

    sqlx::query("INSERT INTO favorites (user_id, manga_id) VALUES ($1, $2)")
        .bind(user_id)
        .bind(manga_id)
        .execute(&mut *tx)
        .await
        .map_err(DatabaseError::from)?;

    tx.commit().await.map_err(DatabaseError::from)?;

    Ok(())
}

#[tracing::instrument(name = "remove favorite", skip(pool))]
pub async fn remove_favorite(pool: &PgPool, user_id: i64, manga_id: i64) -> Result<(), Error> {
    let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND manga_id = $2")
        .bind(user_id)
        .bind(manga_id)
        .execute(pool)
        .await
        .map_err(DatabaseError::from)?;

    if result.rows_affected() == 0 {
        return Err(Error::Database(DatabaseError::NotFound("Favorite")));
    }

    Ok(())
}

#[tracing::instrument(name = "list favorites", skip(pool))]
pub async fn list_favorites(pool: &PgPool, user_id: i64) -> Result<Vec<FavoriteManga>, Error> {
    let favorites = sqlx::query_as::<_, FavoriteManga>(
        r#"
        SELECT
            m.*, f.created_at AS added_at
        FROM
            favorites f
        INNER JOIN
            manga m ON m.id = f.manga_id
        WHERE
            f.user_id = $1
        ORDER BY f.created_at DESC, f.id DESC
    "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::from)?;

    Ok(favorites)
}
