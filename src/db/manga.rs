use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::Error,
    model::{Cover, Manga},
    payload::{MangaChanges, MangaFilter, NewManga},
};

use super::{PostgresTransaction, error::DatabaseError};

/// Escapes `LIKE` metacharacters so user input only matches literally.
pub fn like_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');

    pattern
}

fn push_filter<'args>(query_builder: &mut QueryBuilder<'args, Postgres>, filter: &'args MangaFilter) {
    query_builder.push(" WHERE TRUE");

    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        query_builder
            .push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR title_original ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(status) = filter.status {
        query_builder.push(" AND status = ").push_bind(status);
    }
    if !filter.genres.is_empty() {
        query_builder.push(" AND genres && ").push_bind(&filter.genres);
    }
    if let Some(author) = &filter.author {
        query_builder
            .push(" AND author ILIKE ")
            .push_bind(like_pattern(author));
    }
}

#[tracing::instrument(name = "count manga", skip_all)]
pub async fn count_manga(pool: &PgPool, filter: &MangaFilter) -> Result<i64, Error> {
    let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM manga");
    push_filter(&mut query_builder, filter);

    let total = query_builder
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await
        .map_err(DatabaseError::from)?;

    Ok(total)
}

#[tracing::instrument(name = "get manga with pagination", skip_all, fields(limit, offset))]
pub async fn get_manga_with_pagination(
    pool: &PgPool,
    filter: &MangaFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Manga>, Error> {
    let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM manga");
    push_filter(&mut query_builder, filter);
    query_builder
        .push(" ORDER BY id DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    let manga = query_builder
        .build_query_as::<Manga>()
        .fetch_all(pool)
        .await
        .map_err(DatabaseError::from)?;

    Ok(manga)
}

#[tracing::instrument(name = "get manga by id", skip(pool))]
pub async fn get_manga_by_id(pool: &PgPool, manga_id: i64) -> Result<Manga, Error> {
    sqlx::query_as::<_, Manga>("SELECT * FROM manga WHERE id = $1")
        .bind(manga_id)
        .fetch_optional(pool)
        .await
        .map_err(DatabaseError::from)?
        .ok_or(Error::Database(DatabaseError::NotFound("Manga")))
}

#[tracing::instrument(name = "manga exists", skip(tx))]
pub async fn ensure_manga_exists(tx: &mut PostgresTransaction, manga_id: i64) -> Result<(), Error> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM manga WHERE id = $1)")
        .bind(manga_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(DatabaseError::from)?;

    if !exists {
        return Err(Error::Database(DatabaseError::NotFound("Manga")));
    }

    Ok(())
}

#[tracing::instrument(name = "insert manga", skip_all)]
pub async fn insert_manga(tx: &mut PostgresTransaction, manga: &NewManga) -> Result<Manga, Error> {
    let manga = sqlx::query_as::<_, Manga>(
        r#"
        INSERT INTO manga
            (title, title_original, description, author, artist,
             status, genres, year, rating, views, cover_image)
        VALUES
            ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *
    "#,
    )
    .bind(&manga.title)
    .bind(&manga.title_original)
    .bind(&manga.description)
    .bind(&manga.author)
    .bind(&manga.artist)
    .bind(manga.status)
    .bind(&manga.genres)
    .bind(manga.year)
    .bind(manga.rating)
    .bind(manga.views)
    .bind(&manga.cover_image)
    .fetch_one(&mut **tx)
    .await
    .map_err(DatabaseError::from)?;

    Ok(manga)
}

/// Writes the members present in `changes` and bumps `updated_at`.
#[tracing::instrument(name = "update manga", skip(tx, changes))]
pub async fn update_manga(
    tx: &mut PostgresTransaction,
    manga_id: i64,
    changes: &MangaChanges,
) -> Result<Manga, Error> {
    let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE manga SET ");
    let mut set = query_builder.separated(", ");

    if let Some(title) = &changes.title {
        set.push("title = ").push_bind_unseparated(title);
    }
    if let Some(title_original) = &changes.title_original {
        set.push("title_original = ").push_bind_unseparated(title_original);
    }
    if let Some(description) = &changes.description {
        set.push("description = ").push_bind_unseparated(description);
    }
    if let Some(author) = &changes.author {
        set.push("author = ").push_bind_unseparated(author);
    }
    if let Some(artist) = &changes.artist {
        set.push("artist = ").push_bind_unseparated(artist);
    }
    if let Some(status) = changes.status {
        set.push("status = ").push_bind_unseparated(status);
    }
    if let Some(genres) = &changes.genres {
        set.push("genres = ").push_bind_unseparated(genres);
    }
    if let Some(year) = changes.year {
        set.push("year = ").push_bind_unseparated(year);
    }
    if let Some(rating) = changes.rating {
        set.push("rating = ").push_bind_unseparated(rating);
    }
    if let Some(views) = changes.views {
        set.push("views = ").push_bind_unseparated(views);
    }
    if let Some(cover_image) = &changes.cover_image {
        set.push("cover_image = ").push_bind_unseparated(cover_image);
    }
    set.push("updated_at = now()");

    query_builder
        .push(" WHERE id = ")
        .push_bind(manga_id)
        .push(" RETURNING *");

    query_builder
        .build_query_as::<Manga>()
        .fetch_optional(&mut **tx)
        .await
        .map_err(DatabaseError::from)?
        .ok_or(Error::Database(DatabaseError::NotFound("Manga")))
}

#[tracing::instrument(name = "update manga cover", skip(tx, cover_image))]
pub async fn update_cover(
    tx: &mut PostgresTransaction,
    manga_id: i64,
    cover_image: &str,
) -> Result<Cover, Error> {
    sqlx::query_as::<_, Cover>(
        r#"
        UPDATE manga
        SET
            cover_image = $1,
            updated_at = now()
        WHERE
            id = $2
        RETURNING cover_image
    "#,
    )
    .bind(cover_image)
    .bind(manga_id)
    .fetch_optional(&mut **tx)
    .await
    .map_err(DatabaseError::from)?
    .ok_or(Error::Database(DatabaseError::NotFound("Manga")))
}

/// Removes the manga; its chapters, favorites and reading history cascade with it.
#[tracing::instrument(name = "delete manga", skip(tx))]
pub async fn delete_manga(tx: &mut PostgresTransaction, manga_id: i64) -> Result<Manga, Error> {
    sqlx::query_as::<_, Manga>("DELETE FROM manga WHERE id = $1 RETURNING *")
        .bind(manga_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(DatabaseError::from)?
        .ok_or(Error::Database(DatabaseError::NotFound("Manga")))
}
