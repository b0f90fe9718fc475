use anyhow::Context;
use futures::TryStreamExt;
use secrecy::SecretString;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    auth::compute_password_hash,
    error::Error,
    model::{Credential, Profile, PublicUser, Role, UserSummary},
    payload::ProfileChanges,
    telemetry::spawn_blocking_with_tracing,
};

use super::error::DatabaseError;

const PROFILE_COLUMNS: &str = "id, username, email, role, avatar, banner, bio, created_at";

pub async fn hash_password(password: SecretString) -> Result<String, Error> {
    spawn_blocking_with_tracing(move || compute_password_hash(password))
        .await
        .context("compute password hash")
        .map_err(Error::Other)?
}

#[tracing::instrument(name = "create user", skip_all, fields(username = %username))]
pub async fn create_user(
    pool: &PgPool,
    username: &str,
    email: &str,
    password: SecretString,
) -> Result<PublicUser, Error> {
    let password_hash = hash_password(password).await?;

    let user = sqlx::query_as::<_, PublicUser>(
        r#"
        INSERT INTO users
            (username, email, password_hash)
        VALUES
            ($1, $2, $3)
        RETURNING
            id, username, email, role, created_at
    "#,
    )
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .fetch_one(pool)
    .await
    .map_err(DatabaseError::from)?;

    Ok(user)
}

/// Looks a user up by email first, then by username.
#[tracing::instrument(name = "find credential by login", skip_all)]
pub async fn find_credential_by_login(
    pool: &PgPool,
    login: &str,
) -> Result<Option<Credential>, Error> {
    let credential = sqlx::query_as::<_, Credential>(
        r#"
        SELECT
            id, username, email, role, avatar, password_hash
        FROM
            users
        WHERE
            email = $1 OR username = $1
        ORDER BY
            (email = $1) DESC
        LIMIT 1
    "#,
    )
    .bind(login)
    .fetch_optional(pool)
    .await
    .map_err(DatabaseError::from)?;

    Ok(credential)
}

#[tracing::instrument(name = "get user role", skip(pool))]
pub async fn get_user_role(pool: &PgPool, user_id: i64) -> Result<Option<Role>, Error> {
    let role = sqlx::query_scalar::<_, Role>("SELECT role FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(DatabaseError::from)?;

    Ok(role)
}

#[tracing::instrument(name = "get profile", skip(pool))]
pub async fn get_profile(pool: &PgPool, user_id: i64) -> Result<Profile, Error> {
    let query = format!("SELECT {PROFILE_COLUMNS} FROM users WHERE id = $1");

    sqlx::query_as::<_, Profile>(&query)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(DatabaseError::from)?
        .ok_or(Error::Database(DatabaseError::NotFound("User")))
}

/// Applies only the members present in `changes`; an explicit `null` clears a nullable column.
#[tracing::instrument(name = "update profile", skip(pool, changes))]
pub async fn update_profile(
    pool: &PgPool,
    user_id: i64,
    changes: &ProfileChanges,
) -> Result<Profile, Error> {
    let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE users SET ");
    let mut set = query_builder.separated(", ");

    if let Some(username) = &changes.username {
        set.push("username = ").push_bind_unseparated(username);
    }
    if let Some(email) = &changes.email {
        set.push("email = ").push_bind_unseparated(email);
    }
    if let Some(avatar) = &changes.avatar {
        set.push("avatar = ").push_bind_unseparated(avatar);
    }
    if let Some(banner) = &changes.banner {
        set.push("banner = ").push_bind_unseparated(banner);
    }
    if let Some(bio) = &changes.bio {
        set.push("bio = ").push_bind_unseparated(bio);
    }
    set.push("updated_at = now()");

    query_builder
        .push(" WHERE id = ")
        .push_bind(user_id)
        .push(" RETURNING ")
        .push(PROFILE_COLUMNS);

    query_builder
        .build_query_as::<Profile>()
        .fetch_optional(pool)
        .await
        .map_err(DatabaseError::from)?
        .ok_or(Error::Database(DatabaseError::NotFound("User")))
}

#[tracing::instrument(name = "get password hash", skip(pool))]
pub async fn get_password_hash(pool: &PgPool, user_id: i64) -> Result<String, Error> {
    sqlx::query_scalar::<_, String>("SELECT password_hash FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(DatabaseError::from)?
        .ok_or(Error::Database(DatabaseError::NotFound("User")))
}

#[tracing::instrument(name = "update password hash", skip(pool, password_hash))]
pub async fn update_password_hash(
    pool: &PgPool,
    user_id: i64,
    password_hash: String,
) -> Result<(), Error> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET
            password_hash = $1,
            updated_at = now()
        WHERE
            id = $2
    "#,
    )
    .bind(password_hash)
    .bind(user_id)
    .execute(pool)
    .await
    .map_err(DatabaseError::from)?;

    if result.rows_affected() == 0 {
        return Err(Error::Database(DatabaseError::NotFound("User")));
    }

    Ok(())
}

#[tracing::instrument(name = "list users", skip_all)]
pub async fn list_users(pool: &PgPool) -> Result<Vec<UserSummary>, Error> {
    let mut stream = sqlx::query_as::<_, UserSummary>(
        r#"
        SELECT
            id, username, email, role, created_at, updated_at
        FROM
            users
        ORDER BY id
    "#,
    )
    .fetch(pool);

    let mut users = Vec::new();
    while let Some(user) = stream.try_next().await.map_err(DatabaseError::from)? {
        users.push(user);
    }

    Ok(users)
}
