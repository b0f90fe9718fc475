use sqlx::PgPool;

use crate::{
    error::Error,
    model::{AuditAction, AuditEntry, AuditRecord},
};

use super::{PostgresTransaction, error::DatabaseError};

/// Appends an audit record inside the caller's transaction, so a failed append
/// rolls back the mutation it describes. A `None` actor records a system change.
#[tracing::instrument(name = "append audit record", skip(tx, details))]
pub async fn append_audit(
    tx: &mut PostgresTransaction,
    user_id: Option<i64>,
    manga_id: i64,
    action: AuditAction,
    details: Option<serde_json::Value>,
) -> Result<AuditRecord, Error> {
    let record = sqlx::query_as::<_, AuditRecord>(
        r#"
        INSERT INTO manga_history
            (user_id, manga_id, action, details)
        VALUES
            ($1, $2, $3, $4)
        RETURNING *
    "#,
    )
    .bind(user_id)
    .bind(manga_id)
    .bind(action)
    .bind(details)
    .fetch_one(&mut **tx)
    .await
    .map_err(DatabaseError::from)?;

    Ok(record)
}

/// Newest first. Records survive deletion of their manga or actor, in which
/// case the joined title or username is absent.
#[tracing::instrument(name = "get audit log", skip(pool))]
pub async fn get_audit_log(pool: &PgPool, limit: i64) -> Result<Vec<AuditEntry>, Error> {
    let entries = sqlx::query_as::<_, AuditEntry>(
        r#"
        SELECT
            h.id, h.user_id, h.manga_id, h.action, h.details, h.created_at,
            u.username, m.title AS manga_title
        FROM
            manga_history h
        LEFT JOIN users u ON u.id = h.user_id
        LEFT JOIN manga m ON m.id = h.manga_id
        ORDER BY h.created_at DESC, h.id DESC
        LIMIT $1
    "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::from)?;

    Ok(entries)
}
