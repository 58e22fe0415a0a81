//! Login sessions.

use chrono::{DateTime, Utc};
use sqlx::SqliteExecutor;
use uuid::Uuid;

use crate::{DbError, models::SessionRow};

pub async fn create_session<'e, E>(
    executor: E,
    token: &str,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
) -> Result<SessionRow, DbError>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query_as::<_, SessionRow>(
        r#"
        INSERT INTO sessions (token, user_id, created_at, expires_at)
        VALUES (?1, ?2, ?3, ?4)
        RETURNING token, user_id, created_at, expires_at
        "#,
    )
    .bind(token)
    .bind(user_id)
    .bind(Utc::now())
    .bind(expires_at)
    .fetch_one(executor)
    .await?;

    Ok(row)
}

/// Look up a session that has not expired yet.
pub async fn find_live_session<'e, E>(
    executor: E,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Option<SessionRow>, DbError>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query_as::<_, SessionRow>(
        "SELECT token, user_id, created_at, expires_at FROM sessions WHERE token = ?1 AND expires_at > ?2",
    )
    .bind(token)
    .bind(now)
    .fetch_optional(executor)
    .await?;

    Ok(row)
}

pub async fn delete_session<'e, E>(executor: E, token: &str) -> Result<(), DbError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("DELETE FROM sessions WHERE token = ?1")
        .bind(token)
        .execute(executor)
        .await?;
    Ok(())
}

/// Drop every session that expired before `now`.
pub async fn purge_expired<'e, E>(executor: E, now: DateTime<Utc>) -> Result<u64, DbError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?1")
        .bind(now)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
