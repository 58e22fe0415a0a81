//! Audit log of household actions.

use chrono::Utc;
use sqlx::SqliteExecutor;
use uuid::Uuid;

use crate::{
    DbError,
    models::{ActionLogRow, ActionType},
};

pub async fn record<'e, E>(
    executor: E,
    action_type: ActionType,
    actor_id: Option<Uuid>,
    target_user_id: Option<Uuid>,
    description: &str,
) -> Result<ActionLogRow, DbError>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query_as::<_, ActionLogRow>(
        r#"
        INSERT INTO action_logs (id, action_type, actor_id, target_user_id, description, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        RETURNING id, action_type, actor_id, target_user_id, description, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(action_type)
    .bind(actor_id)
    .bind(target_user_id)
    .bind(description)
    .bind(Utc::now())
    .fetch_one(executor)
    .await?;

    Ok(row)
}

/// The newest `limit` entries.
pub async fn list_recent<'e, E>(executor: E, limit: i64) -> Result<Vec<ActionLogRow>, DbError>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query_as::<_, ActionLogRow>(
        r#"
        SELECT id, action_type, actor_id, target_user_id, description, created_at
        FROM action_logs
        ORDER BY created_at DESC
        LIMIT ?1
        "#,
    )
    .bind(limit)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}
