//! Completion and completion-share repository functions.

use chrono::{DateTime, Utc};
use sqlx::SqliteExecutor;
use uuid::Uuid;

use crate::{
    DbError,
    models::{CompletionDetailRow, CompletionRow, CompletionShareRow, ShareDetailRow},
};

const COMPLETION_COLUMNS: &str =
    "id, instance_id, completed_by, completed_at, was_late, is_undone, undone_at, undone_by";

const DETAIL_SELECT: &str = r#"
    SELECT co.id, co.instance_id, c.name AS chore_name, co.completed_by,
           u.display_name AS completed_by_display_name, co.completed_at, co.was_late,
           co.is_undone, ci.points_value
    FROM completions co
    JOIN chore_instances ci ON ci.id = co.instance_id
    JOIN chores c ON c.id = ci.chore_id
    JOIN users u ON u.id = co.completed_by
"#;

// ---------------------------------------------------------------------------
// completions
// ---------------------------------------------------------------------------

pub async fn create_completion<'e, E>(
    executor: E,
    instance_id: Uuid,
    completed_by: Uuid,
    completed_at: DateTime<Utc>,
    was_late: bool,
) -> Result<CompletionRow, DbError>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query_as::<_, CompletionRow>(&format!(
        r#"
        INSERT INTO completions
            (id, instance_id, completed_by, completed_at, was_late, is_undone, undone_at, undone_by)
        VALUES (?1, ?2, ?3, ?4, ?5, 0, NULL, NULL)
        RETURNING {COMPLETION_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(instance_id)
    .bind(completed_by)
    .bind(completed_at)
    .bind(was_late)
    .fetch_one(executor)
    .await?;

    Ok(row)
}

pub async fn get_completion<'e, E>(executor: E, id: Uuid) -> Result<CompletionRow, DbError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, CompletionRow>(&format!(
        "SELECT {COMPLETION_COLUMNS} FROM completions WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or(DbError::NotFound)
}

/// Mark a completion as undone. Fails with `NotFound` if it was already
/// undone.
pub async fn mark_undone<'e, E>(
    executor: E,
    id: Uuid,
    undone_by: Option<Uuid>,
    undone_at: DateTime<Utc>,
) -> Result<(), DbError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE completions SET is_undone = 1, undone_at = ?1, undone_by = ?2 WHERE id = ?3 AND is_undone = 0",
    )
    .bind(undone_at)
    .bind(undone_by)
    .bind(id)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Completions (not undone) made at or after `since`, newest first.
pub async fn list_details_since<'e, E>(
    executor: E,
    since: DateTime<Utc>,
) -> Result<Vec<CompletionDetailRow>, DbError>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query_as::<_, CompletionDetailRow>(&format!(
        r#"
        {DETAIL_SELECT}
        WHERE co.is_undone = 0 AND co.completed_at >= ?1
        ORDER BY co.completed_at DESC
        "#
    ))
    .bind(since)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// The most recent completions, undone ones included, for the admin pages.
pub async fn list_recent_details<'e, E>(executor: E, limit: i64) -> Result<Vec<CompletionDetailRow>, DbError>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query_as::<_, CompletionDetailRow>(&format!(
        "{DETAIL_SELECT} ORDER BY co.completed_at DESC LIMIT ?1"
    ))
    .bind(limit)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// Who completed the chore most recently (ignoring undone completions).
pub async fn last_completer_for_chore<'e, E>(executor: E, chore_id: Uuid) -> Result<Option<Uuid>, DbError>
where
    E: SqliteExecutor<'e>,
{
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT co.completed_by
        FROM completions co
        JOIN chore_instances ci ON ci.id = co.instance_id
        WHERE ci.chore_id = ?1 AND co.is_undone = 0
        ORDER BY co.completed_at DESC
        LIMIT 1
        "#,
    )
    .bind(chore_id)
    .fetch_optional(executor)
    .await?;

    Ok(id)
}

/// Number of completions (not undone) recorded against a chore.
pub async fn count_for_chore<'e, E>(executor: E, chore_id: Uuid) -> Result<i64, DbError>
where
    E: SqliteExecutor<'e>,
{
    let count = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM completions co
        JOIN chore_instances ci ON ci.id = co.instance_id
        WHERE ci.chore_id = ?1 AND co.is_undone = 0
        "#,
    )
    .bind(chore_id)
    .fetch_one(executor)
    .await?;

    Ok(count)
}

pub async fn count_since<'e, E>(executor: E, since: DateTime<Utc>) -> Result<i64, DbError>
where
    E: SqliteExecutor<'e>,
{
    let count = sqlx::query_scalar(
        "SELECT COUNT(*) FROM completions WHERE is_undone = 0 AND completed_at >= ?1",
    )
    .bind(since)
    .fetch_one(executor)
    .await?;

    Ok(count)
}

// ---------------------------------------------------------------------------
// completion_shares
// ---------------------------------------------------------------------------

pub async fn create_share<'e, E>(
    executor: E,
    completion_id: Uuid,
    user_id: Uuid,
    points_awarded: i64,
) -> Result<CompletionShareRow, DbError>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query_as::<_, CompletionShareRow>(
        r#"
        INSERT INTO completion_shares (id, completion_id, user_id, points_awarded)
        VALUES (?1, ?2, ?3, ?4)
        RETURNING id, completion_id, user_id, points_awarded
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(completion_id)
    .bind(user_id)
    .bind(points_awarded)
    .fetch_one(executor)
    .await?;

    Ok(row)
}

pub async fn list_shares<'e, E>(executor: E, completion_id: Uuid) -> Result<Vec<CompletionShareRow>, DbError>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query_as::<_, CompletionShareRow>(
        "SELECT id, completion_id, user_id, points_awarded FROM completion_shares WHERE completion_id = ?1",
    )
    .bind(completion_id)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// Shares of every completion (not undone) made at or after `since`.
pub async fn list_share_details_since<'e, E>(
    executor: E,
    since: DateTime<Utc>,
) -> Result<Vec<ShareDetailRow>, DbError>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query_as::<_, ShareDetailRow>(
        r#"
        SELECT s.completion_id, s.user_id, u.display_name, s.points_awarded
        FROM completion_shares s
        JOIN completions co ON co.id = s.completion_id
        JOIN users u ON u.id = s.user_id
        WHERE co.is_undone = 0 AND co.completed_at >= ?1
        ORDER BY u.display_name ASC
        "#,
    )
    .bind(since)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}
