//! Weekly point snapshots.

use chrono::{NaiveDate, Utc};
use sqlx::SqliteExecutor;
use uuid::Uuid;

use crate::{DbError, models::WeeklySnapshotRow};

/// Insert a snapshot. A second snapshot for the same user and week yields
/// `DbError::Conflict`.
pub async fn create_snapshot<'e, E>(
    executor: E,
    user_id: Uuid,
    week_ending: NaiveDate,
    points: i64,
) -> Result<WeeklySnapshotRow, DbError>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query_as::<_, WeeklySnapshotRow>(
        r#"
        INSERT INTO weekly_snapshots (id, user_id, week_ending, points, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        RETURNING id, user_id, week_ending, points, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(week_ending)
    .bind(points)
    .bind(Utc::now())
    .fetch_one(executor)
    .await?;

    Ok(row)
}

pub async fn exists_for_week<'e, E>(executor: E, week_ending: NaiveDate) -> Result<bool, DbError>
where
    E: SqliteExecutor<'e>,
{
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM weekly_snapshots WHERE week_ending = ?1")
        .bind(week_ending)
        .fetch_one(executor)
        .await?;

    Ok(count > 0)
}

pub async fn list_for_user<'e, E>(executor: E, user_id: Uuid) -> Result<Vec<WeeklySnapshotRow>, DbError>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query_as::<_, WeeklySnapshotRow>(
        r#"
        SELECT id, user_id, week_ending, points, created_at
        FROM weekly_snapshots
        WHERE user_id = ?1
        ORDER BY week_ending DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}
