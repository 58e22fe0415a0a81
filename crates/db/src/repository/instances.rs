//! Chore instance repository functions.

use chrono::{DateTime, Utc};
use sqlx::SqliteExecutor;
use uuid::Uuid;

use crate::{
    DbError,
    models::{ChoreInstanceRow, InstanceDetailRow, InstanceStatus, NewInstance},
};

const INSTANCE_COLUMNS: &str = "id, chore_id, status, assigned_to, assignment_reason, assigned_at, \
     points_value, due_at, distribution_at, spawned_from, created_at, completed_at";

const DETAIL_SELECT: &str = r#"
    SELECT ci.id, ci.chore_id, c.name AS chore_name, c.description AS chore_description,
           c.is_undesirable, c.is_difficult, ci.status, ci.assigned_to,
           u.username AS assignee_username, u.display_name AS assignee_display_name,
           ci.assignment_reason, ci.points_value, ci.due_at, ci.distribution_at, ci.spawned_from
    FROM chore_instances ci
    JOIN chores c ON c.id = ci.chore_id
    LEFT JOIN users u ON u.id = ci.assigned_to
"#;

/// Insert a new instance. `assigned_at` is stamped when an assignee is set.
pub async fn create_instance<'e, E>(executor: E, new: &NewInstance) -> Result<ChoreInstanceRow, DbError>
where
    E: SqliteExecutor<'e>,
{
    let now = Utc::now();
    let assigned_at = new.assigned_to.map(|_| now);

    let row = sqlx::query_as::<_, ChoreInstanceRow>(&format!(
        r#"
        INSERT INTO chore_instances
            (id, chore_id, status, assigned_to, assignment_reason, assigned_at, points_value,
             due_at, distribution_at, spawned_from, created_at, completed_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, NULL)
        RETURNING {INSTANCE_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(new.chore_id)
    .bind(new.status)
    .bind(new.assigned_to)
    .bind(&new.assignment_reason)
    .bind(assigned_at)
    .bind(new.points_value)
    .bind(new.due_at)
    .bind(new.distribution_at)
    .bind(new.spawned_from)
    .bind(now)
    .fetch_one(executor)
    .await?;

    Ok(row)
}

/// Fetch a single instance by its primary key.
pub async fn get_instance<'e, E>(executor: E, id: Uuid) -> Result<ChoreInstanceRow, DbError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, ChoreInstanceRow>(&format!(
        "SELECT {INSTANCE_COLUMNS} FROM chore_instances WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or(DbError::NotFound)
}

pub async fn get_instance_detail<'e, E>(executor: E, id: Uuid) -> Result<InstanceDetailRow, DbError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, InstanceDetailRow>(&format!("{DETAIL_SELECT} WHERE ci.id = ?1"))
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or(DbError::NotFound)
}

/// Open (pool/assigned) instances due at or before `cutoff`, plus open
/// instances carrying the `no_due_date` sentinel.
pub async fn list_open_due_by<'e, E>(
    executor: E,
    cutoff: DateTime<Utc>,
    no_due_date: DateTime<Utc>,
) -> Result<Vec<InstanceDetailRow>, DbError>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query_as::<_, InstanceDetailRow>(&format!(
        r#"
        {DETAIL_SELECT}
        WHERE ci.status IN ('pool', 'assigned')
          AND (ci.due_at <= ?1 OR ci.due_at = ?2)
        ORDER BY ci.due_at ASC, c.name ASC
        "#
    ))
    .bind(cutoff)
    .bind(no_due_date)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// Every open instance regardless of due date.
pub async fn list_open<'e, E>(executor: E) -> Result<Vec<InstanceDetailRow>, DbError>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query_as::<_, InstanceDetailRow>(&format!(
        r#"
        {DETAIL_SELECT}
        WHERE ci.status IN ('pool', 'assigned')
        ORDER BY ci.due_at ASC, c.name ASC
        "#
    ))
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// Whether the chore already has an instance due inside `[start, end]`.
pub async fn exists_due_between<'e, E>(
    executor: E,
    chore_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<bool, DbError>
where
    E: SqliteExecutor<'e>,
{
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM chore_instances WHERE chore_id = ?1 AND due_at >= ?2 AND due_at <= ?3",
    )
    .bind(chore_id)
    .bind(start)
    .bind(end)
    .fetch_one(executor)
    .await?;

    Ok(count > 0)
}

/// Pool instances whose distribution time has passed and that were never
/// offered to the auto-assigner.
pub async fn list_pending_distribution<'e, E>(
    executor: E,
    now: DateTime<Utc>,
) -> Result<Vec<ChoreInstanceRow>, DbError>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query_as::<_, ChoreInstanceRow>(&format!(
        r#"
        SELECT {INSTANCE_COLUMNS} FROM chore_instances
        WHERE status = 'pool' AND assignment_reason IS NULL AND distribution_at <= ?1
        ORDER BY distribution_at ASC
        "#
    ))
    .bind(now)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// Assign an open instance. Returns `DbError::NotFound` when the instance
/// does not exist or is no longer open.
pub async fn assign<'e, E>(
    executor: E,
    id: Uuid,
    user_id: Uuid,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<(), DbError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE chore_instances
        SET status = 'assigned', assigned_to = ?1, assignment_reason = ?2, assigned_at = ?3
        WHERE id = ?4 AND status IN ('pool', 'assigned')
        "#,
    )
    .bind(user_id)
    .bind(reason)
    .bind(now)
    .bind(id)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Auto-assign a pool instance that was never offered before. Returns
/// `false` when it was claimed, reassigned or closed in the meantime.
pub async fn assign_from_pool<'e, E>(
    executor: E,
    id: Uuid,
    user_id: Uuid,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<bool, DbError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE chore_instances
        SET status = 'assigned', assigned_to = ?1, assignment_reason = ?2, assigned_at = ?3
        WHERE id = ?4 AND status = 'pool' AND assignment_reason IS NULL
        "#,
    )
    .bind(user_id)
    .bind(reason)
    .bind(now)
    .bind(id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Stamp `reason` on a pool instance that was never offered before, leaving
/// it unassigned. Returns `false` when the instance left the pool meanwhile.
pub async fn mark_pool_reason<'e, E>(executor: E, id: Uuid, reason: &str) -> Result<bool, DbError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE chore_instances SET assignment_reason = ?1
        WHERE id = ?2 AND status = 'pool' AND assignment_reason IS NULL
        "#,
    )
    .bind(reason)
    .bind(id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Set the status and `completed_at` of an instance.
pub async fn update_status<'e, E>(
    executor: E,
    id: Uuid,
    status: InstanceStatus,
    completed_at: Option<DateTime<Utc>>,
) -> Result<(), DbError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE chore_instances SET status = ?1, completed_at = ?2 WHERE id = ?3",
    )
    .bind(status)
    .bind(completed_at)
    .bind(id)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Number of open instances currently assigned to the user.
pub async fn count_open_assigned<'e, E>(executor: E, user_id: Uuid) -> Result<i64, DbError>
where
    E: SqliteExecutor<'e>,
{
    let count = sqlx::query_scalar(
        "SELECT COUNT(*) FROM chore_instances WHERE assigned_to = ?1 AND status = 'assigned'",
    )
    .bind(user_id)
    .fetch_one(executor)
    .await?;

    Ok(count)
}

/// Number of claims the user made at or after `since`.
pub async fn count_claims_since<'e, E>(
    executor: E,
    user_id: Uuid,
    since: DateTime<Utc>,
) -> Result<i64, DbError>
where
    E: SqliteExecutor<'e>,
{
    let count = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM chore_instances
        WHERE assigned_to = ?1 AND assignment_reason = 'claimed' AND assigned_at >= ?2
        "#,
    )
    .bind(user_id)
    .bind(since)
    .fetch_one(executor)
    .await?;

    Ok(count)
}

/// Open instances whose due time has already passed.
pub async fn count_overdue<'e, E>(executor: E, now: DateTime<Utc>) -> Result<i64, DbError>
where
    E: SqliteExecutor<'e>,
{
    let count = sqlx::query_scalar(
        "SELECT COUNT(*) FROM chore_instances WHERE status IN ('pool', 'assigned') AND due_at < ?1",
    )
    .bind(now)
    .fetch_one(executor)
    .await?;

    Ok(count)
}

pub async fn count_by_status<'e, E>(executor: E, status: InstanceStatus) -> Result<i64, DbError>
where
    E: SqliteExecutor<'e>,
{
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM chore_instances WHERE status = ?1")
        .bind(status)
        .fetch_one(executor)
        .await?;

    Ok(count)
}

/// Remove the open instances of a chore. Returns how many were deleted.
pub async fn delete_open_for_chore<'e, E>(executor: E, chore_id: Uuid) -> Result<u64, DbError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        "DELETE FROM chore_instances WHERE chore_id = ?1 AND status IN ('pool', 'assigned')",
    )
    .bind(chore_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// Remove open instances spawned by the given parent instance.
pub async fn delete_open_spawned_from<'e, E>(executor: E, parent_id: Uuid) -> Result<u64, DbError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        "DELETE FROM chore_instances WHERE spawned_from = ?1 AND status IN ('pool', 'assigned')",
    )
    .bind(parent_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// Whether `parent_id` already spawned an instance of `chore_id`.
pub async fn exists_spawned<'e, E>(executor: E, parent_id: Uuid, chore_id: Uuid) -> Result<bool, DbError>
where
    E: SqliteExecutor<'e>,
{
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM chore_instances WHERE spawned_from = ?1 AND chore_id = ?2",
    )
    .bind(parent_id)
    .bind(chore_id)
    .fetch_one(executor)
    .await?;

    Ok(count > 0)
}
