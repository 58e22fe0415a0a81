//! Chore CRUD and eligibility lists.

use chrono::Utc;
use sqlx::{SqliteConnection, SqliteExecutor};
use uuid::Uuid;

use crate::{
    DbError,
    models::{ChoreFields, ChoreRow},
};

const CHORE_COLUMNS: &str = "id, name, description, points, is_pool, assigned_to, is_undesirable, \
     is_difficult, schedule_type, weekday, every_n_days, start_date, due_date, distribution_time, \
     is_active, created_at, updated_at";

/// Insert a new, active chore.
pub async fn create_chore<'e, E>(executor: E, fields: &ChoreFields) -> Result<ChoreRow, DbError>
where
    E: SqliteExecutor<'e>,
{
    let now = Utc::now();

    let row = sqlx::query_as::<_, ChoreRow>(&format!(
        r#"
        INSERT INTO chores
            (id, name, description, points, is_pool, assigned_to, is_undesirable, is_difficult,
             schedule_type, weekday, every_n_days, start_date, due_date, distribution_time,
             is_active, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, 1, ?15, ?15)
        RETURNING {CHORE_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(&fields.name)
    .bind(&fields.description)
    .bind(fields.points)
    .bind(fields.is_pool)
    .bind(fields.assigned_to)
    .bind(fields.is_undesirable)
    .bind(fields.is_difficult)
    .bind(fields.schedule_type)
    .bind(fields.weekday)
    .bind(fields.every_n_days)
    .bind(fields.start_date)
    .bind(fields.due_date)
    .bind(fields.distribution_time)
    .bind(now)
    .fetch_one(executor)
    .await?;

    Ok(row)
}

/// Fetch a single chore by its primary key.
pub async fn get_chore<'e, E>(executor: E, id: Uuid) -> Result<ChoreRow, DbError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, ChoreRow>(&format!("SELECT {CHORE_COLUMNS} FROM chores WHERE id = ?1"))
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or(DbError::NotFound)
}

/// Return chores ordered by name. Inactive chores are included on request.
pub async fn list_chores<'e, E>(executor: E, include_inactive: bool) -> Result<Vec<ChoreRow>, DbError>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query_as::<_, ChoreRow>(&format!(
        "SELECT {CHORE_COLUMNS} FROM chores WHERE is_active = 1 OR ?1 ORDER BY name ASC"
    ))
    .bind(include_inactive)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// Overwrite every editable column of a chore.
pub async fn update_chore<'e, E>(executor: E, id: Uuid, fields: &ChoreFields) -> Result<ChoreRow, DbError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, ChoreRow>(&format!(
        r#"
        UPDATE chores
        SET name = ?1, description = ?2, points = ?3, is_pool = ?4, assigned_to = ?5,
            is_undesirable = ?6, is_difficult = ?7, schedule_type = ?8, weekday = ?9,
            every_n_days = ?10, start_date = ?11, due_date = ?12, distribution_time = ?13,
            updated_at = ?14
        WHERE id = ?15
        RETURNING {CHORE_COLUMNS}
        "#
    ))
    .bind(&fields.name)
    .bind(&fields.description)
    .bind(fields.points)
    .bind(fields.is_pool)
    .bind(fields.assigned_to)
    .bind(fields.is_undesirable)
    .bind(fields.is_difficult)
    .bind(fields.schedule_type)
    .bind(fields.weekday)
    .bind(fields.every_n_days)
    .bind(fields.start_date)
    .bind(fields.due_date)
    .bind(fields.distribution_time)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or(DbError::NotFound)
}

pub async fn set_active<'e, E>(executor: E, id: Uuid, active: bool) -> Result<(), DbError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("UPDATE chores SET is_active = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(active)
        .bind(Utc::now())
        .bind(id)
        .execute(executor)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Permanently delete a chore. Instances, dependencies and eligibility rows
/// go with it through `ON DELETE CASCADE`.
///
/// Returns `DbError::NotFound` if no row was deleted.
pub async fn delete_chore<'e, E>(executor: E, id: Uuid) -> Result<(), DbError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM chores WHERE id = ?1")
        .bind(id)
        .execute(executor)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// chore_eligibility
// ---------------------------------------------------------------------------

/// Users allowed to be auto-assigned this chore. Empty means everybody.
pub async fn list_eligible_user_ids<'e, E>(executor: E, chore_id: Uuid) -> Result<Vec<Uuid>, DbError>
where
    E: SqliteExecutor<'e>,
{
    let ids = sqlx::query_scalar::<_, Uuid>(
        "SELECT user_id FROM chore_eligibility WHERE chore_id = ?1",
    )
    .bind(chore_id)
    .fetch_all(executor)
    .await?;

    Ok(ids)
}

/// Replace the eligibility list of a chore.
pub async fn replace_eligibility(
    conn: &mut SqliteConnection,
    chore_id: Uuid,
    user_ids: &[Uuid],
) -> Result<(), DbError> {
    sqlx::query("DELETE FROM chore_eligibility WHERE chore_id = ?1")
        .bind(chore_id)
        .execute(&mut *conn)
        .await?;

    for user_id in user_ids {
        sqlx::query("INSERT OR IGNORE INTO chore_eligibility (chore_id, user_id) VALUES (?1, ?2)")
            .bind(chore_id)
            .bind(*user_id)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}
