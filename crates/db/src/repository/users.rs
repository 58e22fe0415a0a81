//! User CRUD and point bookkeeping.

use chrono::Utc;
use sqlx::SqliteExecutor;
use uuid::Uuid;

use crate::{
    DbError,
    models::{NewUser, UserFlags, UserRow},
};

const USER_COLUMNS: &str = "id, username, display_name, password_hash, is_staff, is_active, \
     can_be_assigned, eligible_for_points, weekly_points, all_time_points, created_at";

/// Insert a new user. Duplicate usernames yield `DbError::Conflict`.
pub async fn create_user<'e, E>(executor: E, user: &NewUser) -> Result<UserRow, DbError>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query_as::<_, UserRow>(&format!(
        r#"
        INSERT INTO users
            (id, username, display_name, password_hash, is_staff, is_active,
             can_be_assigned, eligible_for_points, weekly_points, all_time_points, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?7, 0, 0, ?8)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(&user.username)
    .bind(&user.display_name)
    .bind(&user.password_hash)
    .bind(user.is_staff)
    .bind(user.can_be_assigned)
    .bind(user.eligible_for_points)
    .bind(Utc::now())
    .fetch_one(executor)
    .await?;

    Ok(row)
}

/// Fetch a single user by primary key.
pub async fn get_user<'e, E>(executor: E, id: Uuid) -> Result<UserRow, DbError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or(DbError::NotFound)
}

pub async fn find_by_username<'e, E>(executor: E, username: &str) -> Result<Option<UserRow>, DbError>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = ?1"
    ))
    .bind(username)
    .fetch_optional(executor)
    .await?;

    Ok(row)
}

/// All users ordered by display name.
pub async fn list_users<'e, E>(executor: E) -> Result<Vec<UserRow>, DbError>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY display_name ASC, username ASC"
    ))
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// Active users who may receive chores.
pub async fn list_assignable<'e, E>(executor: E) -> Result<Vec<UserRow>, DbError>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users \
         WHERE is_active = 1 AND can_be_assigned = 1 \
         ORDER BY display_name ASC, username ASC"
    ))
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// Active users eligible for points, highest weekly total first.
pub async fn leaderboard<'e, E>(executor: E) -> Result<Vec<UserRow>, DbError>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users \
         WHERE is_active = 1 AND eligible_for_points = 1 \
         ORDER BY weekly_points DESC, all_time_points DESC, display_name ASC"
    ))
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// Overwrite the editable flags of a user.
pub async fn update_flags<'e, E>(executor: E, id: Uuid, flags: &UserFlags) -> Result<(), DbError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE users
        SET display_name = ?1, is_staff = ?2, is_active = ?3,
            can_be_assigned = ?4, eligible_for_points = ?5
        WHERE id = ?6
        "#,
    )
    .bind(&flags.display_name)
    .bind(flags.is_staff)
    .bind(flags.is_active)
    .bind(flags.can_be_assigned)
    .bind(flags.eligible_for_points)
    .bind(id)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

pub async fn set_password_hash<'e, E>(executor: E, id: Uuid, hash: &str) -> Result<(), DbError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("UPDATE users SET password_hash = ?1 WHERE id = ?2")
        .bind(hash)
        .bind(id)
        .execute(executor)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Apply a signed point delta to both totals. Weekly points never drop
/// below zero.
pub async fn add_points<'e, E>(executor: E, id: Uuid, delta: i64) -> Result<(), DbError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        UPDATE users
        SET weekly_points = MAX(weekly_points + ?1, 0),
            all_time_points = all_time_points + ?1
        WHERE id = ?2
        "#,
    )
    .bind(delta)
    .bind(id)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn reset_weekly_points<'e, E>(executor: E, id: Uuid) -> Result<(), DbError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("UPDATE users SET weekly_points = 0 WHERE id = ?1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}
