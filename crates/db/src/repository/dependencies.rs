//! Chore dependency edges.

use chrono::Utc;
use sqlx::SqliteExecutor;
use uuid::Uuid;

use crate::{DbError, models::ChoreDependencyRow};

const DEPENDENCY_COLUMNS: &str = "id, chore_id, depends_on_id, offset_hours, created_at";

/// Insert an edge "`chore_id` depends on `depends_on_id`". Duplicate edges
/// yield `DbError::Conflict`.
pub async fn create_dependency<'e, E>(
    executor: E,
    chore_id: Uuid,
    depends_on_id: Uuid,
    offset_hours: i64,
) -> Result<ChoreDependencyRow, DbError>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query_as::<_, ChoreDependencyRow>(&format!(
        r#"
        INSERT INTO chore_dependencies (id, chore_id, depends_on_id, offset_hours, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        RETURNING {DEPENDENCY_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(chore_id)
    .bind(depends_on_id)
    .bind(offset_hours)
    .bind(Utc::now())
    .fetch_one(executor)
    .await?;

    Ok(row)
}

/// Every dependency edge in the household.
pub async fn list_dependencies<'e, E>(executor: E) -> Result<Vec<ChoreDependencyRow>, DbError>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query_as::<_, ChoreDependencyRow>(&format!(
        "SELECT {DEPENDENCY_COLUMNS} FROM chore_dependencies ORDER BY created_at ASC"
    ))
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// Edges whose parent is `parent_id`.
pub async fn list_children_of<'e, E>(executor: E, parent_id: Uuid) -> Result<Vec<ChoreDependencyRow>, DbError>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query_as::<_, ChoreDependencyRow>(&format!(
        "SELECT {DEPENDENCY_COLUMNS} FROM chore_dependencies WHERE depends_on_id = ?1 ORDER BY created_at ASC"
    ))
    .bind(parent_id)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// Ids of every chore that is the child of some dependency.
pub async fn list_child_chore_ids<'e, E>(executor: E) -> Result<Vec<Uuid>, DbError>
where
    E: SqliteExecutor<'e>,
{
    let ids = sqlx::query_scalar::<_, Uuid>("SELECT DISTINCT chore_id FROM chore_dependencies")
        .fetch_all(executor)
        .await?;

    Ok(ids)
}

pub async fn delete_dependency<'e, E>(executor: E, id: Uuid) -> Result<(), DbError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM chore_dependencies WHERE id = ?1")
        .bind(id)
        .execute(executor)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
