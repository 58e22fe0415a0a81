//! Chore template CRUD.

use chrono::Utc;
use sqlx::SqliteExecutor;
use uuid::Uuid;

use crate::{
    DbError,
    models::{ChoreTemplateRow, TemplateFields},
};

const TEMPLATE_COLUMNS: &str = "id, name, description, points, is_pool, is_undesirable, is_difficult, \
     schedule_type, weekday, every_n_days, distribution_time, created_by, created_at";

/// Insert a template. Template names are unique.
pub async fn create_template<'e, E>(executor: E, fields: &TemplateFields) -> Result<ChoreTemplateRow, DbError>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query_as::<_, ChoreTemplateRow>(&format!(
        r#"
        INSERT INTO chore_templates
            (id, name, description, points, is_pool, is_undesirable, is_difficult,
             schedule_type, weekday, every_n_days, distribution_time, created_by, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        RETURNING {TEMPLATE_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(&fields.name)
    .bind(&fields.description)
    .bind(fields.points)
    .bind(fields.is_pool)
    .bind(fields.is_undesirable)
    .bind(fields.is_difficult)
    .bind(fields.schedule_type)
    .bind(fields.weekday)
    .bind(fields.every_n_days)
    .bind(fields.distribution_time)
    .bind(fields.created_by)
    .bind(Utc::now())
    .fetch_one(executor)
    .await?;

    Ok(row)
}

pub async fn get_template<'e, E>(executor: E, id: Uuid) -> Result<ChoreTemplateRow, DbError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, ChoreTemplateRow>(&format!(
        "SELECT {TEMPLATE_COLUMNS} FROM chore_templates WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or(DbError::NotFound)
}

/// All templates ordered by name.
pub async fn list_templates<'e, E>(executor: E) -> Result<Vec<ChoreTemplateRow>, DbError>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query_as::<_, ChoreTemplateRow>(&format!(
        "SELECT {TEMPLATE_COLUMNS} FROM chore_templates ORDER BY name ASC"
    ))
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

pub async fn delete_template<'e, E>(executor: E, id: Uuid) -> Result<(), DbError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM chore_templates WHERE id = ?1")
        .bind(id)
        .execute(executor)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
