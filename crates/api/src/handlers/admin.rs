//! Staff-only administration pages.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::response::{Html, Response};
use axum_extra::extract::Form;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use db::models::{ScheduleType, UserFlags};
use engine::chores::TemplateOverrides;
use engine::points::parse_points;
use engine::users::UserInput;
use engine::{ChoreInput, EngineError};

use crate::auth::StaffUser;
use crate::error::ApiError;
use crate::handlers::{found, render};
use crate::state::AppState;
use crate::templates::{
    ChoreEditTemplate, ChoresTemplate, DashboardTemplate, LogsTemplate, TemplatesTemplate, UsersTemplate,
};
use crate::views::{
    ChoreEditView, ChoreView, CompletionView, DependencyView, ItemView, LogView, TemplateView, UserOption,
    UserView,
};

const DASHBOARD_ACTIVITY: i64 = 15;
const DASHBOARD_COMPLETIONS: i64 = 20;
const LOG_PAGE_SIZE: i64 = 200;

// ---------------------------------------------------------------------------
// Forms
// ---------------------------------------------------------------------------

/// Chore and template form. Points are entered as decimals (`2.50`).
#[derive(Debug, Deserialize)]
pub struct ChoreForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub points: String,
    /// Only read for templates; chores are pool chores when unassigned.
    #[serde(default)]
    pub is_pool: bool,
    pub assigned_to: Option<Uuid>,
    #[serde(default)]
    pub is_undesirable: bool,
    #[serde(default)]
    pub is_difficult: bool,
    pub schedule_type: ScheduleType,
    pub weekday: Option<i64>,
    pub every_n_days: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub distribution_time: String,
    /// Repeated `eligible=<id>` fields restricting auto-assignment.
    #[serde(default)]
    pub eligible: Vec<Uuid>,
}

impl ChoreForm {
    fn chore_input(&self) -> Result<ChoreInput, EngineError> {
        Ok(ChoreInput {
            name: self.name.clone(),
            description: self.description.clone(),
            points: parse_points(&self.points)?,
            is_pool: self.assigned_to.is_none(),
            assigned_to: self.assigned_to,
            is_undesirable: self.is_undesirable,
            is_difficult: self.is_difficult,
            schedule_type: self.schedule_type,
            weekday: self.weekday,
            every_n_days: self.every_n_days,
            start_date: self.start_date,
            due_date: self.due_date,
            distribution_time: self.distribution_time.clone(),
        })
    }

    fn template_input(&self) -> Result<ChoreInput, EngineError> {
        Ok(ChoreInput { is_pool: self.is_pool, assigned_to: None, ..self.chore_input()? })
    }
}

/// New user. Unticked checkboxes are absent from the body, so every flag
/// defaults to `false`.
#[derive(Debug, Deserialize)]
pub struct NewUserForm {
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    pub password: Option<String>,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub can_be_assigned: bool,
    #[serde(default)]
    pub eligible_for_points: bool,
}

#[derive(Debug, Deserialize)]
pub struct EditUserForm {
    pub display_name: String,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub can_be_assigned: bool,
    #[serde(default)]
    pub eligible_for_points: bool,
    /// Replaces the password when non-empty.
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReassignForm {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct DependencyForm {
    pub chore_id: Uuid,
    pub depends_on: Uuid,
    #[serde(default)]
    pub offset_hours: i64,
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

pub async fn dashboard(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
) -> Result<Html<String>, ApiError> {
    let now = Utc::now();
    let offset = state.engine.offset();

    let stats = state.boards.dashboard(now).await?;
    let open = state.boards.open_instances(now).await?;
    let completions = state.boards.recent_completions(DASHBOARD_COMPLETIONS).await?;
    let activity = state.boards.recent_activity(DASHBOARD_ACTIVITY).await?;
    let people = state.users.list_assignable().await?;

    render(DashboardTemplate {
        staff: staff.display_name,
        stats,
        open: ItemView::list(&open, offset),
        completions: completions.iter().map(|c| CompletionView::new(c, now)).collect(),
        activity: activity.iter().map(|row| LogView::new(row, offset)).collect(),
        people: people.iter().map(UserOption::from).collect(),
    })
}

pub async fn skip_instance(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state.completions.skip(id, Some(staff.id)).await?;
    Ok(found("/admin"))
}

pub async fn reassign_instance(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    Path(id): Path<Uuid>,
    Form(form): Form<ReassignForm>,
) -> Result<Response, ApiError> {
    state
        .completions
        .reassign(id, form.user_id, Some(staff.id), Utc::now())
        .await?;
    Ok(found("/admin"))
}

pub async fn undo_completion(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state
        .completions
        .undo_completion(id, Some(staff.id), Utc::now())
        .await?;
    Ok(found("/admin"))
}

// ---------------------------------------------------------------------------
// Chores and dependencies
// ---------------------------------------------------------------------------

pub async fn chores(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
) -> Result<Html<String>, ApiError> {
    let all_chores = state.chores.list_chores(true).await?;
    let users = state.users.list_users().await?;
    let dependencies = state.dependencies.list_dependencies().await?;

    let user_names: HashMap<Uuid, String> =
        users.iter().map(|u| (u.id, u.display_name.clone())).collect();
    let chore_names: HashMap<Uuid, String> =
        all_chores.iter().map(|c| (c.id, c.name.clone())).collect();

    render(ChoresTemplate {
        staff: staff.display_name,
        chores: all_chores.iter().map(|c| ChoreView::new(c, &user_names)).collect(),
        dependencies: dependencies.iter().map(|d| DependencyView::new(d, &chore_names)).collect(),
        people: users
            .iter()
            .filter(|u| u.is_active && u.can_be_assigned)
            .map(UserOption::from)
            .collect(),
    })
}

pub async fn create_chore(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    Form(form): Form<ChoreForm>,
) -> Result<Response, ApiError> {
    let input = form.chore_input()?;
    let (chore, _) = state
        .chores
        .create_chore_with_eligibility(&input, &form.eligible, Utc::now())
        .await?;
    info!(chore = %chore.name, staff = %staff.username, "chore created from admin");
    Ok(found("/admin/chores"))
}

pub async fn edit_chore(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, ApiError> {
    let chore = state.chores.get_chore(id).await?;
    let eligible = state.chores.eligibility(id).await?;
    let people: Vec<_> = state
        .users
        .list_users()
        .await?
        .into_iter()
        .filter(|u| (u.is_active && u.can_be_assigned) || chore.assigned_to == Some(u.id))
        .collect();

    render(ChoreEditTemplate {
        staff: staff.display_name,
        chore: ChoreEditView::new(&chore, &people, &eligible),
    })
}

pub async fn update_chore(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    Path(id): Path<Uuid>,
    Form(form): Form<ChoreForm>,
) -> Result<Response, ApiError> {
    let input = form.chore_input()?;
    let chore = state.chores.update_chore(id, &input, &form.eligible).await?;
    info!(chore = %chore.name, staff = %staff.username, "chore updated from admin");
    Ok(found("/admin/chores"))
}

pub async fn activate_chore(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state.chores.set_active(id, true).await?;
    Ok(found(&format!("/admin/chores/{id}")))
}

pub async fn delete_chore(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state.chores.delete_chore(id, Some(staff.id)).await?;
    Ok(found("/admin/chores"))
}

pub async fn add_dependency(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    Form(form): Form<DependencyForm>,
) -> Result<Response, ApiError> {
    state
        .dependencies
        .add_dependency(form.chore_id, form.depends_on, form.offset_hours)
        .await?;
    Ok(found("/admin/chores"))
}

pub async fn remove_dependency(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state.dependencies.remove_dependency(id).await?;
    Ok(found("/admin/chores"))
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

pub async fn templates(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
) -> Result<Html<String>, ApiError> {
    let templates = state.chores.list_templates().await?;
    let people = state.users.list_assignable().await?;

    render(TemplatesTemplate {
        staff: staff.display_name,
        templates: templates.iter().map(TemplateView::from).collect(),
        people: people.iter().map(UserOption::from).collect(),
    })
}

pub async fn create_template(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    Form(form): Form<ChoreForm>,
) -> Result<Response, ApiError> {
    let input = form.template_input()?;
    state.chores.create_template(&input, Some(staff.id)).await?;
    Ok(found("/admin/templates"))
}

pub async fn instantiate_template(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    Path(id): Path<Uuid>,
    Form(mut overrides): Form<TemplateOverrides>,
) -> Result<Response, ApiError> {
    overrides.name = overrides.name.filter(|name| !name.trim().is_empty());
    state
        .chores
        .create_chore_from_template(id, &overrides, Utc::now())
        .await?;
    Ok(found("/admin/chores"))
}

pub async fn delete_template(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state.chores.delete_template(id).await?;
    Ok(found("/admin/templates"))
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub async fn users(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
) -> Result<Html<String>, ApiError> {
    let users = state.users.list_users().await?;
    render(UsersTemplate {
        staff: staff.display_name,
        users: users.iter().map(UserView::from).collect(),
    })
}

pub async fn create_user(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    Form(form): Form<NewUserForm>,
) -> Result<Response, ApiError> {
    state
        .users
        .create_user(&UserInput {
            username: form.username,
            display_name: form.display_name,
            password: form.password,
            is_staff: form.is_staff,
            can_be_assigned: form.can_be_assigned,
            eligible_for_points: form.eligible_for_points,
        })
        .await?;
    Ok(found("/admin/users"))
}

pub async fn update_user(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    Path(id): Path<Uuid>,
    Form(form): Form<EditUserForm>,
) -> Result<Response, ApiError> {
    if id == staff.id && (!form.is_staff || !form.is_active) {
        return Err(EngineError::Validation("you cannot remove your own staff access".into()).into());
    }
    let password = form.password.as_deref().filter(|p| !p.is_empty());
    state
        .users
        .update_user(
            id,
            &UserFlags {
                display_name: form.display_name.clone(),
                is_staff: form.is_staff,
                is_active: form.is_active,
                can_be_assigned: form.can_be_assigned,
                eligible_for_points: form.eligible_for_points,
            },
            password,
        )
        .await?;
    Ok(found("/admin/users"))
}

// ---------------------------------------------------------------------------
// Action log
// ---------------------------------------------------------------------------

pub async fn logs(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
) -> Result<Html<String>, ApiError> {
    let offset = state.engine.offset();
    let entries = state.boards.recent_activity(LOG_PAGE_SIZE).await?;
    render(LogsTemplate {
        staff: staff.display_name,
        entries: entries.iter().map(|row| LogView::new(row, offset)).collect(),
    })
}
