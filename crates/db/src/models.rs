//! Row structs that map 1-to-1 onto database tables.
//!
//! These are *persistence* models; they carry no domain behaviour.
//! Scheduling and point rules live in the `engine` crate.
//!
//! Points columns hold integer hundredths of a point (`250` = 2.50).

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// users
// ---------------------------------------------------------------------------

/// A persisted household member.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    /// Argon2 PHC string. Only staff accounts need one.
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub is_staff: bool,
    pub is_active: bool,
    pub can_be_assigned: bool,
    pub eligible_for_points: bool,
    pub weekly_points: i64,
    pub all_time_points: i64,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// chores
// ---------------------------------------------------------------------------

/// How often a chore produces instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ScheduleType {
    Daily,
    Weekly,
    EveryNDays,
    OneTime,
}

impl std::fmt::Display for ScheduleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Daily      => write!(f, "daily"),
            Self::Weekly     => write!(f, "weekly"),
            Self::EveryNDays => write!(f, "every_n_days"),
            Self::OneTime    => write!(f, "one_time"),
        }
    }
}

impl std::str::FromStr for ScheduleType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily"        => Ok(Self::Daily),
            "weekly"       => Ok(Self::Weekly),
            "every_n_days" => Ok(Self::EveryNDays),
            "one_time"     => Ok(Self::OneTime),
            other          => Err(format!("unknown schedule type: {other}")),
        }
    }
}

/// A persisted chore definition row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChoreRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub points: i64,
    pub is_pool: bool,
    pub assigned_to: Option<Uuid>,
    pub is_undesirable: bool,
    pub is_difficult: bool,
    pub schedule_type: ScheduleType,
    /// 0 = Monday … 6 = Sunday. Weekly chores only.
    pub weekday: Option<i64>,
    pub every_n_days: Option<i64>,
    pub start_date: Option<NaiveDate>,
    /// Optional due date of a one-time chore.
    pub due_date: Option<NaiveDate>,
    pub distribution_time: NaiveTime,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Column values for inserting or updating a chore.
#[derive(Debug, Clone)]
pub struct ChoreFields {
    pub name: String,
    pub description: String,
    pub points: i64,
    pub is_pool: bool,
    pub assigned_to: Option<Uuid>,
    pub is_undesirable: bool,
    pub is_difficult: bool,
    pub schedule_type: ScheduleType,
    pub weekday: Option<i64>,
    pub every_n_days: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub distribution_time: NaiveTime,
}

// ---------------------------------------------------------------------------
// chore_templates
// ---------------------------------------------------------------------------

/// A reusable chore preset.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChoreTemplateRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub points: i64,
    pub is_pool: bool,
    pub is_undesirable: bool,
    pub is_difficult: bool,
    pub schedule_type: ScheduleType,
    pub weekday: Option<i64>,
    pub every_n_days: Option<i64>,
    pub distribution_time: NaiveTime,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Column values for a new chore template.
#[derive(Debug, Clone)]
pub struct TemplateFields {
    pub name: String,
    pub description: String,
    pub points: i64,
    pub is_pool: bool,
    pub is_undesirable: bool,
    pub is_difficult: bool,
    pub schedule_type: ScheduleType,
    pub weekday: Option<i64>,
    pub every_n_days: Option<i64>,
    pub distribution_time: NaiveTime,
    pub created_by: Option<Uuid>,
}

// ---------------------------------------------------------------------------
// chore_instances
// ---------------------------------------------------------------------------

/// Lifecycle status of a chore instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum InstanceStatus {
    Pool,
    Assigned,
    Completed,
    Skipped,
}

impl InstanceStatus {
    /// Open instances are the only ones shown on the board.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Pool | Self::Assigned)
    }
}

impl std::fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pool      => write!(f, "pool"),
            Self::Assigned  => write!(f, "assigned"),
            Self::Completed => write!(f, "completed"),
            Self::Skipped   => write!(f, "skipped"),
        }
    }
}

/// A persisted chore instance row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChoreInstanceRow {
    pub id: Uuid,
    pub chore_id: Uuid,
    pub status: InstanceStatus,
    pub assigned_to: Option<Uuid>,
    /// `fixed`, `claimed`, `auto`, `manual`, `dependency` or
    /// `no_eligible_users`.
    pub assignment_reason: Option<String>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub points_value: i64,
    pub due_at: DateTime<Utc>,
    pub distribution_at: DateTime<Utc>,
    pub spawned_from: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Column values for a new chore instance.
#[derive(Debug, Clone)]
pub struct NewInstance {
    pub chore_id: Uuid,
    pub status: InstanceStatus,
    pub assigned_to: Option<Uuid>,
    pub assignment_reason: Option<String>,
    pub points_value: i64,
    pub due_at: DateTime<Utc>,
    pub distribution_at: DateTime<Utc>,
    pub spawned_from: Option<Uuid>,
}

/// An instance joined with its chore and assignee, as rendered on boards.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InstanceDetailRow {
    pub id: Uuid,
    pub chore_id: Uuid,
    pub chore_name: String,
    pub chore_description: String,
    pub is_undesirable: bool,
    pub is_difficult: bool,
    pub status: InstanceStatus,
    pub assigned_to: Option<Uuid>,
    pub assignee_username: Option<String>,
    pub assignee_display_name: Option<String>,
    pub assignment_reason: Option<String>,
    pub points_value: i64,
    pub due_at: DateTime<Utc>,
    pub distribution_at: DateTime<Utc>,
    pub spawned_from: Option<Uuid>,
}

// ---------------------------------------------------------------------------
// completions
// ---------------------------------------------------------------------------

/// A persisted completion row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompletionRow {
    pub id: Uuid,
    pub instance_id: Uuid,
    pub completed_by: Uuid,
    pub completed_at: DateTime<Utc>,
    pub was_late: bool,
    pub is_undone: bool,
    pub undone_at: Option<DateTime<Utc>>,
    pub undone_by: Option<Uuid>,
}

/// Points credited to one user for one completion.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompletionShareRow {
    pub id: Uuid,
    pub completion_id: Uuid,
    pub user_id: Uuid,
    pub points_awarded: i64,
}

/// A completion joined with its chore and completer.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompletionDetailRow {
    pub id: Uuid,
    pub instance_id: Uuid,
    pub chore_name: String,
    pub completed_by: Uuid,
    pub completed_by_display_name: String,
    pub completed_at: DateTime<Utc>,
    pub was_late: bool,
    pub is_undone: bool,
    pub points_value: i64,
}

/// A share joined with the credited user's name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ShareDetailRow {
    pub completion_id: Uuid,
    pub user_id: Uuid,
    pub display_name: String,
    pub points_awarded: i64,
}

// ---------------------------------------------------------------------------
// chore_dependencies
// ---------------------------------------------------------------------------

/// "`chore_id` is spawned when `depends_on_id` is completed."
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChoreDependencyRow {
    pub id: Uuid,
    pub chore_id: Uuid,
    pub depends_on_id: Uuid,
    pub offset_hours: i64,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// sessions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// action_logs
// ---------------------------------------------------------------------------

/// Kinds of audited actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ActionType {
    Claim,
    Complete,
    Undo,
    Skip,
    Reassign,
    AutoAssign,
    Spawn,
    WeeklyReset,
    ChoreDeleted,
    ChoreDeactivated,
    Login,
    Logout,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Claim            => "claim",
            Self::Complete         => "complete",
            Self::Undo             => "undo",
            Self::Skip             => "skip",
            Self::Reassign         => "reassign",
            Self::AutoAssign       => "auto_assign",
            Self::Spawn            => "spawn",
            Self::WeeklyReset      => "weekly_reset",
            Self::ChoreDeleted     => "chore_deleted",
            Self::ChoreDeactivated => "chore_deactivated",
            Self::Login            => "login",
            Self::Logout           => "logout",
        };
        f.write_str(label)
    }
}

/// A persisted audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActionLogRow {
    pub id: Uuid,
    pub action_type: ActionType,
    pub actor_id: Option<Uuid>,
    pub target_user_id: Option<Uuid>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// weekly_snapshots
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WeeklySnapshotRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub week_ending: NaiveDate,
    pub points: i64,
    pub created_at: DateTime<Utc>,
}

/// Column values for a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub display_name: String,
    pub password_hash: Option<String>,
    pub is_staff: bool,
    pub can_be_assigned: bool,
    pub eligible_for_points: bool,
}

/// Mutable user flags edited from the admin pages.
#[derive(Debug, Clone)]
pub struct UserFlags {
    pub display_name: String,
    pub is_staff: bool,
    pub is_active: bool,
    pub can_be_assigned: bool,
    pub eligible_for_points: bool,
}
