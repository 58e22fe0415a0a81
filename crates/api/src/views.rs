//! Display helpers and the flattened view models the templates render.
//!
//! Templates only print strings and flags; every date, point value and
//! label is formatted here.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};
use uuid::Uuid;

use db::models::{
    ActionLogRow, ChoreDependencyRow, ChoreRow, ChoreTemplateRow, CompletionDetailRow,
    ScheduleType, UserRow,
};
use engine::board::{BoardItem, CompletedItem, LeaderboardEntry, UserColumn};
use engine::points::format_points;
use engine::DueState;

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

pub fn points(hundredths: i64) -> String {
    format_points(hundredths)
}

pub fn due_label(state: DueState, due_at: DateTime<Utc>, offset: FixedOffset) -> String {
    match state {
        DueState::Overdue => "Overdue".into(),
        DueState::DueToday => "Due today".into(),
        DueState::NoDueDate => "No due date".into(),
        DueState::Upcoming => format!("Due {}", due_at.with_timezone(&offset).format("%a %d %b")),
    }
}

/// Coarse "time ago" text. Future timestamps read as "just now".
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds();
    match secs {
        s if s < 60 => "just now".into(),
        s if s < 3_600 => format!("{} min ago", s / 60),
        s if s < 7_200 => "1 hour ago".into(),
        s if s < 86_400 => format!("{} hours ago", s / 3_600),
        s if s < 172_800 => "yesterday".into(),
        s => format!("{} days ago", s / 86_400),
    }
}

pub fn local_time(at: DateTime<Utc>, offset: FixedOffset) -> String {
    at.with_timezone(&offset).format("%Y-%m-%d %H:%M").to_string()
}

pub fn schedule_label(
    schedule: ScheduleType,
    weekday: Option<i64>,
    every_n_days: Option<i64>,
) -> String {
    match schedule {
        ScheduleType::Daily => "Daily".into(),
        ScheduleType::Weekly => {
            let day = weekday
                .and_then(|d| usize::try_from(d).ok())
                .and_then(|d| WEEKDAYS.get(d))
                .copied()
                .unwrap_or("?");
            format!("Weekly on {day}")
        }
        ScheduleType::EveryNDays => format!("Every {} days", every_n_days.unwrap_or(1)),
        ScheduleType::OneTime => "One time".into(),
    }
}

// ---------------------------------------------------------------------------
// View models
// ---------------------------------------------------------------------------

/// Entry for a user `<select>`.
pub struct UserOption {
    pub id: Uuid,
    pub display_name: String,
}

impl From<&UserRow> for UserOption {
    fn from(user: &UserRow) -> Self {
        Self { id: user.id, display_name: user.display_name.clone() }
    }
}

impl From<&UserColumn> for UserOption {
    fn from(column: &UserColumn) -> Self {
        Self { id: column.user_id, display_name: column.display_name.clone() }
    }
}

pub struct ItemView {
    pub id: Uuid,
    pub chore: String,
    pub description: String,
    pub points: String,
    pub due: String,
    /// CSS class: `overdue`, `today`, `upcoming` or `undated`.
    pub due_class: &'static str,
    /// Assignee's display name, or "Pool".
    pub assignee: String,
    pub in_pool: bool,
    pub undesirable: bool,
    pub difficult: bool,
    pub follow_up: bool,
}

impl ItemView {
    pub fn new(item: &BoardItem, offset: FixedOffset) -> Self {
        let i = &item.instance;
        Self {
            id: i.id,
            chore: i.chore_name.clone(),
            description: i.chore_description.clone(),
            points: points(i.points_value),
            due: due_label(item.due_state, i.due_at, offset),
            due_class: match item.due_state {
                DueState::Overdue => "overdue",
                DueState::DueToday => "today",
                DueState::Upcoming => "upcoming",
                DueState::NoDueDate => "undated",
            },
            assignee: i.assignee_display_name.clone().unwrap_or_else(|| "Pool".into()),
            in_pool: i.assigned_to.is_none(),
            undesirable: i.is_undesirable,
            difficult: i.is_difficult,
            follow_up: i.spawned_from.is_some(),
        }
    }

    pub fn list(items: &[BoardItem], offset: FixedOffset) -> Vec<Self> {
        items.iter().map(|item| Self::new(item, offset)).collect()
    }
}

pub struct ColumnView {
    pub username: String,
    pub display_name: String,
    pub items: Vec<ItemView>,
    pub overdue_count: usize,
}

impl ColumnView {
    pub fn new(column: &UserColumn, offset: FixedOffset) -> Self {
        Self {
            username: column.username.clone(),
            display_name: column.display_name.clone(),
            items: ItemView::list(&column.items, offset),
            overdue_count: column.overdue_count,
        }
    }
}

pub struct CompletedView {
    pub chore: String,
    pub completed_by: String,
    pub when: String,
    pub late: bool,
    /// "Ada (0.50), Bob (0.50)"
    pub helpers: String,
}

impl CompletedView {
    pub fn new(item: &CompletedItem, now: DateTime<Utc>) -> Self {
        let helpers = item
            .helpers
            .iter()
            .map(|h| format!("{} ({})", h.display_name, points(h.points_awarded)))
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            chore: item.completion.chore_name.clone(),
            completed_by: item.completion.completed_by_display_name.clone(),
            when: relative_time(item.completion.completed_at, now),
            late: item.completion.was_late,
            helpers,
        }
    }
}

pub struct LeaderRow {
    pub rank: usize,
    pub username: String,
    pub display_name: String,
    pub weekly: String,
    pub all_time: String,
}

impl From<&LeaderboardEntry> for LeaderRow {
    fn from(e: &LeaderboardEntry) -> Self {
        Self {
            rank: e.rank,
            username: e.username.clone(),
            display_name: e.display_name.clone(),
            weekly: points(e.weekly_points),
            all_time: points(e.all_time_points),
        }
    }
}

/// A completion on the admin dashboard, with its undo button.
pub struct CompletionView {
    pub id: Uuid,
    pub chore: String,
    pub completed_by: String,
    pub points: String,
    pub when: String,
    pub undone: bool,
}

impl CompletionView {
    pub fn new(c: &CompletionDetailRow, now: DateTime<Utc>) -> Self {
        Self {
            id: c.id,
            chore: c.chore_name.clone(),
            completed_by: c.completed_by_display_name.clone(),
            points: points(c.points_value),
            when: relative_time(c.completed_at, now),
            undone: c.is_undone,
        }
    }
}

pub struct LogView {
    pub when: String,
    pub action: String,
    pub description: String,
}

impl LogView {
    pub fn new(row: &ActionLogRow, offset: FixedOffset) -> Self {
        Self {
            when: local_time(row.created_at, offset),
            action: row.action_type.to_string(),
            description: row.description.clone(),
        }
    }
}

pub struct ChoreView {
    pub id: Uuid,
    pub name: String,
    pub points: String,
    pub schedule: String,
    pub assignee: String,
    pub distribution_time: String,
    pub active: bool,
    pub undesirable: bool,
    pub difficult: bool,
}

impl ChoreView {
    pub fn new(chore: &ChoreRow, names: &HashMap<Uuid, String>) -> Self {
        let mut schedule = schedule_label(chore.schedule_type, chore.weekday, chore.every_n_days);
        if let (ScheduleType::EveryNDays, Some(start)) = (chore.schedule_type, chore.start_date) {
            schedule.push_str(&format!(" from {start}"));
        }
        if let (ScheduleType::OneTime, Some(due)) = (chore.schedule_type, chore.due_date) {
            schedule.push_str(&format!(", due {due}"));
        }
        Self {
            id: chore.id,
            name: chore.name.clone(),
            points: points(chore.points),
            schedule,
            assignee: match chore.assigned_to {
                None => "Pool".into(),
                Some(id) => names.get(&id).cloned().unwrap_or_else(|| "Unknown".into()),
            },
            distribution_time: chore.distribution_time.format("%H:%M").to_string(),
            active: chore.is_active,
            undesirable: chore.is_undesirable,
            difficult: chore.is_difficult,
        }
    }
}

/// An `<option>` and whether it starts selected.
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl SelectOption {
    fn new(value: impl Into<String>, label: impl Into<String>, selected: bool) -> Self {
        Self { value: value.into(), label: label.into(), selected }
    }
}

const SCHEDULE_TYPES: [(ScheduleType, &str); 4] = [
    (ScheduleType::Daily, "Daily"),
    (ScheduleType::Weekly, "Weekly"),
    (ScheduleType::EveryNDays, "Every N days"),
    (ScheduleType::OneTime, "One time"),
];

/// A chore's current values, pre-filled into the edit form.
pub struct ChoreEditView {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub points: String,
    pub every_n_days: String,
    pub start_date: String,
    pub due_date: String,
    pub distribution_time: String,
    pub undesirable: bool,
    pub difficult: bool,
    pub active: bool,
    pub schedule_types: Vec<SelectOption>,
    /// Leads with a blank option.
    pub weekdays: Vec<SelectOption>,
    /// Leads with "Pool".
    pub assignees: Vec<SelectOption>,
    pub eligible: Vec<SelectOption>,
}

impl ChoreEditView {
    pub fn new(chore: &ChoreRow, people: &[UserRow], eligible: &[Uuid]) -> Self {
        let text = |value: Option<String>| value.unwrap_or_default();

        let mut weekdays = vec![SelectOption::new("", "", chore.weekday.is_none())];
        weekdays.extend(WEEKDAYS.iter().zip(0_i64..).map(|(label, day)| {
            SelectOption::new(day.to_string(), *label, chore.weekday == Some(day))
        }));

        let mut assignees = vec![SelectOption::new("", "Pool", chore.assigned_to.is_none())];
        assignees.extend(people.iter().map(|u| {
            SelectOption::new(u.id.to_string(), u.display_name.clone(), chore.assigned_to == Some(u.id))
        }));

        Self {
            id: chore.id,
            name: chore.name.clone(),
            description: chore.description.clone(),
            points: points(chore.points),
            every_n_days: text(chore.every_n_days.map(|n| n.to_string())),
            start_date: text(chore.start_date.map(|d| d.to_string())),
            due_date: text(chore.due_date.map(|d| d.to_string())),
            distribution_time: chore.distribution_time.format("%H:%M").to_string(),
            undesirable: chore.is_undesirable,
            difficult: chore.is_difficult,
            active: chore.is_active,
            schedule_types: SCHEDULE_TYPES
                .iter()
                .map(|(kind, label)| SelectOption::new(kind.to_string(), *label, *kind == chore.schedule_type))
                .collect(),
            weekdays,
            assignees,
            eligible: people
                .iter()
                .map(|u| SelectOption::new(u.id.to_string(), u.display_name.clone(), eligible.contains(&u.id)))
                .collect(),
        }
    }
}

pub struct DependencyView {
    pub id: Uuid,
    pub parent: String,
    pub child: String,
    pub offset_hours: i64,
}

impl DependencyView {
    pub fn new(dep: &ChoreDependencyRow, chores: &HashMap<Uuid, String>) -> Self {
        let name = |id: Uuid| chores.get(&id).cloned().unwrap_or_else(|| id.to_string());
        Self {
            id: dep.id,
            parent: name(dep.depends_on_id),
            child: name(dep.chore_id),
            offset_hours: dep.offset_hours,
        }
    }
}

pub struct TemplateView {
    pub id: Uuid,
    pub name: String,
    pub points: String,
    pub schedule: String,
    pub pool: bool,
}

impl From<&ChoreTemplateRow> for TemplateView {
    fn from(t: &ChoreTemplateRow) -> Self {
        Self {
            id: t.id,
            name: t.name.clone(),
            points: points(t.points),
            schedule: schedule_label(t.schedule_type, t.weekday, t.every_n_days),
            pool: t.is_pool,
        }
    }
}

pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub is_staff: bool,
    pub is_active: bool,
    pub can_be_assigned: bool,
    pub eligible_for_points: bool,
    pub weekly: String,
    pub all_time: String,
}

impl From<&UserRow> for UserView {
    fn from(u: &UserRow) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            display_name: u.display_name.clone(),
            is_staff: u.is_staff,
            is_active: u.is_active,
            can_be_assigned: u.can_be_assigned,
            eligible_for_points: u.eligible_for_points,
            weekly: points(u.weekly_points),
            all_time: points(u.all_time_points),
        }
    }
}
