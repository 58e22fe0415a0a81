use askama::Template;

use engine::board::DashboardStats;

use crate::views::{
    ChoreEditView, ChoreView, ColumnView, CompletedView, CompletionView, DependencyView, ItemView,
    LeaderRow, LogView, TemplateView, UserOption, UserView,
};

#[derive(Template)]
#[template(path = "board.html")]
pub struct BoardTemplate {
    pub today: String,
    pub pool: Vec<ItemView>,
    pub pool_overdue: usize,
    pub columns: Vec<ColumnView>,
    pub overdue_count: usize,
    pub completed: Vec<CompletedView>,
    pub people: Vec<UserOption>,
}

#[derive(Template)]
#[template(path = "pool.html")]
pub struct PoolTemplate {
    pub today: String,
    pub items: Vec<ItemView>,
    pub overdue_count: usize,
    pub people: Vec<UserOption>,
}

#[derive(Template)]
#[template(path = "user.html")]
pub struct UserTemplate {
    pub today: String,
    pub display_name: String,
    pub weekly: String,
    pub all_time: String,
    pub items: Vec<ItemView>,
    pub overdue_count: usize,
    pub completed: Vec<CompletedView>,
    pub people: Vec<UserOption>,
}

#[derive(Template)]
#[template(path = "leaderboard.html")]
pub struct LeaderboardTemplate {
    pub entries: Vec<LeaderRow>,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    /// Empty when there is nothing to report.
    pub error: String,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub status: u16,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

#[derive(Template)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub staff: String,
    pub stats: DashboardStats,
    pub open: Vec<ItemView>,
    pub completions: Vec<CompletionView>,
    pub activity: Vec<LogView>,
    pub people: Vec<UserOption>,
}

#[derive(Template)]
#[template(path = "admin/chores.html")]
pub struct ChoresTemplate {
    pub staff: String,
    pub chores: Vec<ChoreView>,
    pub dependencies: Vec<DependencyView>,
    pub people: Vec<UserOption>,
}

#[derive(Template)]
#[template(path = "admin/chore_edit.html")]
pub struct ChoreEditTemplate {
    pub staff: String,
    pub chore: ChoreEditView,
}

#[derive(Template)]
#[template(path = "admin/users.html")]
pub struct UsersTemplate {
    pub staff: String,
    pub users: Vec<UserView>,
}

#[derive(Template)]
#[template(path = "admin/templates.html")]
pub struct TemplatesTemplate {
    pub staff: String,
    pub templates: Vec<TemplateView>,
    pub people: Vec<UserOption>,
}

#[derive(Template)]
#[template(path = "admin/logs.html")]
pub struct LogsTemplate {
    pub staff: String,
    pub entries: Vec<LogView>,
}
