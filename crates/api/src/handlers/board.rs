//! Public board pages.

use axum::extract::{Path, State};
use axum::response::Html;
use chrono::Utc;

use crate::error::ApiError;
use crate::handlers::render;
use crate::state::AppState;
use crate::templates::{BoardTemplate, LeaderboardTemplate, PoolTemplate, UserTemplate};
use crate::views::{points, ColumnView, CompletedView, ItemView, LeaderRow, UserOption};

const DATE_FORMAT: &str = "%A %d %B";

pub async fn index(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let now = Utc::now();
    let offset = state.engine.offset();
    let board = state.boards.board(now).await?;

    render(BoardTemplate {
        today: board.today.format(DATE_FORMAT).to_string(),
        pool: ItemView::list(&board.pool, offset),
        pool_overdue: board.pool_overdue,
        columns: board.users.iter().map(|c| ColumnView::new(c, offset)).collect(),
        overdue_count: board.overdue_count,
        completed: board.completed_today.iter().map(|c| CompletedView::new(c, now)).collect(),
        people: board.users.iter().map(UserOption::from).collect(),
    })
}

pub async fn pool(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let offset = state.engine.offset();
    let board = state.boards.pool_board(Utc::now()).await?;
    let people = state.users.list_assignable().await?;

    render(PoolTemplate {
        today: board.today.format(DATE_FORMAT).to_string(),
        items: ItemView::list(&board.items, offset),
        overdue_count: board.overdue_count,
        people: people.iter().map(UserOption::from).collect(),
    })
}

pub async fn user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Html<String>, ApiError> {
    let now = Utc::now();
    let offset = state.engine.offset();
    let board = state.boards.user_board(&username, now).await?;
    let people = state.users.list_assignable().await?;

    render(UserTemplate {
        today: board.today.format(DATE_FORMAT).to_string(),
        display_name: board.user.display_name.clone(),
        weekly: points(board.user.weekly_points),
        all_time: points(board.user.all_time_points),
        items: ItemView::list(&board.items, offset),
        overdue_count: board.overdue_count,
        completed: board.completed_today.iter().map(|c| CompletedView::new(c, now)).collect(),
        people: people.iter().map(UserOption::from).collect(),
    })
}

pub async fn leaderboard(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let entries = state.boards.leaderboard().await?;
    render(LeaderboardTemplate { entries: entries.iter().map(LeaderRow::from).collect() })
}
