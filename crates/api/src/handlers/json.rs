//! JSON API under `/api/v1`.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use db::models::{ChoreInstanceRow, UserRow};
use engine::board::{Board, LeaderboardEntry};
use engine::completion::CompletionOutcome;

use crate::error::JsonError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ClaimRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    pub completed_by: Uuid,
    #[serde(default)]
    pub helpers: Vec<Uuid>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

pub async fn board(State(state): State<AppState>) -> Result<Json<Board>, JsonError> {
    Ok(Json(state.boards.board(Utc::now()).await?))
}

pub async fn users(State(state): State<AppState>) -> Result<Json<Vec<UserRow>>, JsonError> {
    Ok(Json(state.users.list_users().await?))
}

pub async fn leaderboard(
    State(state): State<AppState>,
) -> Result<Json<Vec<LeaderboardEntry>>, JsonError> {
    Ok(Json(state.boards.leaderboard().await?))
}

pub async fn claim(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ClaimRequest>,
) -> Result<Json<ChoreInstanceRow>, JsonError> {
    Ok(Json(state.completions.claim(id, body.user_id, Utc::now()).await?))
}

pub async fn complete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<CompleteRequest>,
) -> Result<Json<CompletionOutcome>, JsonError> {
    let outcome = state
        .completions
        .complete(id, body.completed_by, &body.helpers, Utc::now())
        .await?;
    Ok(Json(outcome))
}

pub async fn health() -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, "no-store, no-cache, must-revalidate")],
        Json(HealthResponse { status: "up", version: env!("CARGO_PKG_VERSION") }),
    )
}
