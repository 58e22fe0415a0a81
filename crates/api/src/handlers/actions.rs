//! Board actions: claiming pool chores and completing chores.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum_extra::extract::Form;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::handlers::{found, referer_path};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ClaimForm {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CompleteForm {
    pub completed_by: Uuid,
    /// Repeated `helpers=<id>` fields. Empty means the completer alone.
    #[serde(default)]
    pub helpers: Vec<Uuid>,
}

pub async fn claim(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Form(form): Form<ClaimForm>,
) -> Result<Response, ApiError> {
    state.completions.claim(id, form.user_id, Utc::now()).await?;
    Ok(found(&referer_path(&headers, "/")))
}

pub async fn complete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Form(form): Form<CompleteForm>,
) -> Result<Response, ApiError> {
    state
        .completions
        .complete(id, form.completed_by, &form.helpers, Utc::now())
        .await?;
    Ok(found(&referer_path(&headers, "/")))
}
