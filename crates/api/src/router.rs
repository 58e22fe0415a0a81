use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{actions, admin, auth, board, json};
use crate::state::AppState;

pub fn app_router(state: AppState) -> Router {
    Router::new()
        // Boards
        .route("/", get(board::index))
        .route("/pool", get(board::pool))
        .route("/user/:username", get(board::user))
        .route("/leaderboard", get(board::leaderboard))
        .route("/instances/:id/claim", post(actions::claim))
        .route("/instances/:id/complete", post(actions::complete))
        // Session
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
        // Admin
        .route("/admin", get(admin::dashboard))
        .route("/admin/chores", get(admin::chores).post(admin::create_chore))
        .route("/admin/chores/:id", get(admin::edit_chore).post(admin::update_chore))
        .route("/admin/chores/:id/activate", post(admin::activate_chore))
        .route("/admin/chores/:id/delete", post(admin::delete_chore))
        .route("/admin/instances/:id/skip", post(admin::skip_instance))
        .route("/admin/instances/:id/reassign", post(admin::reassign_instance))
        .route("/admin/completions/:id/undo", post(admin::undo_completion))
        .route("/admin/users", get(admin::users).post(admin::create_user))
        .route("/admin/users/:id", post(admin::update_user))
        .route("/admin/dependencies", post(admin::add_dependency))
        .route("/admin/dependencies/:id/delete", post(admin::remove_dependency))
        .route("/admin/templates", get(admin::templates).post(admin::create_template))
        .route("/admin/templates/:id/instantiate", post(admin::instantiate_template))
        .route("/admin/templates/:id/delete", post(admin::delete_template))
        .route("/admin/logs", get(admin::logs))
        // JSON
        .route("/api/v1/health", get(json::health))
        .route("/api/v1/board", get(json::board))
        .route("/api/v1/users", get(json::users))
        .route("/api/v1/leaderboard", get(json::leaderboard))
        .route("/api/v1/instances/:id/claim", post(json::claim))
        .route("/api/v1/instances/:id/complete", post(json::complete))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
