//! `api` crate: axum HTTP layer for ChoreBoard.
//!
//! Serves the HTML boards and admin pages (askama templates) and a small JSON
//! API under `/api/v1`. Staff pages authenticate with a session cookie.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;
pub mod templates;
pub mod views;

use std::future::Future;

use tokio::net::TcpListener;
use tracing::info;

pub use error::ApiError;
pub use router::app_router;
pub use state::{AppState, WebConfig};

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn serve<F>(addr: &str, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    info!("ChoreBoard listening on {}", listener.local_addr()?);
    axum::serve(listener, app_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
