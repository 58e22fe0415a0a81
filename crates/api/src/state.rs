//! Shared handler state.

use chrono::Duration;
use serde::Deserialize;

use db::DbPool;
use engine::{
    BoardService, ChoreService, CompletionService, DependencyService, EngineConfig, UserService,
};

/// HTTP-facing settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// How long a staff login stays valid.
    pub session_ttl_hours: i64,
    pub cookie_name: String,
    /// Mark the session cookie `Secure`. Enable behind HTTPS.
    pub secure_cookies: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            session_ttl_hours: 24 * 14,
            cookie_name: "choreboard_session".into(),
            secure_cookies: false,
        }
    }
}

impl WebConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::hours(self.session_ttl_hours.max(1))
    }
}

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub engine: EngineConfig,
    pub web: WebConfig,
    pub boards: BoardService,
    pub chores: ChoreService,
    pub completions: CompletionService,
    pub dependencies: DependencyService,
    pub users: UserService,
}

impl AppState {
    pub fn new(pool: DbPool, engine: EngineConfig, web: WebConfig) -> Self {
        Self {
            boards: BoardService::new(pool.clone(), engine.clone()),
            chores: ChoreService::new(pool.clone(), engine.clone()),
            completions: CompletionService::new(pool.clone(), engine.clone()),
            dependencies: DependencyService::new(pool.clone(), engine.clone()),
            users: UserService::new(pool.clone()),
            pool,
            engine,
            web,
        }
    }
}
