//! Repository functions, one per database operation.
//!
//! Single-statement functions accept any `SqliteExecutor` so they work with
//! both `&DbPool` and an open transaction (`&mut *tx`). No business logic,
//! no domain rules, just SQL.

pub mod action_logs;
pub mod chores;
pub mod completions;
pub mod dependencies;
pub mod instances;
pub mod sessions;
pub mod snapshots;
pub mod templates;
pub mod users;
