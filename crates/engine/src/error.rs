//! Engine-level error types.

use thiserror::Error;
use uuid::Uuid;

/// Errors produced by the chore engine (validation + state transitions).
#[derive(Debug, Error)]
pub enum EngineError {
    // ------ Lookup errors ------

    /// The referenced record does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    // ------ Validation errors ------

    /// Input failed validation.
    #[error("invalid input: {0}")]
    Validation(String),

    /// A unique constraint rejected the write (duplicate username, template
    /// name, dependency edge, ...).
    #[error("already exists: {0}")]
    Conflict(String),

    /// A dependency edge references a chore that doesn't exist.
    #[error("dependency references unknown chore '{chore_id}' ({side} side)")]
    UnknownChoreReference {
        chore_id: Uuid,
        side: &'static str,
    },

    /// Topological sort of the dependency graph detected a cycle.
    #[error("chore dependencies contain a cycle")]
    CycleDetected,

    // ------ State transition errors ------

    /// The instance is not in a status that allows the operation.
    #[error("instance is {status}, cannot {action}")]
    InvalidState {
        status: db::models::InstanceStatus,
        action: &'static str,
    },

    /// The user may not take on chores (inactive or not assignable).
    #[error("user '{0}' cannot be assigned chores")]
    NotAssignable(String),

    /// The user already claimed the daily maximum.
    #[error("claim limit of {limit} per day reached")]
    ClaimLimitReached { limit: u32 },

    /// The undo window for a completion has passed.
    #[error("completion is older than {hours} hours and can no longer be undone")]
    UndoWindowExpired { hours: i64 },

    /// The completion was already undone.
    #[error("completion was already undone")]
    AlreadyUndone,

    // ------ Auth errors ------

    /// Username/password did not match an active account.
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    /// Persistence error from the db crate.
    #[error("database error: {0}")]
    Database(db::DbError),
}

impl From<db::DbError> for EngineError {
    fn from(err: db::DbError) -> Self {
        match err {
            db::DbError::NotFound => Self::NotFound("record"),
            db::DbError::Conflict(msg) => Self::Conflict(msg),
            other => Self::Database(other),
        }
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        db::DbError::from(err).into()
    }
}

/// Map a lookup failure to `NotFound(entity)`, keeping other errors intact.
pub(crate) fn missing(entity: &'static str) -> impl FnOnce(db::DbError) -> EngineError {
    move |err| match err {
        db::DbError::NotFound => EngineError::NotFound(entity),
        other => other.into(),
    }
}
