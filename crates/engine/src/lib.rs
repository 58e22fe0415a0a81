//! `engine` crate: household chore rules: scheduling, distribution,
//! claiming, completion with point sharing, dependency spawning, boards and
//! chore administration.

pub mod assignment;
pub mod board;
pub mod chores;
pub mod completion;
pub mod config;
pub mod dag;
pub mod dependency;
pub mod error;
pub mod jobs;
pub mod points;
pub mod schedule;
pub mod scheduler;
pub mod users;
pub mod weekly;

pub use board::BoardService;
pub use chores::{ChoreInput, ChoreService};
pub use completion::CompletionService;
pub use config::EngineConfig;
pub use dag::validate_dependency_graph;
pub use dependency::DependencyService;
pub use error::EngineError;
pub use schedule::DueState;
pub use scheduler::Scheduler;
pub use users::UserService;

#[cfg(test)]
mod test_support;
#[cfg(test)]
mod board_tests;
#[cfg(test)]
mod users_tests;
#[cfg(test)]
mod chores_tests;
