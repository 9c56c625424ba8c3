//! Core domain logic for the GTD task manager.
//! This crate is the single source of truth for task invariants and owns the
//! undoable command history that every user mutation goes through.

pub mod clock;
pub mod command;
pub mod config;
pub mod context;
pub mod db;
pub mod history;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use command::{Command, CommandBuilder, CommandError, CommandResult, NewTask};
pub use config::{ConfigError, CoreConfig};
pub use context::{AppContext, ContextError};
pub use history::{HistoryManager, HistorySnapshot, SubscriptionId, MAX_HISTORY_SIZE};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::comment::{Comment, CommentId};
pub use model::task::{Task, TaskId, TaskPatch, TaskStatus};
pub use model::validation::ValidationError;
pub use service::task_service::{ProjectView, TaskDetail, TaskService};
pub use store::{
    InMemoryTaskStore, SqliteTaskStore, StoreError, StoreResult, TaskListQuery, TaskStore,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
