//! Undoable task/comment commands.
//!
//! # Responsibility
//! - Encapsulate one forward store mutation and its exact inverse per value.
//! - Dispatch `execute`/`undo` over a closed set of command kinds.
//!
//! # Invariants
//! - Commands are built only by `CommandBuilder`, after validation; fields are
//!   crate-private so a malformed command cannot exist.
//! - Inverse state is captured at construction, never re-read at undo time.
//!   A write from another replica between `execute` and `undo` is
//!   overwritten by the captured snapshot.
//! - `execute` runs once per application; it is not idempotent.

use crate::model::validation::ValidationError;
use crate::store::{StoreError, StoreResult, TaskStore};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod builder;
pub mod comment_commands;
pub mod task_commands;

pub use builder::{CommandBuilder, NewTask};
pub use comment_commands::{CreateCommentCommand, DeleteCommentCommand};
pub use task_commands::{
    ConvertToProjectCommand, CreateTaskCommand, DeleteTaskCommand, LinkTaskCommand,
    MoveTaskCommand, SetContextCommand,
};

pub type CommandResult<T> = Result<T, CommandError>;

/// Failure while building a command.
#[derive(Debug)]
pub enum CommandError {
    /// Intent is malformed; no command was created.
    Validation(ValidationError),
    /// Current state could not be read to validate or snapshot.
    Store(StoreError),
}

impl Display for CommandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CommandError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<ValidationError> for CommandError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for CommandError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// One undoable user mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CreateTask(CreateTaskCommand),
    DeleteTask(DeleteTaskCommand),
    MoveTask(MoveTaskCommand),
    LinkTask(LinkTaskCommand),
    ConvertToProject(ConvertToProjectCommand),
    SetContext(SetContextCommand),
    CreateComment(CreateCommentCommand),
    DeleteComment(DeleteCommentCommand),
}

impl Command {
    /// Stable machine label for log events.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateTask(_) => "create_task",
            Self::DeleteTask(_) => "delete_task",
            Self::MoveTask(_) => "move_task",
            Self::LinkTask(_) => "link_task",
            Self::ConvertToProject(_) => "convert_to_project",
            Self::SetContext(_) => "set_context",
            Self::CreateComment(_) => "create_comment",
            Self::DeleteComment(_) => "delete_comment",
        }
    }

    /// Human-readable label for "Undone: ..." / "Redone: ..." messages.
    pub fn description(&self) -> String {
        match self {
            Self::CreateTask(cmd) => cmd.description(),
            Self::DeleteTask(cmd) => cmd.description(),
            Self::MoveTask(cmd) => cmd.description(),
            Self::LinkTask(cmd) => cmd.description(),
            Self::ConvertToProject(cmd) => cmd.description(),
            Self::SetContext(cmd) => cmd.description(),
            Self::CreateComment(cmd) => cmd.description(),
            Self::DeleteComment(cmd) => cmd.description(),
        }
    }

    /// Applies the forward mutation. `now_ms` stamps `updated_at`.
    pub async fn execute(&self, store: &dyn TaskStore, now_ms: i64) -> StoreResult<()> {
        match self {
            Self::CreateTask(cmd) => cmd.execute(store).await,
            Self::DeleteTask(cmd) => cmd.execute(store).await,
            Self::MoveTask(cmd) => cmd.execute(store, now_ms).await,
            Self::LinkTask(cmd) => cmd.execute(store, now_ms).await,
            Self::ConvertToProject(cmd) => cmd.execute(store, now_ms).await,
            Self::SetContext(cmd) => cmd.execute(store, now_ms).await,
            Self::CreateComment(cmd) => cmd.execute(store).await,
            Self::DeleteComment(cmd) => cmd.execute(store).await,
        }
    }

    /// Applies the exact inverse of `execute`.
    pub async fn undo(&self, store: &dyn TaskStore, now_ms: i64) -> StoreResult<()> {
        match self {
            Self::CreateTask(cmd) => cmd.undo(store).await,
            Self::DeleteTask(cmd) => cmd.undo(store).await,
            Self::MoveTask(cmd) => cmd.undo(store, now_ms).await,
            Self::LinkTask(cmd) => cmd.undo(store, now_ms).await,
            Self::ConvertToProject(cmd) => cmd.undo(store, now_ms).await,
            Self::SetContext(cmd) => cmd.undo(store, now_ms).await,
            Self::CreateComment(cmd) => cmd.undo(store).await,
            Self::DeleteComment(cmd) => cmd.undo(store).await,
        }
    }
}
