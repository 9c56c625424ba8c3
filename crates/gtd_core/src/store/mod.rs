//! Task/comment store port and adapters.
//!
//! # Responsibility
//! - Define the async persistence contract consumed by history commands.
//! - Keep storage engine details (SQL, locking) behind the port.
//!
//! # Invariants
//! - Every write resolves only after it is durable enough to be reversed.
//! - Write paths validate row-local invariants before persisting.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Multi-row writes (`delete_task_with_comments`,
//!   `restore_task_with_comments`) are atomic.

use crate::db::DbError;
use crate::model::comment::{Comment, CommentId};
use crate::model::task::{Task, TaskId, TaskPatch, TaskStatus};
use crate::model::validation::ValidationError;
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryTaskStore;
pub use sqlite::SqliteTaskStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// I/O, durability or integrity failure from a store adapter.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// A write would break a task/comment invariant.
    Validation(ValidationError),
    TaskNotFound(TaskId),
    CommentNotFound(CommentId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Write would orphan dependent rows (comments, child tasks).
    Conflict(String),
    /// Persisted row cannot be converted into a valid model.
    InvalidData(String),
    /// Adapter could not run the operation at all (worker join, poisoned lock).
    Unavailable(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::CommentNotFound(id) => write!(f, "comment not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "task store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::Conflict(message) => write!(f, "store conflict: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::Unavailable(message) => write!(f, "store unavailable: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::TaskNotFound(_) => None,
            Self::CommentNotFound(_) => None,
            Self::UninitializedConnection { .. } => None,
            Self::Conflict(_) => None,
            Self::InvalidData(_) => None,
            Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Predicate for listing tasks. Unset fields do not filter.
///
/// Results are ordered by `created_at ASC, id ASC`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskListQuery {
    pub status: Option<TaskStatus>,
    pub is_project: Option<bool>,
    pub parent_id: Option<TaskId>,
    pub context: Option<String>,
    pub limit: Option<u32>,
}

impl TaskListQuery {
    /// Returns whether `task` satisfies every set filter.
    pub fn matches(&self, task: &Task) -> bool {
        self.status.map_or(true, |status| task.status == status)
            && self.is_project.map_or(true, |flag| task.is_project == flag)
            && self
                .parent_id
                .as_ref()
                .map_or(true, |parent| task.parent_id.as_ref() == Some(parent))
            && self
                .context
                .as_deref()
                .map_or(true, |context| task.context.as_deref() == Some(context))
    }
}

/// Async persistence contract for tasks and comments.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Inserts one task. Fails on duplicate id or a non-project parent.
    async fn insert_task(&self, task: &Task) -> StoreResult<()>;
    /// Applies `patch` to one task and returns the stored result.
    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> StoreResult<Task>;
    /// Deletes one task row by id. Fails with `Conflict` while comments or
    /// child tasks still reference it.
    async fn delete_task(&self, id: &TaskId) -> StoreResult<()>;
    async fn get_task(&self, id: &TaskId) -> StoreResult<Option<Task>>;
    async fn list_tasks(&self, query: &TaskListQuery) -> StoreResult<Vec<Task>>;
    /// Deletes one task and every comment it owns in one atomic write.
    /// Fails with `Conflict` while child tasks still reference it.
    async fn delete_task_with_comments(&self, id: &TaskId) -> StoreResult<()>;
    /// Re-inserts a task and its comments with their original fields.
    async fn restore_task_with_comments(&self, task: &Task, comments: &[Comment])
        -> StoreResult<()>;
    async fn insert_comment(&self, comment: &Comment) -> StoreResult<()>;
    async fn get_comment(&self, id: &CommentId) -> StoreResult<Option<Comment>>;
    /// Lists comments of one task ordered by `created_at ASC, id ASC`.
    async fn list_comments(&self, task_id: &TaskId) -> StoreResult<Vec<Comment>>;
    async fn delete_comment(&self, id: &CommentId) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::TaskListQuery;
    use crate::model::task::{Task, TaskId, TaskStatus};

    #[test]
    fn list_query_matches_every_set_filter() {
        let mut task = Task::new(TaskId::from("a"), "Write report", 0);
        task.status = TaskStatus::Next;
        task.parent_id = Some(TaskId::from("p"));
        task.context = Some("@office".to_string());

        assert!(TaskListQuery::default().matches(&task));
        assert!(TaskListQuery {
            status: Some(TaskStatus::Next),
            parent_id: Some(TaskId::from("p")),
            context: Some("@office".to_string()),
            is_project: Some(false),
            limit: None,
        }
        .matches(&task));
        assert!(!TaskListQuery {
            status: Some(TaskStatus::Inbox),
            ..TaskListQuery::default()
        }
        .matches(&task));
        assert!(!TaskListQuery {
            context: Some("@home".to_string()),
            ..TaskListQuery::default()
        }
        .matches(&task));
    }
}
