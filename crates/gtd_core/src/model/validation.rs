//! Validation errors for malformed user intent.
//!
//! # Invariants
//! - Raised before a command exists, never from `execute`/`undo`.
//! - Also raised by store write paths when a row breaks a row-local rule.

use crate::model::comment::CommentId;
use crate::model::task::{TaskId, TaskStatus};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rejected intent against the task/comment model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Task title is blank after trim.
    BlankTitle,
    /// Comment content is blank after trim.
    BlankCommentContent,
    /// `waiting` status needs a non-blank `waiting_for`.
    WaitingForRequired,
    /// `waiting_for` was supplied for a status other than `waiting`.
    WaitingForNotAllowed(TaskStatus),
    /// A project cannot have a parent.
    ProjectWithParent(TaskId),
    /// Projects are not completed through `done`.
    ProjectCannotComplete(TaskId),
    /// Projects never wait on anyone; only leaf tasks carry `waiting_for`.
    ProjectCannotWait(TaskId),
    /// Task is already done.
    AlreadyDone(TaskId),
    /// Task is already a project.
    AlreadyProject(TaskId),
    /// Link target exists but is not a project.
    NotAProject(TaskId),
    /// Projects cannot be attached under another project.
    ProjectCannotBeLinked(TaskId),
    /// Contexts are only set on leaf tasks.
    ProjectContext(TaskId),
    /// Project still owns child tasks.
    ProjectHasChildren(TaskId),
    /// A task with this id already exists.
    DuplicateTaskId(TaskId),
    /// A comment with this id already exists.
    DuplicateCommentId(CommentId),
    /// Referenced task does not exist.
    TaskNotFound(TaskId),
    /// Referenced comment does not exist.
    CommentNotFound(CommentId),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "task title must not be blank"),
            Self::BlankCommentContent => write!(f, "comment content must not be blank"),
            Self::WaitingForRequired => {
                write!(f, "waiting status requires a non-empty waiting_for")
            }
            Self::WaitingForNotAllowed(status) => {
                write!(f, "waiting_for is only allowed for waiting status, got `{status}`")
            }
            Self::ProjectWithParent(id) => write!(f, "project cannot have a parent: {id}"),
            Self::ProjectCannotComplete(id) => write!(f, "project cannot be marked done: {id}"),
            Self::ProjectCannotWait(id) => write!(f, "project cannot be moved to waiting: {id}"),
            Self::AlreadyDone(id) => write!(f, "task is already done: {id}"),
            Self::AlreadyProject(id) => write!(f, "task is already a project: {id}"),
            Self::NotAProject(id) => write!(f, "link target is not a project: {id}"),
            Self::ProjectCannotBeLinked(id) => {
                write!(f, "project cannot be linked under another project: {id}")
            }
            Self::ProjectContext(id) => write!(f, "context cannot be set on a project: {id}"),
            Self::ProjectHasChildren(id) => write!(f, "project still has child tasks: {id}"),
            Self::DuplicateTaskId(id) => write!(f, "task id already exists: {id}"),
            Self::DuplicateCommentId(id) => write!(f, "comment id already exists: {id}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::CommentNotFound(id) => write!(f, "comment not found: {id}"),
        }
    }
}

impl Error for ValidationError {}
