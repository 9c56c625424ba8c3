//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record shared by inbox/project/context views.
//! - Provide row-local validation used by store write and read paths.
//!
//! # Invariants
//! - `id` is assigned by the caller before any command is built.
//! - `waiting_for` is `Some` iff `status == TaskStatus::Waiting`.
//! - `is_project == true` implies `parent_id == None`.

use crate::model::validation::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque, caller-assigned task identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Generates a fresh random id (UUID v4 text form).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// GTD triage state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Captured, not yet triaged.
    Inbox,
    /// Actionable next step.
    Next,
    /// Blocked on someone else; see `waiting_for`.
    Waiting,
    /// Deferred indefinitely.
    Someday,
    /// Completed.
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Inbox,
        TaskStatus::Next,
        TaskStatus::Waiting,
        TaskStatus::Someday,
        TaskStatus::Done,
    ];

    /// Stable lowercase label, also used as the persisted value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inbox => "inbox",
            Self::Next => "next",
            Self::Waiting => "waiting",
            Self::Someday => "someday",
            Self::Done => "done",
        }
    }

    /// Parses a persisted label. Returns `None` for unknown values.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == value)
    }
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    /// Projects group leaf tasks through their `parent_id`.
    pub is_project: bool,
    /// Owning project. Must reference a task with `is_project == true`.
    pub parent_id: Option<TaskId>,
    /// Who or what the task waits on. Set only while `status == Waiting`.
    pub waiting_for: Option<String>,
    /// Free-form context tag used for filtering (`@home`, `@phone`, ...).
    pub context: Option<String>,
    /// Unix epoch milliseconds.
    pub due_date: Option<i64>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

impl Task {
    /// Creates an inbox task with both timestamps set to `now_ms`.
    pub fn new(id: TaskId, title: impl Into<String>, now_ms: i64) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            status: TaskStatus::Inbox,
            is_project: false,
            parent_id: None,
            waiting_for: None,
            context: None,
            due_date: None,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    /// Checks row-local invariants.
    ///
    /// Cross-row rules (parent must be a project) need the store and are
    /// enforced by the command builder.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::BlankTitle);
        }

        match (self.status, self.waiting_for.as_deref()) {
            (TaskStatus::Waiting, None) => return Err(ValidationError::WaitingForRequired),
            (TaskStatus::Waiting, Some(target)) if target.trim().is_empty() => {
                return Err(ValidationError::WaitingForRequired)
            }
            (TaskStatus::Waiting, Some(_)) => {}
            (other, Some(_)) => return Err(ValidationError::WaitingForNotAllowed(other)),
            (_, None) => {}
        }

        if self.is_project && self.parent_id.is_some() {
            return Err(ValidationError::ProjectWithParent(self.id.clone()));
        }
        if self.is_project && self.status == TaskStatus::Waiting {
            return Err(ValidationError::ProjectCannotWait(self.id.clone()));
        }

        Ok(())
    }
}

/// Partial update applied by `TaskStore::update_task`.
///
/// Outer `None` leaves a field unchanged; for nullable fields the inner
/// option is the new value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub status: Option<TaskStatus>,
    pub is_project: Option<bool>,
    pub parent_id: Option<Option<TaskId>>,
    pub waiting_for: Option<Option<String>>,
    pub context: Option<Option<String>>,
    pub updated_at: Option<i64>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies every set field onto `task`.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(is_project) = self.is_project {
            task.is_project = is_project;
        }
        if let Some(parent_id) = &self.parent_id {
            task.parent_id = parent_id.clone();
        }
        if let Some(waiting_for) = &self.waiting_for {
            task.waiting_for = waiting_for.clone();
        }
        if let Some(context) = &self.context {
            task.context = context.clone();
        }
        if let Some(updated_at) = self.updated_at {
            task.updated_at = updated_at;
        }
    }
}
