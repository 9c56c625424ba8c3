//! Task-level commands: create, delete, move, link, convert, set context.

use crate::model::comment::Comment;
use crate::model::task::{Task, TaskId, TaskPatch, TaskStatus};
use crate::store::{StoreResult, TaskStore};

/// Inserts a pre-built task; undo deletes it by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskCommand {
    pub(crate) task: Task,
}

impl CreateTaskCommand {
    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn description(&self) -> String {
        if self.task.is_project {
            format!("Create project \"{}\"", self.task.title)
        } else {
            format!("Create task \"{}\"", self.task.title)
        }
    }

    pub(crate) async fn execute(&self, store: &dyn TaskStore) -> StoreResult<()> {
        store.insert_task(&self.task).await
    }

    pub(crate) async fn undo(&self, store: &dyn TaskStore) -> StoreResult<()> {
        store.delete_task(&self.task.id).await
    }
}

/// Deletes a task with its comments; undo restores the captured snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteTaskCommand {
    pub(crate) task: Task,
    pub(crate) comments: Vec<Comment>,
}

impl DeleteTaskCommand {
    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn description(&self) -> String {
        format!("Delete task \"{}\"", self.task.title)
    }

    pub(crate) async fn execute(&self, store: &dyn TaskStore) -> StoreResult<()> {
        store.delete_task_with_comments(&self.task.id).await
    }

    pub(crate) async fn undo(&self, store: &dyn TaskStore) -> StoreResult<()> {
        store
            .restore_task_with_comments(&self.task, &self.comments)
            .await
    }
}

/// Changes status and `waiting_for` together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveTaskCommand {
    pub(crate) task_id: TaskId,
    pub(crate) title: String,
    pub(crate) from_status: TaskStatus,
    pub(crate) from_waiting_for: Option<String>,
    pub(crate) to_status: TaskStatus,
    pub(crate) to_waiting_for: Option<String>,
}

impl MoveTaskCommand {
    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    pub fn from_status(&self) -> TaskStatus {
        self.from_status
    }

    pub fn to_status(&self) -> TaskStatus {
        self.to_status
    }

    pub fn description(&self) -> String {
        match (self.to_status, self.to_waiting_for.as_deref()) {
            (TaskStatus::Done, _) => format!("Complete \"{}\"", self.title),
            (TaskStatus::Waiting, Some(target)) => {
                format!("Move \"{}\" to waiting for {}", self.title, target)
            }
            (status, _) => format!("Move \"{}\" to {}", self.title, status),
        }
    }

    pub(crate) async fn execute(&self, store: &dyn TaskStore, now_ms: i64) -> StoreResult<()> {
        let patch = TaskPatch {
            status: Some(self.to_status),
            waiting_for: Some(self.to_waiting_for.clone()),
            updated_at: Some(now_ms),
            ..TaskPatch::default()
        };
        store.update_task(&self.task_id, &patch).await.map(|_| ())
    }

    pub(crate) async fn undo(&self, store: &dyn TaskStore, now_ms: i64) -> StoreResult<()> {
        let patch = TaskPatch {
            status: Some(self.from_status),
            waiting_for: Some(self.from_waiting_for.clone()),
            updated_at: Some(now_ms),
            ..TaskPatch::default()
        };
        store.update_task(&self.task_id, &patch).await.map(|_| ())
    }
}

/// Attaches a leaf task to a project, or detaches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTaskCommand {
    pub(crate) task_id: TaskId,
    pub(crate) title: String,
    pub(crate) from_parent_id: Option<TaskId>,
    pub(crate) to_parent_id: Option<TaskId>,
    pub(crate) to_parent_title: Option<String>,
}

impl LinkTaskCommand {
    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    pub fn to_parent_id(&self) -> Option<&TaskId> {
        self.to_parent_id.as_ref()
    }

    pub fn description(&self) -> String {
        match self.to_parent_title.as_deref() {
            Some(project) => format!("Link \"{}\" to project \"{}\"", self.title, project),
            None => format!("Unlink \"{}\" from its project", self.title),
        }
    }

    pub(crate) async fn execute(&self, store: &dyn TaskStore, now_ms: i64) -> StoreResult<()> {
        self.set_parent(store, self.to_parent_id.clone(), now_ms).await
    }

    pub(crate) async fn undo(&self, store: &dyn TaskStore, now_ms: i64) -> StoreResult<()> {
        self.set_parent(store, self.from_parent_id.clone(), now_ms).await
    }

    async fn set_parent(
        &self,
        store: &dyn TaskStore,
        parent_id: Option<TaskId>,
        now_ms: i64,
    ) -> StoreResult<()> {
        let patch = TaskPatch {
            parent_id: Some(parent_id),
            updated_at: Some(now_ms),
            ..TaskPatch::default()
        };
        store.update_task(&self.task_id, &patch).await.map(|_| ())
    }
}

/// Turns a leaf task into a project in `next`.
///
/// `waiting_for` and `context` are cleared on the way in and restored on
/// undo; projects carry neither.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertToProjectCommand {
    pub(crate) task_id: TaskId,
    pub(crate) title: String,
    pub(crate) original_status: TaskStatus,
    pub(crate) original_waiting_for: Option<String>,
    pub(crate) original_context: Option<String>,
}

impl ConvertToProjectCommand {
    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    pub fn original_status(&self) -> TaskStatus {
        self.original_status
    }

    pub fn description(&self) -> String {
        format!("Convert \"{}\" to project", self.title)
    }

    pub(crate) async fn execute(&self, store: &dyn TaskStore, now_ms: i64) -> StoreResult<()> {
        let patch = TaskPatch {
            is_project: Some(true),
            status: Some(TaskStatus::Next),
            waiting_for: Some(None),
            context: Some(None),
            updated_at: Some(now_ms),
            ..TaskPatch::default()
        };
        store.update_task(&self.task_id, &patch).await.map(|_| ())
    }

    pub(crate) async fn undo(&self, store: &dyn TaskStore, now_ms: i64) -> StoreResult<()> {
        let patch = TaskPatch {
            is_project: Some(false),
            status: Some(self.original_status),
            waiting_for: Some(self.original_waiting_for.clone()),
            context: Some(self.original_context.clone()),
            updated_at: Some(now_ms),
            ..TaskPatch::default()
        };
        store.update_task(&self.task_id, &patch).await.map(|_| ())
    }
}

/// Sets or clears the context tag of a leaf task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetContextCommand {
    pub(crate) task_id: TaskId,
    pub(crate) title: String,
    pub(crate) from_context: Option<String>,
    pub(crate) to_context: Option<String>,
}

impl SetContextCommand {
    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    pub fn description(&self) -> String {
        match self.to_context.as_deref() {
            Some(context) => format!("Set context of \"{}\" to {}", self.title, context),
            None => format!("Clear context of \"{}\"", self.title),
        }
    }

    pub(crate) async fn execute(&self, store: &dyn TaskStore, now_ms: i64) -> StoreResult<()> {
        self.set_context(store, self.to_context.clone(), now_ms).await
    }

    pub(crate) async fn undo(&self, store: &dyn TaskStore, now_ms: i64) -> StoreResult<()> {
        self.set_context(store, self.from_context.clone(), now_ms).await
    }

    async fn set_context(
        &self,
        store: &dyn TaskStore,
        context: Option<String>,
        now_ms: i64,
    ) -> StoreResult<()> {
        let patch = TaskPatch {
            context: Some(context),
            updated_at: Some(now_ms),
            ..TaskPatch::default()
        };
        store.update_task(&self.task_id, &patch).await.map(|_| ())
    }
}
