//! Command construction with validation and inverse snapshots.
//!
//! # Responsibility
//! - Turn user intent into a well-formed `Command`, or reject it.
//! - Assign ids and timestamps before a command exists.
//! - Capture every prior value the inverse will need.
//!
//! # Invariants
//! - Validation happens here only; `execute`/`undo` never validate intent.
//! - Reads the store, never writes it.

use crate::clock::Clock;
use crate::command::comment_commands::{CreateCommentCommand, DeleteCommentCommand};
use crate::command::task_commands::{
    ConvertToProjectCommand, CreateTaskCommand, DeleteTaskCommand, LinkTaskCommand,
    MoveTaskCommand, SetContextCommand,
};
use crate::command::{Command, CommandError, CommandResult};
use crate::model::comment::{Comment, CommentId};
use crate::model::lifecycle::{
    check_context, check_convert, check_link, check_move, normalize_text,
};
use crate::model::task::{Task, TaskId, TaskStatus};
use crate::model::validation::ValidationError;
use crate::store::{TaskListQuery, TaskStore};
use log::{info, warn};
use std::sync::Arc;

/// Input for `CommandBuilder::create_task`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    /// Caller-provided id; generated when `None`.
    pub id: Option<TaskId>,
    pub title: String,
    pub description: Option<String>,
    /// Defaults to `inbox`.
    pub status: Option<TaskStatus>,
    pub waiting_for: Option<String>,
    pub is_project: bool,
    pub parent_id: Option<TaskId>,
    pub context: Option<String>,
    /// Unix epoch milliseconds.
    pub due_date: Option<i64>,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Validating factory for every command kind.
#[derive(Clone)]
pub struct CommandBuilder {
    store: Arc<dyn TaskStore>,
    clock: Arc<dyn Clock>,
}

impl CommandBuilder {
    pub fn new(store: Arc<dyn TaskStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Builds a `CreateTask` command.
    ///
    /// # Errors
    /// - Blank title, waiting without target, duplicate id.
    /// - Parent missing or not a project; project with a parent.
    pub async fn create_task(&self, input: NewTask) -> CommandResult<Command> {
        let result = self.build_create_task(input).await;
        log_outcome("create_task", &result);
        result
    }

    async fn build_create_task(&self, input: NewTask) -> CommandResult<Command> {
        let id = input.id.unwrap_or_else(TaskId::generate);
        if self.store.get_task(&id).await?.is_some() {
            return Err(ValidationError::DuplicateTaskId(id).into());
        }

        let now_ms = self.clock.now_ms();
        let mut task = Task::new(id, input.title.trim(), now_ms);
        task.description = normalize_text(input.description);
        task.status = input.status.unwrap_or(TaskStatus::Inbox);
        task.waiting_for = normalize_text(input.waiting_for);
        task.is_project = input.is_project;
        task.parent_id = input.parent_id;
        task.context = normalize_text(input.context);
        task.due_date = input.due_date;
        task.validate()?;

        if task.is_project {
            if task.status == TaskStatus::Done {
                return Err(ValidationError::ProjectCannotComplete(task.id).into());
            }
            if task.context.is_some() {
                return Err(ValidationError::ProjectContext(task.id).into());
            }
        }
        if let Some(parent_id) = &task.parent_id {
            let parent = self.load_task(parent_id).await?;
            check_link(&task, Some(&parent))?;
        }

        Ok(Command::CreateTask(CreateTaskCommand { task }))
    }

    /// Builds a `DeleteTask` command capturing the task and all its comments.
    ///
    /// # Errors
    /// - Task missing; project that still owns child tasks.
    pub async fn delete_task(&self, id: &TaskId) -> CommandResult<Command> {
        let result = self.build_delete_task(id).await;
        log_outcome("delete_task", &result);
        result
    }

    async fn build_delete_task(&self, id: &TaskId) -> CommandResult<Command> {
        let task = self.load_task(id).await?;
        if task.is_project {
            let children = TaskListQuery {
                parent_id: Some(task.id.clone()),
                limit: Some(1),
                ..TaskListQuery::default()
            };
            if !self.store.list_tasks(&children).await?.is_empty() {
                return Err(ValidationError::ProjectHasChildren(task.id).into());
            }
        }
        let comments = self.store.list_comments(id).await?;
        Ok(Command::DeleteTask(DeleteTaskCommand { task, comments }))
    }

    /// Builds a `MoveTask` command. `waiting_for` is required for `waiting`
    /// and rejected for every other target.
    pub async fn move_task(
        &self,
        id: &TaskId,
        to: TaskStatus,
        waiting_for: Option<String>,
    ) -> CommandResult<Command> {
        let result = self.build_move_task(id, to, waiting_for).await;
        log_outcome("move_task", &result);
        result
    }

    async fn build_move_task(
        &self,
        id: &TaskId,
        to: TaskStatus,
        waiting_for: Option<String>,
    ) -> CommandResult<Command> {
        let task = self.load_task(id).await?;
        let to_waiting_for = check_move(&task, to, waiting_for)?;
        Ok(Command::MoveTask(MoveTaskCommand {
            task_id: task.id,
            title: task.title,
            from_status: task.status,
            from_waiting_for: task.waiting_for,
            to_status: to,
            to_waiting_for,
        }))
    }

    /// Shortcut for moving a leaf task to `done`.
    pub async fn complete_task(&self, id: &TaskId) -> CommandResult<Command> {
        self.move_task(id, TaskStatus::Done, None).await
    }

    /// Builds a `LinkTask` command. `parent_id = None` detaches.
    pub async fn link_task(
        &self,
        id: &TaskId,
        parent_id: Option<&TaskId>,
    ) -> CommandResult<Command> {
        let result = self.build_link_task(id, parent_id).await;
        log_outcome("link_task", &result);
        result
    }

    async fn build_link_task(
        &self,
        id: &TaskId,
        parent_id: Option<&TaskId>,
    ) -> CommandResult<Command> {
        let task = self.load_task(id).await?;
        let parent = match parent_id {
            Some(parent_id) => Some(self.load_task(parent_id).await?),
            None => None,
        };
        check_link(&task, parent.as_ref())?;

        Ok(Command::LinkTask(LinkTaskCommand {
            task_id: task.id,
            title: task.title,
            from_parent_id: task.parent_id,
            to_parent_id: parent.as_ref().map(|parent| parent.id.clone()),
            to_parent_title: parent.map(|parent| parent.title),
        }))
    }

    /// Builds a `ConvertToProject` command for an unparented leaf task.
    pub async fn convert_to_project(&self, id: &TaskId) -> CommandResult<Command> {
        let result = self.build_convert_to_project(id).await;
        log_outcome("convert_to_project", &result);
        result
    }

    async fn build_convert_to_project(&self, id: &TaskId) -> CommandResult<Command> {
        let task = self.load_task(id).await?;
        check_convert(&task)?;
        Ok(Command::ConvertToProject(ConvertToProjectCommand {
            task_id: task.id,
            title: task.title,
            original_status: task.status,
            original_waiting_for: task.waiting_for,
            original_context: task.context,
        }))
    }

    /// Builds a `SetContext` command. Blank context clears it.
    pub async fn set_context(
        &self,
        id: &TaskId,
        context: Option<String>,
    ) -> CommandResult<Command> {
        let result = self.build_set_context(id, context).await;
        log_outcome("set_context", &result);
        result
    }

    async fn build_set_context(
        &self,
        id: &TaskId,
        context: Option<String>,
    ) -> CommandResult<Command> {
        let task = self.load_task(id).await?;
        check_context(&task)?;
        Ok(Command::SetContext(SetContextCommand {
            task_id: task.id,
            title: task.title,
            from_context: task.context,
            to_context: normalize_text(context),
        }))
    }

    /// Builds a `CreateComment` command with a fresh id and timestamp.
    pub async fn create_comment(
        &self,
        task_id: &TaskId,
        content: impl Into<String>,
    ) -> CommandResult<Command> {
        let content = content.into();
        let result = self.build_create_comment(task_id, content).await;
        log_outcome("create_comment", &result);
        result
    }

    async fn build_create_comment(
        &self,
        task_id: &TaskId,
        content: String,
    ) -> CommandResult<Command> {
        let task = self.load_task(task_id).await?;
        let comment = Comment::new(
            CommentId::generate(),
            task.id,
            content.trim(),
            self.clock.now_ms(),
        );
        comment.validate()?;
        Ok(Command::CreateComment(CreateCommentCommand {
            comment,
            task_title: task.title,
        }))
    }

    /// Builds a `DeleteComment` command capturing the full comment.
    pub async fn delete_comment(&self, id: &CommentId) -> CommandResult<Command> {
        let result = self.build_delete_comment(id).await;
        log_outcome("delete_comment", &result);
        result
    }

    async fn build_delete_comment(&self, id: &CommentId) -> CommandResult<Command> {
        let comment = self
            .store
            .get_comment(id)
            .await?
            .ok_or_else(|| ValidationError::CommentNotFound(id.clone()))?;
        let task = self.load_task(&comment.task_id).await?;
        Ok(Command::DeleteComment(DeleteCommentCommand {
            comment,
            task_title: task.title,
        }))
    }

    async fn load_task(&self, id: &TaskId) -> CommandResult<Task> {
        self.store
            .get_task(id)
            .await?
            .ok_or_else(|| CommandError::Validation(ValidationError::TaskNotFound(id.clone())))
    }
}

fn log_outcome(kind: &'static str, result: &CommandResult<Command>) {
    match result {
        Ok(_) => {}
        Err(CommandError::Validation(err)) => {
            info!(
                "event=command_build module=command status=rejected command={} reason=\"{}\"",
                kind, err
            );
        }
        Err(CommandError::Store(err)) => {
            warn!(
                "event=command_build module=command status=error command={} error={}",
                kind, err
            );
        }
    }
}
