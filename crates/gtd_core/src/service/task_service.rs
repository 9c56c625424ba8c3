//! Read-side task queries for views.
//!
//! # Responsibility
//! - Give the presentation layer stable list/detail queries to re-run after
//!   a history change notification.
//!
//! # Invariants
//! - Never mutates the store; every mutation goes through `HistoryManager`.

use crate::model::comment::Comment;
use crate::model::task::{Task, TaskId, TaskStatus};
use crate::store::{StoreResult, TaskListQuery, TaskStore};
use std::sync::Arc;

/// One project with its child tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectView {
    pub project: Task,
    pub children: Vec<Task>,
}

/// One task with its comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDetail {
    pub task: Task,
    pub comments: Vec<Comment>,
}

/// Query facade over a `TaskStore`.
#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    /// Leaf tasks and projects in one status.
    pub async fn list_by_status(&self, status: TaskStatus) -> StoreResult<Vec<Task>> {
        self.store
            .list_tasks(&TaskListQuery {
                status: Some(status),
                ..TaskListQuery::default()
            })
            .await
    }

    /// Leaf tasks tagged with `context`.
    pub async fn list_by_context(&self, context: &str) -> StoreResult<Vec<Task>> {
        self.store
            .list_tasks(&TaskListQuery {
                context: Some(context.trim().to_string()),
                is_project: Some(false),
                ..TaskListQuery::default()
            })
            .await
    }

    /// Every project with its children, ordered by creation.
    pub async fn list_projects(&self) -> StoreResult<Vec<ProjectView>> {
        let projects = self
            .store
            .list_tasks(&TaskListQuery {
                is_project: Some(true),
                ..TaskListQuery::default()
            })
            .await?;

        let mut views = Vec::with_capacity(projects.len());
        for project in projects {
            let children = self.project_children(&project.id).await?;
            views.push(ProjectView { project, children });
        }
        Ok(views)
    }

    pub async fn project_children(&self, project_id: &TaskId) -> StoreResult<Vec<Task>> {
        self.store
            .list_tasks(&TaskListQuery {
                parent_id: Some(project_id.clone()),
                ..TaskListQuery::default()
            })
            .await
    }

    /// Task with its comments, or `None` when it does not exist.
    pub async fn task_detail(&self, id: &TaskId) -> StoreResult<Option<TaskDetail>> {
        let Some(task) = self.store.get_task(id).await? else {
            return Ok(None);
        };
        let comments = self.store.list_comments(id).await?;
        Ok(Some(TaskDetail { task, comments }))
    }
}
