//! In-memory task store.
//!
//! Mirrors the SQLite adapter's validation and conflict rules so history
//! tests and the smoke CLI behave the same against either backend.

use crate::model::comment::{Comment, CommentId};
use crate::model::task::{Task, TaskId, TaskPatch};
use crate::model::validation::ValidationError;
use crate::store::{StoreError, StoreResult, TaskListQuery, TaskStore};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

#[derive(Default)]
struct InMemoryState {
    tasks: BTreeMap<TaskId, Task>,
    comments: BTreeMap<CommentId, Comment>,
}

impl InMemoryState {
    fn insert_task(&mut self, task: &Task) -> StoreResult<()> {
        task.validate()?;
        if self.tasks.contains_key(&task.id) {
            return Err(ValidationError::DuplicateTaskId(task.id.clone()).into());
        }
        self.ensure_parent_is_project(task)?;
        self.tasks.insert(task.id.clone(), task.clone());
        Ok(())
    }

    fn insert_comment(&mut self, comment: &Comment) -> StoreResult<()> {
        comment.validate()?;
        if !self.tasks.contains_key(&comment.task_id) {
            return Err(StoreError::TaskNotFound(comment.task_id.clone()));
        }
        if self.comments.contains_key(&comment.id) {
            return Err(ValidationError::DuplicateCommentId(comment.id.clone()).into());
        }
        self.comments.insert(comment.id.clone(), comment.clone());
        Ok(())
    }

    fn ensure_parent_is_project(&self, task: &Task) -> StoreResult<()> {
        let Some(parent_id) = &task.parent_id else {
            return Ok(());
        };
        match self.tasks.get(parent_id) {
            Some(parent) if parent.is_project => Ok(()),
            Some(_) => Err(ValidationError::NotAProject(parent_id.clone()).into()),
            None => Err(StoreError::TaskNotFound(parent_id.clone())),
        }
    }

    fn ensure_no_children(&self, id: &TaskId) -> StoreResult<()> {
        if self
            .tasks
            .values()
            .any(|task| task.parent_id.as_ref() == Some(id))
        {
            return Err(StoreError::Conflict(format!("task {id} still has child tasks")));
        }
        Ok(())
    }

    fn has_comments(&self, id: &TaskId) -> bool {
        self.comments.values().any(|comment| &comment.task_id == id)
    }
}

/// Store kept entirely in process memory.
#[derive(Default)]
pub struct InMemoryTaskStore {
    state: Mutex<InMemoryState>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn insert_task(&self, task: &Task) -> StoreResult<()> {
        self.state.lock().await.insert_task(task)
    }

    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> StoreResult<Task> {
        let mut state = self.state.lock().await;
        let mut task = state
            .tasks
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::TaskNotFound(id.clone()))?;
        patch.apply_to(&mut task);
        task.validate()?;
        state.ensure_parent_is_project(&task)?;
        state.tasks.insert(id.clone(), task.clone());
        Ok(task)
    }

    async fn delete_task(&self, id: &TaskId) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        state.ensure_no_children(id)?;
        if state.has_comments(id) {
            return Err(StoreError::Conflict(format!("task {id} still has comments")));
        }
        state
            .tasks
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::TaskNotFound(id.clone()))
    }

    async fn get_task(&self, id: &TaskId) -> StoreResult<Option<Task>> {
        Ok(self.state.lock().await.tasks.get(id).cloned())
    }

    async fn list_tasks(&self, query: &TaskListQuery) -> StoreResult<Vec<Task>> {
        let state = self.state.lock().await;
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|task| query.matches(task))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        if let Some(limit) = query.limit {
            tasks.truncate(limit as usize);
        }
        Ok(tasks)
    }

    async fn delete_task_with_comments(&self, id: &TaskId) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        if !state.tasks.contains_key(id) {
            return Err(StoreError::TaskNotFound(id.clone()));
        }
        state.ensure_no_children(id)?;
        state.comments.retain(|_, comment| &comment.task_id != id);
        state.tasks.remove(id);
        Ok(())
    }

    async fn restore_task_with_comments(
        &self,
        task: &Task,
        comments: &[Comment],
    ) -> StoreResult<()> {
        if let Some(stray) = comments.iter().find(|comment| comment.task_id != task.id) {
            return Err(StoreError::InvalidData(format!(
                "comment {} belongs to task {}, not {}",
                stray.id, stray.task_id, task.id
            )));
        }

        let mut state = self.state.lock().await;
        // All-or-nothing: validate every comment before touching state.
        for comment in comments {
            comment.validate()?;
            if state.comments.contains_key(&comment.id) {
                return Err(ValidationError::DuplicateCommentId(comment.id.clone()).into());
            }
        }
        state.insert_task(task)?;
        for comment in comments {
            state.comments.insert(comment.id.clone(), comment.clone());
        }
        Ok(())
    }

    async fn insert_comment(&self, comment: &Comment) -> StoreResult<()> {
        self.state.lock().await.insert_comment(comment)
    }

    async fn get_comment(&self, id: &CommentId) -> StoreResult<Option<Comment>> {
        Ok(self.state.lock().await.comments.get(id).cloned())
    }

    async fn list_comments(&self, task_id: &TaskId) -> StoreResult<Vec<Comment>> {
        let state = self.state.lock().await;
        let mut comments: Vec<Comment> = state
            .comments
            .values()
            .filter(|comment| &comment.task_id == task_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(comments)
    }

    async fn delete_comment(&self, id: &CommentId) -> StoreResult<()> {
        self.state
            .lock()
            .await
            .comments
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::CommentNotFound(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryTaskStore;
    use crate::model::comment::{Comment, CommentId};
    use crate::model::task::{Task, TaskId, TaskPatch, TaskStatus};
    use crate::model::validation::ValidationError;
    use crate::store::{StoreError, TaskListQuery, TaskStore};

    #[tokio::test]
    async fn update_rejects_patch_that_breaks_waiting_invariant() {
        let store = InMemoryTaskStore::new();
        store
            .insert_task(&Task::new(TaskId::from("a"), "Email Bob", 10))
            .await
            .unwrap();

        let patch = TaskPatch {
            status: Some(TaskStatus::Waiting),
            ..TaskPatch::default()
        };
        let err = store.update_task(&TaskId::from("a"), &patch).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::WaitingForRequired)
        ));

        let unchanged = store.get_task(&TaskId::from("a")).await.unwrap().unwrap();
        assert_eq!(unchanged.status, TaskStatus::Inbox);
    }

    #[tokio::test]
    async fn delete_task_with_comments_is_all_or_nothing_for_projects_with_children() {
        let store = InMemoryTaskStore::new();
        let mut project = Task::new(TaskId::from("p"), "Move house", 1);
        project.is_project = true;
        project.status = TaskStatus::Next;
        store.insert_task(&project).await.unwrap();

        let mut child = Task::new(TaskId::from("c"), "Book van", 2);
        child.parent_id = Some(TaskId::from("p"));
        store.insert_task(&child).await.unwrap();
        store
            .insert_comment(&Comment::new(
                CommentId::from("k"),
                TaskId::from("p"),
                "budget 500",
                3,
            ))
            .await
            .unwrap();

        let err = store
            .delete_task_with_comments(&TaskId::from("p"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert!(store.get_task(&TaskId::from("p")).await.unwrap().is_some());
        assert_eq!(store.list_comments(&TaskId::from("p")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_orders_by_creation_and_applies_limit() {
        let store = InMemoryTaskStore::new();
        store.insert_task(&Task::new(TaskId::from("b"), "second", 20)).await.unwrap();
        store.insert_task(&Task::new(TaskId::from("a"), "first", 10)).await.unwrap();
        store.insert_task(&Task::new(TaskId::from("c"), "third", 30)).await.unwrap();

        let query = TaskListQuery {
            limit: Some(2),
            ..TaskListQuery::default()
        };
        let ids: Vec<String> = store
            .list_tasks(&query)
            .await
            .unwrap()
            .into_iter()
            .map(|task| task.id.to_string())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
