#![allow(dead_code)]

use async_trait::async_trait;
use gtd_core::{
    AppContext, Comment, CommentId, FixedClock, InMemoryTaskStore, StoreError, StoreResult, Task,
    TaskId, TaskListQuery, TaskPatch, TaskStore,
};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

pub const NOW: i64 = 1_700_000_000_000;

/// In-memory store whose writes can be made to fail, hang or interleave.
///
/// Every write yields to the scheduler before and after touching the inner
/// store, and the store records the highest number of writes in flight.
#[derive(Default)]
pub struct ControlledStore {
    inner: InMemoryTaskStore,
    fail_writes: AtomicBool,
    hang_deletes: AtomicBool,
    writes_in_flight: AtomicUsize,
    max_writes_in_flight: AtomicUsize,
}

impl ControlledStore {
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes `delete_task` wait forever without touching the inner store.
    pub fn set_hang_deletes(&self, hang: bool) {
        self.hang_deletes.store(hang, Ordering::SeqCst);
    }

    pub fn max_writes_in_flight(&self) -> usize {
        self.max_writes_in_flight.load(Ordering::SeqCst)
    }

    async fn write<T>(&self, op: impl Future<Output = StoreResult<T>>) -> StoreResult<T> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected write failure".to_string()));
        }
        let in_flight = self.writes_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_writes_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        tokio::task::yield_now().await;
        let result = op.await;
        tokio::task::yield_now().await;
        self.writes_in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[async_trait]
impl TaskStore for ControlledStore {
    async fn insert_task(&self, task: &Task) -> StoreResult<()> {
        self.write(self.inner.insert_task(task)).await
    }

    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> StoreResult<Task> {
        self.write(self.inner.update_task(id, patch)).await
    }

    async fn delete_task(&self, id: &TaskId) -> StoreResult<()> {
        if self.hang_deletes.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.write(self.inner.delete_task(id)).await
    }

    async fn get_task(&self, id: &TaskId) -> StoreResult<Option<Task>> {
        self.inner.get_task(id).await
    }

    async fn list_tasks(&self, query: &TaskListQuery) -> StoreResult<Vec<Task>> {
        self.inner.list_tasks(query).await
    }

    async fn delete_task_with_comments(&self, id: &TaskId) -> StoreResult<()> {
        self.write(self.inner.delete_task_with_comments(id)).await
    }

    async fn restore_task_with_comments(
        &self,
        task: &Task,
        comments: &[Comment],
    ) -> StoreResult<()> {
        self.write(self.inner.restore_task_with_comments(task, comments)).await
    }

    async fn insert_comment(&self, comment: &Comment) -> StoreResult<()> {
        self.write(self.inner.insert_comment(comment)).await
    }

    async fn get_comment(&self, id: &CommentId) -> StoreResult<Option<Comment>> {
        self.inner.get_comment(id).await
    }

    async fn list_comments(&self, task_id: &TaskId) -> StoreResult<Vec<Comment>> {
        self.inner.list_comments(task_id).await
    }

    async fn delete_comment(&self, id: &CommentId) -> StoreResult<()> {
        self.write(self.inner.delete_comment(id)).await
    }
}

pub fn memory_context() -> AppContext {
    context_with(Arc::new(InMemoryTaskStore::new()), 50)
}

pub fn context_with(store: Arc<dyn TaskStore>, max_history: usize) -> AppContext {
    clocked_context(store, max_history).0
}

/// Context plus a handle on its clock, for tests that move time forward.
pub fn clocked_context(
    store: Arc<dyn TaskStore>,
    max_history: usize,
) -> (AppContext, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::new(NOW));
    let context = AppContext::with_store(store, clock.clone(), max_history);
    (context, clock)
}

/// Full observable store state: every task plus every comment.
pub async fn dump(store: &dyn TaskStore) -> (Vec<Task>, Vec<Comment>) {
    let tasks = store.list_tasks(&TaskListQuery::default()).await.unwrap();
    let mut comments = Vec::new();
    for task in &tasks {
        comments.extend(store.list_comments(&task.id).await.unwrap());
    }
    (tasks, comments)
}

pub async fn task(store: &dyn TaskStore, id: &str) -> Option<Task> {
    store.get_task(&TaskId::from(id)).await.unwrap()
}
