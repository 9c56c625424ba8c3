//! Undo/redo history for task commands.
//!
//! # Responsibility
//! - Apply commands against the store and keep undo/redo stacks.
//! - Notify subscribers after every successful history operation.
//!
//! # Invariants
//! - `execute`/`undo`/`redo` are serialized; one operation in flight at most.
//! - A successful `execute` clears the redo stack.
//! - The undo stack never exceeds `max_history`; the oldest entry is dropped
//!   without running its undo.
//! - A failed operation leaves both stacks exactly as they were.
//! - A command moves between stacks only after its store write succeeded;
//!   an abandoned caller never strands it off both stacks.
//! - Empty-stack `undo`/`redo` return `Ok(false)`; it is not an error.

mod subscribers;

pub use subscribers::SubscriptionId;

use crate::clock::Clock;
use crate::command::Command;
use crate::store::{StoreError, StoreResult, TaskStore};
use log::{debug, error, info};
use serde::Serialize;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use subscribers::Subscribers;

/// Default bound of the undo stack.
pub const MAX_HISTORY_SIZE: usize = 50;

/// Read-only view of the history stacks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HistorySnapshot {
    pub undo_depth: usize,
    pub redo_depth: usize,
    pub undo_description: Option<String>,
    pub redo_description: Option<String>,
}

#[derive(Default)]
struct Stacks {
    /// Most recent last.
    undo: VecDeque<Command>,
    /// Most recently undone last.
    redo: Vec<Command>,
}

/// Owns the undo/redo stacks for one application context.
///
/// Every `execute`/`undo`/`redo` runs on its own runtime task. Dropping the
/// caller's future does not cancel the store write or the stack update that
/// follows it.
pub struct HistoryManager {
    inner: Arc<HistoryInner>,
}

struct HistoryInner {
    store: Arc<dyn TaskStore>,
    clock: Arc<dyn Clock>,
    max_history: usize,
    op_lock: tokio::sync::Mutex<()>,
    stacks: Mutex<Stacks>,
    subscribers: Subscribers,
}

impl HistoryManager {
    /// Creates a manager bounded at `MAX_HISTORY_SIZE`.
    pub fn new(store: Arc<dyn TaskStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_max_history(store, clock, MAX_HISTORY_SIZE)
    }

    /// Creates a manager with a custom bound. A bound of zero is raised to one.
    pub fn with_max_history(
        store: Arc<dyn TaskStore>,
        clock: Arc<dyn Clock>,
        max_history: usize,
    ) -> Self {
        Self {
            inner: Arc::new(HistoryInner {
                store,
                clock,
                max_history: max_history.max(1),
                op_lock: tokio::sync::Mutex::new(()),
                stacks: Mutex::new(Stacks::default()),
                subscribers: Subscribers::default(),
            }),
        }
    }

    pub fn max_history(&self) -> usize {
        self.inner.max_history
    }

    /// Runs `command` forward and records it for undo.
    ///
    /// # Errors
    /// - Store failures propagate unchanged; stacks are left untouched.
    pub async fn execute(&self, command: Command) -> StoreResult<()> {
        let inner = Arc::clone(&self.inner);
        detach("execute", async move { inner.execute(command).await }).await
    }

    /// Reverts the most recent command.
    ///
    /// Returns `Ok(false)` when there is nothing to undo.
    ///
    /// # Errors
    /// - Store failures propagate; the command stays on the undo stack.
    pub async fn undo(&self) -> StoreResult<bool> {
        let inner = Arc::clone(&self.inner);
        detach("undo", async move { inner.undo().await }).await
    }

    /// Re-applies the most recently undone command.
    ///
    /// Returns `Ok(false)` when there is nothing to redo.
    ///
    /// # Errors
    /// - Store failures propagate; the command stays on the redo stack.
    pub async fn redo(&self) -> StoreResult<bool> {
        let inner = Arc::clone(&self.inner);
        detach("redo", async move { inner.redo().await }).await
    }

    pub fn can_undo(&self) -> bool {
        !self.inner.lock_stacks().undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.inner.lock_stacks().redo.is_empty()
    }

    /// Description of the command `undo` would revert.
    pub fn undo_description(&self) -> Option<String> {
        self.inner.lock_stacks().undo.back().map(Command::description)
    }

    /// Description of the command `redo` would re-apply.
    pub fn redo_description(&self) -> Option<String> {
        self.inner.lock_stacks().redo.last().map(Command::description)
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        let stacks = self.inner.lock_stacks();
        HistorySnapshot {
            undo_depth: stacks.undo.len(),
            redo_depth: stacks.redo.len(),
            undo_description: stacks.undo.back().map(Command::description),
            redo_description: stacks.redo.last().map(Command::description),
        }
    }

    /// Registers a parameterless change listener.
    ///
    /// Listeners run synchronously on the task driving
    /// `execute`/`undo`/`redo`/`clear`, right after the stacks change. They
    /// may read history state but must not block.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.subscribers.subscribe(Arc::new(listener))
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.subscribers.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    /// Forgets both stacks without touching the store, then notifies.
    pub async fn clear(&self) {
        let _serial = self.inner.op_lock.lock().await;
        {
            let mut stacks = self.inner.lock_stacks();
            stacks.undo.clear();
            stacks.redo.clear();
        }
        info!("event=history_clear module=history status=ok");
        self.inner.subscribers.notify();
    }

    /// Ends the manager's useful life: drops both stacks and all listeners.
    pub async fn teardown(&self) {
        let _serial = self.inner.op_lock.lock().await;
        let dropped = {
            let mut stacks = self.inner.lock_stacks();
            let dropped = stacks.undo.len() + stacks.redo.len();
            stacks.undo.clear();
            stacks.redo.clear();
            dropped
        };
        self.inner.subscribers.clear();
        info!(
            "event=history_teardown module=history status=ok dropped_commands={}",
            dropped
        );
    }
}

impl HistoryInner {
    async fn execute(&self, command: Command) -> StoreResult<()> {
        let _serial = self.op_lock.lock().await;
        let started_at = Instant::now();
        let kind = command.kind();

        if let Err(err) = command
            .execute(self.store.as_ref(), self.clock.now_ms())
            .await
        {
            error!(
                "event=history_execute module=history status=error command={} duration_ms={} error={}",
                kind,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err);
        }

        let (undo_depth, redo_depth) = {
            let mut stacks = self.lock_stacks();
            stacks.redo.clear();
            self.push_undo(&mut stacks, command);
            (stacks.undo.len(), stacks.redo.len())
        };
        info!(
            "event=history_execute module=history status=ok command={} undo_depth={} redo_depth={} duration_ms={}",
            kind,
            undo_depth,
            redo_depth,
            started_at.elapsed().as_millis()
        );
        self.subscribers.notify();
        Ok(())
    }

    async fn undo(&self) -> StoreResult<bool> {
        let _serial = self.op_lock.lock().await;
        // Stays on the undo stack until its inverse has landed.
        let peeked = self.lock_stacks().undo.back().cloned();
        let Some(command) = peeked else {
            debug!("event=history_undo module=history status=empty");
            return Ok(false);
        };
        let started_at = Instant::now();
        let kind = command.kind();

        if let Err(err) = command.undo(self.store.as_ref(), self.clock.now_ms()).await {
            error!(
                "event=history_undo module=history status=error command={} duration_ms={} error={}",
                kind,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err);
        }

        let (undo_depth, redo_depth) = {
            let mut stacks = self.lock_stacks();
            if let Some(applied) = stacks.undo.pop_back() {
                stacks.redo.push(applied);
            }
            (stacks.undo.len(), stacks.redo.len())
        };
        info!(
            "event=history_undo module=history status=ok command={} undo_depth={} redo_depth={} duration_ms={}",
            kind,
            undo_depth,
            redo_depth,
            started_at.elapsed().as_millis()
        );
        self.subscribers.notify();
        Ok(true)
    }

    async fn redo(&self) -> StoreResult<bool> {
        let _serial = self.op_lock.lock().await;
        let peeked = self.lock_stacks().redo.last().cloned();
        let Some(command) = peeked else {
            debug!("event=history_redo module=history status=empty");
            return Ok(false);
        };
        let started_at = Instant::now();
        let kind = command.kind();

        if let Err(err) = command
            .execute(self.store.as_ref(), self.clock.now_ms())
            .await
        {
            error!(
                "event=history_redo module=history status=error command={} duration_ms={} error={}",
                kind,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err);
        }

        let (undo_depth, redo_depth) = {
            let mut stacks = self.lock_stacks();
            if let Some(applied) = stacks.redo.pop() {
                self.push_undo(&mut stacks, applied);
            }
            (stacks.undo.len(), stacks.redo.len())
        };
        info!(
            "event=history_redo module=history status=ok command={} undo_depth={} redo_depth={} duration_ms={}",
            kind,
            undo_depth,
            redo_depth,
            started_at.elapsed().as_millis()
        );
        self.subscribers.notify();
        Ok(true)
    }

    fn push_undo(&self, stacks: &mut Stacks, command: Command) {
        stacks.undo.push_back(command);
        while stacks.undo.len() > self.max_history {
            if let Some(evicted) = stacks.undo.pop_front() {
                debug!(
                    "event=history_evict module=history status=ok command={} max_history={}",
                    evicted.kind(),
                    self.max_history
                );
            }
        }
    }

    fn lock_stacks(&self) -> MutexGuard<'_, Stacks> {
        self.stacks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Runs one history operation on its own task and waits for it.
async fn detach<T, F>(operation: &'static str, future: F) -> StoreResult<T>
where
    T: Send + 'static,
    F: Future<Output = StoreResult<T>> + Send + 'static,
{
    tokio::spawn(future).await.map_err(|err| {
        error!(
            "event=history_{} module=history status=error error=\"task failed: {}\"",
            operation, err
        );
        StoreError::Unavailable(format!("history {operation} task failed: {err}"))
    })?
}
