//! Explicit application context.
//!
//! # Responsibility
//! - Build store, clock, command builder, history manager and query service
//!   once at startup and hand them out by reference.
//! - Provide the single teardown point for history state.
//!
//! # Invariants
//! - No process-global history; each context owns exactly one manager.
//! - All components in one context share the same store and clock.

use crate::clock::{Clock, SystemClock};
use crate::command::CommandBuilder;
use crate::config::{ConfigError, CoreConfig};
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::history::HistoryManager;
use crate::logging::{default_log_level, init_logging, LoggingError};
use crate::service::task_service::TaskService;
use crate::store::{SqliteTaskStore, StoreError, TaskStore};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Startup failure.
#[derive(Debug)]
pub enum ContextError {
    Config(ConfigError),
    Logging(LoggingError),
    Db(DbError),
    Store(StoreError),
}

impl Display for ContextError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Logging(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ContextError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Logging(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<ConfigError> for ContextError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<LoggingError> for ContextError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<DbError> for ContextError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<StoreError> for ContextError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Wiring for one running application.
pub struct AppContext {
    store: Arc<dyn TaskStore>,
    clock: Arc<dyn Clock>,
    commands: CommandBuilder,
    history: HistoryManager,
    tasks: TaskService,
}

impl AppContext {
    /// Opens the configured SQLite database and wires every component.
    ///
    /// Initializes file logging first when `log_dir` is set.
    pub fn open(config: &CoreConfig) -> Result<Self, ContextError> {
        config.validate()?;
        if let Some(log_dir) = &config.log_dir {
            let level = config.log_level.as_deref().unwrap_or(default_log_level());
            init_logging(level, log_dir)?;
        }

        let conn = match &config.db_path {
            Some(path) => open_db(path)?,
            None => open_db_in_memory()?,
        };
        let store: Arc<dyn TaskStore> = Arc::new(SqliteTaskStore::try_new(conn)?);
        let context = Self::with_store(store, Arc::new(SystemClock), config.max_history);
        info!(
            "event=context_open module=context status=ok mode={} max_history={}",
            if config.db_path.is_some() { "file" } else { "memory" },
            context.history.max_history()
        );
        Ok(context)
    }

    /// Wires a context around an existing store and clock.
    pub fn with_store(
        store: Arc<dyn TaskStore>,
        clock: Arc<dyn Clock>,
        max_history: usize,
    ) -> Self {
        Self {
            commands: CommandBuilder::new(Arc::clone(&store), Arc::clone(&clock)),
            history: HistoryManager::with_max_history(
                Arc::clone(&store),
                Arc::clone(&clock),
                max_history,
            ),
            tasks: TaskService::new(Arc::clone(&store)),
            store,
            clock,
        }
    }

    pub fn commands(&self) -> &CommandBuilder {
        &self.commands
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn tasks(&self) -> &TaskService {
        &self.tasks
    }

    pub fn store(&self) -> &Arc<dyn TaskStore> {
        &self.store
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Tears the context down: history stacks and listeners are dropped.
    pub async fn shutdown(self) {
        self.history.teardown().await;
        info!("event=context_shutdown module=context status=ok");
    }
}

#[cfg(test)]
mod tests {
    use super::{AppContext, ContextError};
    use crate::command::NewTask;
    use crate::config::CoreConfig;

    #[tokio::test]
    async fn in_memory_context_runs_commands_end_to_end() {
        let context = AppContext::open(&CoreConfig::default()).unwrap();
        let command = context
            .commands()
            .create_task(NewTask::titled("Water plants"))
            .await
            .unwrap();
        context.history().execute(command).await.unwrap();

        assert!(context.history().can_undo());
        assert_eq!(
            context.history().undo_description().as_deref(),
            Some("Create task \"Water plants\"")
        );
        context.shutdown().await;
    }

    #[test]
    fn open_rejects_invalid_config() {
        let config = CoreConfig {
            max_history: 0,
            ..CoreConfig::default()
        };
        assert!(matches!(
            AppContext::open(&config),
            Err(ContextError::Config(_))
        ));
    }
}
