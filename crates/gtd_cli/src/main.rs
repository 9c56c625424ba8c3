//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable that exercises the history round trip.
//! - Keep output deterministic apart from generated ids.
//!
//! Usage: `gtd_cli [config.json]`. Without a config the run uses an
//! in-memory database and no file logging.

use gtd_core::{AppContext, CoreConfig, NewTask, TaskStatus};
use log::info;
use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => CoreConfig::from_file(path)?,
        None => CoreConfig::default(),
    };
    let context = AppContext::open(&config)?;

    let changes = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&changes);
    context.history().subscribe(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let create = context
        .commands()
        .create_task(NewTask::titled("Try the history"))
        .await?;
    let gtd_core::Command::CreateTask(created) = &create else {
        return Err("create_task built an unexpected command".into());
    };
    let task_id = created.task().id.clone();
    context.history().execute(create).await?;

    let waiting = context
        .commands()
        .move_task(&task_id, TaskStatus::Waiting, Some("Bob".to_string()))
        .await?;
    context.history().execute(waiting).await?;

    if let Some(description) = context.history().undo_description() {
        context.history().undo().await?;
        println!("Undone: {description}");
    }
    if let Some(description) = context.history().redo_description() {
        context.history().redo().await?;
        println!("Redone: {description}");
    }

    let waiting_tasks = context.tasks().list_by_status(TaskStatus::Waiting).await?;
    println!("gtd_core waiting={}", waiting_tasks.len());
    println!("gtd_core changes={}", changes.load(Ordering::SeqCst));
    println!("gtd_core version={}", gtd_core::core_version());
    info!("event=cli_smoke module=cli status=ok");

    context.shutdown().await;
    Ok(())
}
