mod common;

use common::memory_context;
use gtd_core::{
    AppContext, CommandError, CommentId, NewTask, TaskId, TaskStatus, ValidationError,
};

async fn seed(context: &AppContext, input: NewTask) -> TaskId {
    let command = context.commands().create_task(input).await.unwrap();
    let gtd_core::Command::CreateTask(create) = &command else {
        panic!("expected a create command");
    };
    let id = create.task().id.clone();
    context.history().execute(command).await.unwrap();
    id
}

fn rejection<T: std::fmt::Debug>(result: Result<T, CommandError>) -> ValidationError {
    match result {
        Err(CommandError::Validation(err)) => err,
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn create_task_rejects_malformed_input() {
    let context = memory_context();
    let commands = context.commands();
    let leaf = seed(&context, NewTask::titled("Buy milk")).await;

    assert_eq!(
        rejection(commands.create_task(NewTask::titled("   ")).await),
        ValidationError::BlankTitle
    );
    assert_eq!(
        rejection(
            commands
                .create_task(NewTask {
                    status: Some(TaskStatus::Waiting),
                    ..NewTask::titled("Hear back")
                })
                .await
        ),
        ValidationError::WaitingForRequired
    );
    assert_eq!(
        rejection(
            commands
                .create_task(NewTask {
                    id: Some(leaf.clone()),
                    ..NewTask::titled("Duplicate")
                })
                .await
        ),
        ValidationError::DuplicateTaskId(leaf.clone())
    );
    assert_eq!(
        rejection(
            commands
                .create_task(NewTask {
                    parent_id: Some(leaf.clone()),
                    ..NewTask::titled("Child of a leaf")
                })
                .await
        ),
        ValidationError::NotAProject(leaf)
    );
    assert!(matches!(
        rejection(
            commands
                .create_task(NewTask {
                    is_project: true,
                    context: Some("@home".to_string()),
                    ..NewTask::titled("Garden")
                })
                .await
        ),
        ValidationError::ProjectContext(_)
    ));
}

#[tokio::test]
async fn create_task_trims_and_generates_ids() {
    let context = memory_context();
    let command = context
        .commands()
        .create_task(NewTask {
            waiting_for: Some("  Bob ".to_string()),
            status: Some(TaskStatus::Waiting),
            context: Some("   ".to_string()),
            ..NewTask::titled("  Hear back  ")
        })
        .await
        .unwrap();
    let gtd_core::Command::CreateTask(create) = &command else {
        panic!("expected a create command");
    };
    let task = create.task();
    assert_eq!(task.title, "Hear back");
    assert_eq!(task.waiting_for.as_deref(), Some("Bob"));
    assert_eq!(task.context, None);
    assert!(!task.id.as_str().is_empty());
    assert_eq!(task.created_at, common::NOW);
}

#[tokio::test]
async fn move_task_enforces_the_status_machine() {
    let context = memory_context();
    let commands = context.commands();
    let task = seed(&context, NewTask::titled("Buy milk")).await;
    let project = seed(
        &context,
        NewTask {
            is_project: true,
            ..NewTask::titled("Move house")
        },
    )
    .await;

    assert_eq!(
        rejection(commands.move_task(&task, TaskStatus::Waiting, Some(" ".into())).await),
        ValidationError::WaitingForRequired
    );
    assert_eq!(
        rejection(commands.move_task(&task, TaskStatus::Next, Some("Bob".into())).await),
        ValidationError::WaitingForNotAllowed(TaskStatus::Next)
    );
    assert_eq!(
        rejection(commands.complete_task(&project).await),
        ValidationError::ProjectCannotComplete(project.clone())
    );
    assert_eq!(
        rejection(
            commands
                .move_task(&project, TaskStatus::Waiting, Some("Bob".into()))
                .await
        ),
        ValidationError::ProjectCannotWait(project.clone())
    );
    assert!(matches!(
        rejection(
            commands
                .create_task(NewTask {
                    is_project: true,
                    status: Some(TaskStatus::Waiting),
                    waiting_for: Some("Bob".to_string()),
                    ..NewTask::titled("Waiting project")
                })
                .await
        ),
        ValidationError::ProjectCannotWait(_)
    ));

    let done = commands.complete_task(&task).await.unwrap();
    assert_eq!(done.description(), "Complete \"Buy milk\"");
    context.history().execute(done).await.unwrap();
    assert_eq!(
        rejection(commands.complete_task(&task).await),
        ValidationError::AlreadyDone(task.clone())
    );

    // Reopening a done task is a legal correction.
    commands
        .move_task(&task, TaskStatus::Inbox, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn hierarchy_commands_reject_invalid_targets() {
    let context = memory_context();
    let commands = context.commands();
    let leaf = seed(&context, NewTask::titled("Buy milk")).await;
    let other = seed(&context, NewTask::titled("Buy bread")).await;
    let project = seed(
        &context,
        NewTask {
            is_project: true,
            ..NewTask::titled("Move house")
        },
    )
    .await;

    assert_eq!(
        rejection(commands.link_task(&leaf, Some(&other)).await),
        ValidationError::NotAProject(other.clone())
    );
    assert_eq!(
        rejection(commands.link_task(&project, None).await),
        ValidationError::ProjectCannotBeLinked(project.clone())
    );
    assert_eq!(
        rejection(commands.convert_to_project(&project).await),
        ValidationError::AlreadyProject(project.clone())
    );
    assert_eq!(
        rejection(commands.set_context(&project, Some("@home".into())).await),
        ValidationError::ProjectContext(project.clone())
    );

    let link = commands.link_task(&leaf, Some(&project)).await.unwrap();
    context.history().execute(link).await.unwrap();
    assert_eq!(
        rejection(commands.convert_to_project(&leaf).await),
        ValidationError::ProjectWithParent(leaf.clone())
    );
    assert_eq!(
        rejection(commands.delete_task(&project).await),
        ValidationError::ProjectHasChildren(project.clone())
    );

    let unlink = commands.link_task(&leaf, None).await.unwrap();
    assert_eq!(unlink.description(), "Unlink \"Buy milk\" from its project");
}

#[tokio::test]
async fn missing_targets_and_blank_comments_are_rejected() {
    let context = memory_context();
    let commands = context.commands();
    let missing = TaskId::from("missing");
    let task = seed(&context, NewTask::titled("Buy milk")).await;

    assert_eq!(
        rejection(commands.delete_task(&missing).await),
        ValidationError::TaskNotFound(missing.clone())
    );
    assert_eq!(
        rejection(commands.move_task(&missing, TaskStatus::Next, None).await),
        ValidationError::TaskNotFound(missing.clone())
    );
    assert_eq!(
        rejection(commands.create_comment(&missing, "hello").await),
        ValidationError::TaskNotFound(missing)
    );
    assert_eq!(
        rejection(commands.create_comment(&task, " \n ").await),
        ValidationError::BlankCommentContent
    );
    assert_eq!(
        rejection(commands.delete_comment(&CommentId::from("gone")).await),
        ValidationError::CommentNotFound(CommentId::from("gone"))
    );
}

#[tokio::test]
async fn rejected_commands_never_touch_history() {
    let context = memory_context();
    let _ = context.commands().create_task(NewTask::titled("")).await;
    assert!(!context.history().can_undo());
    assert_eq!(context.history().snapshot().undo_depth, 0);
}
