//! GTD status/hierarchy state machine.
//!
//! # Responsibility
//! - Decide which status, project and link transitions are legal.
//! - Normalize user-supplied free text (`waiting_for`, `context`).
//!
//! # Invariants
//! - Every check is pure over already-loaded tasks; no store access here.
//! - Moving back to earlier states is legal so corrections stay possible.

use crate::model::task::{Task, TaskStatus};
use crate::model::validation::ValidationError;

/// Trims free text and maps blank input to `None`.
pub fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

/// Validates a status move and returns the `waiting_for` value to store.
///
/// - `inbox|next|someday`: always legal, `waiting_for` is cleared.
/// - `waiting`: leaf tasks only; requires non-blank `waiting_for`.
/// - `done`: only for non-project tasks that are not already done.
pub fn check_move(
    task: &Task,
    to: TaskStatus,
    waiting_for: Option<String>,
) -> Result<Option<String>, ValidationError> {
    let waiting_for = normalize_text(waiting_for);

    match to {
        TaskStatus::Waiting => {
            if task.is_project {
                return Err(ValidationError::ProjectCannotWait(task.id.clone()));
            }
            if waiting_for.is_none() {
                return Err(ValidationError::WaitingForRequired);
            }
            Ok(waiting_for)
        }
        TaskStatus::Done => {
            if waiting_for.is_some() {
                return Err(ValidationError::WaitingForNotAllowed(to));
            }
            if task.is_project {
                return Err(ValidationError::ProjectCannotComplete(task.id.clone()));
            }
            if task.status == TaskStatus::Done {
                return Err(ValidationError::AlreadyDone(task.id.clone()));
            }
            Ok(None)
        }
        TaskStatus::Inbox | TaskStatus::Next | TaskStatus::Someday => {
            if waiting_for.is_some() {
                return Err(ValidationError::WaitingForNotAllowed(to));
            }
            Ok(None)
        }
    }
}

/// Validates leaf-to-project conversion.
pub fn check_convert(task: &Task) -> Result<(), ValidationError> {
    if task.is_project {
        return Err(ValidationError::AlreadyProject(task.id.clone()));
    }
    if task.parent_id.is_some() {
        return Err(ValidationError::ProjectWithParent(task.id.clone()));
    }
    Ok(())
}

/// Validates attaching `task` to `parent` (`None` detaches).
///
/// Status is irrelevant for linking.
pub fn check_link(task: &Task, parent: Option<&Task>) -> Result<(), ValidationError> {
    if task.is_project {
        return Err(ValidationError::ProjectCannotBeLinked(task.id.clone()));
    }
    if let Some(parent) = parent {
        if !parent.is_project {
            return Err(ValidationError::NotAProject(parent.id.clone()));
        }
    }
    Ok(())
}

/// Validates a context change; contexts belong to leaf tasks.
pub fn check_context(task: &Task) -> Result<(), ValidationError> {
    if task.is_project {
        return Err(ValidationError::ProjectContext(task.id.clone()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{check_context, check_convert, check_link, check_move, normalize_text};
    use crate::model::task::{Task, TaskId, TaskStatus};
    use crate::model::validation::ValidationError;
    use rstest::rstest;

    fn leaf(status: TaskStatus) -> Task {
        let mut task = Task::new(TaskId::from("a"), "Call plumber", 0);
        task.status = status;
        if status == TaskStatus::Waiting {
            task.waiting_for = Some("Alice".to_string());
        }
        task
    }

    fn project() -> Task {
        let mut task = Task::new(TaskId::from("p"), "Renovate kitchen", 0);
        task.is_project = true;
        task.status = TaskStatus::Next;
        task
    }

    #[rstest]
    #[case(TaskStatus::Inbox)]
    #[case(TaskStatus::Next)]
    #[case(TaskStatus::Waiting)]
    #[case(TaskStatus::Someday)]
    #[case(TaskStatus::Done)]
    fn any_status_moves_to_open_states(#[case] from: TaskStatus) {
        for to in [TaskStatus::Inbox, TaskStatus::Next, TaskStatus::Someday] {
            assert_eq!(check_move(&leaf(from), to, None), Ok(None));
        }
    }

    #[rstest]
    #[case(TaskStatus::Inbox)]
    #[case(TaskStatus::Waiting)]
    #[case(TaskStatus::Done)]
    fn waiting_requires_target(#[case] from: TaskStatus) {
        assert_eq!(
            check_move(&leaf(from), TaskStatus::Waiting, None),
            Err(ValidationError::WaitingForRequired)
        );
        assert_eq!(
            check_move(&leaf(from), TaskStatus::Waiting, Some("   ".to_string())),
            Err(ValidationError::WaitingForRequired)
        );
        assert_eq!(
            check_move(&leaf(from), TaskStatus::Waiting, Some(" Bob ".to_string())),
            Ok(Some("Bob".to_string()))
        );
    }

    #[rstest]
    #[case(TaskStatus::Inbox, true)]
    #[case(TaskStatus::Next, true)]
    #[case(TaskStatus::Waiting, true)]
    #[case(TaskStatus::Someday, true)]
    #[case(TaskStatus::Done, false)]
    fn leaf_completion(#[case] from: TaskStatus, #[case] allowed: bool) {
        let result = check_move(&leaf(from), TaskStatus::Done, None);
        if allowed {
            assert_eq!(result, Ok(None));
        } else {
            assert_eq!(result, Err(ValidationError::AlreadyDone(TaskId::from("a"))));
        }
    }

    #[test]
    fn project_cannot_complete_but_can_be_triaged() {
        assert_eq!(
            check_move(&project(), TaskStatus::Done, None),
            Err(ValidationError::ProjectCannotComplete(TaskId::from("p")))
        );
        assert_eq!(check_move(&project(), TaskStatus::Someday, None), Ok(None));
    }

    #[test]
    fn project_cannot_wait() {
        assert_eq!(
            check_move(&project(), TaskStatus::Waiting, Some("Bob".into())),
            Err(ValidationError::ProjectCannotWait(TaskId::from("p")))
        );
    }

    #[test]
    fn waiting_for_rejected_for_other_targets() {
        assert_eq!(
            check_move(&leaf(TaskStatus::Inbox), TaskStatus::Next, Some("Bob".into())),
            Err(ValidationError::WaitingForNotAllowed(TaskStatus::Next))
        );
        assert_eq!(
            check_move(&leaf(TaskStatus::Inbox), TaskStatus::Done, Some("Bob".into())),
            Err(ValidationError::WaitingForNotAllowed(TaskStatus::Done))
        );
    }

    #[test]
    fn convert_only_unparented_leaves() {
        assert_eq!(check_convert(&leaf(TaskStatus::Waiting)), Ok(()));
        assert_eq!(
            check_convert(&project()),
            Err(ValidationError::AlreadyProject(TaskId::from("p")))
        );

        let mut child = leaf(TaskStatus::Next);
        child.parent_id = Some(TaskId::from("p"));
        assert_eq!(
            check_convert(&child),
            Err(ValidationError::ProjectWithParent(TaskId::from("a")))
        );
    }

    #[rstest]
    #[case(TaskStatus::Inbox)]
    #[case(TaskStatus::Done)]
    fn link_ignores_status(#[case] status: TaskStatus) {
        let parent = project();
        assert_eq!(check_link(&leaf(status), Some(&parent)), Ok(()));
        assert_eq!(check_link(&leaf(status), None), Ok(()));
    }

    #[test]
    fn link_rejects_non_project_target_and_project_child() {
        let not_project = leaf(TaskStatus::Next);
        let mut other = leaf(TaskStatus::Next);
        other.id = TaskId::from("b");
        assert_eq!(
            check_link(&other, Some(&not_project)),
            Err(ValidationError::NotAProject(TaskId::from("a")))
        );
        assert_eq!(
            check_link(&project(), None),
            Err(ValidationError::ProjectCannotBeLinked(TaskId::from("p")))
        );
    }

    #[test]
    fn context_only_on_leaves() {
        assert_eq!(check_context(&leaf(TaskStatus::Inbox)), Ok(()));
        assert_eq!(
            check_context(&project()),
            Err(ValidationError::ProjectContext(TaskId::from("p")))
        );
    }

    #[test]
    fn normalize_text_trims_and_drops_blank() {
        assert_eq!(normalize_text(Some("  @home ".into())), Some("@home".into()));
        assert_eq!(normalize_text(Some("   ".into())), None);
        assert_eq!(normalize_text(None), None);
    }
}
