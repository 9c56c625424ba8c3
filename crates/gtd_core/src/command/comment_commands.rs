//! Comment commands: create and delete.

use crate::model::comment::Comment;
use crate::store::{StoreResult, TaskStore};

/// Inserts a pre-built comment; undo deletes it by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCommentCommand {
    pub(crate) comment: Comment,
    pub(crate) task_title: String,
}

impl CreateCommentCommand {
    pub fn comment(&self) -> &Comment {
        &self.comment
    }

    pub fn description(&self) -> String {
        format!("Add comment to \"{}\"", self.task_title)
    }

    pub(crate) async fn execute(&self, store: &dyn TaskStore) -> StoreResult<()> {
        store.insert_comment(&self.comment).await
    }

    pub(crate) async fn undo(&self, store: &dyn TaskStore) -> StoreResult<()> {
        store.delete_comment(&self.comment.id).await
    }
}

/// Deletes a comment; undo re-inserts it with original id and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteCommentCommand {
    pub(crate) comment: Comment,
    pub(crate) task_title: String,
}

impl DeleteCommentCommand {
    pub fn comment(&self) -> &Comment {
        &self.comment
    }

    pub fn description(&self) -> String {
        format!("Delete comment from \"{}\"", self.task_title)
    }

    pub(crate) async fn execute(&self, store: &dyn TaskStore) -> StoreResult<()> {
        store.delete_comment(&self.comment.id).await
    }

    pub(crate) async fn undo(&self, store: &dyn TaskStore) -> StoreResult<()> {
        store.insert_comment(&self.comment).await
    }
}
