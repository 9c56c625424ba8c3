//! SQLite-backed task store.
//!
//! # Responsibility
//! - Implement `TaskStore` over the migrated `tasks`/`comments` schema.
//! - Run blocking rusqlite calls off the async executor.
//!
//! # Invariants
//! - One connection, guarded by a mutex; every call runs on `spawn_blocking`.
//! - Multi-row writes run inside a single transaction.
//! - Rows are validated before insert/update and after read.

use crate::db::migrations::latest_version;
use crate::model::comment::{Comment, CommentId};
use crate::model::task::{Task, TaskId, TaskPatch, TaskStatus};
use crate::model::validation::ValidationError;
use crate::store::{StoreError, StoreResult, TaskListQuery, TaskStore};
use async_trait::async_trait;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    status,
    is_project,
    parent_id,
    waiting_for,
    context,
    due_date,
    created_at,
    updated_at
FROM tasks";

const COMMENT_SELECT_SQL: &str = "SELECT
    id,
    task_id,
    content,
    created_at
FROM comments";

/// SQLite task store sharing one connection across async callers.
#[derive(Clone)]
pub struct SqliteTaskStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTaskStore {
    /// Wraps a migrated connection (see `db::open_db`).
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    pub fn try_new(conn: Connection) -> StoreResult<Self> {
        ensure_connection_ready(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn run<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| {
                StoreError::Unavailable("sqlite connection lock poisoned".to_string())
            })?;
            op(&mut guard)
        })
        .await
        .map_err(|err| StoreError::Unavailable(format!("sqlite worker failed: {err}")))?
    }
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    async fn insert_task(&self, task: &Task) -> StoreResult<()> {
        let task = task.clone();
        self.run(move |conn| insert_task_row(conn, &task)).await
    }

    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> StoreResult<Task> {
        let id = id.clone();
        let patch = patch.clone();
        self.run(move |conn| {
            let tx = conn.transaction()?;
            let mut task =
                load_task(&tx, &id)?.ok_or_else(|| StoreError::TaskNotFound(id.clone()))?;
            patch.apply_to(&mut task);
            task.validate()?;
            ensure_parent_is_project(&tx, &task)?;

            tx.execute(
                "UPDATE tasks
                 SET
                    status = ?1,
                    is_project = ?2,
                    parent_id = ?3,
                    waiting_for = ?4,
                    context = ?5,
                    updated_at = ?6
                 WHERE id = ?7;",
                params![
                    task.status.as_str(),
                    bool_to_int(task.is_project),
                    task.parent_id.as_ref().map(TaskId::as_str),
                    task.waiting_for.as_deref(),
                    task.context.as_deref(),
                    task.updated_at,
                    task.id.as_str(),
                ],
            )?;
            tx.commit()?;
            Ok(task)
        })
        .await
    }

    async fn delete_task(&self, id: &TaskId) -> StoreResult<()> {
        let id = id.clone();
        self.run(move |conn| {
            ensure_no_children(conn, &id)?;
            if count_rows(conn, "SELECT COUNT(*) FROM comments WHERE task_id = ?1;", &id)? > 0 {
                return Err(StoreError::Conflict(format!("task {id} still has comments")));
            }
            let changed = conn.execute("DELETE FROM tasks WHERE id = ?1;", [id.as_str()])?;
            if changed == 0 {
                return Err(StoreError::TaskNotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn get_task(&self, id: &TaskId) -> StoreResult<Option<Task>> {
        let id = id.clone();
        self.run(move |conn| load_task(conn, &id)).await
    }

    async fn list_tasks(&self, query: &TaskListQuery) -> StoreResult<Vec<Task>> {
        let query = query.clone();
        self.run(move |conn| {
            let mut sql = format!("{TASK_SELECT_SQL} WHERE 1 = 1");
            let mut bind_values: Vec<Value> = Vec::new();

            if let Some(status) = query.status {
                sql.push_str(" AND status = ?");
                bind_values.push(Value::Text(status.as_str().to_string()));
            }
            if let Some(is_project) = query.is_project {
                sql.push_str(" AND is_project = ?");
                bind_values.push(Value::Integer(bool_to_int(is_project)));
            }
            if let Some(parent_id) = &query.parent_id {
                sql.push_str(" AND parent_id = ?");
                bind_values.push(Value::Text(parent_id.as_str().to_string()));
            }
            if let Some(context) = &query.context {
                sql.push_str(" AND context = ?");
                bind_values.push(Value::Text(context.clone()));
            }

            sql.push_str(" ORDER BY created_at ASC, id ASC");

            if let Some(limit) = query.limit {
                sql.push_str(" LIMIT ?");
                bind_values.push(Value::Integer(i64::from(limit)));
            }

            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params_from_iter(bind_values))?;
            let mut tasks = Vec::new();
            while let Some(row) = rows.next()? {
                tasks.push(parse_task_row(row)?);
            }
            Ok(tasks)
        })
        .await
    }

    async fn delete_task_with_comments(&self, id: &TaskId) -> StoreResult<()> {
        let id = id.clone();
        self.run(move |conn| {
            let tx = conn.transaction()?;
            if load_task(&tx, &id)?.is_none() {
                return Err(StoreError::TaskNotFound(id));
            }
            ensure_no_children(&tx, &id)?;

            tx.execute("DELETE FROM comments WHERE task_id = ?1;", [id.as_str()])?;
            tx.execute("DELETE FROM tasks WHERE id = ?1;", [id.as_str()])?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn restore_task_with_comments(
        &self,
        task: &Task,
        comments: &[Comment],
    ) -> StoreResult<()> {
        let task = task.clone();
        let comments = comments.to_vec();
        self.run(move |conn| {
            if let Some(stray) = comments.iter().find(|comment| comment.task_id != task.id) {
                return Err(StoreError::InvalidData(format!(
                    "comment {} belongs to task {}, not {}",
                    stray.id, stray.task_id, task.id
                )));
            }

            let tx = conn.transaction()?;
            insert_task_row(&tx, &task)?;
            for comment in &comments {
                insert_comment_row(&tx, comment)?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn insert_comment(&self, comment: &Comment) -> StoreResult<()> {
        let comment = comment.clone();
        self.run(move |conn| insert_comment_row(conn, &comment)).await
    }

    async fn get_comment(&self, id: &CommentId) -> StoreResult<Option<Comment>> {
        let id = id.clone();
        self.run(move |conn| {
            let comment = conn
                .query_row(
                    &format!("{COMMENT_SELECT_SQL} WHERE id = ?1;"),
                    [id.as_str()],
                    |row| Ok(parse_comment_row(row)),
                )
                .optional()?;
            comment.transpose()
        })
        .await
    }

    async fn list_comments(&self, task_id: &TaskId) -> StoreResult<Vec<Comment>> {
        let task_id = task_id.clone();
        self.run(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{COMMENT_SELECT_SQL}
                 WHERE task_id = ?1
                 ORDER BY created_at ASC, id ASC;"
            ))?;
            let mut rows = stmt.query([task_id.as_str()])?;
            let mut comments = Vec::new();
            while let Some(row) = rows.next()? {
                comments.push(parse_comment_row(row)?);
            }
            Ok(comments)
        })
        .await
    }

    async fn delete_comment(&self, id: &CommentId) -> StoreResult<()> {
        let id = id.clone();
        self.run(move |conn| {
            let changed = conn.execute("DELETE FROM comments WHERE id = ?1;", [id.as_str()])?;
            if changed == 0 {
                return Err(StoreError::CommentNotFound(id));
            }
            Ok(())
        })
        .await
    }
}

fn ensure_connection_ready(conn: &Connection) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

fn count_rows(conn: &Connection, sql: &str, id: &TaskId) -> StoreResult<i64> {
    let count = conn.query_row(sql, [id.as_str()], |row| row.get(0))?;
    Ok(count)
}

fn ensure_no_children(conn: &Connection, id: &TaskId) -> StoreResult<()> {
    if count_rows(conn, "SELECT COUNT(*) FROM tasks WHERE parent_id = ?1;", id)? > 0 {
        return Err(StoreError::Conflict(format!("task {id} still has child tasks")));
    }
    Ok(())
}

fn load_task(conn: &Connection, id: &TaskId) -> StoreResult<Option<Task>> {
    let task = conn
        .query_row(
            &format!("{TASK_SELECT_SQL} WHERE id = ?1;"),
            [id.as_str()],
            |row| Ok(parse_task_row(row)),
        )
        .optional()?;
    task.transpose()
}

fn insert_task_row(conn: &Connection, task: &Task) -> StoreResult<()> {
    task.validate()?;
    if load_task(conn, &task.id)?.is_some() {
        return Err(ValidationError::DuplicateTaskId(task.id.clone()).into());
    }
    ensure_parent_is_project(conn, task)?;

    conn.execute(
        "INSERT INTO tasks (
            id,
            title,
            description,
            status,
            is_project,
            parent_id,
            waiting_for,
            context,
            due_date,
            created_at,
            updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
        params![
            task.id.as_str(),
            task.title.as_str(),
            task.description.as_deref(),
            task.status.as_str(),
            bool_to_int(task.is_project),
            task.parent_id.as_ref().map(TaskId::as_str),
            task.waiting_for.as_deref(),
            task.context.as_deref(),
            task.due_date,
            task.created_at,
            task.updated_at,
        ],
    )?;
    Ok(())
}

fn insert_comment_row(conn: &Connection, comment: &Comment) -> StoreResult<()> {
    comment.validate()?;
    if load_task(conn, &comment.task_id)?.is_none() {
        return Err(StoreError::TaskNotFound(comment.task_id.clone()));
    }

    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM comments WHERE id = ?1);",
        [comment.id.as_str()],
        |row| row.get(0),
    )?;
    if exists == 1 {
        return Err(ValidationError::DuplicateCommentId(comment.id.clone()).into());
    }

    conn.execute(
        "INSERT INTO comments (id, task_id, content, created_at) VALUES (?1, ?2, ?3, ?4);",
        params![
            comment.id.as_str(),
            comment.task_id.as_str(),
            comment.content.as_str(),
            comment.created_at,
        ],
    )?;
    Ok(())
}

fn ensure_parent_is_project(conn: &Connection, task: &Task) -> StoreResult<()> {
    let Some(parent_id) = &task.parent_id else {
        return Ok(());
    };
    match load_task(conn, parent_id)? {
        Some(parent) if parent.is_project => Ok(()),
        Some(_) => Err(ValidationError::NotAProject(parent_id.clone()).into()),
        None => Err(StoreError::TaskNotFound(parent_id.clone())),
    }
}

fn parse_task_row(row: &Row<'_>) -> StoreResult<Task> {
    let status_text: String = row.get("status")?;
    let status = TaskStatus::parse(&status_text).ok_or_else(|| {
        StoreError::InvalidData(format!("invalid task status `{status_text}` in tasks.status"))
    })?;

    let is_project = match row.get::<_, i64>("is_project")? {
        0 => false,
        1 => true,
        other => {
            return Err(StoreError::InvalidData(format!(
                "invalid is_project value `{other}` in tasks.is_project"
            )));
        }
    };

    let task = Task {
        id: TaskId::from(row.get::<_, String>("id")?),
        title: row.get("title")?,
        description: row.get("description")?,
        status,
        is_project,
        parent_id: row.get::<_, Option<String>>("parent_id")?.map(TaskId::from),
        waiting_for: row.get("waiting_for")?,
        context: row.get("context")?,
        due_date: row.get("due_date")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    task.validate().map_err(|err| {
        StoreError::InvalidData(format!("task {} violates invariant: {err}", task.id))
    })?;
    Ok(task)
}

fn parse_comment_row(row: &Row<'_>) -> StoreResult<Comment> {
    let comment = Comment {
        id: CommentId::from(row.get::<_, String>("id")?),
        task_id: TaskId::from(row.get::<_, String>("task_id")?),
        content: row.get("content")?,
        created_at: row.get("created_at")?,
    };
    comment.validate().map_err(|err| {
        StoreError::InvalidData(format!("comment {} violates invariant: {err}", comment.id))
    })?;
    Ok(comment)
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
