/// Task comment model and database operations
///
/// Comments are append-only: they can be added, listed oldest first, and
/// deleted, never edited. Deleting the parent task removes its comments.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE task_comments (
///     id SERIAL PRIMARY KEY,
///     task_id INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     user_id INTEGER NOT NULL,
///     comment TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::StoreResult;

pub(crate) const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS task_comments (
        id SERIAL PRIMARY KEY,
        task_id INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
        user_id INTEGER NOT NULL,
        comment TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
"#;

const COLUMNS: &str = "id, task_id, user_id, comment, created_at";

/// Comment row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskComment {
    pub id: i32,
    pub task_id: i32,

    /// Author (raw identifier, not enforced)
    pub user_id: i32,

    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl TaskComment {
    /// Adds a comment to a task
    ///
    /// # Errors
    ///
    /// `StoreError::ConstraintViolation` if the task doesn't exist.
    pub async fn add(pool: &PgPool, task_id: i32, user_id: i32, comment: &str) -> StoreResult<Self> {
        let comment = sqlx::query_as::<_, TaskComment>(&format!(
            r#"
            INSERT INTO task_comments (task_id, user_id, comment)
            VALUES ($1, $2, $3)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(task_id)
        .bind(user_id)
        .bind(comment)
        .fetch_one(pool)
        .await?;

        Ok(comment)
    }

    /// Lists the comments of a task, oldest first
    pub async fn list_by_task(pool: &PgPool, task_id: i32) -> StoreResult<Vec<Self>> {
        let comments = sqlx::query_as::<_, TaskComment>(&format!(
            "SELECT {COLUMNS} FROM task_comments WHERE task_id = $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(task_id)
        .fetch_all(pool)
        .await?;

        Ok(comments)
    }

    /// Deletes a comment, returning the removed row
    pub async fn delete(pool: &PgPool, id: i32) -> StoreResult<Option<Self>> {
        let comment = sqlx::query_as::<_, TaskComment>(&format!(
            "DELETE FROM task_comments WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(comment)
    }
}
