/// Task model and database operations
///
/// Tasks belong to a project and may be assigned to a user. Both references
/// are raw identifiers. Deleting a task cascades to its comments.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id SERIAL PRIMARY KEY,
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     project_id INTEGER NOT NULL,
///     assigned_to INTEGER,
///     created_by INTEGER NOT NULL,
///     status VARCHAR(50) NOT NULL DEFAULT 'todo',
///     priority VARCHAR(50) NOT NULL DEFAULT 'medium',
///     due_date DATE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use workhub_shared::models::task::{NewTask, Task};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let task = Task::create(&pool, NewTask {
///     title: "Design".to_string(),
///     project_id: 1,
///     created_by: 1,
///     ..Default::default()
/// }).await?;
///
/// assert_eq!(task.status, "todo");
/// assert_eq!(task.priority, "medium");
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::StoreResult;

pub(crate) const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS tasks (
        id SERIAL PRIMARY KEY,
        title VARCHAR(255) NOT NULL,
        description TEXT,
        project_id INTEGER NOT NULL,
        assigned_to INTEGER,
        created_by INTEGER NOT NULL,
        status VARCHAR(50) NOT NULL DEFAULT 'todo',
        priority VARCHAR(50) NOT NULL DEFAULT 'medium',
        due_date DATE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
"#;

const COLUMNS: &str = "id, title, description, project_id, assigned_to, created_by, status, \
                       priority, due_date, created_at, updated_at";

/// Task row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub project_id: i32,

    /// Assignee, if any
    pub assigned_to: Option<i32>,

    pub created_by: i32,

    /// Free-form status label, "todo" unless specified
    pub status: String,

    /// Free-form priority label, "medium" unless specified
    pub priority: String,

    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub project_id: i32,
    pub assigned_to: Option<i32>,
    pub created_by: i32,

    /// Defaults to [`Task::DEFAULT_STATUS`]
    pub status: Option<String>,

    /// Defaults to [`Task::DEFAULT_PRIORITY`]
    pub priority: Option<String>,

    pub due_date: Option<NaiveDate>,
}

/// Sparse task update; `None` fields are left unchanged
///
/// `project_id` and `created_by` cannot be changed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<i32>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<NaiveDate>,
}

impl Task {
    pub const DEFAULT_STATUS: &'static str = "todo";
    pub const DEFAULT_PRIORITY: &'static str = "medium";

    /// Creates a new task
    pub async fn create(pool: &PgPool, data: NewTask) -> StoreResult<Self> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks
                (title, description, project_id, assigned_to, created_by, status, priority, due_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(data.title)
        .bind(data.description)
        .bind(data.project_id)
        .bind(data.assigned_to)
        .bind(data.created_by)
        .bind(data.status.unwrap_or_else(|| Self::DEFAULT_STATUS.to_string()))
        .bind(data.priority.unwrap_or_else(|| Self::DEFAULT_PRIORITY.to_string()))
        .bind(data.due_date)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: i32) -> StoreResult<Option<Self>> {
        let task = sqlx::query_as::<_, Task>(&format!("SELECT {COLUMNS} FROM tasks WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(task)
    }

    /// Lists all tasks, newest first
    pub async fn list(pool: &PgPool) -> StoreResult<Vec<Self>> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {COLUMNS} FROM tasks ORDER BY created_at DESC"
        ))
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Lists the tasks of a project, newest first
    pub async fn list_by_project(pool: &PgPool, project_id: i32) -> StoreResult<Vec<Self>> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {COLUMNS} FROM tasks WHERE project_id = $1 ORDER BY created_at DESC"
        ))
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Lists the tasks assigned to a user, soonest due date first
    ///
    /// Tasks without a due date come last.
    pub async fn list_by_assignee(pool: &PgPool, user_id: i32) -> StoreResult<Vec<Self>> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {COLUMNS} FROM tasks WHERE assigned_to = $1 ORDER BY due_date ASC NULLS LAST"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Lists the tasks with a given status, newest first
    pub async fn list_by_status(pool: &PgPool, status: &str) -> StoreResult<Vec<Self>> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {COLUMNS} FROM tasks WHERE status = $1 ORDER BY created_at DESC"
        ))
        .bind(status)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Applies `changes` to a task
    ///
    /// `updated_at` is refreshed even when `changes` is empty.
    pub async fn update(pool: &PgPool, id: i32, changes: TaskChanges) -> StoreResult<Option<Self>> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE tasks SET updated_at = NOW()");

        if let Some(title) = changes.title {
            query.push(", title = ").push_bind(title);
        }
        if let Some(description) = changes.description {
            query.push(", description = ").push_bind(description);
        }
        if let Some(assigned_to) = changes.assigned_to {
            query.push(", assigned_to = ").push_bind(assigned_to);
        }
        if let Some(status) = changes.status {
            query.push(", status = ").push_bind(status);
        }
        if let Some(priority) = changes.priority {
            query.push(", priority = ").push_bind(priority);
        }
        if let Some(due_date) = changes.due_date {
            query.push(", due_date = ").push_bind(due_date);
        }

        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(COLUMNS);

        let task = query.build_query_as::<Task>().fetch_optional(pool).await?;

        Ok(task)
    }

    /// Deletes a task and, through the cascade, its comments
    ///
    /// Returns the removed row, or `None` if it didn't exist.
    pub async fn delete(pool: &PgPool, id: i32) -> StoreResult<Option<Self>> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "DELETE FROM tasks WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(Task::DEFAULT_STATUS, "todo");
        assert_eq!(Task::DEFAULT_PRIORITY, "medium");
    }

    #[test]
    fn test_new_task_from_json() {
        let data: NewTask = serde_json::from_value(serde_json::json!({
            "title": "Design",
            "project_id": 4,
            "created_by": 1,
            "due_date": "2024-03-01"
        }))
        .unwrap();

        assert_eq!(data.title, "Design");
        assert_eq!(data.project_id, 4);
        assert!(data.assigned_to.is_none());
        assert!(data.status.is_none());
        assert_eq!(data.due_date, NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    #[test]
    fn test_empty_changes() {
        let changes: TaskChanges = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(changes.title.is_none());
        assert!(changes.assigned_to.is_none());
        assert!(changes.due_date.is_none());
    }
}
