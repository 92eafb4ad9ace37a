/// Project membership model and database operations
///
/// A membership row links a user to a project with a free-form role.
/// Rows are removed automatically when their project is deleted.
///
/// The pair (project_id, user_id) is deliberately not unique: adding the same
/// user twice creates two rows, and removing that user removes both.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE project_members (
///     id SERIAL PRIMARY KEY,
///     project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id INTEGER NOT NULL,
///     role VARCHAR(50) NOT NULL DEFAULT 'member',
///     joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::StoreResult;

pub(crate) const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS project_members (
        id SERIAL PRIMARY KEY,
        project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        user_id INTEGER NOT NULL,
        role VARCHAR(50) NOT NULL DEFAULT 'member',
        joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
"#;

const COLUMNS: &str = "id, project_id, user_id, role, joined_at";

/// Membership row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectMember {
    pub id: i32,
    pub project_id: i32,
    pub user_id: i32,

    /// Free-form role label, "member" unless specified
    pub role: String,

    pub joined_at: DateTime<Utc>,
}

/// Input for adding a member
#[derive(Debug, Clone, Default)]
pub struct NewMember {
    pub project_id: i32,
    pub user_id: i32,

    /// Defaults to [`ProjectMember::DEFAULT_ROLE`]
    pub role: Option<String>,
}

impl ProjectMember {
    pub const DEFAULT_ROLE: &'static str = "member";

    /// Adds a user to a project
    ///
    /// # Errors
    ///
    /// `StoreError::ConstraintViolation` if the project doesn't exist.
    pub async fn add(pool: &PgPool, data: NewMember) -> StoreResult<Self> {
        let member = sqlx::query_as::<_, ProjectMember>(&format!(
            r#"
            INSERT INTO project_members (project_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(data.project_id)
        .bind(data.user_id)
        .bind(data.role.unwrap_or_else(|| Self::DEFAULT_ROLE.to_string()))
        .fetch_one(pool)
        .await?;

        Ok(member)
    }

    /// Lists the members of a project, earliest joined first
    pub async fn list_by_project(pool: &PgPool, project_id: i32) -> StoreResult<Vec<Self>> {
        let members = sqlx::query_as::<_, ProjectMember>(&format!(
            "SELECT {COLUMNS} FROM project_members WHERE project_id = $1 ORDER BY joined_at ASC, id ASC"
        ))
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(members)
    }

    /// Removes a user from a project
    ///
    /// Returns every removed row; an empty list means the user was not a
    /// member.
    pub async fn remove(pool: &PgPool, project_id: i32, user_id: i32) -> StoreResult<Vec<Self>> {
        let removed = sqlx::query_as::<_, ProjectMember>(&format!(
            "DELETE FROM project_members WHERE project_id = $1 AND user_id = $2 RETURNING {COLUMNS}"
        ))
        .bind(project_id)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_member_default_role() {
        let data = NewMember {
            project_id: 1,
            user_id: 2,
            ..Default::default()
        };
        assert!(data.role.is_none());
        assert_eq!(ProjectMember::DEFAULT_ROLE, "member");
    }
}
