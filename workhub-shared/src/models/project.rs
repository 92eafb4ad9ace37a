/// Project model and database operations
///
/// Projects are owned by a user (`owner_id`, not enforced) and may have any
/// number of members (see [`crate::models::project_member`]). Deleting a
/// project cascades to its member rows.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id SERIAL PRIMARY KEY,
///     name VARCHAR(200) NOT NULL,
///     description TEXT,
///     owner_id INTEGER NOT NULL,
///     status VARCHAR(50) NOT NULL DEFAULT 'active',
///     start_date DATE,
///     end_date DATE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use workhub_shared::models::project::{Project, ProjectChanges};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let changes = ProjectChanges {
///     status: Some("archived".to_string()),
///     ..Default::default()
/// };
///
/// if let Some(project) = Project::update(&pool, 1, changes).await? {
///     println!("{} is now {}", project.name, project.status);
/// }
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::StoreResult;

pub(crate) const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS projects (
        id SERIAL PRIMARY KEY,
        name VARCHAR(200) NOT NULL,
        description TEXT,
        owner_id INTEGER NOT NULL,
        status VARCHAR(50) NOT NULL DEFAULT 'active',
        start_date DATE,
        end_date DATE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
"#;

const COLUMNS: &str =
    "id, name, description, owner_id, status, start_date, end_date, created_at, updated_at";

/// Project row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,

    /// Owning user (raw identifier, not enforced)
    pub owner_id: i32,

    /// Free-form status label, "active" unless specified
    pub status: String,

    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A project seen through one of its memberships
///
/// Serializes as the project's fields plus `member_role`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MemberProject {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub project: Project,

    /// Role of the queried user in this project
    pub member_role: String,
}

/// Input for creating a project
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub owner_id: i32,

    /// Defaults to [`Project::DEFAULT_STATUS`]
    pub status: Option<String>,

    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Sparse project update; `None` fields are left unchanged
///
/// `owner_id` cannot be changed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Project {
    pub const DEFAULT_STATUS: &'static str = "active";

    /// Creates a new project
    pub async fn create(pool: &PgPool, data: NewProject) -> StoreResult<Self> {
        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            INSERT INTO projects (name, description, owner_id, status, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(data.name)
        .bind(data.description)
        .bind(data.owner_id)
        .bind(data.status.unwrap_or_else(|| Self::DEFAULT_STATUS.to_string()))
        .bind(data.start_date)
        .bind(data.end_date)
        .fetch_one(pool)
        .await?;

        Ok(project)
    }

    /// Finds a project by ID
    pub async fn find_by_id(pool: &PgPool, id: i32) -> StoreResult<Option<Self>> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Lists all projects, newest first
    pub async fn list(pool: &PgPool) -> StoreResult<Vec<Self>> {
        let projects = sqlx::query_as::<_, Project>(&format!(
            "SELECT {COLUMNS} FROM projects ORDER BY created_at DESC"
        ))
        .fetch_all(pool)
        .await?;

        Ok(projects)
    }

    /// Lists projects owned by a user, newest first
    pub async fn list_by_owner(pool: &PgPool, owner_id: i32) -> StoreResult<Vec<Self>> {
        let projects = sqlx::query_as::<_, Project>(&format!(
            "SELECT {COLUMNS} FROM projects WHERE owner_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(pool)
        .await?;

        Ok(projects)
    }

    /// Lists the projects a user is a member of, newest first
    ///
    /// One row per membership row: if the same user was added twice to a
    /// project, that project appears twice, each with its own role.
    pub async fn list_by_member(pool: &PgPool, user_id: i32) -> StoreResult<Vec<MemberProject>> {
        let projects = sqlx::query_as::<_, MemberProject>(
            r#"
            SELECT p.id, p.name, p.description, p.owner_id, p.status,
                   p.start_date, p.end_date, p.created_at, p.updated_at,
                   pm.role AS member_role
            FROM projects p
            INNER JOIN project_members pm ON p.id = pm.project_id
            WHERE pm.user_id = $1
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(projects)
    }

    /// Applies `changes` to a project
    ///
    /// `updated_at` is refreshed even when `changes` is empty.
    pub async fn update(
        pool: &PgPool,
        id: i32,
        changes: ProjectChanges,
    ) -> StoreResult<Option<Self>> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE projects SET updated_at = NOW()");

        if let Some(name) = changes.name {
            query.push(", name = ").push_bind(name);
        }
        if let Some(description) = changes.description {
            query.push(", description = ").push_bind(description);
        }
        if let Some(status) = changes.status {
            query.push(", status = ").push_bind(status);
        }
        if let Some(start_date) = changes.start_date {
            query.push(", start_date = ").push_bind(start_date);
        }
        if let Some(end_date) = changes.end_date {
            query.push(", end_date = ").push_bind(end_date);
        }

        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(COLUMNS);

        let project = query
            .build_query_as::<Project>()
            .fetch_optional(pool)
            .await?;

        Ok(project)
    }

    /// Deletes a project and, through the cascade, its members
    ///
    /// Returns the removed row, or `None` if it didn't exist.
    pub async fn delete(pool: &PgPool, id: i32) -> StoreResult<Option<Self>> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "DELETE FROM projects WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Project {
        Project {
            id: 3,
            name: "Launch".to_string(),
            description: None,
            owner_id: 1,
            status: Project::DEFAULT_STATUS.to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 15),
            end_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_member_project_serializes_flat() {
        let row = MemberProject {
            project: sample(),
            member_role: "lead".to_string(),
        };

        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["name"], "Launch");
        assert_eq!(json["member_role"], "lead");
        assert_eq!(json["start_date"], "2024-01-15");
        assert!(json.get("project").is_none());
    }

    #[test]
    fn test_changes_parse_dates() {
        let changes: ProjectChanges =
            serde_json::from_value(serde_json::json!({ "end_date": "2024-12-31" })).unwrap();

        assert_eq!(changes.end_date, NaiveDate::from_ymd_opt(2024, 12, 31));
        assert!(changes.name.is_none());
        assert!(changes.start_date.is_none());
    }
}
