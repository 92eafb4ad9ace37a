/// User profile model and database operations
///
/// A profile extends a user account with descriptive fields. There is at
/// most one profile per user (`user_id` is UNIQUE), and every operation after
/// creation is keyed by `user_id` rather than by the profile's own id.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE user_profiles (
///     id SERIAL PRIMARY KEY,
///     user_id INTEGER UNIQUE NOT NULL,
///     bio TEXT,
///     avatar_url VARCHAR(255),
///     phone VARCHAR(20),
///     location VARCHAR(100),
///     role VARCHAR(50) NOT NULL DEFAULT 'user',
///     department VARCHAR(100),
///     skills TEXT[] NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::StoreResult;

pub(crate) const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS user_profiles (
        id SERIAL PRIMARY KEY,
        user_id INTEGER UNIQUE NOT NULL,
        bio TEXT,
        avatar_url VARCHAR(255),
        phone VARCHAR(20),
        location VARCHAR(100),
        role VARCHAR(50) NOT NULL DEFAULT 'user',
        department VARCHAR(100),
        skills TEXT[] NOT NULL DEFAULT '{}',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
"#;

const COLUMNS: &str = "id, user_id, bio, avatar_url, phone, location, role, department, \
                       skills, created_at, updated_at";

/// Profile row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserProfile {
    pub id: i32,

    /// Owning user (raw identifier, not enforced)
    pub user_id: i32,

    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,

    /// Free-form role label, "user" unless specified
    pub role: String,

    pub department: Option<String>,

    /// Ordered list of skill labels
    pub skills: Vec<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a profile
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewProfile {
    pub user_id: i32,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,

    /// Defaults to [`UserProfile::DEFAULT_ROLE`]
    pub role: Option<String>,

    pub department: Option<String>,

    /// Defaults to an empty list
    pub skills: Option<Vec<String>>,
}

/// Sparse profile update; `None` fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileChanges {
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub role: Option<String>,
    pub department: Option<String>,
    pub skills: Option<Vec<String>>,
}

impl UserProfile {
    pub const DEFAULT_ROLE: &'static str = "user";

    /// Creates the profile of `data.user_id`
    ///
    /// # Errors
    ///
    /// `StoreError::ConstraintViolation` if the user already has a profile.
    pub async fn create(pool: &PgPool, data: NewProfile) -> StoreResult<Self> {
        let profile = sqlx::query_as::<_, UserProfile>(&format!(
            r#"
            INSERT INTO user_profiles
                (user_id, bio, avatar_url, phone, location, role, department, skills)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(data.user_id)
        .bind(data.bio)
        .bind(data.avatar_url)
        .bind(data.phone)
        .bind(data.location)
        .bind(data.role.unwrap_or_else(|| Self::DEFAULT_ROLE.to_string()))
        .bind(data.department)
        .bind(data.skills.unwrap_or_default())
        .fetch_one(pool)
        .await?;

        Ok(profile)
    }

    /// Finds the profile of a user
    pub async fn find_by_user_id(pool: &PgPool, user_id: i32) -> StoreResult<Option<Self>> {
        let profile = sqlx::query_as::<_, UserProfile>(&format!(
            "SELECT {COLUMNS} FROM user_profiles WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(profile)
    }

    /// Lists all profiles, newest first
    pub async fn list(pool: &PgPool) -> StoreResult<Vec<Self>> {
        let profiles = sqlx::query_as::<_, UserProfile>(&format!(
            "SELECT {COLUMNS} FROM user_profiles ORDER BY created_at DESC"
        ))
        .fetch_all(pool)
        .await?;

        Ok(profiles)
    }

    /// Lists profiles with the given role, newest first
    pub async fn list_by_role(pool: &PgPool, role: &str) -> StoreResult<Vec<Self>> {
        let profiles = sqlx::query_as::<_, UserProfile>(&format!(
            "SELECT {COLUMNS} FROM user_profiles WHERE role = $1 ORDER BY created_at DESC"
        ))
        .bind(role)
        .fetch_all(pool)
        .await?;

        Ok(profiles)
    }

    /// Applies `changes` to the profile of a user
    ///
    /// `updated_at` is refreshed even when `changes` is empty.
    pub async fn update(
        pool: &PgPool,
        user_id: i32,
        changes: ProfileChanges,
    ) -> StoreResult<Option<Self>> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE user_profiles SET updated_at = NOW()");

        if let Some(bio) = changes.bio {
            query.push(", bio = ").push_bind(bio);
        }
        if let Some(avatar_url) = changes.avatar_url {
            query.push(", avatar_url = ").push_bind(avatar_url);
        }
        if let Some(phone) = changes.phone {
            query.push(", phone = ").push_bind(phone);
        }
        if let Some(location) = changes.location {
            query.push(", location = ").push_bind(location);
        }
        if let Some(role) = changes.role {
            query.push(", role = ").push_bind(role);
        }
        if let Some(department) = changes.department {
            query.push(", department = ").push_bind(department);
        }
        if let Some(skills) = changes.skills {
            query.push(", skills = ").push_bind(skills);
        }

        query
            .push(" WHERE user_id = ")
            .push_bind(user_id)
            .push(" RETURNING ")
            .push(COLUMNS);

        let profile = query
            .build_query_as::<UserProfile>()
            .fetch_optional(pool)
            .await?;

        Ok(profile)
    }

    /// Deletes the profile of a user, returning the removed row
    pub async fn delete(pool: &PgPool, user_id: i32) -> StoreResult<Option<Self>> {
        let profile = sqlx::query_as::<_, UserProfile>(&format!(
            "DELETE FROM user_profiles WHERE user_id = $1 RETURNING {COLUMNS}"
        ))
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changes_default_is_empty() {
        let changes = ProfileChanges::default();
        assert!(changes.bio.is_none());
        assert!(changes.role.is_none());
        assert!(changes.skills.is_none());
    }

    #[test]
    fn test_changes_from_partial_json() {
        let changes: ProfileChanges =
            serde_json::from_value(serde_json::json!({ "phone": "555-0100", "skills": ["rust"] }))
                .unwrap();

        assert_eq!(changes.phone.as_deref(), Some("555-0100"));
        assert_eq!(changes.skills, Some(vec!["rust".to_string()]));
        assert!(changes.bio.is_none());
        assert!(changes.department.is_none());
    }
}
