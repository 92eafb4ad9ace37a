/// User model and database operations
///
/// Users are created on registration, never deleted, and only their password
/// may change afterwards.
///
/// Two projections exist on purpose:
///
/// - [`User`] carries the password hash. It is returned only by the lookups
///   used to verify credentials (`find_by_email`, `find_with_password`).
/// - [`PublicUser`] omits it. Listing, by-id lookups and writes return this.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id SERIAL PRIMARY KEY,
///     name VARCHAR(100) NOT NULL,
///     email VARCHAR(120) UNIQUE NOT NULL,
///     password VARCHAR(200) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use workhub_shared::models::user::{NewUser, User};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let user = User::create(&pool, NewUser {
///     name: "Ada".to_string(),
///     email: "ada@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
///
/// let with_hash = User::find_by_email(&pool, "ada@example.com").await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::StoreResult;

pub(crate) const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id SERIAL PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        email VARCHAR(120) UNIQUE NOT NULL,
        password VARCHAR(200) NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
"#;

/// Full user row, including the password hash
///
/// Only used for credential verification. The hash is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i32,

    pub name: String,

    /// Unique across all users
    pub email: String,

    /// Argon2id hash in PHC string format
    #[serde(skip_serializing)]
    pub password: String,

    pub created_at: DateTime<Utc>,
}

/// User row without the password hash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PublicUser {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// Input for registering a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,

    /// Already-hashed password (NOT plaintext)
    pub password_hash: String,
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// `StoreError::ConstraintViolation` if the email is already registered.
    pub async fn create(pool: &PgPool, data: NewUser) -> StoreResult<PublicUser> {
        let user = sqlx::query_as::<_, PublicUser>(
            r#"
            INSERT INTO users (name, email, password)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, created_at
            "#,
        )
        .bind(data.name)
        .bind(data.email)
        .bind(data.password_hash)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email, including the password hash
    pub async fn find_by_email(pool: &PgPool, email: &str) -> StoreResult<Option<Self>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID, including the password hash
    ///
    /// Used by the authenticated user acting on their own account, where the
    /// current password has to be checked.
    pub async fn find_with_password(pool: &PgPool, id: i32) -> StoreResult<Option<Self>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID, without the password hash
    pub async fn find_by_id(pool: &PgPool, id: i32) -> StoreResult<Option<PublicUser>> {
        let user = sqlx::query_as::<_, PublicUser>(
            r#"
            SELECT id, name, email, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Lists all users without password hashes, newest first
    pub async fn list(pool: &PgPool) -> StoreResult<Vec<PublicUser>> {
        let users = sqlx::query_as::<_, PublicUser>(
            r#"
            SELECT id, name, email, created_at
            FROM users
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Replaces the password hash
    ///
    /// Returns `None` if no user has this ID.
    pub async fn update_password(
        pool: &PgPool,
        id: i32,
        password_hash: &str,
    ) -> StoreResult<Option<PublicUser>> {
        let user = sqlx::query_as::<_, PublicUser>(
            r#"
            UPDATE users
            SET password = $2
            WHERE id = $1
            RETURNING id, name, email, created_at
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> User {
        User {
            id: 7,
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "$argon2id$v=19$secret".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_password_is_never_serialized() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["email"], "ada@example.com");
    }

    #[test]
    fn test_public_projection_drops_hash() {
        let user = sample();
        let created_at = user.created_at;
        let public = PublicUser::from(user);

        assert_eq!(public.id, 7);
        assert_eq!(public.name, "Ada");
        assert_eq!(public.created_at, created_at);

        let json = serde_json::to_value(&public).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 4);
    }
}
