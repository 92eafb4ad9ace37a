/// Schema bootstrap
///
/// Each service owns a subset of the tables and creates them at startup with
/// `CREATE TABLE IF NOT EXISTS`, so running the bootstrap repeatedly is a
/// no-op. Parent tables are created before the children that reference them.
///
/// # Example
///
/// ```no_run
/// use workhub_shared::db::schema::{ensure_schema, TableSet};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) {
/// if let Err(e) = ensure_schema(&pool, TableSet::Tasks).await {
///     tracing::error!(error = %e, "Failed to initialize database");
/// }
/// # }
/// ```

use sqlx::{migrate::MigrateDatabase, postgres::PgPool, Postgres};
use tracing::{debug, info, warn};

use crate::models::{project, project_member, task, task_comment, user, user_profile};

/// Group of tables owned by one service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSet {
    /// `users`
    Users,

    /// `user_profiles`
    Profiles,

    /// `projects` and `project_members`
    Projects,

    /// `tasks` and `task_comments`
    Tasks,
}

impl TableSet {
    /// DDL statements for this set, parents first
    pub fn statements(&self) -> &'static [&'static str] {
        match self {
            TableSet::Users => &[user::SCHEMA],
            TableSet::Profiles => &[user_profile::SCHEMA],
            TableSet::Projects => &[project::SCHEMA, project_member::SCHEMA],
            TableSet::Tasks => &[task::SCHEMA, task_comment::SCHEMA],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TableSet::Users => "users",
            TableSet::Profiles => "user_profiles",
            TableSet::Projects => "projects",
            TableSet::Tasks => "tasks",
        }
    }
}

/// Creates the tables of `set` if they do not exist yet
///
/// Statements run one after another outside of a transaction; the first
/// failure is returned and the remaining statements are skipped.
pub async fn ensure_schema(pool: &PgPool, set: TableSet) -> Result<(), sqlx::Error> {
    info!(tables = set.as_str(), "Ensuring database schema");

    for statement in set.statements() {
        if let Err(e) = sqlx::query(statement).execute(pool).await {
            warn!(tables = set.as_str(), error = %e, "Schema statement failed");
            return Err(e);
        }
    }

    info!(tables = set.as_str(), "Database schema ready");
    Ok(())
}

/// Creates the database if it doesn't exist
///
/// This is useful for development and testing. In production, the database
/// should already exist.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    info!("Checking if database exists");

    if !Postgres::database_exists(database_url).await? {
        info!("Database does not exist, creating it");
        Postgres::create_database(database_url).await?;
        info!("Database created successfully");
    } else {
        debug!("Database already exists");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parents_come_first() {
        let statements = TableSet::Projects.statements();
        assert!(statements[0].contains("CREATE TABLE IF NOT EXISTS projects"));
        assert!(statements[1].contains("REFERENCES projects(id) ON DELETE CASCADE"));

        let statements = TableSet::Tasks.statements();
        assert!(statements[0].contains("CREATE TABLE IF NOT EXISTS tasks"));
        assert!(statements[1].contains("REFERENCES tasks(id) ON DELETE CASCADE"));
    }

    #[test]
    fn test_all_statements_are_idempotent() {
        for set in [
            TableSet::Users,
            TableSet::Profiles,
            TableSet::Projects,
            TableSet::Tasks,
        ] {
            for statement in set.statements() {
                assert!(
                    statement.contains("IF NOT EXISTS"),
                    "{} statement is not idempotent",
                    set.as_str()
                );
            }
        }
    }
}
