/// Database layer for WorkHub
///
/// This module provides connection pooling and schema bootstrap. Entity
/// repositories live in the `models` module at crate root level.
///
/// # Modules
///
/// - `pool`: Lazily-connecting PostgreSQL pool with health checks
/// - `schema`: Idempotent table creation per service
///
/// # Example
///
/// ```no_run
/// use workhub_shared::db::pool::{create_pool, DatabaseConfig};
/// use workhub_shared::db::schema::{ensure_schema, TableSet};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig::from_url(&std::env::var("DATABASE_URL")?)?;
///
///     let pool = create_pool(&config);
///     ensure_schema(&pool, TableSet::Projects).await?;
///     Ok(())
/// }
/// ```

pub mod pool;
pub mod schema;
