/// Storage error taxonomy
///
/// Every repository operation returns [`StoreResult`]. Raw `sqlx::Error`
/// values are classified once, here, so callers can tell a rejected write
/// apart from an unreachable database without inspecting driver internals.
///
/// "Not found" is not an error: lookups, updates and deletes return `Option`.
use sqlx::error::ErrorKind;

/// Result alias used by all repository operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Typed failure surfaced by the repository layer
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A declared constraint rejected the write (unique, foreign key, not null, check)
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// The database could not be reached or the pool is exhausted/closed
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Any other database failure (malformed input, decode errors, ...)
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl StoreError {
    /// Whether a declared constraint rejected the write
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, StoreError::ConstraintViolation(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => match db_err.kind() {
                ErrorKind::UniqueViolation
                | ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation => {
                    let detail = match db_err.constraint() {
                        Some(constraint) => format!("{} ({})", db_err.message(), constraint),
                        None => db_err.message().to_string(),
                    };
                    StoreError::ConstraintViolation(detail)
                }
                _ => StoreError::Database(sqlx::Error::Database(db_err)),
            },
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
            other => StoreError::Database(other),
        }
    }
}
