//! Error types for persistence operations.

use thiserror::Error;

/// Result type alias for persistence operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors raised by the persistence context.
///
/// Storage failures are deliberately deferred: creating a [`Database`]
/// performs no I/O, so an unreachable server or a missing table shows up here
/// on first use, not at startup composition.
///
/// [`Database`]: crate::Database
#[derive(Debug, Error)]
pub enum DataError {
    /// The underlying storage engine reported a failure.
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// A database migration failed to apply.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}
