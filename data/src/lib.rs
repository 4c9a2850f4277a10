//! Relational persistence context for Roster.
//!
//! This crate owns the shared `PostgreSQL` connection pool and the schema it
//! serves: the identity tables (users, roles, claims, logins, tokens) and the
//! `people` domain table. Everything that touches storage — the identity user
//! store and the `Person` collection alike — routes through one [`Database`]
//! handle, so the whole application shares a single connection-string-derived
//! data source.
//!
//! # Example
//!
//! ```no_run
//! use roster_data::Database;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect("postgres://localhost/roster")?;
//! db.migrate().await?;
//!
//! let person = db.people().insert().await?;
//! println!("created person {}", person.id);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod people;

pub use error::{DataError, Result};
pub use people::{People, Person};

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Shared persistence context.
///
/// Wraps a lazily-connecting [`PgPool`]: constructing a `Database` performs
/// no I/O, and connection, authentication, or schema failures surface on the
/// first query rather than at composition time.
#[derive(Debug, Clone)]
pub struct Database {
    connection_string: String,
    pool: PgPool,
}

impl Database {
    /// Create a persistence context for the given connection string.
    ///
    /// The pool is created lazily: no connection is attempted here. An
    /// unreachable or misconfigured server is reported by the first query
    /// that needs a connection.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Storage`] if the connection string cannot be
    /// parsed as a `PostgreSQL` `DSN`.
    pub fn connect(connection_string: &str) -> Result<Self> {
        let pool = PgPoolOptions::new().connect_lazy(connection_string)?;

        Ok(Self {
            connection_string: connection_string.to_string(),
            pool,
        })
    }

    /// The connection string this context was created from.
    #[must_use]
    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run embedded database migrations.
    ///
    /// Creates the identity tables and the `people` table if they do not
    /// exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Migration`] if a migration fails to apply.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(DataError::Migration)?;

        tracing::debug!("database migrations applied");
        Ok(())
    }

    /// The `Person` collection bound to this context.
    #[must_use]
    pub fn people(&self) -> People {
        People::new(self.pool.clone())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Tests can unwrap

    use super::*;

    #[tokio::test]
    async fn connect_is_lazy_and_keeps_the_literal_connection_string() {
        let dsn = "postgres://db.internal/roster";
        let db = Database::connect(dsn).unwrap();

        assert_eq!(db.connection_string(), dsn);
    }

    #[test]
    fn connect_rejects_an_unparseable_connection_string() {
        let result = Database::connect("Server=x;Database=y;");

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn contexts_for_the_same_string_are_interchangeable() {
        let a = Database::connect("postgres://db.internal/roster").unwrap();
        let b = Database::connect("postgres://db.internal/roster").unwrap();

        assert_eq!(a.connection_string(), b.connection_string());
    }
}
