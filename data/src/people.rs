//! The `Person` domain entity and its stored collection.
//!
//! `Person` is intentionally minimal: the schema declares nothing beyond an
//! identifier, and no lifecycle rules are attached to it. The collection
//! exposes plain storage operations and leaves create/update/delete policy to
//! whoever grows the domain later.

use crate::error::Result;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// A stored domain record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Person {
    /// Row identifier.
    pub id: Uuid,
}

/// Queryable, persistable collection of [`Person`] rows.
#[derive(Debug, Clone)]
pub struct People {
    pool: PgPool,
}

impl People {
    /// Bind the collection to a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new row and return it.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn insert(&self) -> Result<Person> {
        let person = Person { id: Uuid::new_v4() };

        sqlx::query("INSERT INTO people (id) VALUES ($1)")
            .bind(person.id)
            .execute(&self.pool)
            .await?;

        Ok(person)
    }

    /// Look up a row by identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find(&self, id: Uuid) -> Result<Option<Person>> {
        let row = sqlx::query("SELECT id FROM people WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(Person {
                id: row.try_get("id")?,
            })),
            None => Ok(None),
        }
    }

    /// List all rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(&self) -> Result<Vec<Person>> {
        let rows = sqlx::query("SELECT id FROM people ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| {
                Ok(Person {
                    id: row.try_get("id")?,
                })
            })
            .collect()
    }

    /// Count stored rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM people")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
