//! `PostgreSQL` user store implementation.
//!
//! Persists users and their satellite records (claims, external logins,
//! purpose-bound tokens) in the identity tables. The schema is owned by the
//! application's persistence context and applied through its embedded
//! migrations; this store only reads and writes it.
//!
//! # Example
//!
//! ```no_run
//! use roster_identity::PostgresUserStore;
//! use sqlx::postgres::PgPoolOptions;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = PgPoolOptions::new().connect_lazy("postgres://localhost/roster")?;
//! let store = PostgresUserStore::new(pool);
//! # Ok(())
//! # }
//! ```

use crate::error::{IdentityError, Result};
use crate::store::{StoredToken, UserStore};
use crate::user::{ApplicationUser, ExternalLogin, UserClaim, UserId};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

/// `PostgreSQL`-backed [`UserStore`].
#[derive(Debug, Clone)]
pub struct PostgresUserStore {
    /// Shared connection pool.
    pool: PgPool,
}

impl PostgresUserStore {
    /// Bind the store to a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn user_from_row(row: &PgRow) -> Result<ApplicationUser> {
        let read = |e: sqlx::Error| IdentityError::Storage(format!("Failed to read user row: {e}"));

        Ok(ApplicationUser {
            id: UserId(row.try_get("id").map_err(read)?),
            email: row.try_get("email").map_err(read)?,
            password_hash: row.try_get("password_hash").map_err(read)?,
            email_confirmed: row.try_get("email_confirmed").map_err(read)?,
            security_stamp: row.try_get("security_stamp").map_err(read)?,
            created_at: row.try_get("created_at").map_err(read)?,
            updated_at: row.try_get("updated_at").map_err(read)?,
        })
    }
}

const USER_COLUMNS: &str =
    "id, email, password_hash, email_confirmed, security_stamp, created_at, updated_at";

impl UserStore for PostgresUserStore {
    async fn create_user(&self, user: &ApplicationUser) -> Result<ApplicationUser> {
        sqlx::query(
            "INSERT INTO users \
                 (id, email, password_hash, email_confirmed, security_stamp, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(user.id.0)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.email_confirmed)
        .bind(&user.security_stamp)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return IdentityError::DuplicateEmail;
                }
            }
            IdentityError::Storage(format!("Failed to create user: {e}"))
        })?;

        Ok(user.clone())
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<ApplicationUser> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| IdentityError::Storage(format!("Failed to get user: {e}")))?
            .ok_or(IdentityError::UserNotFound)?;

        Self::user_from_row(&row)
    }

    async fn find_by_email(&self, email: &str) -> Result<ApplicationUser> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| IdentityError::Storage(format!("Failed to get user: {e}")))?
            .ok_or(IdentityError::UserNotFound)?;

        Self::user_from_row(&row)
    }

    async fn update_user(&self, user: &ApplicationUser) -> Result<ApplicationUser> {
        let result = sqlx::query(
            "UPDATE users \
             SET email = $2, \
                 password_hash = $3, \
                 email_confirmed = $4, \
                 security_stamp = $5, \
                 updated_at = $6 \
             WHERE id = $1",
        )
        .bind(user.id.0)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.email_confirmed)
        .bind(&user.security_stamp)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| IdentityError::Storage(format!("Failed to update user: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(IdentityError::UserNotFound);
        }

        Ok(user.clone())
    }

    async fn delete_user(&self, user_id: UserId) -> Result<()> {
        // Satellite rows go with the user via ON DELETE CASCADE.
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| IdentityError::Storage(format!("Failed to delete user: {e}")))?;

        Ok(())
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| IdentityError::Storage(format!("Failed to check email: {e}")))?;

        Ok(exists)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Claims
    // ═══════════════════════════════════════════════════════════════════════

    async fn add_claim(&self, user_id: UserId, claim: &UserClaim) -> Result<()> {
        sqlx::query("INSERT INTO user_claims (user_id, claim_type, claim_value) VALUES ($1, $2, $3)")
            .bind(user_id.0)
            .bind(&claim.claim_type)
            .bind(&claim.claim_value)
            .execute(&self.pool)
            .await
            .map_err(|e| IdentityError::Storage(format!("Failed to add claim: {e}")))?;

        Ok(())
    }

    async fn claims(&self, user_id: UserId) -> Result<Vec<UserClaim>> {
        let rows = sqlx::query(
            "SELECT claim_type, claim_value FROM user_claims WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| IdentityError::Storage(format!("Failed to get claims: {e}")))?;

        rows.iter()
            .map(|row| {
                let read =
                    |e: sqlx::Error| IdentityError::Storage(format!("Failed to read claim: {e}"));
                Ok(UserClaim {
                    claim_type: row.try_get("claim_type").map_err(read)?,
                    claim_value: row.try_get("claim_value").map_err(read)?,
                })
            })
            .collect()
    }

    async fn remove_claim(&self, user_id: UserId, claim: &UserClaim) -> Result<()> {
        sqlx::query(
            "DELETE FROM user_claims \
             WHERE user_id = $1 AND claim_type = $2 AND claim_value = $3",
        )
        .bind(user_id.0)
        .bind(&claim.claim_type)
        .bind(&claim.claim_value)
        .execute(&self.pool)
        .await
        .map_err(|e| IdentityError::Storage(format!("Failed to remove claim: {e}")))?;

        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // External Logins
    // ═══════════════════════════════════════════════════════════════════════

    async fn add_login(&self, user_id: UserId, login: &ExternalLogin) -> Result<()> {
        sqlx::query(
            "INSERT INTO user_logins (provider, provider_key, provider_display_name, user_id) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&login.provider)
        .bind(&login.provider_key)
        .bind(&login.provider_display_name)
        .bind(user_id.0)
        .execute(&self.pool)
        .await
        .map_err(|e| IdentityError::Storage(format!("Failed to add login: {e}")))?;

        Ok(())
    }

    async fn find_by_login(&self, provider: &str, provider_key: &str) -> Result<ApplicationUser> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             INNER JOIN user_logins ON user_logins.user_id = users.id \
             WHERE user_logins.provider = $1 AND user_logins.provider_key = $2"
        ))
        .bind(provider)
        .bind(provider_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| IdentityError::Storage(format!("Failed to get user by login: {e}")))?
        .ok_or(IdentityError::UserNotFound)?;

        Self::user_from_row(&row)
    }

    async fn logins(&self, user_id: UserId) -> Result<Vec<ExternalLogin>> {
        let rows = sqlx::query(
            "SELECT provider, provider_key, provider_display_name \
             FROM user_logins WHERE user_id = $1 ORDER BY provider, provider_key",
        )
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| IdentityError::Storage(format!("Failed to get logins: {e}")))?;

        rows.iter()
            .map(|row| {
                let read =
                    |e: sqlx::Error| IdentityError::Storage(format!("Failed to read login: {e}"));
                Ok(ExternalLogin {
                    provider: row.try_get("provider").map_err(read)?,
                    provider_key: row.try_get("provider_key").map_err(read)?,
                    provider_display_name: row.try_get("provider_display_name").map_err(read)?,
                })
            })
            .collect()
    }

    async fn remove_login(&self, user_id: UserId, provider: &str, provider_key: &str) -> Result<()> {
        sqlx::query(
            "DELETE FROM user_logins \
             WHERE user_id = $1 AND provider = $2 AND provider_key = $3",
        )
        .bind(user_id.0)
        .bind(provider)
        .bind(provider_key)
        .execute(&self.pool)
        .await
        .map_err(|e| IdentityError::Storage(format!("Failed to remove login: {e}")))?;

        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Purpose-Bound Tokens
    // ═══════════════════════════════════════════════════════════════════════

    async fn set_token(&self, user_id: UserId, purpose: &str, token: &StoredToken) -> Result<()> {
        sqlx::query(
            "INSERT INTO user_tokens (user_id, purpose, value, expires_at) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id, purpose) \
             DO UPDATE SET value = EXCLUDED.value, expires_at = EXCLUDED.expires_at",
        )
        .bind(user_id.0)
        .bind(purpose)
        .bind(&token.value)
        .bind(token.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| IdentityError::Storage(format!("Failed to set token: {e}")))?;

        Ok(())
    }

    async fn token(&self, user_id: UserId, purpose: &str) -> Result<Option<StoredToken>> {
        let row = sqlx::query(
            "SELECT value, expires_at FROM user_tokens WHERE user_id = $1 AND purpose = $2",
        )
        .bind(user_id.0)
        .bind(purpose)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| IdentityError::Storage(format!("Failed to get token: {e}")))?;

        match row {
            Some(row) => {
                let read =
                    |e: sqlx::Error| IdentityError::Storage(format!("Failed to read token: {e}"));
                Ok(Some(StoredToken {
                    value: row.try_get("value").map_err(read)?,
                    expires_at: row.try_get("expires_at").map_err(read)?,
                }))
            }
            None => Ok(None),
        }
    }

    async fn remove_token(&self, user_id: UserId, purpose: &str) -> Result<()> {
        sqlx::query("DELETE FROM user_tokens WHERE user_id = $1 AND purpose = $2")
            .bind(user_id.0)
            .bind(purpose)
            .execute(&self.pool)
            .await
            .map_err(|e| IdentityError::Storage(format!("Failed to remove token: {e}")))?;

        Ok(())
    }
}
