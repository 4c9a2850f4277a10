//! User principal types.
//!
//! All types are `Clone` and serde-serializable so they can cross the
//! store boundary and be embedded in authentication tickets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random `UserId`.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The authentication principal.
///
/// Stored in the `users` identity table. The email is kept normalized
/// (trimmed, lowercased) by [`UserManager`]; the store treats it as an
/// opaque unique key.
///
/// [`UserManager`]: crate::manager::UserManager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationUser {
    /// User ID.
    pub id: UserId,

    /// Normalized email address (unique).
    pub email: String,

    /// Argon2id password hash in `PHC` string format.
    pub password_hash: String,

    /// Whether the email address has been confirmed.
    pub email_confirmed: bool,

    /// Opaque value rotated whenever credentials change; embedded in
    /// long-lived artifacts so they can be invalidated.
    pub security_stamp: String,

    /// Account created timestamp.
    pub created_at: DateTime<Utc>,

    /// Last updated timestamp.
    pub updated_at: DateTime<Utc>,
}

impl ApplicationUser {
    /// Create a new unconfirmed user with a fresh identifier and security
    /// stamp.
    #[must_use]
    pub fn new(email: String, password_hash: String) -> Self {
        let now = Utc::now();

        Self {
            id: UserId::new(),
            email,
            password_hash,
            email_confirmed: false,
            security_stamp: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rotate the security stamp and touch the update timestamp.
    pub fn rotate_security_stamp(&mut self) {
        self.security_stamp = Uuid::new_v4().to_string();
        self.updated_at = Utc::now();
    }
}

/// A claim attached to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaim {
    /// Claim type (e.g. `"role"`, `"display_name"`).
    pub claim_type: String,

    /// Claim value.
    pub claim_value: String,
}

/// A link between a user and an external sign-in provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalLogin {
    /// Provider name (e.g. `"google"`).
    pub provider: String,

    /// The user's key at the provider.
    pub provider_key: String,

    /// Human-readable provider name for account management UIs.
    pub provider_display_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_users_start_unconfirmed() {
        let user = ApplicationUser::new("ada@example.com".into(), "hash".into());

        assert!(!user.email_confirmed);
        assert_eq!(user.created_at, user.updated_at);
        assert!(!user.security_stamp.is_empty());
    }

    #[test]
    fn rotating_the_stamp_changes_it() {
        let mut user = ApplicationUser::new("ada@example.com".into(), "hash".into());
        let before = user.security_stamp.clone();

        user.rotate_security_stamp();

        assert_ne!(user.security_stamp, before);
    }
}
