//! User identity storage.
//!
//! The [`UserStore`] trait abstracts over identity persistence so the
//! managers stay polymorphic over the storage capability: `PostgreSQL` in
//! production, in-memory in tests.

use crate::error::Result;
use crate::user::{ApplicationUser, ExternalLogin, UserClaim, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;

#[cfg(feature = "test-utils")]
pub mod memory;
pub mod postgres;

/// A purpose-bound token at rest.
///
/// Stores only the token's hash; the raw token value never touches storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    /// Hash of the token value.
    pub value: String,

    /// Expiry, if the token has one.
    pub expires_at: Option<DateTime<Utc>>,
}

/// User identity store.
///
/// Persists users, their claims, their external-provider logins, and their
/// purpose-bound tokens — the identity tables.
pub trait UserStore: Send + Sync {
    /// Create a user.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Storage fails
    /// - Email already exists → `IdentityError::DuplicateEmail`
    fn create_user(
        &self,
        user: &ApplicationUser,
    ) -> impl Future<Output = Result<ApplicationUser>> + Send;

    /// Get user by ID.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Storage fails
    /// - User not found → `IdentityError::UserNotFound`
    fn find_by_id(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<ApplicationUser>> + Send;

    /// Get user by normalized email.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Storage fails
    /// - User not found → `IdentityError::UserNotFound`
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<ApplicationUser>> + Send;

    /// Update a user.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Storage fails
    /// - User not found → `IdentityError::UserNotFound`
    fn update_user(
        &self,
        user: &ApplicationUser,
    ) -> impl Future<Output = Result<ApplicationUser>> + Send;

    /// Delete a user and all satellite records.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    fn delete_user(&self, user_id: UserId) -> impl Future<Output = Result<()>> + Send;

    /// Check if an email is already registered.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    fn email_exists(&self, email: &str) -> impl Future<Output = Result<bool>> + Send;

    // ═══════════════════════════════════════════════════════════════════════
    // Claims
    // ═══════════════════════════════════════════════════════════════════════

    /// Attach a claim to a user.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    fn add_claim(
        &self,
        user_id: UserId,
        claim: &UserClaim,
    ) -> impl Future<Output = Result<()>> + Send;

    /// All claims attached to a user.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    fn claims(&self, user_id: UserId) -> impl Future<Output = Result<Vec<UserClaim>>> + Send;

    /// Remove a claim from a user.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    fn remove_claim(
        &self,
        user_id: UserId,
        claim: &UserClaim,
    ) -> impl Future<Output = Result<()>> + Send;

    // ═══════════════════════════════════════════════════════════════════════
    // External Logins
    // ═══════════════════════════════════════════════════════════════════════

    /// Link an external-provider login to a user.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    fn add_login(
        &self,
        user_id: UserId,
        login: &ExternalLogin,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Find the user linked to an external login.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Storage fails
    /// - No user is linked → `IdentityError::UserNotFound`
    fn find_by_login(
        &self,
        provider: &str,
        provider_key: &str,
    ) -> impl Future<Output = Result<ApplicationUser>> + Send;

    /// All external logins linked to a user.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    fn logins(&self, user_id: UserId) -> impl Future<Output = Result<Vec<ExternalLogin>>> + Send;

    /// Unlink an external login from a user.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    fn remove_login(
        &self,
        user_id: UserId,
        provider: &str,
        provider_key: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    // ═══════════════════════════════════════════════════════════════════════
    // Purpose-Bound Tokens
    // ═══════════════════════════════════════════════════════════════════════

    /// Store a token for a user and purpose, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    fn set_token(
        &self,
        user_id: UserId,
        purpose: &str,
        token: &StoredToken,
    ) -> impl Future<Output = Result<()>> + Send;

    /// The stored token for a user and purpose, if any.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    fn token(
        &self,
        user_id: UserId,
        purpose: &str,
    ) -> impl Future<Output = Result<Option<StoredToken>>> + Send;

    /// Remove the stored token for a user and purpose.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    fn remove_token(
        &self,
        user_id: UserId,
        purpose: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}
