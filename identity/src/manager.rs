//! User management.
//!
//! [`UserManager`] is the identity-management capability: user CRUD and
//! credential validation over a [`UserStore`], polymorphic over the storage
//! and hashing collaborators.

use crate::error::{IdentityError, Result};
use crate::hasher::PasswordHasher;
use crate::options::IdentityOptions;
use crate::store::UserStore;
use crate::user::{ApplicationUser, UserId};
use std::sync::Arc;

/// Normalize an email for storage and lookup: trimmed, lowercased.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Minimal shape check for an email used as a user identifier.
fn validate_email(email: &str) -> Result<()> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(IdentityError::EmailInvalid);
    };

    if local.is_empty() || domain.is_empty() || email.contains(char::is_whitespace) {
        return Err(IdentityError::EmailInvalid);
    }

    Ok(())
}

/// Identity-management capability for [`ApplicationUser`] principals.
#[derive(Clone)]
pub struct UserManager<S>
where
    S: UserStore + Clone,
{
    store: S,
    hasher: Arc<dyn PasswordHasher>,
    options: IdentityOptions,
}

impl<S> UserManager<S>
where
    S: UserStore + Clone,
{
    /// Create a user manager over a store and hasher with the given policy.
    pub fn new(store: S, hasher: Arc<dyn PasswordHasher>, options: IdentityOptions) -> Self {
        Self {
            store,
            hasher,
            options,
        }
    }

    /// The identity policy in effect.
    #[must_use]
    pub const fn options(&self) -> &IdentityOptions {
        &self.options
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Register a new user with an email and password.
    ///
    /// The email is normalized; the password is hashed before it reaches
    /// storage. The account starts unconfirmed.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::EmailInvalid`] for a malformed email,
    /// [`IdentityError::DuplicateEmail`] if the email is taken, and
    /// storage/hashing errors otherwise.
    pub async fn create(&self, email: &str, password: &str) -> Result<ApplicationUser> {
        let email = normalize_email(email);
        validate_email(&email)?;

        let password_hash = self.hasher.hash(password)?;
        let user = ApplicationUser::new(email, password_hash);

        self.store.create_user(&user).await
    }

    /// Look up a user by email.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::UserNotFound`] if no user matches.
    pub async fn find_by_email(&self, email: &str) -> Result<ApplicationUser> {
        self.store.find_by_email(&normalize_email(email)).await
    }

    /// Look up a user by ID.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::UserNotFound`] if no user matches.
    pub async fn find_by_id(&self, user_id: UserId) -> Result<ApplicationUser> {
        self.store.find_by_id(user_id).await
    }

    /// Delete a user and all satellite records.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub async fn delete(&self, user_id: UserId) -> Result<()> {
        self.store.delete_user(user_id).await
    }

    /// Validate an email/password pair and return the matching user.
    ///
    /// An unknown email and a wrong password both come back as
    /// [`IdentityError::InvalidCredentials`] so callers cannot probe which
    /// accounts exist.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::InvalidCredentials`] on mismatch, and
    /// storage/hashing errors otherwise.
    pub async fn validate_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ApplicationUser> {
        let user = match self.find_by_email(email).await {
            Ok(user) => user,
            Err(IdentityError::UserNotFound) => return Err(IdentityError::InvalidCredentials),
            Err(e) => return Err(e),
        };

        if !self.hasher.verify(password, &user.password_hash)? {
            return Err(IdentityError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Whether the sign-in policy currently permits this account to sign in.
    #[must_use]
    pub const fn can_sign_in(&self, user: &ApplicationUser) -> bool {
        !self.options.sign_in.require_confirmed_account || user.email_confirmed
    }

    /// Mark a user's email as confirmed.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::UserNotFound`] if no user matches.
    pub async fn confirm_email(&self, user_id: UserId) -> Result<ApplicationUser> {
        let mut user = self.store.find_by_id(user_id).await?;
        user.email_confirmed = true;
        user.updated_at = chrono::Utc::now();

        self.store.update_user(&user).await
    }

    /// Change a user's password after verifying the current one.
    ///
    /// Rotates the security stamp so existing long-lived artifacts bound to
    /// the old credentials can be invalidated.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::InvalidCredentials`] if the current password
    /// does not match.
    pub async fn change_password(
        &self,
        user_id: UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<ApplicationUser> {
        let mut user = self.store.find_by_id(user_id).await?;

        if !self.hasher.verify(current_password, &user.password_hash)? {
            return Err(IdentityError::InvalidCredentials);
        }

        user.password_hash = self.hasher.hash(new_password)?;
        user.rotate_security_stamp();

        self.store.update_user(&user).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Tests can unwrap

    use super::*;
    use crate::hasher::Argon2PasswordHasher;
    use crate::store::memory::InMemoryUserStore;

    fn manager() -> UserManager<InMemoryUserStore> {
        UserManager::new(
            InMemoryUserStore::new(),
            Arc::new(Argon2PasswordHasher),
            IdentityOptions::default(),
        )
    }

    #[tokio::test]
    async fn create_normalizes_email_and_hashes_password() {
        let users = manager();

        let user = users.create("  Ada@Example.COM ", "hunter2").await.unwrap();

        assert_eq!(user.email, "ada@example.com");
        assert_ne!(user.password_hash, "hunter2");
        assert!(!user.email_confirmed);
    }

    #[tokio::test]
    async fn malformed_emails_are_rejected() {
        let users = manager();

        for email in ["", "no-at-sign", "@nodomain", "nolocal@", "two words@example.com"] {
            assert_eq!(
                users.create(email, "hunter2").await,
                Err(IdentityError::EmailInvalid),
                "email {email:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn validate_credentials_accepts_the_right_password() {
        let users = manager();
        users.create("ada@example.com", "hunter2").await.unwrap();

        let user = users
            .validate_credentials("Ada@example.com", "hunter2")
            .await
            .unwrap();

        assert_eq!(user.email, "ada@example.com");
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_are_indistinguishable() {
        let users = manager();
        users.create("ada@example.com", "hunter2").await.unwrap();

        let wrong_password = users.validate_credentials("ada@example.com", "nope").await;
        let unknown_user = users.validate_credentials("ghost@example.com", "nope").await;

        assert_eq!(wrong_password, Err(IdentityError::InvalidCredentials));
        assert_eq!(unknown_user, Err(IdentityError::InvalidCredentials));
    }

    #[tokio::test]
    async fn unconfirmed_users_may_sign_in_by_default() {
        let users = manager();
        let user = users.create("ada@example.com", "hunter2").await.unwrap();

        assert!(users.can_sign_in(&user));
    }

    #[tokio::test]
    async fn confirmation_gating_honors_the_policy() {
        let users = UserManager::new(
            InMemoryUserStore::new(),
            Arc::new(Argon2PasswordHasher),
            IdentityOptions::new().with_require_confirmed_account(true),
        );
        let user = users.create("ada@example.com", "hunter2").await.unwrap();

        assert!(!users.can_sign_in(&user));

        let confirmed = users.confirm_email(user.id).await.unwrap();
        assert!(users.can_sign_in(&confirmed));
    }

    #[tokio::test]
    async fn change_password_verifies_current_and_rotates_stamp() {
        let users = manager();
        let user = users.create("ada@example.com", "hunter2").await.unwrap();

        assert_eq!(
            users.change_password(user.id, "wrong", "new-password").await,
            Err(IdentityError::InvalidCredentials)
        );

        let updated = users
            .change_password(user.id, "hunter2", "new-password")
            .await
            .unwrap();

        assert_ne!(updated.security_stamp, user.security_stamp);
        users
            .validate_credentials("ada@example.com", "new-password")
            .await
            .unwrap();
    }
}
