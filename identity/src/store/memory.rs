//! In-memory user store for fast, deterministic testing.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for lock access

use crate::error::{IdentityError, Result};
use crate::store::{StoredToken, UserStore};
use crate::user::{ApplicationUser, ExternalLogin, UserClaim, UserId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[derive(Default)]
struct Inner {
    users: HashMap<UserId, ApplicationUser>,
    claims: HashMap<UserId, Vec<UserClaim>>,
    logins: HashMap<UserId, Vec<ExternalLogin>>,
    tokens: HashMap<(UserId, String), StoredToken>,
}

/// `HashMap`-backed [`UserStore`].
///
/// Mirrors the `PostgreSQL` store's observable behavior (duplicate-email
/// rejection, not-found errors, token replacement) without any I/O, so the
/// managers can be tested at memory speed.
///
/// # Example
///
/// ```
/// use roster_identity::{ApplicationUser, InMemoryUserStore, UserStore};
///
/// # async fn example() -> roster_identity::Result<()> {
/// let store = InMemoryUserStore::new();
/// let user = ApplicationUser::new("ada@example.com".into(), "hash".into());
///
/// store.create_user(&user).await?;
/// assert!(store.email_exists("ada@example.com").await?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryUserStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().unwrap().users.len()
    }

    /// Whether the store holds no users.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().unwrap().users.is_empty()
    }

    /// Drop all stored data (for test isolation).
    pub fn clear(&self) {
        let mut inner = self.inner.write().unwrap();
        inner.users.clear();
        inner.claims.clear();
        inner.logins.clear();
        inner.tokens.clear();
    }
}

impl UserStore for InMemoryUserStore {
    async fn create_user(&self, user: &ApplicationUser) -> Result<ApplicationUser> {
        let mut inner = self.inner.write().unwrap();

        if inner.users.values().any(|u| u.email == user.email) {
            return Err(IdentityError::DuplicateEmail);
        }

        inner.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<ApplicationUser> {
        self.inner
            .read()
            .unwrap()
            .users
            .get(&user_id)
            .cloned()
            .ok_or(IdentityError::UserNotFound)
    }

    async fn find_by_email(&self, email: &str) -> Result<ApplicationUser> {
        self.inner
            .read()
            .unwrap()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(IdentityError::UserNotFound)
    }

    async fn update_user(&self, user: &ApplicationUser) -> Result<ApplicationUser> {
        let mut inner = self.inner.write().unwrap();

        if !inner.users.contains_key(&user.id) {
            return Err(IdentityError::UserNotFound);
        }

        inner.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn delete_user(&self, user_id: UserId) -> Result<()> {
        let mut inner = self.inner.write().unwrap();

        inner.users.remove(&user_id);
        inner.claims.remove(&user_id);
        inner.logins.remove(&user_id);
        inner.tokens.retain(|(id, _), _| *id != user_id);

        Ok(())
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .users
            .values()
            .any(|u| u.email == email))
    }

    async fn add_claim(&self, user_id: UserId, claim: &UserClaim) -> Result<()> {
        self.inner
            .write()
            .unwrap()
            .claims
            .entry(user_id)
            .or_default()
            .push(claim.clone());

        Ok(())
    }

    async fn claims(&self, user_id: UserId) -> Result<Vec<UserClaim>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .claims
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn remove_claim(&self, user_id: UserId, claim: &UserClaim) -> Result<()> {
        if let Some(claims) = self.inner.write().unwrap().claims.get_mut(&user_id) {
            claims.retain(|c| c != claim);
        }

        Ok(())
    }

    async fn add_login(&self, user_id: UserId, login: &ExternalLogin) -> Result<()> {
        self.inner
            .write()
            .unwrap()
            .logins
            .entry(user_id)
            .or_default()
            .push(login.clone());

        Ok(())
    }

    async fn find_by_login(&self, provider: &str, provider_key: &str) -> Result<ApplicationUser> {
        let inner = self.inner.read().unwrap();

        let user_id = inner
            .logins
            .iter()
            .find(|(_, logins)| {
                logins
                    .iter()
                    .any(|l| l.provider == provider && l.provider_key == provider_key)
            })
            .map(|(id, _)| *id)
            .ok_or(IdentityError::UserNotFound)?;

        inner
            .users
            .get(&user_id)
            .cloned()
            .ok_or(IdentityError::UserNotFound)
    }

    async fn logins(&self, user_id: UserId) -> Result<Vec<ExternalLogin>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .logins
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn remove_login(&self, user_id: UserId, provider: &str, provider_key: &str) -> Result<()> {
        if let Some(logins) = self.inner.write().unwrap().logins.get_mut(&user_id) {
            logins.retain(|l| !(l.provider == provider && l.provider_key == provider_key));
        }

        Ok(())
    }

    async fn set_token(&self, user_id: UserId, purpose: &str, token: &StoredToken) -> Result<()> {
        self.inner
            .write()
            .unwrap()
            .tokens
            .insert((user_id, purpose.to_string()), token.clone());

        Ok(())
    }

    async fn token(&self, user_id: UserId, purpose: &str) -> Result<Option<StoredToken>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .tokens
            .get(&(user_id, purpose.to_string()))
            .cloned())
    }

    async fn remove_token(&self, user_id: UserId, purpose: &str) -> Result<()> {
        self.inner
            .write()
            .unwrap()
            .tokens
            .remove(&(user_id, purpose.to_string()));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_emails_are_rejected() {
        let store = InMemoryUserStore::new();
        let first = ApplicationUser::new("ada@example.com".into(), "hash".into());
        let second = ApplicationUser::new("ada@example.com".into(), "hash".into());

        store.create_user(&first).await.unwrap();

        assert_eq!(
            store.create_user(&second).await,
            Err(IdentityError::DuplicateEmail)
        );
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn deleting_a_user_removes_satellite_records() {
        let store = InMemoryUserStore::new();
        let user = ApplicationUser::new("ada@example.com".into(), "hash".into());
        store.create_user(&user).await.unwrap();
        store
            .add_claim(
                user.id,
                &UserClaim {
                    claim_type: "role".into(),
                    claim_value: "admin".into(),
                },
            )
            .await
            .unwrap();
        store
            .set_token(
                user.id,
                "password_reset",
                &StoredToken {
                    value: "hash".into(),
                    expires_at: None,
                },
            )
            .await
            .unwrap();

        store.delete_user(user.id).await.unwrap();

        assert!(store.is_empty());
        assert!(store.claims(user.id).await.unwrap().is_empty());
        assert!(store.token(user.id, "password_reset").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn tokens_replace_per_purpose() {
        let store = InMemoryUserStore::new();
        let user = ApplicationUser::new("ada@example.com".into(), "hash".into());
        store.create_user(&user).await.unwrap();

        for value in ["first", "second"] {
            store
                .set_token(
                    user.id,
                    "password_reset",
                    &StoredToken {
                        value: value.into(),
                        expires_at: None,
                    },
                )
                .await
                .unwrap();
        }

        let stored = store.token(user.id, "password_reset").await.unwrap().unwrap();
        assert_eq!(stored.value, "second");
    }

    #[tokio::test]
    async fn logins_resolve_back_to_the_user() {
        let store = InMemoryUserStore::new();
        let user = ApplicationUser::new("ada@example.com".into(), "hash".into());
        store.create_user(&user).await.unwrap();
        store
            .add_login(
                user.id,
                &ExternalLogin {
                    provider: "google".into(),
                    provider_key: "g-123".into(),
                    provider_display_name: Some("Google".into()),
                },
            )
            .await
            .unwrap();

        let found = store.find_by_login("google", "g-123").await.unwrap();
        assert_eq!(found.id, user.id);

        store.remove_login(user.id, "google", "g-123").await.unwrap();
        assert_eq!(
            store.find_by_login("google", "g-123").await,
            Err(IdentityError::UserNotFound)
        );
    }
}
