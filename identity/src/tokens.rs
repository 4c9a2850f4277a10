//! Default token providers.
//!
//! Purpose-bound, single-use tokens for flows that need an out-of-band
//! proof: password reset, email confirmation, two-factor. Only the token's
//! `SHA-256` hash is stored; validation compares in constant time and
//! consumes the token on success so it can never be replayed.

use crate::error::{IdentityError, Result};
use crate::store::{StoredToken, UserStore};
use crate::user::ApplicationUser;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

/// What a one-time token proves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    /// Password reset flow.
    PasswordReset,

    /// Email confirmation flow.
    EmailConfirmation,

    /// Two-factor sign-in flow.
    TwoFactor,
}

impl TokenPurpose {
    /// Storage key for this purpose.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PasswordReset => "password_reset",
            Self::EmailConfirmation => "email_confirmation",
            Self::TwoFactor => "two_factor",
        }
    }
}

/// Default token providers over a [`UserStore`].
///
/// One token per user and purpose; generating a new token replaces the
/// previous one.
#[derive(Debug, Clone)]
pub struct TokenProviders<S>
where
    S: UserStore + Clone,
{
    store: S,
    token_ttl: Duration,
}

impl<S> TokenProviders<S>
where
    S: UserStore + Clone,
{
    /// Create token providers with the default one-day token lifetime.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            token_ttl: Duration::hours(24),
        }
    }

    /// Override the token lifetime.
    #[must_use]
    pub const fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// The token lifetime in effect.
    #[must_use]
    pub const fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    fn hash_token(token: &str) -> String {
        URL_SAFE_NO_PAD.encode(Sha256::digest(token.as_bytes()))
    }

    /// Generate a token for a user and purpose.
    ///
    /// Returns the raw token to hand to the user; storage only ever sees its
    /// hash.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub async fn generate(&self, user: &ApplicationUser, purpose: TokenPurpose) -> Result<String> {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        let token = URL_SAFE_NO_PAD.encode(bytes);

        let stored = StoredToken {
            value: Self::hash_token(&token),
            expires_at: Some(Utc::now() + self.token_ttl),
        };
        self.store.set_token(user.id, purpose.as_str(), &stored).await?;

        tracing::debug!(user_id = %user.id, purpose = purpose.as_str(), "one-time token generated");
        Ok(token)
    }

    /// Validate and consume a token for a user and purpose.
    ///
    /// A matching token is removed before this returns, so a second
    /// validation with the same token fails.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::TokenInvalid`] if no token is stored, the
    /// value does not match, or the token was already consumed;
    /// [`IdentityError::TokenExpired`] if it exists but is past its expiry.
    pub async fn validate(
        &self,
        user: &ApplicationUser,
        purpose: TokenPurpose,
        token: &str,
    ) -> Result<()> {
        let stored = self
            .store
            .token(user.id, purpose.as_str())
            .await?
            .ok_or(IdentityError::TokenInvalid)?;

        if let Some(expires_at) = stored.expires_at {
            if Utc::now() > expires_at {
                self.store.remove_token(user.id, purpose.as_str()).await?;
                return Err(IdentityError::TokenExpired);
            }
        }

        let presented = Self::hash_token(token);
        if !constant_time_eq::constant_time_eq(presented.as_bytes(), stored.value.as_bytes()) {
            return Err(IdentityError::TokenInvalid);
        }

        // Single use: consume before reporting success.
        self.store.remove_token(user.id, purpose.as_str()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Tests can unwrap

    use super::*;
    use crate::store::memory::InMemoryUserStore;

    async fn setup() -> (TokenProviders<InMemoryUserStore>, ApplicationUser) {
        let store = InMemoryUserStore::new();
        let user = ApplicationUser::new("ada@example.com".into(), "hash".into());
        store.create_user(&user).await.unwrap();

        (TokenProviders::new(store), user)
    }

    #[tokio::test]
    async fn a_token_validates_exactly_once() {
        let (tokens, user) = setup().await;

        let token = tokens.generate(&user, TokenPurpose::PasswordReset).await.unwrap();

        tokens
            .validate(&user, TokenPurpose::PasswordReset, &token)
            .await
            .unwrap();
        assert_eq!(
            tokens.validate(&user, TokenPurpose::PasswordReset, &token).await,
            Err(IdentityError::TokenInvalid)
        );
    }

    #[tokio::test]
    async fn purposes_do_not_cross_validate() {
        let (tokens, user) = setup().await;

        let token = tokens.generate(&user, TokenPurpose::PasswordReset).await.unwrap();

        assert_eq!(
            tokens.validate(&user, TokenPurpose::TwoFactor, &token).await,
            Err(IdentityError::TokenInvalid)
        );
    }

    #[tokio::test]
    async fn a_wrong_token_does_not_consume_the_stored_one() {
        let (tokens, user) = setup().await;

        let token = tokens.generate(&user, TokenPurpose::EmailConfirmation).await.unwrap();

        assert_eq!(
            tokens
                .validate(&user, TokenPurpose::EmailConfirmation, "wrong")
                .await,
            Err(IdentityError::TokenInvalid)
        );
        tokens
            .validate(&user, TokenPurpose::EmailConfirmation, &token)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn expired_tokens_are_rejected() {
        let (tokens, user) = setup().await;
        let tokens = tokens.with_token_ttl(Duration::seconds(-1));

        let token = tokens.generate(&user, TokenPurpose::PasswordReset).await.unwrap();

        assert_eq!(
            tokens.validate(&user, TokenPurpose::PasswordReset, &token).await,
            Err(IdentityError::TokenExpired)
        );
    }

    #[tokio::test]
    async fn regenerating_replaces_the_previous_token() {
        let (tokens, user) = setup().await;

        let first = tokens.generate(&user, TokenPurpose::PasswordReset).await.unwrap();
        let second = tokens.generate(&user, TokenPurpose::PasswordReset).await.unwrap();

        assert_eq!(
            tokens.validate(&user, TokenPurpose::PasswordReset, &first).await,
            Err(IdentityError::TokenInvalid)
        );
        tokens
            .validate(&user, TokenPurpose::PasswordReset, &second)
            .await
            .unwrap();
    }
}
