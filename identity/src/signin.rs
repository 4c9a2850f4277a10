//! Sign-in orchestration.
//!
//! [`SignInManager`] layers credential validation on top of cookie issuance:
//! it validates a password against the user manager, checks the sign-in
//! policy, and issues the protected cookie for the right scheme.

use crate::cookie::{AuthenticationTicket, CookieAuthenticationHandler, IssuedCookie};
use crate::error::{IdentityError, Result};
use crate::manager::UserManager;
use crate::schemes::AuthenticationSchemes;
use crate::store::UserStore;
use crate::user::ApplicationUser;
use std::sync::Arc;

/// Credential validation plus cookie issuance.
#[derive(Clone)]
pub struct SignInManager<S>
where
    S: UserStore + Clone,
{
    users: UserManager<S>,
    schemes: Arc<AuthenticationSchemes>,
}

impl<S> SignInManager<S>
where
    S: UserStore + Clone,
{
    /// Create a sign-in manager over a user manager and scheme registry.
    pub const fn new(users: UserManager<S>, schemes: Arc<AuthenticationSchemes>) -> Self {
        Self { users, schemes }
    }

    /// The underlying user manager.
    #[must_use]
    pub const fn users(&self) -> &UserManager<S> {
        &self.users
    }

    /// The scheme registry in effect.
    #[must_use]
    pub fn schemes(&self) -> &AuthenticationSchemes {
        &self.schemes
    }

    fn handler_for(&self, scheme: &str) -> Result<&CookieAuthenticationHandler> {
        self.schemes
            .handler(scheme)
            .ok_or_else(|| IdentityError::SchemeNotRegistered {
                scheme: scheme.to_string(),
            })
    }

    /// Validate a password and issue the application-scheme cookie.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::InvalidCredentials`] on a credential
    /// mismatch, [`IdentityError::SignInNotAllowed`] when the policy
    /// requires a confirmed account and this one is unconfirmed, and
    /// scheme/storage errors otherwise.
    pub async fn password_sign_in(&self, email: &str, password: &str) -> Result<IssuedCookie> {
        let user = self.users.validate_credentials(email, password).await?;

        if !self.users.can_sign_in(&user) {
            tracing::debug!(user_id = %user.id, "sign-in blocked by confirmation policy");
            return Err(IdentityError::SignInNotAllowed);
        }

        let scheme = self.schemes.default_scheme();
        let handler = self.handler_for(scheme)?;
        let ticket = AuthenticationTicket::new(&user, scheme, handler.ticket_ttl());

        tracing::info!(user_id = %user.id, scheme, "password sign-in succeeded");
        handler.issue(&ticket)
    }

    /// Issue the transient external-scheme cookie for a user mid external
    /// sign-in flow.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::SchemeNotRegistered`] if no handler is
    /// registered for the sign-in scheme.
    pub fn external_sign_in(&self, user: &ApplicationUser) -> Result<IssuedCookie> {
        let scheme = self.schemes.default_sign_in_scheme();
        let handler = self.handler_for(scheme)?;
        let ticket = AuthenticationTicket::new(user, scheme, handler.ticket_ttl());

        tracing::info!(user_id = %user.id, scheme, "external sign-in cookie issued");
        handler.issue(&ticket)
    }

    /// Authenticate a cookie value against the default scheme.
    ///
    /// # Errors
    ///
    /// Returns ticket validation errors from the handler.
    pub fn authenticate(&self, cookie_value: &str) -> Result<AuthenticationTicket> {
        self.authenticate_scheme(self.schemes.default_scheme(), cookie_value)
    }

    /// Authenticate a cookie value against a specific scheme.
    ///
    /// The ticket must both verify under the scheme's handler and claim the
    /// same scheme it is being checked against.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::TicketInvalid`], [`IdentityError::TicketExpired`],
    /// or [`IdentityError::SchemeNotRegistered`].
    pub fn authenticate_scheme(
        &self,
        scheme: &str,
        cookie_value: &str,
    ) -> Result<AuthenticationTicket> {
        let handler = self.handler_for(scheme)?;
        let ticket = handler.unprotect(cookie_value)?;

        if ticket.scheme != scheme {
            return Err(IdentityError::TicketInvalid);
        }

        Ok(ticket)
    }

    /// A removal cookie for the default scheme.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::SchemeNotRegistered`] if no handler is
    /// registered for the default scheme.
    pub fn sign_out(&self) -> Result<IssuedCookie> {
        let handler = self.handler_for(self.schemes.default_scheme())?;

        Ok(handler.removal())
    }
}
