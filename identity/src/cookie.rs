//! Cookie authentication tickets and handlers.
//!
//! A ticket is the serialized principal a cookie carries: user id, email,
//! scheme, and validity window. Handlers protect tickets with `HMAC-SHA256`
//! over the `JSON` payload, encode them base64url, and verify them in
//! constant time on the way back in.

use crate::error::{IdentityError, Result};
use crate::schemes::CookieOptions;
use crate::user::{ApplicationUser, UserId};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// The principal carried by an authentication cookie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticationTicket {
    /// Authenticated user.
    pub user_id: UserId,

    /// User's email at issuance time.
    pub email: String,

    /// Scheme this ticket was issued under.
    pub scheme: String,

    /// Issuance timestamp.
    pub issued_at: DateTime<Utc>,

    /// Expiry timestamp.
    pub expires_at: DateTime<Utc>,
}

impl AuthenticationTicket {
    /// Create a ticket for a user under a scheme, valid for `ttl` from now.
    #[must_use]
    pub fn new(user: &ApplicationUser, scheme: impl Into<String>, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            user_id: user.id,
            email: user.email.clone(),
            scheme: scheme.into(),
            issued_at: now,
            expires_at: now + ttl,
        }
    }

    /// Whether the ticket is past its expiry.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// A cookie ready to be set on a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCookie {
    /// Cookie name.
    pub name: String,

    /// Protected cookie value. Empty for a removal cookie.
    pub value: String,

    /// Expiry communicated to the browser, if any.
    pub expires_at: Option<DateTime<Utc>>,
}

impl IssuedCookie {
    /// Render as a `Set-Cookie` header value.
    ///
    /// Removal cookies (empty value) carry `Max-Age=0` so the browser drops
    /// the cookie immediately.
    #[must_use]
    pub fn header_value(&self) -> String {
        let mut header = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", self.name, self.value);

        if self.value.is_empty() {
            header.push_str("; Max-Age=0");
        } else if let Some(expires) = self.expires_at {
            header.push_str(&format!(
                "; Expires={}",
                expires.format("%a, %d %b %Y %H:%M:%S GMT")
            ));
        }

        header
    }
}

/// Cookie-based authentication handler for one scheme.
///
/// Issues protected tickets and validates them on the way back in. The
/// signing key is random per process by default; inject a stable key with
/// [`CookieAuthenticationHandler::with_key`] when sessions must survive
/// restarts.
#[derive(Clone)]
pub struct CookieAuthenticationHandler {
    options: CookieOptions,
    key: [u8; 32],
}

impl CookieAuthenticationHandler {
    /// Create a handler with a freshly generated signing key.
    #[must_use]
    pub fn new(options: CookieOptions) -> Self {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);

        Self { options, key }
    }

    /// Replace the signing key.
    #[must_use]
    pub const fn with_key(mut self, key: [u8; 32]) -> Self {
        self.key = key;
        self
    }

    /// Handler options.
    #[must_use]
    pub const fn options(&self) -> &CookieOptions {
        &self.options
    }

    /// Name of the cookie this handler issues.
    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.options.name
    }

    /// Ticket lifetime this handler issues.
    #[must_use]
    pub const fn ticket_ttl(&self) -> Duration {
        self.options.ticket_ttl
    }

    /// Issue a cookie carrying the protected ticket.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::TicketProtection`] if the ticket cannot be
    /// serialized or signed.
    pub fn issue(&self, ticket: &AuthenticationTicket) -> Result<IssuedCookie> {
        Ok(IssuedCookie {
            name: self.options.name.clone(),
            value: self.protect(ticket)?,
            expires_at: Some(ticket.expires_at),
        })
    }

    /// A cookie that removes this handler's cookie from the browser.
    #[must_use]
    pub fn removal(&self) -> IssuedCookie {
        IssuedCookie {
            name: self.options.name.clone(),
            value: String::new(),
            expires_at: None,
        }
    }

    /// Serialize and sign a ticket into a cookie value.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::TicketProtection`] if serialization or
    /// signing fails.
    pub fn protect(&self, ticket: &AuthenticationTicket) -> Result<String> {
        let payload = serde_json::to_vec(ticket)
            .map_err(|e| IdentityError::TicketProtection(format!("serialize ticket: {e}")))?;
        let tag = self.compute_tag(&payload)?;

        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload),
            URL_SAFE_NO_PAD.encode(tag)
        ))
    }

    /// Verify a cookie value and return the ticket it carries.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::TicketInvalid`] if decoding or signature
    /// verification fails, and [`IdentityError::TicketExpired`] if the
    /// ticket is valid but past its expiry.
    pub fn unprotect(&self, value: &str) -> Result<AuthenticationTicket> {
        let (payload_b64, tag_b64) = value
            .split_once('.')
            .ok_or(IdentityError::TicketInvalid)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| IdentityError::TicketInvalid)?;
        let tag = URL_SAFE_NO_PAD
            .decode(tag_b64)
            .map_err(|_| IdentityError::TicketInvalid)?;

        let expected = self.compute_tag(&payload)?;
        if !constant_time_eq::constant_time_eq(&expected, &tag) {
            return Err(IdentityError::TicketInvalid);
        }

        let ticket: AuthenticationTicket =
            serde_json::from_slice(&payload).map_err(|_| IdentityError::TicketInvalid)?;

        if ticket.is_expired() {
            return Err(IdentityError::TicketExpired);
        }

        Ok(ticket)
    }

    fn compute_tag(&self, payload: &[u8]) -> Result<Vec<u8>> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| IdentityError::TicketProtection(format!("hmac key: {e}")))?;
        mac.update(payload);

        Ok(mac.finalize().into_bytes().to_vec())
    }
}

impl std::fmt::Debug for CookieAuthenticationHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The signing key stays out of logs.
        f.debug_struct("CookieAuthenticationHandler")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Tests can unwrap

    use super::*;
    use crate::schemes::APPLICATION_SCHEME;

    fn test_user() -> ApplicationUser {
        ApplicationUser::new("ada@example.com".into(), "hash".into())
    }

    fn handler() -> CookieAuthenticationHandler {
        CookieAuthenticationHandler::new(CookieOptions::application()).with_key([7u8; 32])
    }

    #[test]
    fn protect_then_unprotect_round_trips() {
        let handler = handler();
        let ticket =
            AuthenticationTicket::new(&test_user(), APPLICATION_SCHEME, Duration::hours(1));

        let value = handler.protect(&ticket).unwrap();
        let recovered = handler.unprotect(&value).unwrap();

        assert_eq!(recovered, ticket);
    }

    #[test]
    fn tampered_payloads_are_rejected() {
        let handler = handler();
        let ticket =
            AuthenticationTicket::new(&test_user(), APPLICATION_SCHEME, Duration::hours(1));

        let value = handler.protect(&ticket).unwrap();
        let mut tampered = value.into_bytes();
        tampered[0] ^= 1;
        let tampered = String::from_utf8(tampered).unwrap();

        assert_eq!(
            handler.unprotect(&tampered),
            Err(IdentityError::TicketInvalid)
        );
    }

    #[test]
    fn a_different_key_cannot_unprotect() {
        let issuing = handler();
        let other = CookieAuthenticationHandler::new(CookieOptions::application())
            .with_key([8u8; 32]);
        let ticket =
            AuthenticationTicket::new(&test_user(), APPLICATION_SCHEME, Duration::hours(1));

        let value = issuing.protect(&ticket).unwrap();

        assert_eq!(other.unprotect(&value), Err(IdentityError::TicketInvalid));
    }

    #[test]
    fn expired_tickets_are_rejected() {
        let handler = handler();
        let ticket =
            AuthenticationTicket::new(&test_user(), APPLICATION_SCHEME, Duration::seconds(-1));

        let value = handler.protect(&ticket).unwrap();

        assert_eq!(handler.unprotect(&value), Err(IdentityError::TicketExpired));
    }

    #[test]
    fn garbage_values_are_rejected() {
        let handler = handler();

        assert_eq!(
            handler.unprotect("not-a-ticket"),
            Err(IdentityError::TicketInvalid)
        );
        assert_eq!(
            handler.unprotect("a.b"),
            Err(IdentityError::TicketInvalid)
        );
    }

    #[test]
    fn removal_cookie_expires_immediately() {
        let header = handler().removal().header_value();

        assert!(header.contains("Max-Age=0"));
        assert!(header.starts_with(".roster.application=;"));
    }

    #[test]
    fn issued_cookie_header_carries_expiry() {
        let handler = handler();
        let ticket =
            AuthenticationTicket::new(&test_user(), APPLICATION_SCHEME, Duration::hours(1));

        let cookie = handler.issue(&ticket).unwrap();
        let header = cookie.header_value();

        assert!(header.starts_with(".roster.application="));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("Expires="));
    }
}
