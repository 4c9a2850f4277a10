//! Error types for identity and authentication operations.

use thiserror::Error;

/// Result type alias for identity operations.
pub type Result<T> = std::result::Result<T, IdentityError>;

/// Error taxonomy for the identity core.
///
/// Variants are organized by category: credential and sign-in failures,
/// authentication-ticket failures, one-time-token failures, and system
/// errors. Storage failures are carried as strings so the error stays
/// `Clone`-able and comparable in tests.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    // ═══════════════════════════════════════════════════════════
    // Credentials & Sign-In
    // ═══════════════════════════════════════════════════════════

    /// Invalid credentials provided.
    ///
    /// Deliberately covers both "no such user" and "wrong password" so the
    /// response does not leak which accounts exist.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The account is not currently allowed to sign in (e.g. the policy
    /// requires a confirmed account and this one is unconfirmed).
    #[error("Sign-in is not allowed for this account")]
    SignInNotAllowed,

    /// A user with this email already exists.
    #[error("Email is already registered")]
    DuplicateEmail,

    /// The email address is not acceptable as a user identifier.
    #[error("Invalid email address")]
    EmailInvalid,

    /// No user matched the lookup.
    #[error("User not found")]
    UserNotFound,

    // ═══════════════════════════════════════════════════════════
    // Authentication Tickets
    // ═══════════════════════════════════════════════════════════

    /// The cookie payload failed decoding or signature verification.
    #[error("Invalid authentication ticket")]
    TicketInvalid,

    /// The authentication ticket is past its expiry.
    #[error("Authentication ticket has expired")]
    TicketExpired,

    /// No handler is registered for the requested authentication scheme.
    #[error("Authentication scheme '{scheme}' is not registered")]
    SchemeNotRegistered {
        /// The scheme that was requested.
        scheme: String,
    },

    // ═══════════════════════════════════════════════════════════
    // One-Time Tokens
    // ═══════════════════════════════════════════════════════════

    /// The token did not match, was already consumed, or never existed.
    #[error("Invalid token")]
    TokenInvalid,

    /// The token exists but is past its expiry.
    #[error("Token has expired")]
    TokenExpired,

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// Password hashing or verification failed for a non-credential reason.
    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    /// Protecting a cookie ticket failed for a non-validation reason.
    #[error("Ticket protection error: {0}")]
    TicketProtection(String),

    /// The storage engine reported a failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl IdentityError {
    /// Returns `true` if this error is due to invalid user input rather than
    /// a system fault.
    ///
    /// # Examples
    ///
    /// ```
    /// # use roster_identity::IdentityError;
    /// assert!(IdentityError::InvalidCredentials.is_user_error());
    /// assert!(!IdentityError::Storage("connection refused".into()).is_user_error());
    /// ```
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::SignInNotAllowed
                | Self::DuplicateEmail
                | Self::EmailInvalid
                | Self::TicketInvalid
                | Self::TicketExpired
                | Self::TokenInvalid
                | Self::TokenExpired
        )
    }

    /// Returns `true` if this error originates in the storage layer.
    #[must_use]
    pub const fn is_storage_error(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}
