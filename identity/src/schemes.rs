//! Authentication scheme configuration.
//!
//! A scheme is a named way of establishing a request's identity. Roster
//! registers a cookie-backed pair: the application scheme carries
//! authenticated sessions, and the external scheme carries the transient
//! principal during an external-provider sign-in flow.

use crate::cookie::CookieAuthenticationHandler;
use chrono::Duration;
use std::collections::HashMap;

/// Scheme used for already-authenticated requests.
pub const APPLICATION_SCHEME: &str = "roster.application";

/// Scheme used transiently during external-provider sign-in flows.
pub const EXTERNAL_SCHEME: &str = "roster.external";

/// Scheme selection for incoming requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationOptions {
    /// Scheme consulted to authenticate a request.
    pub default_scheme: String,

    /// Scheme used to persist a principal mid sign-in flow.
    pub default_sign_in_scheme: String,
}

impl Default for AuthenticationOptions {
    fn default() -> Self {
        Self {
            default_scheme: APPLICATION_SCHEME.to_string(),
            default_sign_in_scheme: EXTERNAL_SCHEME.to_string(),
        }
    }
}

/// Options for one cookie authentication handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    /// Cookie name.
    pub name: String,

    /// How long an issued ticket stays valid.
    pub ticket_ttl: Duration,
}

impl CookieOptions {
    /// Defaults for the application scheme: a long-lived session cookie.
    #[must_use]
    pub fn application() -> Self {
        Self {
            name: ".roster.application".to_string(),
            ticket_ttl: Duration::hours(24),
        }
    }

    /// Defaults for the external scheme: a short-lived hand-off cookie.
    #[must_use]
    pub fn external() -> Self {
        Self {
            name: ".roster.external".to_string(),
            ticket_ttl: Duration::minutes(15),
        }
    }

    /// Override the cookie name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Override the ticket time-to-live.
    #[must_use]
    pub const fn with_ticket_ttl(mut self, ttl: Duration) -> Self {
        self.ticket_ttl = ttl;
        self
    }
}

/// Registry of authentication schemes and their cookie handlers.
///
/// Registration is keyed by scheme name; registering a handler under an
/// existing name replaces the previous handler rather than accumulating.
#[derive(Debug)]
pub struct AuthenticationSchemes {
    options: AuthenticationOptions,
    handlers: HashMap<String, CookieAuthenticationHandler>,
}

impl AuthenticationSchemes {
    /// Create an empty registry with the given scheme selection.
    #[must_use]
    pub fn new(options: AuthenticationOptions) -> Self {
        Self {
            options,
            handlers: HashMap::new(),
        }
    }

    /// Create the standard Roster configuration: default scheme selection
    /// with cookie handlers attached for both the application and the
    /// external scheme.
    #[must_use]
    pub fn with_cookie_defaults() -> Self {
        let mut schemes = Self::new(AuthenticationOptions::default());
        schemes.add_cookie(
            APPLICATION_SCHEME,
            CookieAuthenticationHandler::new(CookieOptions::application()),
        );
        schemes.add_cookie(
            EXTERNAL_SCHEME,
            CookieAuthenticationHandler::new(CookieOptions::external()),
        );
        schemes
    }

    /// Register a cookie handler for a scheme.
    ///
    /// Replaces any handler previously registered under the same name.
    pub fn add_cookie(&mut self, scheme: impl Into<String>, handler: CookieAuthenticationHandler) {
        self.handlers.insert(scheme.into(), handler);
    }

    /// The handler registered for a scheme, if any.
    #[must_use]
    pub fn handler(&self, scheme: &str) -> Option<&CookieAuthenticationHandler> {
        self.handlers.get(scheme)
    }

    /// Scheme consulted to authenticate a request.
    #[must_use]
    pub fn default_scheme(&self) -> &str {
        &self.options.default_scheme
    }

    /// Scheme used to persist a principal mid sign-in flow.
    #[must_use]
    pub fn default_sign_in_scheme(&self) -> &str {
        &self.options.default_sign_in_scheme
    }

    /// Number of registered schemes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no scheme is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_select_application_and_external() {
        let options = AuthenticationOptions::default();

        assert_eq!(options.default_scheme, APPLICATION_SCHEME);
        assert_eq!(options.default_sign_in_scheme, EXTERNAL_SCHEME);
    }

    #[test]
    fn cookie_defaults_register_both_schemes() {
        let schemes = AuthenticationSchemes::with_cookie_defaults();

        assert_eq!(schemes.len(), 2);
        assert!(schemes.handler(APPLICATION_SCHEME).is_some());
        assert!(schemes.handler(EXTERNAL_SCHEME).is_some());
    }

    #[test]
    fn re_registration_replaces_instead_of_accumulating() {
        let mut schemes = AuthenticationSchemes::with_cookie_defaults();
        let replacement =
            CookieAuthenticationHandler::new(CookieOptions::application().with_name("override"));

        schemes.add_cookie(APPLICATION_SCHEME, replacement);

        assert_eq!(schemes.len(), 2);
        let handler = schemes.handler(APPLICATION_SCHEME).map(|h| h.cookie_name());
        assert_eq!(handler, Some("override"));
    }
}
