//! Developer diagnostics policy.
//!
//! Database failures carry detail an operator wants during development and
//! must not leak to clients in production. The policy is decided once at
//! composition time from the deployment environment.

use crate::config::Environment;

/// Whether error responses may carry database detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diagnostics {
    database_errors: bool,
}

impl Diagnostics {
    /// Diagnostics with database error detail surfaced.
    #[must_use]
    pub const fn enabled() -> Self {
        Self {
            database_errors: true,
        }
    }

    /// Diagnostics with database error detail suppressed.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            database_errors: false,
        }
    }

    /// The policy for a deployment environment: enabled during development,
    /// disabled in production.
    #[must_use]
    pub const fn for_environment(environment: Environment) -> Self {
        if environment.is_development() {
            Self::enabled()
        } else {
            Self::disabled()
        }
    }

    /// Whether database error detail may be included in responses.
    #[must_use]
    pub const fn database_error_detail(self) -> bool {
        self.database_errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_surfaces_database_detail() {
        let diagnostics = Diagnostics::for_environment(Environment::Development);

        assert!(diagnostics.database_error_detail());
    }

    #[test]
    fn production_suppresses_database_detail() {
        let diagnostics = Diagnostics::for_environment(Environment::Production);

        assert!(!diagnostics.database_error_detail());
    }
}
