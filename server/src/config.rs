//! Application configuration.
//!
//! Configuration is read once at startup from an optional TOML file plus
//! environment overrides, then treated as read-only. The one hard
//! requirement is the `DefaultConnection` connection string: resolution is a
//! pure lookup, and a missing or empty value is a startup-fatal error so a
//! misconfigured deployment never starts accepting traffic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Name of the connection string the application requires.
pub const DEFAULT_CONNECTION: &str = "DefaultConnection";

/// Environment variable pointing at the TOML configuration file.
pub const CONFIG_PATH_ENV: &str = "ROSTER_CONFIG";

/// Environment variable overriding the `DefaultConnection` entry.
pub const DEFAULT_CONNECTION_ENV: &str = "ROSTER_DEFAULT_CONNECTION";

/// Error type for configuration loading and resolution.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A required connection string is absent or empty.
    #[error("Connection string '{name}' not found.")]
    ConnectionStringMissing {
        /// The connection string that was requested.
        name: String,
    },
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development: diagnostic detail is surfaced.
    #[default]
    Development,

    /// Production: diagnostic detail is suppressed.
    Production,
}

impl Environment {
    /// Whether this is the development environment.
    #[must_use]
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g. `"127.0.0.1:3000"`).
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Cookie authentication settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthenticationConfig {
    /// Override for the application cookie name.
    pub application_cookie_name: Option<String>,

    /// Override for the external cookie name.
    pub external_cookie_name: Option<String>,

    /// Override for the application ticket lifetime, in hours.
    pub ticket_ttl_hours: Option<i64>,
}

/// Root application configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Deployment environment.
    pub environment: Environment,

    /// HTTP server settings.
    pub server: ServerConfig,

    /// Named connection strings.
    pub connection_strings: BTreeMap<String, String>,

    /// Cookie authentication settings.
    pub authentication: AuthenticationConfig,
}

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// Reads the file named by `ROSTER_CONFIG` (falling back to
    /// `roster.toml` when that file exists, and to defaults otherwise), then
    /// applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`]/[`ConfigError::Parse`] if a configuration
    /// file is named but unreadable or malformed.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_path(Path::new(&path))?,
            Err(_) => {
                let default_path = Path::new("roster.toml");
                if default_path.exists() {
                    Self::from_path(default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_connection_override(std::env::var(DEFAULT_CONNECTION_ENV).ok());
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not valid TOML.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the string is not valid TOML.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply an override for the `DefaultConnection` entry.
    ///
    /// Empty override values are ignored: an empty environment variable must
    /// not mask a configured connection string.
    pub fn apply_connection_override(&mut self, value: Option<String>) {
        if let Some(value) = value {
            if !value.is_empty() {
                self.connection_strings
                    .insert(DEFAULT_CONNECTION.to_string(), value);
            }
        }
    }

    /// Resolve a named connection string.
    ///
    /// A present-but-empty value counts as missing: there is no meaningful
    /// empty connection string, only a misconfigured one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ConnectionStringMissing`] if the name is not
    /// configured or maps to an empty string.
    pub fn connection_string(&self, name: &str) -> Result<&str, ConfigError> {
        self.connection_strings
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ConfigError::ConnectionStringMissing {
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Tests can unwrap

    use super::*;

    #[test]
    fn resolves_a_configured_connection_string() {
        let config = AppConfig::from_toml_str(
            r#"
            [connection_strings]
            DefaultConnection = "postgres://db.internal/roster"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.connection_string(DEFAULT_CONNECTION).unwrap(),
            "postgres://db.internal/roster"
        );
    }

    #[test]
    fn a_missing_connection_string_is_fatal_with_the_exact_message() {
        let config = AppConfig::default();

        let err = config.connection_string(DEFAULT_CONNECTION).unwrap_err();

        assert_eq!(
            err.to_string(),
            "Connection string 'DefaultConnection' not found."
        );
    }

    #[test]
    fn an_empty_connection_string_counts_as_missing() {
        let config = AppConfig::from_toml_str(
            r#"
            [connection_strings]
            DefaultConnection = ""
            "#,
        )
        .unwrap();

        assert!(matches!(
            config.connection_string(DEFAULT_CONNECTION),
            Err(ConfigError::ConnectionStringMissing { .. })
        ));
    }

    #[test]
    fn the_environment_defaults_to_development() {
        let config = AppConfig::default();

        assert!(config.environment.is_development());
    }

    #[test]
    fn production_is_parsed_from_toml() {
        let config = AppConfig::from_toml_str(r#"environment = "production""#).unwrap();

        assert_eq!(config.environment, Environment::Production);
    }

    #[test]
    fn the_override_replaces_the_configured_value() {
        let mut config = AppConfig::from_toml_str(
            r#"
            [connection_strings]
            DefaultConnection = "postgres://db.internal/roster"
            "#,
        )
        .unwrap();

        config.apply_connection_override(Some("postgres://other/roster".to_string()));

        assert_eq!(
            config.connection_string(DEFAULT_CONNECTION).unwrap(),
            "postgres://other/roster"
        );
    }

    #[test]
    fn an_empty_override_is_ignored() {
        let mut config = AppConfig::from_toml_str(
            r#"
            [connection_strings]
            DefaultConnection = "postgres://db.internal/roster"
            "#,
        )
        .unwrap();

        config.apply_connection_override(Some(String::new()));

        assert_eq!(
            config.connection_string(DEFAULT_CONNECTION).unwrap(),
            "postgres://db.internal/roster"
        );
    }

    #[test]
    fn unknown_names_resolve_to_their_own_message() {
        let config = AppConfig::default();

        let err = config.connection_string("ReportingConnection").unwrap_err();

        assert_eq!(
            err.to_string(),
            "Connection string 'ReportingConnection' not found."
        );
    }
}
