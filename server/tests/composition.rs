//! Composition properties.
//!
//! Exercises the configuration resolver and the composition root together:
//! fail-fast on missing configuration, literal connection-string binding,
//! scheme selection, idempotence, and the permissive confirmation policy.

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect

use roster_server::{AppConfig, ConfigError, DEFAULT_CONNECTION, StartupError, compose};
use std::io::Write;

const VALID_CONFIG: &str = r#"
[connection_strings]
DefaultConnection = "postgres://db.internal/roster"
"#;

#[test]
fn an_empty_configuration_fails_before_any_service_is_built() {
    let config = AppConfig::default();

    let err = compose(&config).unwrap_err();

    assert!(matches!(
        err,
        StartupError::Config(ConfigError::ConnectionStringMissing { ref name })
            if name == DEFAULT_CONNECTION
    ));
}

#[test]
fn the_fatal_error_carries_the_descriptive_message() {
    let err = compose(&AppConfig::default()).unwrap_err();

    let message = err.to_string();
    assert_eq!(message, "Connection string 'DefaultConnection' not found.");
    assert!(message.contains("DefaultConnection"));
}

#[test]
fn an_empty_connection_string_is_treated_as_missing() {
    let config = AppConfig::from_toml_str(
        r#"
        [connection_strings]
        DefaultConnection = ""
        "#,
    )
    .unwrap();

    assert!(matches!(
        compose(&config),
        Err(StartupError::Config(ConfigError::ConnectionStringMissing { .. }))
    ));
}

#[tokio::test]
async fn composition_binds_the_literal_connection_string() {
    let config = AppConfig::from_toml_str(VALID_CONFIG).unwrap();

    let services = compose(&config).unwrap();

    assert_eq!(
        services.database().connection_string(),
        "postgres://db.internal/roster"
    );
}

#[tokio::test]
async fn the_default_schemes_are_application_and_external_never_swapped() {
    let config = AppConfig::from_toml_str(VALID_CONFIG).unwrap();

    let services = compose(&config).unwrap();
    let auth = services.authentication();

    assert_eq!(auth.default_scheme(), "roster.application");
    assert_eq!(auth.default_sign_in_scheme(), "roster.external");
    assert!(auth.handler("roster.application").is_some());
    assert!(auth.handler("roster.external").is_some());
    assert_eq!(auth.len(), 2);
}

#[tokio::test]
async fn composing_twice_yields_the_same_observable_state() {
    let config = AppConfig::from_toml_str(VALID_CONFIG).unwrap();

    let first = compose(&config).unwrap();
    let second = compose(&config).unwrap();

    assert_eq!(
        first.database().connection_string(),
        second.database().connection_string()
    );
    assert_eq!(
        first.authentication().default_scheme(),
        second.authentication().default_scheme()
    );
    assert_eq!(
        first.authentication().default_sign_in_scheme(),
        second.authentication().default_sign_in_scheme()
    );
    assert_eq!(first.authentication().len(), second.authentication().len());
    assert_eq!(first.diagnostics(), second.diagnostics());
    assert_eq!(
        first.users().options().sign_in.require_confirmed_account,
        second.users().options().sign_in.require_confirmed_account
    );
}

#[tokio::test]
async fn confirmed_accounts_are_not_required_after_composition() {
    let config = AppConfig::from_toml_str(VALID_CONFIG).unwrap();

    let services = compose(&config).unwrap();

    assert!(!services.users().options().sign_in.require_confirmed_account);
}

#[tokio::test]
async fn diagnostics_follow_the_environment() {
    let development = AppConfig::from_toml_str(VALID_CONFIG).unwrap();
    let production = AppConfig::from_toml_str(&format!("environment = \"production\"\n{VALID_CONFIG}")).unwrap();

    assert!(compose(&development).unwrap().diagnostics().database_error_detail());
    assert!(!compose(&production).unwrap().diagnostics().database_error_detail());
}

#[tokio::test]
async fn cookie_overrides_flow_into_the_handlers() {
    let config = AppConfig::from_toml_str(
        r#"
        [connection_strings]
        DefaultConnection = "postgres://db.internal/roster"

        [authentication]
        application_cookie_name = ".roster.session"
        "#,
    )
    .unwrap();

    let services = compose(&config).unwrap();
    let handler = services
        .authentication()
        .handler("roster.application")
        .unwrap();

    assert_eq!(handler.cookie_name(), ".roster.session");
}

#[test]
fn an_unparseable_connection_string_is_a_startup_error() {
    let config = AppConfig::from_toml_str(
        r#"
        [connection_strings]
        DefaultConnection = "Server=x;Database=y;"
        "#,
    )
    .unwrap();

    assert!(matches!(compose(&config), Err(StartupError::Database(_))));
}

#[test]
fn configuration_loads_from_a_toml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
        environment = "production"

        [server]
        bind_address = "0.0.0.0:8080"

        [connection_strings]
        DefaultConnection = "postgres://db.internal/roster"
        "#
    )
    .unwrap();

    let config = AppConfig::from_path(file.path()).unwrap();

    assert_eq!(config.server.bind_address, "0.0.0.0:8080");
    assert!(!config.environment.is_development());
    assert_eq!(
        config.connection_string(DEFAULT_CONNECTION).unwrap(),
        "postgres://db.internal/roster"
    );
}
