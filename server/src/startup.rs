//! Service composition.
//!
//! The composition root: given resolved configuration, build the
//! application's capability handles once, in dependency order, and return
//! them as one immutable [`Services`] bundle. There is no ambient service
//! container — everything downstream receives its collaborators by
//! constructor injection from here.

use crate::config::{AppConfig, ConfigError, DEFAULT_CONNECTION};
use crate::diagnostics::Diagnostics;
use roster_data::{Database, People};
use roster_identity::{
    APPLICATION_SCHEME, Argon2PasswordHasher, AuthenticationOptions, AuthenticationSchemes,
    CookieAuthenticationHandler, CookieOptions, EXTERNAL_SCHEME, IdentityOptions,
    PostgresUserStore, SignInManager, TokenProviders, UserManager, UserStore,
};
use std::sync::Arc;
use thiserror::Error;

/// Error raised while composing services.
///
/// Composition has no independent failure path: it propagates configuration
/// resolution errors, and persistence errors only if the connection string
/// cannot even be parsed. Connectivity and schema failures are deferred to
/// first use.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Configuration resolution failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The persistence context could not be created from the connection
    /// string.
    #[error(transparent)]
    Database(#[from] roster_data::DataError),
}

/// The composed application capabilities.
///
/// Immutable after composition; everything here is cheaply cloneable and
/// shares the single connection-string-derived persistence context.
#[derive(Clone)]
pub struct Services<S = PostgresUserStore>
where
    S: UserStore + Clone,
{
    diagnostics: Diagnostics,
    schemes: Arc<AuthenticationSchemes>,
    database: Database,
    users: UserManager<S>,
    sign_in: SignInManager<S>,
    tokens: TokenProviders<S>,
}

impl<S> Services<S>
where
    S: UserStore + Clone,
{
    /// Assemble a service bundle from already-built parts.
    ///
    /// [`compose`] is the production wiring; this constructor is the seam
    /// that lets tests swap the storage capability.
    #[must_use]
    pub fn new(
        diagnostics: Diagnostics,
        schemes: Arc<AuthenticationSchemes>,
        database: Database,
        users: UserManager<S>,
        sign_in: SignInManager<S>,
        tokens: TokenProviders<S>,
    ) -> Self {
        Self {
            diagnostics,
            schemes,
            database,
            users,
            sign_in,
            tokens,
        }
    }

    /// The authentication capability: scheme selection and cookie handlers.
    #[must_use]
    pub fn authentication(&self) -> &AuthenticationSchemes {
        &self.schemes
    }

    /// The persistence capability.
    #[must_use]
    pub const fn database(&self) -> &Database {
        &self.database
    }

    /// The `Person` collection.
    #[must_use]
    pub fn people(&self) -> People {
        self.database.people()
    }

    /// The identity-management capability.
    #[must_use]
    pub const fn users(&self) -> &UserManager<S> {
        &self.users
    }

    /// The sign-in capability.
    #[must_use]
    pub const fn sign_in(&self) -> &SignInManager<S> {
        &self.sign_in
    }

    /// The default token providers.
    #[must_use]
    pub const fn token_providers(&self) -> &TokenProviders<S> {
        &self.tokens
    }

    /// The diagnostics policy in effect.
    #[must_use]
    pub const fn diagnostics(&self) -> Diagnostics {
        self.diagnostics
    }
}

impl<S> std::fmt::Debug for Services<S>
where
    S: UserStore + Clone,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("diagnostics", &self.diagnostics)
            .field("schemes", &self.schemes)
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}

fn application_cookie_options(config: &AppConfig) -> CookieOptions {
    let mut options = CookieOptions::application();

    if let Some(name) = &config.authentication.application_cookie_name {
        options = options.with_name(name.clone());
    }
    if let Some(hours) = config.authentication.ticket_ttl_hours {
        options = options.with_ticket_ttl(chrono::Duration::hours(hours));
    }

    options
}

fn external_cookie_options(config: &AppConfig) -> CookieOptions {
    let mut options = CookieOptions::external();

    if let Some(name) = &config.authentication.external_cookie_name {
        options = options.with_name(name.clone());
    }

    options
}

/// Compose the application services from configuration.
///
/// Resolution happens first: a missing `DefaultConnection` aborts before any
/// service is built, so no partial registration is ever observable. The
/// remaining steps run in dependency order — schemes, persistence context,
/// diagnostics, identity core bound to that context, sign-in manager, token
/// providers.
///
/// # Errors
///
/// Returns [`StartupError::Config`] if the connection string is missing, and
/// [`StartupError::Database`] if it cannot be parsed. All other storage
/// errors surface at first use.
pub fn compose(config: &AppConfig) -> Result<Services, StartupError> {
    let connection_string = config.connection_string(DEFAULT_CONNECTION)?;

    // Authentication scheme pair: application for authenticated requests,
    // external for the transient principal during provider callbacks.
    let mut schemes = AuthenticationSchemes::new(AuthenticationOptions::default());
    schemes.add_cookie(
        APPLICATION_SCHEME,
        CookieAuthenticationHandler::new(application_cookie_options(config)),
    );
    schemes.add_cookie(
        EXTERNAL_SCHEME,
        CookieAuthenticationHandler::new(external_cookie_options(config)),
    );
    let schemes = Arc::new(schemes);

    let database = Database::connect(connection_string)?;

    let diagnostics = Diagnostics::for_environment(config.environment);

    // Identity core for ApplicationUser. Sign-in stays permissive: accounts
    // may authenticate without a confirmation step.
    let options = IdentityOptions::default();

    // Identity reads and writes route through the shared context's pool.
    let store = PostgresUserStore::new(database.pool().clone());
    let users = UserManager::new(store.clone(), Arc::new(Argon2PasswordHasher), options);

    let sign_in = SignInManager::new(users.clone(), Arc::clone(&schemes));

    let tokens = TokenProviders::new(store);

    tracing::info!(
        environment = ?config.environment,
        default_scheme = schemes.default_scheme(),
        "services composed"
    );

    Ok(Services::new(
        diagnostics,
        schemes,
        database,
        users,
        sign_in,
        tokens,
    ))
}
