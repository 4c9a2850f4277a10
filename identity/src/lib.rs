//! # Roster Identity
//!
//! Cookie authentication schemes and the user identity core for the Roster
//! application.
//!
//! ## Features
//!
//! - **Scheme pair**: an application cookie scheme for authenticated
//!   sessions and an external cookie scheme for provider callbacks
//! - **Swappable storage**: identity persistence behind the [`UserStore`]
//!   trait, with `PostgreSQL` and in-memory implementations
//! - **Credential validation**: Argon2id password hashing behind the
//!   [`PasswordHasher`] seam
//! - **One-time tokens**: purpose-bound, single-use tokens for password
//!   reset, email confirmation, and two-factor flows
//!
//! ## Architecture
//!
//! The crate is composed at startup into a set of immutable capability
//! handles:
//!
//! ```text
//! AuthenticationSchemes ── cookie handlers per scheme name
//! UserManager<S>        ── user CRUD + credential validation over a UserStore
//! SignInManager<S>      ── credential validation + cookie issuance
//! TokenProviders<S>     ── purpose-bound one-time tokens
//! ```
//!
//! ## Example: password sign-in
//!
//! ```
//! use roster_identity::{
//!     AuthenticationSchemes, Argon2PasswordHasher, IdentityOptions,
//!     InMemoryUserStore, SignInManager, UserManager,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> roster_identity::Result<()> {
//! let users = UserManager::new(
//!     InMemoryUserStore::new(),
//!     Arc::new(Argon2PasswordHasher::default()),
//!     IdentityOptions::default(),
//! );
//! let sign_in = SignInManager::new(users.clone(), Arc::new(AuthenticationSchemes::with_cookie_defaults()));
//!
//! users.create("ada@example.com", "correct horse battery staple").await?;
//! let cookie = sign_in.password_sign_in("ada@example.com", "correct horse battery staple").await?;
//! let ticket = sign_in.authenticate(&cookie.value)?;
//! assert_eq!(ticket.email, "ada@example.com");
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod cookie;
pub mod error;
pub mod hasher;
pub mod manager;
pub mod options;
pub mod schemes;
pub mod signin;
pub mod store;
pub mod tokens;
pub mod user;

// Re-export main types for convenience
pub use cookie::{AuthenticationTicket, CookieAuthenticationHandler, IssuedCookie};
pub use error::{IdentityError, Result};
pub use hasher::{Argon2PasswordHasher, PasswordHasher};
pub use manager::UserManager;
pub use options::{IdentityOptions, SignInOptions};
pub use schemes::{
    APPLICATION_SCHEME, AuthenticationOptions, AuthenticationSchemes, CookieOptions,
    EXTERNAL_SCHEME,
};
pub use signin::SignInManager;
pub use store::{StoredToken, UserStore};
pub use store::postgres::PostgresUserStore;
#[cfg(feature = "test-utils")]
pub use store::memory::InMemoryUserStore;
pub use tokens::{TokenProviders, TokenPurpose};
pub use user::{ApplicationUser, ExternalLogin, UserClaim, UserId};
