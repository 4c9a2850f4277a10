//! # Roster Server
//!
//! Configuration resolution, service composition, and the HTTP surface for
//! the Roster application.
//!
//! Startup is strictly sequential and runs exactly once per process:
//!
//! 1. [`config::AppConfig::load`] resolves configuration and the
//!    `DefaultConnection` connection string — failing fast if it is absent.
//! 2. [`startup::compose`] builds the immutable [`startup::Services`]
//!    bundle: cookie authentication schemes, the shared persistence
//!    context, the identity core bound to it, the sign-in manager, and the
//!    default token providers.
//! 3. [`http::router`] mounts the capabilities behind an axum router.

#![forbid(unsafe_code)]

pub mod config;
pub mod diagnostics;
pub mod http;
pub mod startup;

// Re-export key types for convenience
pub use config::{AppConfig, ConfigError, DEFAULT_CONNECTION, Environment};
pub use diagnostics::Diagnostics;
pub use http::router;
pub use startup::{Services, StartupError, compose};
