//! Roster server entry point.
//!
//! Loads configuration, composes services, and serves the HTTP API. A
//! missing `DefaultConnection` aborts startup with a descriptive fatal error
//! before any socket is bound; storage connectivity problems are deferred to
//! first use.

use roster_server::{AppConfig, compose, router};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    let services = match compose(&config) {
        Ok(services) => services,
        Err(e) => {
            tracing::error!("failed to compose services: {e}");
            std::process::exit(1);
        }
    };

    // Best effort at startup; an unreachable database is not fatal here —
    // storage errors surface on first use.
    if let Err(e) = services.database().migrate().await {
        tracing::warn!("migrations not applied: {e}");
    }

    let app = router(services);
    let listener = tokio::net::TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!("listening on {}", config.server.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
