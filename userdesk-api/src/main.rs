//! # UserDesk API Server
//!
//! User-account microservice: CRUD over a single relational table,
//! delegating credentials to an external identity provider and profile
//! images to an external object store.
//!
//! ## Architecture
//!
//! The API server is built with Axum and provides:
//! - Administrative user CRUD behind an ADMIN role gate
//! - Self-service profile, email, and password endpoints
//! - Bearer authentication against the provider's key-set endpoint
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p userdesk-api
//! ```

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use userdesk_api::app::{build_router, AppState};
use userdesk_api::config::Config;
use userdesk_api::services::users::{PgUserStore, UserService};
use userdesk_shared::auth::jwt::TokenVerifier;
use userdesk_shared::db::migrations::run_migrations;
use userdesk_shared::db::pool::{create_pool, DatabaseConfig as PoolConfig};
use userdesk_shared::identity::HttpIdentityProvider;
use userdesk_shared::storage::{HttpObjectStore, StorageConfig as StoreConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "userdesk_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "UserDesk API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = create_pool(PoolConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;
    run_migrations(&pool).await?;

    // External collaborators, constructed once and passed explicitly
    let identity = HttpIdentityProvider::new(
        config.identity.api_url.clone(),
        config.identity.api_key.clone(),
    );
    let storage = HttpObjectStore::new(StoreConfig {
        base_url: config.storage.base_url.clone(),
        api_key: config.storage.api_key.clone(),
        bucket: config.storage.bucket.clone(),
        folder: config.storage.folder.clone(),
    });
    let verifier = TokenVerifier::new(
        config.identity.jwks_url.clone(),
        config.identity.issuer.clone(),
    );

    let users = UserService::new(PgUserStore::new(pool.clone()), identity, storage);

    let bind_address = config.bind_address();
    let state = AppState::new(pool, config, users, verifier);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete, exiting...");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
