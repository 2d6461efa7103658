//! guildboard server binary
//!
//! Loads configuration, initializes tracing, connects the Redis-backed
//! ephemeral store, composes the OAuth flow coordinator, and serves the auth
//! routes.

use std::sync::Arc;

use anyhow::Context;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use guildboard::auth::{CsrfStateManager, SessionExchangeManager};
use guildboard::config::GuildboardConfig;
use guildboard::handlers;
use guildboard::oauth::{
    HttpProviderClient, OAuthFlowCoordinator, OpaqueSessionMinter, ProviderClient,
    ProviderIdentityResolver,
};
use guildboard::state::AppState;
use guildboard::store::{EphemeralStore, RedisEphemeralStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    guildboard::observability::init()?;

    let config = Arc::new(GuildboardConfig::load().context("loading configuration")?);

    let store: Arc<dyn EphemeralStore> = Arc::new(
        RedisEphemeralStore::connect(&config.store.url, config.store.op_timeout())
            .context("connecting coordination store")?,
    );

    let provider: Arc<dyn ProviderClient> = Arc::new(
        HttpProviderClient::new(config.provider.clone()).context("building provider client")?,
    );

    let coordinator = OAuthFlowCoordinator::new(
        CsrfStateManager::new(
            store.clone(),
            config.auth.state_ttl(),
            config.auth.token_bytes,
        ),
        SessionExchangeManager::new(
            store,
            config.auth.session_ttl(),
            config.auth.token_bytes,
        ),
        provider.clone(),
        Arc::new(ProviderIdentityResolver::new(provider)),
        Arc::new(OpaqueSessionMinter),
        config.service.frontend_complete_url.clone(),
    );

    let state = AppState::new(config.clone(), Arc::new(coordinator));
    #[allow(deprecated)]
    let app = handlers::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(std::time::Duration::from_secs(30)));

    let addr = format!("{}:{}", config.service.host, config.service.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    tracing::info!(%addr, service = %config.service.name, "guildboard listening");
    axum::serve(listener, app).await.context("serving")?;

    Ok(())
}
