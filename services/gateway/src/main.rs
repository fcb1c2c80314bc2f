mod config;
mod error;
mod handlers;
mod models;
mod router;
mod state;

use config::GatewayConfig;
use market_data::AppContext;
use market_data::config::CoreConfig;
use market_data::reference::WorldTable;
use market_data::store::{MemoryStore, SharedStore, TimeoutStore};
use router::create_router;
use state::AppState;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let config = GatewayConfig::from_env();
    tracing::info!(
        version = market_data::SERVICE_VERSION,
        bind_addr = %config.bind_addr,
        store_timeout_ms = config.store_timeout_ms,
        "Starting market board gateway"
    );

    let worlds = match &config.worlds_path {
        Some(path) => WorldTable::load(path).await?,
        None => {
            tracing::warn!("MARKET_WORLDS_PATH unset, world names and datacenters will not resolve");
            WorldTable::default()
        }
    };
    tracing::info!(worlds = worlds.len(), "World table loaded");

    let memory = match &config.data_path {
        Some(path) => MemoryStore::open(path).await?,
        None => MemoryStore::new(),
    };
    let store = Arc::new(TimeoutStore::new(memory, config.store_timeout()));
    let shared: SharedStore = store.clone();

    let ctx = AppContext::new(shared, worlds, CoreConfig::default());
    for (name, api_key) in &config.trusted_sources {
        if ctx.sources().register(api_key, name).await? {
            tracing::info!(source = %name, "Registered trusted source");
        }
    }

    let state = AppState::new(ctx);
    let app = create_router(state.clone(), config.upload_limit_bytes);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Listening on {}", config.bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(path) = &config.data_path {
        store.inner().flush(path).await?;
    }
    let ingestion = state.ctx.ingestion();
    tracing::info!(
        accepted = ingestion.uploads_accepted(),
        rejected = ingestion.uploads_rejected(),
        "Gateway stopped"
    );

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
