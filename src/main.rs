//! rfid-gateway server entry point.
//!
//! Starts the Axum HTTP server with the WebSocket relay, status endpoints,
//! and static monitor page.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use rfid_gateway::api;
use rfid_gateway::app_state::AppState;
use rfid_gateway::config::GatewayConfig;
use rfid_gateway::domain::{ConnectionRegistry, liveness};
use rfid_gateway::persistence::TagStore;
use rfid_gateway::persistence::memory::MemoryTagStore;
use rfid_gateway::persistence::postgres::PgTagStore;
use rfid_gateway::service::TagService;
use rfid_gateway::shutdown;
use rfid_gateway::ws::handler::ws_handler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = GatewayConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting rfid-gateway");

    // Select the tag store backend
    let store: Arc<dyn TagStore> = if config.persistence_enabled {
        let pg = PgTagStore::connect(&config)?;
        if let Err(err) = pg.migrate().await {
            tracing::warn!(%err, "tag store migration failed, continuing degraded");
        }
        Arc::new(pg)
    } else {
        tracing::warn!("persistence disabled, tag names are in-memory only");
        Arc::new(MemoryTagStore::default())
    };

    // Warm the name cache once; a failure degrades to an empty cache
    let tags = Arc::new(TagService::new(store));
    tags.load_all().await;

    // Build the relay core
    let registry = Arc::new(ConnectionRegistry::new());
    let liveness_task = liveness::spawn(
        Arc::clone(&registry),
        Duration::from_secs(config.probe_interval_secs),
    );

    let app_state = AppState {
        registry: Arc::clone(&registry),
        tags,
        admin_token: config.admin_token.clone(),
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .fallback_service(ServeDir::new(&config.static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::graceful(
            registry,
            liveness_task,
            Duration::from_secs(config.shutdown_grace_secs),
        ))
        .await?;

    Ok(())
}
