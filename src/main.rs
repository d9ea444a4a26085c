use docrelay::{router, AppState, InMemoryConnectionManager, RoomRegistry, ServerConfig};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting document relay server");

    // One registry per process, shared by every connection
    let registry = Arc::new(RoomRegistry::new());
    let connection_manager = Arc::new(InMemoryConnectionManager::new());
    let bind_addr = config.bind_addr;

    let app_state = AppState::new(registry, connection_manager, config);
    let app = router(app_state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(addr = %bind_addr, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
