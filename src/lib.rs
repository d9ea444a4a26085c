// Library crate for the document relay server
// This file exposes the public API for integration tests

pub mod config;
pub mod room;
pub mod shared;
pub mod websockets;

use axum::{http::Uri, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

// Re-export commonly used types for easier access in tests
pub use config::{ConfigError, ServerConfig};
pub use room::{ConnectionId, Member, RoomRegistry};
pub use shared::{AppError, AppState};
pub use websockets::{
    ClientEvent, ConnectionManager, InMemoryConnectionManager, MessageHandler, ServerEvent,
    WebsocketReceiveHandler,
};

/// Build the HTTP router: WebSocket relay plus the small read-only API
pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/rooms", get(room::list_rooms))
        .route("/ws", get(websockets::websocket_handler))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}
