use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;

use crate::config::ServerConfig;
use crate::room::RoomRegistry;
use crate::websockets::ConnectionManager;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RoomRegistry>,
    pub connection_manager: Arc<dyn ConnectionManager>,
    pub connection_limiter: Arc<ConnectionLimiter>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(
        registry: Arc<RoomRegistry>,
        connection_manager: Arc<dyn ConnectionManager>,
        config: ServerConfig,
    ) -> Self {
        Self {
            registry,
            connection_manager,
            connection_limiter: Arc::new(ConnectionLimiter::new(config.max_connections)),
            config: Arc::new(config),
        }
    }
}

/// Counts live WebSocket connections against `max_connections` (0 = unlimited)
#[derive(Debug)]
pub struct ConnectionLimiter {
    max_connections: usize,
    active: AtomicUsize,
}

impl ConnectionLimiter {
    pub fn new(max_connections: usize) -> Self {
        Self {
            max_connections,
            active: AtomicUsize::new(0),
        }
    }

    /// Reserve a slot, or `None` when the limit is reached.
    /// The slot is released when the permit is dropped.
    pub fn try_acquire(self: &Arc<Self>) -> Option<ConnectionPermit> {
        self.active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |active| {
                (self.max_connections == 0 || active < self.max_connections).then_some(active + 1)
            })
            .ok()?;

        Some(ConnectionPermit {
            limiter: Arc::clone(self),
        })
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    pub fn max_connections(&self) -> usize {
        self.max_connections
    }
}

/// Held for the lifetime of one WebSocket connection
#[derive(Debug)]
pub struct ConnectionPermit {
    limiter: Arc<ConnectionLimiter>,
}

impl Drop for ConnectionPermit {
    fn drop(&mut self) {
        self.limiter.active.fetch_sub(1, Ordering::AcqRel);
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
