use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::debug;

use crate::room::ConnectionId;

/// Outbound side of the transport: one queue per live connection
#[async_trait]
pub trait ConnectionManager: Send + Sync {
    async fn add_connection(&self, connection_id: ConnectionId, sender: mpsc::UnboundedSender<String>);

    async fn remove_connection(&self, connection_id: &ConnectionId);

    async fn send_to_connection(&self, connection_id: &ConnectionId, message: &str);

    async fn send_to_connections(&self, connection_ids: &[ConnectionId], message: &str);
}

pub struct InMemoryConnectionManager {
    // connection id -> sender
    connections: Arc<RwLock<HashMap<ConnectionId, mpsc::UnboundedSender<String>>>>,
}

impl Default for InMemoryConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl ConnectionManager for InMemoryConnectionManager {
    async fn add_connection(&self, connection_id: ConnectionId, sender: mpsc::UnboundedSender<String>) {
        let mut connections = self.connections.write().await;
        connections.insert(connection_id, sender);
    }

    async fn remove_connection(&self, connection_id: &ConnectionId) {
        let mut connections = self.connections.write().await;
        connections.remove(connection_id);
    }

    async fn send_to_connection(&self, connection_id: &ConnectionId, message: &str) {
        let connections = self.connections.read().await;
        if let Some(sender) = connections.get(connection_id) {
            if sender.send(message.to_string()).is_err() {
                debug!(connection_id = %connection_id, "Outbound queue closed, message dropped");
            }
        }
    }

    async fn send_to_connections(&self, connection_ids: &[ConnectionId], message: &str) {
        let connections = self.connections.read().await;
        for connection_id in connection_ids {
            if let Some(sender) = connections.get(connection_id) {
                if sender.send(message.to_string()).is_err() {
                    debug!(connection_id = %connection_id, "Outbound queue closed, message dropped");
                }
            }
        }
    }
}
