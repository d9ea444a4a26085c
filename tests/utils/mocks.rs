use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify, RwLock};

use docrelay::{ConnectionId, ConnectionManager};

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// Records every outbound frame per connection instead of sending it
#[derive(Clone)]
pub struct MockConnectionManager {
    sent_messages: Arc<RwLock<HashMap<ConnectionId, VecDeque<String>>>>,
    connected: Arc<RwLock<Vec<ConnectionId>>>,
}

#[allow(dead_code)]
impl MockConnectionManager {
    pub fn new() -> Self {
        Self {
            sent_messages: Arc::new(RwLock::new(HashMap::new())),
            connected: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn add_connected(&self, connection_id: &str) {
        self.connected.write().await.push(connection_id.into());
    }

    pub async fn get_messages_for(&self, connection_id: &str) -> Vec<String> {
        self.sent_messages
            .read()
            .await
            .get(&ConnectionId::from(connection_id))
            .map(|queue| queue.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Pop the oldest undelivered frame for a connection
    pub async fn consume_message_for(&self, connection_id: &str) -> Option<String> {
        self.sent_messages
            .write()
            .await
            .get_mut(&ConnectionId::from(connection_id))
            .and_then(|queue| queue.pop_front())
    }

    pub async fn clear_messages(&self) {
        self.sent_messages.write().await.clear();
    }
}

#[async_trait]
impl ConnectionManager for MockConnectionManager {
    async fn add_connection(&self, connection_id: ConnectionId, _sender: mpsc::UnboundedSender<String>) {
        self.connected.write().await.push(connection_id);
    }

    async fn remove_connection(&self, connection_id: &ConnectionId) {
        self.connected.write().await.retain(|c| c != connection_id);
    }

    async fn send_to_connection(&self, connection_id: &ConnectionId, message: &str) {
        // Only live connections receive frames, like the real manager
        if !self.connected.read().await.contains(connection_id) {
            return;
        }
        self.sent_messages
            .write()
            .await
            .entry(connection_id.clone())
            .or_default()
            .push_back(message.to_string());
    }

    async fn send_to_connections(&self, connection_ids: &[ConnectionId], message: &str) {
        for connection_id in connection_ids {
            self.send_to_connection(connection_id, message).await;
        }
    }
}

/// Wraps the recording mock and stalls the first frame of one event type
/// to one connection until released
#[derive(Clone)]
pub struct GatedConnectionManager {
    inner: MockConnectionManager,
    gated_connection: ConnectionId,
    gated_event: String,
    armed: Arc<AtomicBool>,
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

#[allow(dead_code)]
impl GatedConnectionManager {
    pub fn new(inner: MockConnectionManager, connection_id: &str, event_type: &str) -> Self {
        Self {
            inner,
            gated_connection: ConnectionId::from(connection_id),
            gated_event: format!("\"type\":\"{}\"", event_type),
            armed: Arc::new(AtomicBool::new(true)),
            entered: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }
    }

    /// Resolves once a send is parked at the gate
    pub async fn wait_until_stalled(&self) {
        self.entered.notified().await;
    }

    pub fn open(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl ConnectionManager for GatedConnectionManager {
    async fn add_connection(&self, connection_id: ConnectionId, sender: mpsc::UnboundedSender<String>) {
        self.inner.add_connection(connection_id, sender).await;
    }

    async fn remove_connection(&self, connection_id: &ConnectionId) {
        self.inner.remove_connection(connection_id).await;
    }

    async fn send_to_connection(&self, connection_id: &ConnectionId, message: &str) {
        if connection_id == &self.gated_connection
            && message.contains(&self.gated_event)
            && self.armed.swap(false, Ordering::SeqCst)
        {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.inner.send_to_connection(connection_id, message).await;
    }

    async fn send_to_connections(&self, connection_ids: &[ConnectionId], message: &str) {
        for connection_id in connection_ids {
            self.send_to_connection(connection_id, message).await;
        }
    }
}
