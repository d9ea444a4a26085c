use serde_json::json;

use docrelay::{ConnectionId, ConnectionManager, MessageHandler};

use super::setup::TestSetup;

// ============================================================================
// Action Helpers
// ============================================================================

#[allow(dead_code)]
impl TestSetup {
    /// Deliver a raw text frame as if it came off the socket
    pub async fn send_raw(&self, connection: &str, frame: &str) {
        self.input_handler
            .handle_message(&ConnectionId::from(connection), frame.to_string())
            .await;
    }

    pub async fn send_event(&self, connection: &str, event: serde_json::Value) {
        self.send_raw(connection, &event.to_string()).await;
    }

    /// Clear all recorded messages
    pub async fn clear_messages(&self) {
        self.mock_conn_manager.clear_messages().await;
    }

    // ============================================================================
    // Convenience Action Methods
    // ============================================================================

    pub async fn join(&self, connection: &str, room_id: &str, username: &str) {
        self.send_event(
            connection,
            json!({ "type": "join-room", "payload": { "roomId": room_id, "username": username } }),
        )
        .await;
    }

    pub async fn send_text_change(&self, connection: &str, room_id: &str, content: &str) {
        self.send_event(
            connection,
            json!({ "type": "text-change", "payload": { "roomId": room_id, "content": content } }),
        )
        .await;
    }

    pub async fn send_chat(&self, connection: &str, room_id: &str, message: &str) {
        self.send_event(
            connection,
            json!({ "type": "chat-message", "payload": { "roomId": room_id, "message": message } }),
        )
        .await;
    }

    /// Close the transport connection and run disconnect handling
    pub async fn disconnect(&self, connection: &str) {
        let connection_id = ConnectionId::from(connection);
        self.mock_conn_manager
            .remove_connection(&connection_id)
            .await;
        self.input_handler.handle_disconnect(&connection_id).await;
    }
}
