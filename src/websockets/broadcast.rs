use std::sync::Arc;
use tracing::{debug, warn};

use crate::room::ConnectionId;
use crate::websockets::{connection_manager::ConnectionManager, messages::ServerEvent};

pub struct MessageBroadcaster;

impl MessageBroadcaster {
    /// Serialize once and enqueue for every recipient
    pub async fn broadcast(
        connection_manager: &Arc<dyn ConnectionManager>,
        recipients: &[ConnectionId],
        event: &ServerEvent,
    ) {
        if recipients.is_empty() {
            debug!(event = event.name(), "No recipients for event");
            return;
        }

        match event.to_json() {
            Ok(message_json) => {
                connection_manager
                    .send_to_connections(recipients, &message_json)
                    .await;
                debug!(
                    event = event.name(),
                    recipients = recipients.len(),
                    "Event broadcast"
                );
            }
            Err(e) => {
                warn!(event = event.name(), error = %e, "Failed to serialize event");
            }
        }
    }

    pub async fn send_to(
        connection_manager: &Arc<dyn ConnectionManager>,
        recipient: &ConnectionId,
        event: &ServerEvent,
    ) {
        Self::broadcast(connection_manager, std::slice::from_ref(recipient), event).await;
    }
}
