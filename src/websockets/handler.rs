use async_trait::async_trait;
use axum::{
    extract::{ws::rejection::WebSocketUpgradeRejection, State, WebSocketUpgrade},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::room::{ConnectionId, RoomRegistry};
use crate::shared::{AppError, AppState, ConnectionPermit};
use crate::websockets::broadcast::MessageBroadcaster;
use crate::websockets::connection_manager::ConnectionManager;
use crate::websockets::messages::{
    ChatMessagePayload, ClientEvent, JoinRoomPayload, ServerEvent, TextChangePayload,
};

use super::socket::{Connection, MessageHandler};

/// Routes parsed client events into the registry and fans out the results
pub struct WebsocketReceiveHandler {
    registry: Arc<RoomRegistry>,
    connection_manager: Arc<dyn ConnectionManager>,
}

impl WebsocketReceiveHandler {
    pub fn new(registry: Arc<RoomRegistry>, connection_manager: Arc<dyn ConnectionManager>) -> Self {
        Self {
            registry,
            connection_manager,
        }
    }

    async fn handle_join_room(&self, connection_id: &ConnectionId, payload: JoinRoomPayload) {
        let connection_manager = &self.connection_manager;
        self.registry
            .join_room_then(
                connection_id,
                &payload.room_id,
                &payload.username,
                |outcome| async move {
                    MessageBroadcaster::send_to(
                        connection_manager,
                        connection_id,
                        &ServerEvent::document_state(outcome.content.clone()),
                    )
                    .await;

                    let recipients = outcome.recipients();
                    MessageBroadcaster::broadcast(
                        connection_manager,
                        &recipients,
                        &ServerEvent::user_joined(outcome.users, outcome.joined_user),
                    )
                    .await;
                },
            )
            .await;
    }

    async fn handle_text_change(&self, connection_id: &ConnectionId, payload: TextChangePayload) {
        let connection_manager = &self.connection_manager;
        let TextChangePayload { room_id, content } = payload;
        let event = ServerEvent::text_change(content.clone(), connection_id.clone());

        self.registry
            .apply_text_change_then(connection_id, &room_id, &content, |broadcast| async move {
                MessageBroadcaster::broadcast(connection_manager, &broadcast.recipients, &event)
                    .await;
            })
            .await;
    }

    async fn handle_chat_message(&self, connection_id: &ConnectionId, payload: ChatMessagePayload) {
        let connection_manager = &self.connection_manager;
        let ChatMessagePayload { room_id, message } = payload;

        self.registry
            .chat_message_then(connection_id, &room_id, |delivery| async move {
                MessageBroadcaster::broadcast(
                    connection_manager,
                    &delivery.recipients,
                    &ServerEvent::chat_message(message, delivery.sender),
                )
                .await;
            })
            .await;
    }
}

#[async_trait]
impl MessageHandler for WebsocketReceiveHandler {
    async fn handle_message(&self, connection_id: &ConnectionId, message: String) {
        let event = match ClientEvent::parse(&message) {
            Ok(event) => event,
            Err(e) => {
                warn!(
                    connection_id = %connection_id,
                    error = %e,
                    "Failed to parse WebSocket message"
                );
                return;
            }
        };

        debug!(
            connection_id = %connection_id,
            event = event.name(),
            "Received event"
        );

        match event {
            ClientEvent::JoinRoom(payload) => self.handle_join_room(connection_id, payload).await,
            ClientEvent::TextChange(payload) => {
                self.handle_text_change(connection_id, payload).await
            }
            ClientEvent::ChatMessage(payload) => {
                self.handle_chat_message(connection_id, payload).await
            }
        }
    }

    async fn handle_disconnect(&self, connection_id: &ConnectionId) {
        let connection_manager = &self.connection_manager;
        let departed = self
            .registry
            .disconnect_then(connection_id, |departure| async move {
                let recipients = departure.recipients();
                MessageBroadcaster::broadcast(
                    connection_manager,
                    &recipients,
                    &ServerEvent::user_left(
                        departure.member.connection_id,
                        departure.member.username,
                        departure.users,
                    ),
                )
                .await;
            })
            .await;

        if departed.is_none() {
            debug!(connection_id = %connection_id, "Disconnect without session");
        }
    }
}

/// WebSocket endpoint
/// GET /ws
///
/// A connection slot is reserved before the upgrade headers are validated
/// and held until the socket closes.
pub async fn websocket_handler(
    State(app_state): State<AppState>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, AppError> {
    let Some(permit) = app_state.connection_limiter.try_acquire() else {
        warn!(
            max_connections = app_state.connection_limiter.max_connections(),
            "Connection limit reached, rejecting WebSocket"
        );
        return Err(AppError::Unavailable("Too many connections".to_string()));
    };

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            warn!(error = %rejection, "Invalid WebSocket upgrade request");
            return Ok(rejection.into_response());
        }
    };

    let connection_id = ConnectionId::generate();
    info!(
        connection_id = %connection_id,
        active_connections = app_state.connection_limiter.active(),
        "WebSocket connection requested"
    );

    Ok(ws.on_upgrade(move |socket| {
        handle_websocket_connection(socket, connection_id, app_state, permit)
    }))
}

/// Handle the upgraded WebSocket connection
async fn handle_websocket_connection(
    socket: axum::extract::ws::WebSocket,
    connection_id: ConnectionId,
    app_state: AppState,
    _permit: ConnectionPermit,
) {
    info!(connection_id = %connection_id, "WebSocket connection established");

    // Create the outbound channel (app -> client)
    let (outbound_sender, outbound_receiver) = mpsc::unbounded_channel::<String>();

    app_state
        .connection_manager
        .add_connection(connection_id.clone(), outbound_sender)
        .await;

    let message_handler = Arc::new(WebsocketReceiveHandler::new(
        app_state.registry.clone(),
        app_state.connection_manager.clone(),
    ));

    let connection = Connection::new(
        connection_id.clone(),
        Box::new(socket),
        outbound_receiver,
        message_handler.clone(),
    );

    // Run the connection until disconnect
    match connection.run().await {
        Ok(()) => {
            info!(connection_id = %connection_id, "WebSocket connection closed cleanly");
        }
        Err(e) => {
            warn!(
                connection_id = %connection_id,
                error = %e,
                "WebSocket connection error"
            );
        }
    }

    // Cleanup: stop routing to this connection, then release its room seat
    app_state
        .connection_manager
        .remove_connection(&connection_id)
        .await;

    message_handler.handle_disconnect(&connection_id).await;

    info!(connection_id = %connection_id, "WebSocket disconnect handled");
}
