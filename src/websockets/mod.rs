// Public API
pub use broadcast::MessageBroadcaster;
pub use connection_manager::{ConnectionManager, InMemoryConnectionManager};
pub use handler::{websocket_handler, WebsocketReceiveHandler};
pub use messages::{
    ChatBroadcastPayload, ChatMessagePayload, ClientEvent, DocumentStatePayload, JoinRoomPayload,
    ServerEvent, TextChangeBroadcastPayload, TextChangePayload, UserJoinedPayload,
    UserLeftPayload,
};
pub use socket::{Connection, MessageHandler, SocketError, SocketWrapper};

// Internal modules
mod broadcast;
mod connection_manager;
mod handler;
mod messages;
mod socket;
