use chrono::Utc;
use serde::{Deserialize, Serialize};
use strum_macros::IntoStaticStr;

use crate::room::{ConnectionId, Member};

/// Client -> Server events.
///
/// Frames look like `{"type": "join-room", "payload": {...}}`; anything that
/// does not match one of these shapes is rejected at the socket boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, IntoStaticStr)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ClientEvent {
    JoinRoom(JoinRoomPayload),
    TextChange(TextChangePayload),
    ChatMessage(ChatMessagePayload),
}

impl ClientEvent {
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Wire name of the event, for logging
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomPayload {
    pub room_id: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextChangePayload {
    pub room_id: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessagePayload {
    pub room_id: String,
    pub message: String,
}

/// Server -> Client events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, IntoStaticStr)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ServerEvent {
    DocumentState(DocumentStatePayload),
    UserJoined(UserJoinedPayload),
    TextChange(TextChangeBroadcastPayload),
    ChatMessage(ChatBroadcastPayload),
    UserLeft(UserLeftPayload),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentStatePayload {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserJoinedPayload {
    pub users: Vec<Member>,
    pub joined_user: Member,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChangeBroadcastPayload {
    pub content: String,
    /// Connection id of the writer
    pub sender: ConnectionId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatBroadcastPayload {
    pub text: String,
    /// Username from the sender's session
    pub sender: String,
    /// Epoch milliseconds
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLeftPayload {
    pub user_id: ConnectionId,
    pub username: String,
    pub users: Vec<Member>,
}

/// Helper functions for creating messages
impl ServerEvent {
    /// Create a document-state message
    pub fn document_state(content: String) -> Self {
        Self::DocumentState(DocumentStatePayload { content })
    }

    /// Create a user-joined message
    pub fn user_joined(users: Vec<Member>, joined_user: Member) -> Self {
        Self::UserJoined(UserJoinedPayload { users, joined_user })
    }

    /// Create a text-change message
    pub fn text_change(content: String, sender: ConnectionId) -> Self {
        Self::TextChange(TextChangeBroadcastPayload { content, sender })
    }

    /// Create a chat-message stamped with the current time
    pub fn chat_message(text: String, sender: String) -> Self {
        Self::chat_message_at(text, sender, Utc::now().timestamp_millis())
    }

    pub fn chat_message_at(text: String, sender: String, timestamp: i64) -> Self {
        Self::ChatMessage(ChatBroadcastPayload {
            text,
            sender,
            timestamp,
        })
    }

    /// Create a user-left message
    pub fn user_left(user_id: ConnectionId, username: String, users: Vec<Member>) -> Self {
        Self::UserLeft(UserLeftPayload {
            user_id,
            username,
            users,
        })
    }

    pub fn name(&self) -> &'static str {
        self.into()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
