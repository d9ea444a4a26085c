use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque handle for one live transport connection
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Generates a fresh random connection id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConnectionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ConnectionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A room's public record of one joined connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    #[serde(rename = "id")]
    pub connection_id: ConnectionId,
    pub username: String,
}

impl Member {
    pub fn new(connection_id: ConnectionId, username: impl Into<String>) -> Self {
        Self {
            connection_id,
            username: username.into(),
        }
    }
}

/// Binding of a live connection to a room and a display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub room_id: String,
    pub username: String,
}

/// Shared document and member list for one room id
#[derive(Debug, Clone, Default)]
pub struct Room {
    /// Full document text, replaced wholesale on every change
    pub content: String,
    /// Members in join order
    pub users: Vec<Member>,
}

impl Room {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn has_member(&self, connection_id: &ConnectionId) -> bool {
        self.users.iter().any(|m| &m.connection_id == connection_id)
    }

    pub fn add_member(&mut self, member: Member) {
        self.users.push(member);
    }

    /// Remove every entry for the connection, returning whether anything was removed
    pub fn remove_member(&mut self, connection_id: &ConnectionId) -> bool {
        let before = self.users.len();
        self.users.retain(|m| &m.connection_id != connection_id);
        self.users.len() != before
    }

    /// Connection ids of all members, optionally leaving one out
    pub fn recipients_except(&self, excluded: Option<&ConnectionId>) -> Vec<ConnectionId> {
        self.users
            .iter()
            .filter(|m| Some(&m.connection_id) != excluded)
            .map(|m| m.connection_id.clone())
            .collect()
    }
}
