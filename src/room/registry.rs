use std::collections::{HashMap, HashSet};
use std::future::{self, Future};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::errors::RegistryError;
use super::models::{ConnectionId, Member, Room, Session};
use super::types::RoomSummary;

/// Result of a connection joining a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    pub room_id: String,
    /// Current document, for the joining connection only
    pub content: String,
    /// Full member list after the join, joiner included
    pub users: Vec<Member>,
    pub joined_user: Member,
    /// Room the connection was evicted from, if it was in one
    pub previous_room: Option<String>,
}

impl JoinOutcome {
    pub fn recipients(&self) -> Vec<ConnectionId> {
        self.users.iter().map(|m| m.connection_id.clone()).collect()
    }
}

/// Recipients of a document replacement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Broadcast {
    pub room_id: String,
    pub recipients: Vec<ConnectionId>,
}

/// Recipients of a chat line and the sender's session name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatDelivery {
    pub room_id: String,
    pub sender: String,
    pub recipients: Vec<ConnectionId>,
}

/// Result of a connection going away
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub room_id: String,
    pub member: Member,
    /// Remaining members, empty when the room was deleted
    pub users: Vec<Member>,
    pub room_deleted: bool,
}

impl Departure {
    pub fn recipients(&self) -> Vec<ConnectionId> {
        self.users.iter().map(|m| m.connection_id.clone()).collect()
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    rooms: HashMap<String, Room>,
    sessions: HashMap<ConnectionId, Session>,
}

impl RegistryState {
    /// Drop the connection's member entry from its current room.
    /// The room is deleted when it empties, unless it is `keep_room`.
    fn evict(&mut self, connection_id: &ConnectionId, keep_room: Option<&str>) -> Option<String> {
        let session = self.sessions.remove(connection_id)?;
        if let Some(room) = self.rooms.get_mut(&session.room_id) {
            if !room.remove_member(connection_id) {
                warn!(
                    connection_id = %connection_id,
                    room_id = %session.room_id,
                    "Session had no member entry in its room"
                );
            }
            if room.is_empty() && keep_room != Some(session.room_id.as_str()) {
                self.rooms.remove(&session.room_id);
                info!(room_id = %session.room_id, "Room is now empty, deleting");
            }
        }
        Some(session.room_id)
    }

    fn join(&mut self, connection_id: &ConnectionId, room_id: &str, username: &str) -> JoinOutcome {
        let previous_room = self.evict(connection_id, Some(room_id));
        if let Some(previous) = &previous_room {
            debug!(
                connection_id = %connection_id,
                previous_room = %previous,
                "Connection left previous room"
            );
        }

        let room = self.rooms.entry(room_id.to_string()).or_insert_with(|| {
            info!(room_id = %room_id, "Creating room");
            Room::new()
        });

        let joined_user = Member::new(connection_id.clone(), username);
        room.add_member(joined_user.clone());

        let content = room.content.clone();
        let users = room.users.clone();

        self.sessions.insert(
            connection_id.clone(),
            Session {
                room_id: room_id.to_string(),
                username: username.to_string(),
            },
        );

        info!(
            connection_id = %connection_id,
            room_id = %room_id,
            username = %username,
            user_count = users.len(),
            "User joined room"
        );

        JoinOutcome {
            room_id: room_id.to_string(),
            content,
            users,
            joined_user,
            previous_room,
        }
    }

    fn text_change(
        &mut self,
        connection_id: &ConnectionId,
        room_id: &str,
        content: &str,
    ) -> Option<Broadcast> {
        let Some(room) = self.rooms.get_mut(room_id) else {
            debug!(room_id = %room_id, "Text change for unknown room dropped");
            return None;
        };

        room.content = content.to_string();

        Some(Broadcast {
            room_id: room_id.to_string(),
            recipients: room.recipients_except(Some(connection_id)),
        })
    }

    fn chat(&self, connection_id: &ConnectionId, room_id: &str) -> Option<ChatDelivery> {
        let Some(session) = self.sessions.get(connection_id) else {
            debug!(connection_id = %connection_id, "Chat from connection without session dropped");
            return None;
        };

        let room = self.rooms.get(room_id)?;

        Some(ChatDelivery {
            room_id: room_id.to_string(),
            sender: session.username.clone(),
            recipients: room.recipients_except(None),
        })
    }

    fn leave(&mut self, connection_id: &ConnectionId) -> Option<Departure> {
        let session = self.sessions.remove(connection_id)?;
        let member = Member::new(connection_id.clone(), session.username.clone());

        let Some(room) = self.rooms.get_mut(&session.room_id) else {
            debug!(
                connection_id = %connection_id,
                room_id = %session.room_id,
                "Session pointed at a missing room"
            );
            return None;
        };

        if !room.remove_member(connection_id) {
            warn!(
                connection_id = %connection_id,
                room_id = %session.room_id,
                "Session had no member entry in its room"
            );
        }
        let users = room.users.clone();
        let room_deleted = users.is_empty();

        if room_deleted {
            self.rooms.remove(&session.room_id);
            info!(room_id = %session.room_id, "Room is now empty, deleting");
        }

        info!(
            connection_id = %connection_id,
            room_id = %session.room_id,
            username = %session.username,
            remaining = users.len(),
            "User left room"
        );

        Some(Departure {
            room_id: session.room_id,
            member,
            users,
            room_deleted,
        })
    }
}

/// Process-wide coordinator for room membership, documents and sessions.
///
/// Every operation takes the single state lock once, so operations are
/// linearized in arrival order. The `*_then` variants run the caller's
/// fan-out before the lock is released, so frames are queued to each
/// connection in the same order the registry applied the operations.
/// Fan-out must only enqueue; it must not wait on other connections.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    state: Mutex<RegistryState>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join `room_id` as `username`, leaving whatever room the connection was in
    pub async fn join_room(
        &self,
        connection_id: &ConnectionId,
        room_id: &str,
        username: &str,
    ) -> JoinOutcome {
        self.join_room_then(connection_id, room_id, username, future::ready)
            .await
    }

    /// Join, then run `deliver` on the outcome while still holding the lock
    #[instrument(skip(self, deliver))]
    pub async fn join_room_then<F, Fut>(
        &self,
        connection_id: &ConnectionId,
        room_id: &str,
        username: &str,
        deliver: F,
    ) -> Fut::Output
    where
        F: FnOnce(JoinOutcome) -> Fut,
        Fut: Future,
    {
        let mut state = self.state.lock().await;
        let outcome = state.join(connection_id, room_id, username);
        deliver(outcome).await
    }

    /// Replace the room's document. Returns `None` when the room does not exist.
    pub async fn apply_text_change(
        &self,
        connection_id: &ConnectionId,
        room_id: &str,
        content: &str,
    ) -> Option<Broadcast> {
        self.apply_text_change_then(connection_id, room_id, content, future::ready)
            .await
    }

    /// `deliver` is only called when the room exists
    #[instrument(skip(self, content, deliver), fields(content_len = content.len()))]
    pub async fn apply_text_change_then<F, Fut>(
        &self,
        connection_id: &ConnectionId,
        room_id: &str,
        content: &str,
        deliver: F,
    ) -> Option<Fut::Output>
    where
        F: FnOnce(Broadcast) -> Fut,
        Fut: Future,
    {
        let mut state = self.state.lock().await;
        let broadcast = state.text_change(connection_id, room_id, content)?;
        Some(deliver(broadcast).await)
    }

    /// Resolve a chat line to its recipients.
    ///
    /// The sender name comes from the connection's session; `room_id` only
    /// selects who receives it. Returns `None` for connections without a
    /// session and for rooms that do not exist.
    pub async fn chat_message(
        &self,
        connection_id: &ConnectionId,
        room_id: &str,
    ) -> Option<ChatDelivery> {
        self.chat_message_then(connection_id, room_id, future::ready)
            .await
    }

    #[instrument(skip(self, deliver))]
    pub async fn chat_message_then<F, Fut>(
        &self,
        connection_id: &ConnectionId,
        room_id: &str,
        deliver: F,
    ) -> Option<Fut::Output>
    where
        F: FnOnce(ChatDelivery) -> Fut,
        Fut: Future,
    {
        let state = self.state.lock().await;
        let delivery = state.chat(connection_id, room_id)?;
        Some(deliver(delivery).await)
    }

    /// Tear down the connection's session. Returns `None` if it never joined.
    pub async fn disconnect(&self, connection_id: &ConnectionId) -> Option<Departure> {
        self.disconnect_then(connection_id, future::ready).await
    }

    #[instrument(skip(self, deliver))]
    pub async fn disconnect_then<F, Fut>(
        &self,
        connection_id: &ConnectionId,
        deliver: F,
    ) -> Option<Fut::Output>
    where
        F: FnOnce(Departure) -> Fut,
        Fut: Future,
    {
        let mut state = self.state.lock().await;
        let departure = state.leave(connection_id)?;
        Some(deliver(departure).await)
    }

    pub async fn room_content(&self, room_id: &str) -> Option<String> {
        let state = self.state.lock().await;
        state.rooms.get(room_id).map(|room| room.content.clone())
    }

    pub async fn members(&self, room_id: &str) -> Option<Vec<Member>> {
        let state = self.state.lock().await;
        state.rooms.get(room_id).map(|room| room.users.clone())
    }

    pub async fn session(&self, connection_id: &ConnectionId) -> Option<Session> {
        let state = self.state.lock().await;
        state.sessions.get(connection_id).cloned()
    }

    pub async fn room_count(&self) -> usize {
        self.state.lock().await.rooms.len()
    }

    /// Snapshot of every live room, sorted by id
    pub async fn list_rooms(&self) -> Vec<RoomSummary> {
        let state = self.state.lock().await;
        let mut rooms: Vec<RoomSummary> = state
            .rooms
            .iter()
            .map(|(id, room)| RoomSummary {
                id: id.clone(),
                user_count: room.users.len(),
                content_length: room.content.chars().count(),
            })
            .collect();
        rooms.sort_by(|a, b| a.id.cmp(&b.id));
        rooms
    }

    /// Check that rooms and sessions agree with each other
    pub async fn verify_invariants(&self) -> Result<(), RegistryError> {
        let state = self.state.lock().await;
        let mut seen: HashSet<&ConnectionId> = HashSet::new();

        for (room_id, room) in &state.rooms {
            if room.is_empty() {
                return Err(RegistryError::EmptyRoom(room_id.clone()));
            }

            for member in &room.users {
                if !seen.insert(&member.connection_id) {
                    return Err(RegistryError::DuplicateMember {
                        connection_id: member.connection_id.clone(),
                    });
                }

                match state.sessions.get(&member.connection_id) {
                    None => {
                        return Err(RegistryError::MemberWithoutSession {
                            room_id: room_id.clone(),
                            connection_id: member.connection_id.clone(),
                        })
                    }
                    Some(session) if &session.room_id != room_id => {
                        return Err(RegistryError::SessionRoomMismatch {
                            connection_id: member.connection_id.clone(),
                            session_room: session.room_id.clone(),
                            member_room: room_id.clone(),
                        })
                    }
                    Some(_) => {}
                }
            }
        }

        for (connection_id, session) in &state.sessions {
            let listed = state
                .rooms
                .get(&session.room_id)
                .is_some_and(|room| room.has_member(connection_id));
            if !listed {
                return Err(RegistryError::SessionWithoutMember {
                    connection_id: connection_id.clone(),
                    room_id: session.room_id.clone(),
                });
            }
        }

        Ok(())
    }
}
