use thiserror::Error;

use super::models::ConnectionId;

/// Bookkeeping faults in the room registry.
///
/// None of these are expected at runtime; they are reported by
/// `RoomRegistry::verify_invariants` so tests can assert on them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Member {connection_id} in room {room_id} has no session")]
    MemberWithoutSession {
        room_id: String,
        connection_id: ConnectionId,
    },

    #[error("Member {connection_id} listed in room {member_room} but session points to {session_room}")]
    SessionRoomMismatch {
        connection_id: ConnectionId,
        session_room: String,
        member_room: String,
    },

    #[error("Session for {connection_id} points to room {room_id} without a member entry")]
    SessionWithoutMember {
        connection_id: ConnectionId,
        room_id: String,
    },

    #[error("Member {connection_id} listed more than once")]
    DuplicateMember { connection_id: ConnectionId },

    #[error("Room {0} is empty but still registered")]
    EmptyRoom(String),
}
