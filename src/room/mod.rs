// Public API - what other modules can use
pub use errors::RegistryError;
pub use handlers::list_rooms;
pub use models::{ConnectionId, Member, Room, Session};
pub use registry::{Broadcast, ChatDelivery, Departure, JoinOutcome, RoomRegistry};
pub use types::RoomSummary;

// Internal modules
mod errors;
mod handlers;
pub mod models;
pub mod registry;
mod types;
