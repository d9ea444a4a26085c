use axum::{extract::State, Json};
use tracing::{info, instrument};

use super::types::RoomSummary;
use crate::shared::{AppError, AppState};

/// HTTP handler for listing all live rooms
///
/// GET /rooms
#[instrument(name = "list_rooms", skip(state))]
pub async fn list_rooms(State(state): State<AppState>) -> Result<Json<Vec<RoomSummary>>, AppError> {
    let rooms = state.registry.list_rooms().await;

    info!(room_count = rooms.len(), "Rooms listed successfully");

    Ok(Json(rooms))
}
