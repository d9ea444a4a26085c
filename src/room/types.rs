use serde::{Deserialize, Serialize};

/// Public view of a live room, as listed over HTTP
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: String,
    pub user_count: usize,
    /// Document length in characters
    pub content_length: usize,
}
