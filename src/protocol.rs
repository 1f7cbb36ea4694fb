use serde::{Deserialize, Serialize};

use crate::board::Color;

pub type RoomId = u64;

/// A move sent by a player: `move` is `"rc_rc"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveMessage {
    pub room_id: RoomId,
    pub from_color: Color,
    #[serde(rename = "move")]
    pub mv: String,
}

/// Broadcast to both players after every committed move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardUpdate {
    pub board_status: String,
    /// Absent once the game is over.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_turn_color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<Color>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub room_id: RoomId,
    pub board_status: String,
    pub active_color: Option<Color>,
    pub winner: Option<Color>,
    /// Accepted moves, oldest first.
    pub moves: Vec<String>,
}
