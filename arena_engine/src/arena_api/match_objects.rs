use serde::Serialize;

use crate::db_types::{DeviceId, MatchId, RelayKind};

/// Handed to a participant once both sides have passed the ready-check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadyMatch {
    pub match_id: MatchId,
    /// Whether the caller makes the first move.
    pub first_turn: bool,
    pub enemy_id: DeviceId,
    pub enemy_name: String,
    pub enemy_nation: String,
}

/// The current content of one rendezvous slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelayMessage {
    pub match_id: MatchId,
    pub kind: RelayKind,
    pub payload: Option<String>,
}
