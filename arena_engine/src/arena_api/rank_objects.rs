use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db_types::{DeviceId, MatchId, Player};

pub const MAX_MATCH_HISTORY: i64 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankSummary {
    pub top_player: Option<Player>,
    /// `None` when the caller has never registered.
    pub your_rank: Option<i64>,
    pub latest_matches: Vec<MatchHistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchHistoryEntry {
    pub match_id: MatchId,
    pub match_date: DateTime<Utc>,
    pub enemy_id: DeviceId,
    pub enemy_name: String,
    pub enemy_nation: String,
    pub win: bool,
}
