use arena_engine::{
    db_types::{DeviceId, Match, MatchId, Move, Player, PlayerStatus, PlayerUpdate, RelayKind, ReportedOutcome},
    MatchManagement,
    PlayerManagement,
    StoreError,
};
use chrono::{DateTime, Utc};
use mockall::mock;

mock! {
    pub ArenaStore {}
    impl PlayerManagement for ArenaStore {
        async fn upsert_player(&self, update: PlayerUpdate) -> Result<Player, StoreError>;
        async fn fetch_player(&self, device_id: &DeviceId) -> Result<Option<Player>, StoreError>;
        async fn count_players_with_status(&self, status: PlayerStatus) -> Result<i64, StoreError>;
        async fn fetch_waiting_players(&self) -> Result<Vec<Player>, StoreError>;
        async fn fetch_top_player(&self) -> Result<Option<Player>, StoreError>;
        async fn fetch_rank(&self, device_id: &DeviceId) -> Result<Option<i64>, StoreError>;
    }
    impl MatchManagement for ArenaStore {
        async fn fetch_match(&self, match_id: &MatchId) -> Result<Option<Match>, StoreError>;
        async fn fetch_pending_match_for(&self, device_id: &DeviceId) -> Result<Option<Match>, StoreError>;
        async fn abandon_pending_matches(&self, device_id: &DeviceId) -> Result<u64, StoreError>;
        async fn connect_first(&self, match_id: &MatchId, device_id: &DeviceId) -> Result<bool, StoreError>;
        async fn connect_second(&self, match_id: &MatchId, device_id: &DeviceId) -> Result<bool, StoreError>;
        async fn record_result(&self, match_id: &MatchId, device_id: &DeviceId, outcome: ReportedOutcome) -> Result<bool, StoreError>;
        async fn append_move(&self, match_id: &MatchId, step: Move) -> Result<bool, StoreError>;
        async fn fetch_move(&self, match_id: &MatchId, sequence: i64) -> Result<Option<Move>, StoreError>;
        async fn store_relay_payload(&self, match_id: &MatchId, kind: RelayKind, payload: &str) -> Result<bool, StoreError>;
        async fn force_start(&self, match_id: &MatchId) -> Result<bool, StoreError>;
        async fn fetch_stale_matches(&self, cutoff: DateTime<Utc>) -> Result<Vec<Match>, StoreError>;
        async fn fetch_settled_matches_for(&self, device_id: &DeviceId, limit: u32) -> Result<Vec<Match>, StoreError>;
    }
}
