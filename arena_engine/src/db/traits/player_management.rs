use crate::{
    db::errors::StoreError,
    db_types::{DeviceId, Player, PlayerStatus, PlayerUpdate},
};

/// The player directory: profile, status and score for every device that has ever checked in.
///
/// This is pure data access. Every write is a single statement.
#[allow(async_fn_in_trait)]
pub trait PlayerManagement {
    /// Creates the player if it does not exist yet, otherwise updates it in place. Empty display fields in the update
    /// leave the stored values untouched. The score is never modified here.
    async fn upsert_player(&self, update: PlayerUpdate) -> Result<Player, StoreError>;

    async fn fetch_player(&self, device_id: &DeviceId) -> Result<Option<Player>, StoreError>;

    async fn count_players_with_status(&self, status: PlayerStatus) -> Result<i64, StoreError>;

    /// The waiting pool, oldest status change first.
    async fn fetch_waiting_players(&self) -> Result<Vec<Player>, StoreError>;

    /// The player with the highest score, if anyone has registered at all.
    async fn fetch_top_player(&self) -> Result<Option<Player>, StoreError>;

    /// One plus the number of players with a strictly higher score. `None` if the player is unknown.
    async fn fetch_rank(&self, device_id: &DeviceId) -> Result<Option<i64>, StoreError>;
}
