use std::{collections::HashMap, fmt::Debug};

use log::*;

use crate::{
    arena_api::{
        errors::ArenaApiError,
        rank_objects::{MatchHistoryEntry, RankSummary, MAX_MATCH_HISTORY},
    },
    db::traits::{MatchManagement, PlayerManagement},
    db_types::{DeviceId, MatchState, Player, PlayerStatus, PlayerUpdate},
};

/// `PlayerApi` manages the player directory on behalf of clients: check-ins, status changes, and the leaderboard view.
pub struct PlayerApi<B> {
    db: B,
}

impl<B> Debug for PlayerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PlayerApi")
    }
}

impl<B> PlayerApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> PlayerApi<B>
where B: PlayerManagement + MatchManagement
{
    /// Creates or updates the player record.
    ///
    /// A player that puts itself (back) into the waiting pool abandons any match it was paired into but never started.
    /// Those matches are moved to `Error` before the status change is written.
    pub async fn upsert_player_status(&self, update: PlayerUpdate) -> Result<Player, ArenaApiError> {
        if update.status == PlayerStatus::WaitingForMatch {
            let abandoned = self.db.abandon_pending_matches(&update.device_id).await?;
            if abandoned > 0 {
                info!("🧑️ {} rejoined the waiting pool and abandoned {abandoned} pending matches", update.device_id);
            }
        }
        let player = self.db.upsert_player(update).await?;
        Ok(player)
    }

    pub async fn fetch_player(&self, device_id: &DeviceId) -> Result<Option<Player>, ArenaApiError> {
        let player = self.db.fetch_player(device_id).await?;
        Ok(player)
    }

    pub async fn count_online_players(&self) -> Result<i64, ArenaApiError> {
        let count = self.db.count_players_with_status(PlayerStatus::Online).await?;
        Ok(count)
    }

    /// The leaderboard view for one player: the top player, the caller's own rank, and the caller's most recent
    /// settled matches (at most `match_limit`, capped at [`MAX_MATCH_HISTORY`]).
    pub async fn rank_summary(&self, device_id: &DeviceId, match_limit: i64) -> Result<RankSummary, ArenaApiError> {
        if match_limit < 1 {
            return Err(ArenaApiError::Validation(format!("match_limit must be at least 1, but was {match_limit}")));
        }
        let limit = match_limit.min(MAX_MATCH_HISTORY) as u32;
        let top_player = self.db.fetch_top_player().await?;
        let your_rank = self.db.fetch_rank(device_id).await?;
        let history = self.db.fetch_settled_matches_for(device_id, limit).await?;
        let mut enemies: HashMap<DeviceId, Option<Player>> = HashMap::new();
        let mut latest_matches = Vec::with_capacity(history.len());
        for game in history {
            let Some(enemy_id) = game.opponent_of(device_id).cloned() else {
                warn!("🧑️ Settled match {} was returned for {device_id}, who did not play in it", game.id);
                continue;
            };
            if !enemies.contains_key(&enemy_id) {
                let enemy = self.db.fetch_player(&enemy_id).await?;
                enemies.insert(enemy_id.clone(), enemy);
            }
            let (enemy_name, enemy_nation) = enemies
                .get(&enemy_id)
                .and_then(|p| p.as_ref())
                .map(|p| (p.display_name.clone(), p.nation.clone()))
                .unwrap_or_default();
            let win = matches!(&game.state, MatchState::End { winner, .. } if winner == device_id);
            latest_matches.push(MatchHistoryEntry {
                match_id: game.id,
                match_date: game.created_at,
                enemy_id,
                enemy_name,
                enemy_nation,
                win,
            });
        }
        trace!("🧑️ Rank summary for {device_id}: rank {your_rank:?}, {} recent matches", latest_matches.len());
        Ok(RankSummary { top_player, your_rank, latest_matches })
    }
}
