use std::{fmt::Debug, time::Duration};

use chrono::{DateTime, Utc};
use log::*;
use sqlx::SqlitePool;

use super::{matches, matches::MatchQueryFilter, moves, new_pool, players};
use crate::{
    db::{
        errors::StoreError,
        traits::{ArenaDatabase, MatchManagement, PlayerManagement},
    },
    db_types::{
        DeviceId,
        Match,
        MatchId,
        MatchStatus,
        Move,
        NewMatch,
        Player,
        PlayerStatus,
        PlayerUpdate,
        RelayKind,
        ReportedOutcome,
        Settlement,
    },
};

const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        SqliteDatabase::new_with_timeout(url, max_connections, DEFAULT_STORE_TIMEOUT).await
    }

    /// Creates a new database API object. `timeout` bounds every wait on the pool or on a locked database.
    pub async fn new_with_timeout(url: &str, max_connections: u32, timeout: Duration) -> Result<Self, StoreError> {
        let pool = new_pool(url, max_connections, timeout).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date. Safe to call on every start-up.
    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete for {}", self.url);
        Ok(())
    }

    /// The full move log of a match, in append order, whatever the state of the match.
    pub async fn fetch_move_log(&self, match_id: &MatchId) -> Result<Vec<Move>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        moves::fetch_move_log(match_id, &mut conn).await
    }

    pub async fn fetch_matches(&self, query: MatchQueryFilter) -> Result<Vec<Match>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        matches::fetch_matches(query, &mut conn).await
    }

    pub async fn close(&self) {
        self.pool.close().await
    }
}

impl PlayerManagement for SqliteDatabase {
    async fn upsert_player(&self, update: PlayerUpdate) -> Result<Player, StoreError> {
        let mut conn = self.pool.acquire().await?;
        players::upsert_player(update, &mut conn).await
    }

    async fn fetch_player(&self, device_id: &DeviceId) -> Result<Option<Player>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        players::fetch_player(device_id, &mut conn).await
    }

    async fn count_players_with_status(&self, status: PlayerStatus) -> Result<i64, StoreError> {
        let mut conn = self.pool.acquire().await?;
        players::count_players_with_status(status, &mut conn).await
    }

    async fn fetch_waiting_players(&self) -> Result<Vec<Player>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        players::fetch_waiting_players(&mut conn).await
    }

    async fn fetch_top_player(&self) -> Result<Option<Player>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        players::fetch_top_player(&mut conn).await
    }

    async fn fetch_rank(&self, device_id: &DeviceId) -> Result<Option<i64>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        players::fetch_rank(device_id, &mut conn).await
    }
}

impl MatchManagement for SqliteDatabase {
    async fn fetch_match(&self, match_id: &MatchId) -> Result<Option<Match>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        matches::fetch_match(match_id, &mut conn).await
    }

    async fn fetch_pending_match_for(&self, device_id: &DeviceId) -> Result<Option<Match>, StoreError> {
        let query = MatchQueryFilter::default()
            .with_participant(device_id.clone())
            .with_statuses(&MatchStatus::PENDING)
            .newest_first()
            .with_limit(1);
        let mut conn = self.pool.acquire().await?;
        let mut found = matches::fetch_matches(query, &mut conn).await?;
        Ok(found.pop())
    }

    async fn abandon_pending_matches(&self, device_id: &DeviceId) -> Result<u64, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let abandoned = matches::abandon_pending_matches(device_id, &mut conn).await?;
        if abandoned > 0 {
            debug!("🗃️ {abandoned} pending matches of {device_id} were abandoned");
        }
        Ok(abandoned)
    }

    async fn connect_first(&self, match_id: &MatchId, device_id: &DeviceId) -> Result<bool, StoreError> {
        let mut conn = self.pool.acquire().await?;
        matches::connect_first(match_id, device_id, &mut conn).await
    }

    async fn connect_second(&self, match_id: &MatchId, device_id: &DeviceId) -> Result<bool, StoreError> {
        let mut conn = self.pool.acquire().await?;
        matches::connect_second(match_id, device_id, &mut conn).await
    }

    async fn record_result(
        &self,
        match_id: &MatchId,
        device_id: &DeviceId,
        outcome: ReportedOutcome,
    ) -> Result<bool, StoreError> {
        let mut conn = self.pool.acquire().await?;
        matches::record_result(match_id, device_id, outcome, &mut conn).await
    }

    async fn append_move(&self, match_id: &MatchId, step: Move) -> Result<bool, StoreError> {
        let mut conn = self.pool.acquire().await?;
        moves::append_move(match_id, step, &mut conn).await
    }

    async fn fetch_move(&self, match_id: &MatchId, sequence: i64) -> Result<Option<Move>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        moves::fetch_move(match_id, sequence, &mut conn).await
    }

    async fn store_relay_payload(&self, match_id: &MatchId, kind: RelayKind, payload: &str) -> Result<bool, StoreError> {
        let mut conn = self.pool.acquire().await?;
        matches::store_relay_payload(match_id, kind, payload, &mut conn).await
    }

    async fn force_start(&self, match_id: &MatchId) -> Result<bool, StoreError> {
        let mut conn = self.pool.acquire().await?;
        matches::force_start(match_id, &mut conn).await
    }

    async fn fetch_stale_matches(&self, cutoff: DateTime<Utc>) -> Result<Vec<Match>, StoreError> {
        let query = MatchQueryFilter::default().with_statuses(&MatchStatus::ACTIVE).created_before(cutoff);
        let mut conn = self.pool.acquire().await?;
        matches::fetch_matches(query, &mut conn).await
    }

    async fn fetch_settled_matches_for(&self, device_id: &DeviceId, limit: u32) -> Result<Vec<Match>, StoreError> {
        let query = MatchQueryFilter::default()
            .with_participant(device_id.clone())
            .with_status(MatchStatus::End)
            .newest_first()
            .with_limit(limit);
        let mut conn = self.pool.acquire().await?;
        matches::fetch_matches(query, &mut conn).await
    }
}

impl ArenaDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn create_matches(&self, new_matches: &[NewMatch]) -> Result<Vec<Match>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(new_matches.len());
        for new_match in new_matches {
            for player in [&new_match.player_a, &new_match.player_b] {
                if !players::claim_waiting_player(player, &mut tx).await? {
                    warn!("🗃️ {player} left the waiting pool before match {} was written. Rolling back.", new_match.id);
                    return Err(StoreError::PlayerNotWaiting(player.clone()));
                }
            }
            created.push(matches::insert_match(new_match, &mut tx).await?);
        }
        tx.commit().await?;
        debug!("🗃️ {} new matches committed", created.len());
        Ok(created)
    }

    async fn settle_matches(&self, settlements: &[Settlement]) -> Result<usize, StoreError> {
        let mut tx = self.pool.begin().await?;
        for settlement in settlements {
            if !matches::apply_settlement(settlement, &mut tx).await? {
                warn!("🗃️ Match {} changed since it was scanned. Rolling back.", settlement.match_id);
                return Err(StoreError::MatchChanged(settlement.match_id.clone()));
            }
            if let Some(winner) = settlement.resolution.credited_player() {
                if !players::credit_player(winner, 1, &mut tx).await? {
                    warn!("🗃️ Winner {winner} of match {} has no player record. Rolling back.", settlement.match_id);
                    return Err(StoreError::PlayerNotFound(winner.clone()));
                }
            }
        }
        tx.commit().await?;
        debug!("🗃️ {} settlements committed", settlements.len());
        Ok(settlements.len())
    }
}
