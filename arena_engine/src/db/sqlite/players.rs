use chrono::Utc;
use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db::errors::StoreError,
    db_types::{DeviceId, Player, PlayerStatus, PlayerUpdate},
};

/// Inserts the player, or updates the existing record in place. `None` display fields keep what is stored.
pub async fn upsert_player(update: PlayerUpdate, conn: &mut SqliteConnection) -> Result<Player, StoreError> {
    let now = Utc::now();
    // Step the statement to completion so the autocommit is done before other connections read the player.
    let mut rows: Vec<Player> = sqlx::query_as(
        r#"
            INSERT INTO players (device_id, display_name, nation, status, created_at, updated_at)
            VALUES ($1, COALESCE($2, ''), COALESCE($3, ''), $4, $5, $5)
            ON CONFLICT (device_id) DO UPDATE SET
                display_name = COALESCE($2, players.display_name),
                nation = COALESCE($3, players.nation),
                status = excluded.status,
                updated_at = excluded.updated_at
            RETURNING *;
        "#,
    )
    .bind(update.device_id.as_str())
    .bind(update.display_name)
    .bind(update.nation)
    .bind(update.status.to_string())
    .bind(now)
    .fetch_all(conn)
    .await?;
    let player = rows.pop().ok_or(StoreError::DriverError(sqlx::Error::RowNotFound))?;
    debug!("🧑️ Player [{}] is now {}", player.device_id, player.status);
    Ok(player)
}

pub async fn fetch_player(device_id: &DeviceId, conn: &mut SqliteConnection) -> Result<Option<Player>, StoreError> {
    let player = sqlx::query_as("SELECT * FROM players WHERE device_id = $1")
        .bind(device_id.as_str())
        .fetch_one(conn)
        .await;
    match player {
        Err(sqlx::Error::RowNotFound) => Ok(None),
        Err(e) => Err(e.into()),
        Ok(p) => Ok(Some(p)),
    }
}

pub async fn count_players_with_status(status: PlayerStatus, conn: &mut SqliteConnection) -> Result<i64, StoreError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM players WHERE status = $1")
        .bind(status.to_string())
        .fetch_one(conn)
        .await?;
    Ok(count)
}

/// Players in the waiting pool, in the order they joined it.
pub async fn fetch_waiting_players(conn: &mut SqliteConnection) -> Result<Vec<Player>, StoreError> {
    let players: Vec<Player> =
        sqlx::query_as("SELECT * FROM players WHERE status = $1 ORDER BY updated_at ASC, device_id ASC")
            .bind(PlayerStatus::WaitingForMatch.to_string())
            .fetch_all(conn)
            .await?;
    trace!("🧑️ {} players in the waiting pool", players.len());
    Ok(players)
}

pub async fn fetch_top_player(conn: &mut SqliteConnection) -> Result<Option<Player>, StoreError> {
    let player = sqlx::query_as("SELECT * FROM players ORDER BY score DESC, updated_at ASC LIMIT 1")
        .fetch_optional(conn)
        .await?;
    Ok(player)
}

pub async fn fetch_rank(device_id: &DeviceId, conn: &mut SqliteConnection) -> Result<Option<i64>, StoreError> {
    let rank: Option<i64> = sqlx::query_scalar(
        r#"
            SELECT 1 + (SELECT COUNT(*) FROM players AS other WHERE other.score > me.score)
            FROM players AS me
            WHERE me.device_id = $1
        "#,
    )
    .bind(device_id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(rank)
}

/// Moves a player from the waiting pool into a match. Returns `false` if the player was not waiting.
pub(crate) async fn claim_waiting_player(device_id: &DeviceId, conn: &mut SqliteConnection) -> Result<bool, StoreError> {
    let result = sqlx::query("UPDATE players SET status = $1, updated_at = $2 WHERE device_id = $3 AND status = $4")
        .bind(PlayerStatus::InMatch.to_string())
        .bind(Utc::now())
        .bind(device_id.as_str())
        .bind(PlayerStatus::WaitingForMatch.to_string())
        .execute(conn)
        .await?;
    Ok(result.rows_affected() == 1)
}

/// Adds `points` to the player's score. Returns `false` if there is no such player.
pub(crate) async fn credit_player(
    device_id: &DeviceId,
    points: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, StoreError> {
    let result = sqlx::query("UPDATE players SET score = score + $1, updated_at = $2 WHERE device_id = $3")
        .bind(points)
        .bind(Utc::now())
        .bind(device_id.as_str())
        .execute(conn)
        .await?;
    Ok(result.rows_affected() == 1)
}
