use chrono::Utc;
use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db::errors::StoreError,
    db_types::{MatchId, MatchStatus, Move},
};

/// Appends a move to the match's log. This is a single conditional insert: nothing is written unless the match is
/// `Start` at the moment the statement runs.
pub async fn append_move(match_id: &MatchId, step: Move, conn: &mut SqliteConnection) -> Result<bool, StoreError> {
    let result = sqlx::query(
        r#"
            INSERT INTO match_moves (match_id, player, sequence, step, created_at)
            SELECT id, $1, $2, $3, $4 FROM matches WHERE id = $5 AND status = $6
        "#,
    )
    .bind(step.player.as_str())
    .bind(step.sequence)
    .bind(step.step)
    .bind(Utc::now())
    .bind(match_id.as_str())
    .bind(MatchStatus::Start.to_string())
    .execute(conn)
    .await?;
    let appended = result.rows_affected() == 1;
    trace!("🎞️ Move #{} for match {match_id} appended: {appended}", step.sequence);
    Ok(appended)
}

/// The earliest move appended under `sequence`, as long as the match is `Start`.
pub async fn fetch_move(
    match_id: &MatchId,
    sequence: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Move>, StoreError> {
    let step = sqlx::query_as(
        r#"
            SELECT mm.player, mm.sequence, mm.step
            FROM match_moves AS mm JOIN matches AS m ON m.id = mm.match_id
            WHERE mm.match_id = $1 AND m.status = $2 AND mm.sequence = $3
            ORDER BY mm.id ASC
            LIMIT 1
        "#,
    )
    .bind(match_id.as_str())
    .bind(MatchStatus::Start.to_string())
    .bind(sequence)
    .fetch_one(conn)
    .await;
    match step {
        Err(sqlx::Error::RowNotFound) => Ok(None),
        Err(e) => Err(e.into()),
        Ok(m) => Ok(Some(m)),
    }
}

/// The whole move log of a match in append order, regardless of the match status.
pub async fn fetch_move_log(match_id: &MatchId, conn: &mut SqliteConnection) -> Result<Vec<Move>, StoreError> {
    let moves = sqlx::query_as("SELECT player, sequence, step FROM match_moves WHERE match_id = $1 ORDER BY id ASC")
        .bind(match_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(moves)
}
