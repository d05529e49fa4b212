use std::fmt::Display;

use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db::errors::StoreError,
    db_types::{
        DeviceId,
        Match,
        MatchId,
        MatchState,
        MatchStatus,
        NewMatch,
        RelayKind,
        RelayPayloads,
        ReportedOutcome,
        Resolution,
        ResultReports,
        Settlement,
    },
};

/// A match exactly as it is laid out in the `matches` table. Converted into a [`Match`] (and validated) on the way
/// out of the store.
#[derive(Debug, Clone, FromRow)]
pub struct MatchRow {
    pub id: String,
    pub player_a: String,
    pub player_b: String,
    pub first_turn: String,
    pub status: String,
    pub first_connect: Option<String>,
    pub winner: Option<String>,
    pub loser: Option<String>,
    pub relay_offer: Option<String>,
    pub relay_candidates: Option<String>,
    pub relay_answer: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn corrupt<E: Display>(id: &str, reason: E) -> StoreError {
    StoreError::CorruptMatch(id.to_string(), reason.to_string())
}

impl TryFrom<MatchRow> for Match {
    type Error = StoreError;

    fn try_from(row: MatchRow) -> Result<Self, StoreError> {
        let id = row.id.parse::<MatchId>().map_err(|e| corrupt(&row.id, e))?;
        let status = row.status.parse::<MatchStatus>().map_err(|e| corrupt(&row.id, e))?;
        let state = match status {
            MatchStatus::Init => MatchState::Init,
            MatchStatus::Wait => {
                let first_connect = row
                    .first_connect
                    .clone()
                    .ok_or_else(|| corrupt(&row.id, "waiting match has no first-connect player"))?;
                MatchState::Wait { first_connect: first_connect.into() }
            },
            MatchStatus::Start => MatchState::Start,
            MatchStatus::End => match (&row.winner, &row.loser) {
                (Some(w), Some(l)) if w != l => MatchState::End { winner: w.as_str().into(), loser: l.as_str().into() },
                _ => return Err(corrupt(&row.id, "settled match does not have two distinct results")),
            },
            MatchStatus::Error => MatchState::Error,
            MatchStatus::Invalid => MatchState::Invalid,
        };
        Ok(Match {
            id,
            player_a: row.player_a.into(),
            player_b: row.player_b.into(),
            first_turn: row.first_turn.into(),
            state,
            reports: ResultReports { winner: row.winner.map(DeviceId::from), loser: row.loser.map(DeviceId::from) },
            relay: RelayPayloads {
                offer: row.relay_offer,
                candidates: row.relay_candidates,
                answer: row.relay_answer,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn status_list(statuses: &[MatchStatus]) -> String {
    statuses.iter().map(|s| format!("'{s}'")).collect::<Vec<_>>().join(",")
}

/// Inserts a new match in the `Init` state. Not atomic on its own; embed it in a transaction with the matching player
/// updates.
pub async fn insert_match(new_match: &NewMatch, conn: &mut SqliteConnection) -> Result<Match, StoreError> {
    let row: MatchRow = sqlx::query_as(
        r#"
            INSERT INTO matches (id, player_a, player_b, first_turn, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *;
        "#,
    )
    .bind(new_match.id.as_str())
    .bind(new_match.player_a.as_str())
    .bind(new_match.player_b.as_str())
    .bind(new_match.first_turn.as_str())
    .bind(MatchStatus::Init.to_string())
    .bind(new_match.created_at)
    .fetch_one(conn)
    .await?;
    debug!("🎲️ Match {} created for {} and {}", row.id, row.player_a, row.player_b);
    row.try_into()
}

pub async fn fetch_match(match_id: &MatchId, conn: &mut SqliteConnection) -> Result<Option<Match>, StoreError> {
    let row: Option<MatchRow> =
        sqlx::query_as("SELECT * FROM matches WHERE id = $1").bind(match_id.as_str()).fetch_optional(conn).await?;
    row.map(Match::try_from).transpose()
}

#[derive(Debug, Clone, Default)]
pub struct MatchQueryFilter {
    participant: Option<DeviceId>,
    statuses: Vec<MatchStatus>,
    created_before: Option<DateTime<Utc>>,
    newest_first: bool,
    limit: Option<u32>,
}

impl MatchQueryFilter {
    pub fn with_participant(mut self, device_id: DeviceId) -> Self {
        self.participant = Some(device_id);
        self
    }

    pub fn with_status(mut self, status: MatchStatus) -> Self {
        self.statuses.push(status);
        self
    }

    pub fn with_statuses(mut self, statuses: &[MatchStatus]) -> Self {
        self.statuses.extend_from_slice(statuses);
        self
    }

    pub fn created_before(mut self, cutoff: DateTime<Utc>) -> Self {
        self.created_before = Some(cutoff);
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.newest_first = true;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.participant.is_none() && self.statuses.is_empty() && self.created_before.is_none()
    }
}

/// Fetches matches according to the criteria in the `MatchQueryFilter`.
///
/// Results are ordered by `created_at`, oldest first unless the filter asks otherwise.
pub async fn fetch_matches(query: MatchQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Match>, StoreError> {
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM matches ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(device_id) = &query.participant {
        where_clause.push("(player_a = ");
        where_clause.push_bind_unseparated(device_id.as_str().to_string());
        where_clause.push_unseparated(" OR player_b = ");
        where_clause.push_bind_unseparated(device_id.as_str().to_string());
        where_clause.push_unseparated(")");
    }
    if !query.statuses.is_empty() {
        where_clause.push(format!("status IN ({})", status_list(&query.statuses)));
    }
    if let Some(cutoff) = query.created_before {
        where_clause.push("created_at < ");
        where_clause.push_bind_unseparated(cutoff);
    }
    if query.newest_first {
        builder.push(" ORDER BY created_at DESC, id ASC");
    } else {
        builder.push(" ORDER BY created_at ASC, id ASC");
    }
    if let Some(limit) = query.limit {
        builder.push(" LIMIT ");
        builder.push_bind(i64::from(limit));
    }
    trace!("🎲️ Executing query: {}", builder.sql());
    let rows = builder.build_query_as::<MatchRow>().fetch_all(conn).await?;
    rows.into_iter().map(Match::try_from).collect()
}

/// Moves all the player's pending matches to `Error`.
pub async fn abandon_pending_matches(device_id: &DeviceId, conn: &mut SqliteConnection) -> Result<u64, StoreError> {
    let sql = format!(
        "UPDATE matches SET status = $1, updated_at = $2 WHERE (player_a = $3 OR player_b = $3) AND status IN ({})",
        status_list(&MatchStatus::PENDING)
    );
    let result = sqlx::query(&sql)
        .bind(MatchStatus::Error.to_string())
        .bind(Utc::now())
        .bind(device_id.as_str())
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn connect_first(
    match_id: &MatchId,
    device_id: &DeviceId,
    conn: &mut SqliteConnection,
) -> Result<bool, StoreError> {
    let result = sqlx::query(
        r#"
            UPDATE matches SET status = $1, first_connect = $2, updated_at = $3
            WHERE id = $4 AND status = $5 AND (player_a = $2 OR player_b = $2)
        "#,
    )
    .bind(MatchStatus::Wait.to_string())
    .bind(device_id.as_str())
    .bind(Utc::now())
    .bind(match_id.as_str())
    .bind(MatchStatus::Init.to_string())
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn connect_second(
    match_id: &MatchId,
    device_id: &DeviceId,
    conn: &mut SqliteConnection,
) -> Result<bool, StoreError> {
    let result = sqlx::query(
        r#"
            UPDATE matches SET status = $1, updated_at = $2
            WHERE id = $3 AND status = $4 AND first_connect <> $5 AND (player_a = $5 OR player_b = $5)
        "#,
    )
    .bind(MatchStatus::Start.to_string())
    .bind(Utc::now())
    .bind(match_id.as_str())
    .bind(MatchStatus::Wait.to_string())
    .bind(device_id.as_str())
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Writes the winner or loser field. The write only lands while the field is empty and the match is still active.
pub async fn record_result(
    match_id: &MatchId,
    device_id: &DeviceId,
    outcome: ReportedOutcome,
    conn: &mut SqliteConnection,
) -> Result<bool, StoreError> {
    let column = match outcome {
        ReportedOutcome::Won => "winner",
        ReportedOutcome::Lost => "loser",
    };
    let sql = format!(
        "UPDATE matches SET {column} = $1, updated_at = $2 WHERE id = $3 AND {column} IS NULL AND status IN ({})",
        status_list(&MatchStatus::ACTIVE)
    );
    let result =
        sqlx::query(&sql).bind(device_id.as_str()).bind(Utc::now()).bind(match_id.as_str()).execute(conn).await?;
    Ok(result.rows_affected() == 1)
}

pub async fn store_relay_payload(
    match_id: &MatchId,
    kind: RelayKind,
    payload: &str,
    conn: &mut SqliteConnection,
) -> Result<bool, StoreError> {
    let sql = format!(
        "UPDATE matches SET {} = $1, updated_at = $2 WHERE id = $3 AND status IN ({})",
        kind.column(),
        status_list(&MatchStatus::ACTIVE)
    );
    let result = sqlx::query(&sql).bind(payload).bind(Utc::now()).bind(match_id.as_str()).execute(conn).await?;
    Ok(result.rows_affected() == 1)
}

pub async fn force_start(match_id: &MatchId, conn: &mut SqliteConnection) -> Result<bool, StoreError> {
    let sql = format!(
        "UPDATE matches SET status = $1, updated_at = $2 WHERE id = $3 AND status IN ({})",
        status_list(&MatchStatus::PENDING)
    );
    let result = sqlx::query(&sql)
        .bind(MatchStatus::Start.to_string())
        .bind(Utc::now())
        .bind(match_id.as_str())
        .execute(conn)
        .await?;
    Ok(result.rows_affected() == 1)
}

/// Applies one settlement. The update is guarded on the status and both result fields being exactly what the
/// reconciler scanned. Returns `false` if the match has moved on since.
pub(crate) async fn apply_settlement(settlement: &Settlement, conn: &mut SqliteConnection) -> Result<bool, StoreError> {
    let (winner, loser) = match &settlement.resolution {
        Resolution::Settled { winner, loser } => (Some(winner.as_str()), Some(loser.as_str())),
        _ => (None, None),
    };
    let expected = &settlement.expected_reports;
    let result = sqlx::query(
        r#"
            UPDATE matches SET
                status = $1,
                winner = COALESCE($2, winner),
                loser = COALESCE($3, loser),
                updated_at = $4
            WHERE id = $5 AND status = $6 AND winner IS $7 AND loser IS $8
        "#,
    )
    .bind(settlement.resolution.final_status().to_string())
    .bind(winner)
    .bind(loser)
    .bind(Utc::now())
    .bind(settlement.match_id.as_str())
    .bind(settlement.expected_status.to_string())
    .bind(expected.winner.as_ref().map(|d| d.as_str()))
    .bind(expected.loser.as_ref().map(|d| d.as_str()))
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}
