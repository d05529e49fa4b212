use chrono::{DateTime, Utc};

use crate::{
    db::errors::StoreError,
    db_types::{DeviceId, Match, MatchId, Move, RelayKind, ReportedOutcome},
};

/// The match store. One record per match, plus its append-only move log.
///
/// Every mutating method is a single conditional statement that carries its own transition guard. The `bool` results
/// report whether the guarded write landed; `false` means the record was not in the state the guard requires (or does
/// not exist), and callers re-read the match to find out why.
#[allow(async_fn_in_trait)]
pub trait MatchManagement {
    async fn fetch_match(&self, match_id: &MatchId) -> Result<Option<Match>, StoreError>;

    /// The most recent `Init` or `Wait` match that the player takes part in.
    async fn fetch_pending_match_for(&self, device_id: &DeviceId) -> Result<Option<Match>, StoreError>;

    /// Moves every `Init` or `Wait` match of the player to `Error`. Returns the number of matches abandoned.
    async fn abandon_pending_matches(&self, device_id: &DeviceId) -> Result<u64, StoreError>;

    /// `Init → Wait`, recording `device_id` as the first participant to connect.
    async fn connect_first(&self, match_id: &MatchId, device_id: &DeviceId) -> Result<bool, StoreError>;

    /// `Wait → Start`, provided `device_id` is not the participant that connected first.
    async fn connect_second(&self, match_id: &MatchId, device_id: &DeviceId) -> Result<bool, StoreError>;

    /// Writes the winner or loser field, provided it is still empty and the match is not terminal.
    async fn record_result(
        &self,
        match_id: &MatchId,
        device_id: &DeviceId,
        outcome: ReportedOutcome,
    ) -> Result<bool, StoreError>;

    /// Appends a move to the log, provided the match is `Start`.
    async fn append_move(&self, match_id: &MatchId, step: Move) -> Result<bool, StoreError>;

    /// The earliest move appended under `sequence`, provided the match is `Start`.
    async fn fetch_move(&self, match_id: &MatchId, sequence: i64) -> Result<Option<Move>, StoreError>;

    /// Stores a rendezvous payload, provided the match is not terminal.
    async fn store_relay_payload(&self, match_id: &MatchId, kind: RelayKind, payload: &str) -> Result<bool, StoreError>;

    /// `Init | Wait → Start`, used when the answering side of the rendezvous has picked up its answer.
    async fn force_start(&self, match_id: &MatchId) -> Result<bool, StoreError>;

    /// `Init`, `Wait` and `Start` matches created strictly before `cutoff`, oldest first.
    async fn fetch_stale_matches(&self, cutoff: DateTime<Utc>) -> Result<Vec<Match>, StoreError>;

    /// Settled (`End`) matches the player took part in, newest first.
    async fn fetch_settled_matches_for(&self, device_id: &DeviceId, limit: u32) -> Result<Vec<Match>, StoreError>;
}
