use std::fmt::Debug;

use log::*;

use crate::{
    arena_api::{
        errors::ArenaApiError,
        match_objects::{ReadyMatch, RelayMessage},
    },
    db::traits::{MatchManagement, PlayerManagement},
    db_types::{DeviceId, Match, MatchId, Move, RelayKind, ReportedOutcome},
    match_state::{self, ReadyCheck},
};

/// How many times a ready-check re-reads the match after losing a race on the conditional update.
const READY_CHECK_ATTEMPTS: usize = 3;

/// `MatchFlowApi` drives a match from the participants' side: the ready-check handshake, move exchange, result
/// reports and the rendezvous relay.
///
/// Every method is a thin wrapper around one guarded write in the match store. When the write does not land, the match
/// is re-read to find out why, and the reason is reported as an [`ArenaApiError`].
pub struct MatchFlowApi<B> {
    db: B,
}

impl<B> Debug for MatchFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MatchFlowApi")
    }
}

impl<B> MatchFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> MatchFlowApi<B>
where B: MatchManagement + PlayerManagement
{
    pub async fn fetch_match(&self, match_id: &MatchId) -> Result<Match, ArenaApiError> {
        self.db.fetch_match(match_id).await?.ok_or_else(|| ArenaApiError::MatchNotFound(match_id.clone()))
    }

    /// The id of the player's pending (`Init` or `Wait`) match, if the matchmaker has paired them.
    pub async fn find_active_match(&self, device_id: &DeviceId) -> Result<Option<MatchId>, ArenaApiError> {
        let game = self.db.fetch_pending_match_for(device_id).await?;
        Ok(game.map(|g| g.id))
    }

    /// Performs the ready-check handshake for `device_id`.
    ///
    /// Returns `Some` only once both participants have checked in and the match is `Start`. Until then the result is
    /// `None` and the caller is expected to poll again.
    pub async fn ready_check(
        &self,
        device_id: &DeviceId,
        match_id: &MatchId,
    ) -> Result<Option<ReadyMatch>, ArenaApiError> {
        for attempt in 1..=READY_CHECK_ATTEMPTS {
            let game = self.fetch_match(match_id).await?;
            let step = match_state::ready_check(&game, device_id)
                .map_err(|e| ArenaApiError::from_transition(match_id, e))?;
            let landed = match step {
                ReadyCheck::Connect => self.db.connect_first(match_id, device_id).await?,
                ReadyCheck::Begin => self.db.connect_second(match_id, device_id).await?,
                ReadyCheck::StillWaiting => {
                    trace!("🤝️ {device_id} is still waiting for an opponent in match {match_id}");
                    return Ok(None);
                },
                ReadyCheck::AlreadyStarted => return self.ready_match(&game, device_id).await.map(Some),
            };
            if landed {
                debug!("🤝️ Match {match_id} is now {} after ready-check by {device_id}", step.resulting_status());
                return match step {
                    ReadyCheck::Begin => self.ready_match(&game, device_id).await.map(Some),
                    _ => Ok(None),
                };
            }
            debug!("🤝️ Ready-check by {device_id} on match {match_id} lost a race (attempt {attempt}). Re-reading.");
        }
        Ok(None)
    }

    async fn ready_match(&self, game: &Match, device_id: &DeviceId) -> Result<ReadyMatch, ArenaApiError> {
        let enemy_id = game
            .opponent_of(device_id)
            .cloned()
            .ok_or_else(|| ArenaApiError::NotAParticipant(device_id.clone(), game.id.clone()))?;
        let enemy = self.db.fetch_player(&enemy_id).await?;
        let (enemy_name, enemy_nation) = enemy.map(|p| (p.display_name, p.nation)).unwrap_or_default();
        Ok(ReadyMatch {
            match_id: game.id.clone(),
            first_turn: &game.first_turn == device_id,
            enemy_id,
            enemy_name,
            enemy_nation,
        })
    }

    /// Records the caller's own result for the match. Each of the winner and loser fields is written at most once; the
    /// match status is never changed here. Settlement happens in the reconciler.
    pub async fn report_result(&self, match_id: &MatchId, device_id: &DeviceId, won: bool) -> Result<(), ArenaApiError> {
        let outcome = ReportedOutcome::from_won(won);
        if self.db.record_result(match_id, device_id, outcome).await? {
            info!("🏁️ {device_id} reported itself as the {outcome} of match {match_id}");
            return Ok(());
        }
        let game = self.fetch_match(match_id).await?;
        match_state::check_report(&game, outcome).map_err(|e| ArenaApiError::from_transition(match_id, e))?;
        // The guarded write failed although the re-read says it should have landed; another report won the race.
        Err(ArenaApiError::ResultAlreadyReported(match_id.clone(), outcome))
    }

    /// Appends a move to the match's log. Only allowed while the match is `Start`.
    pub async fn append_move(
        &self,
        match_id: &MatchId,
        device_id: &DeviceId,
        sequence: i64,
        step: String,
    ) -> Result<(), ArenaApiError> {
        let step = Move::new(device_id.clone(), sequence, step);
        if self.db.append_move(match_id, step).await? {
            trace!("🎞️ {device_id} sent move #{sequence} in match {match_id}");
            return Ok(());
        }
        let game = self.fetch_match(match_id).await?;
        match_state::check_move(&game).map_err(|e| ArenaApiError::from_transition(match_id, e))?;
        Err(ArenaApiError::MatchNotStarted(match_id.clone()))
    }

    /// The move stored under `sequence`. `None` means the opponent has not sent it yet.
    pub async fn read_move(&self, match_id: &MatchId, sequence: i64) -> Result<Option<Move>, ArenaApiError> {
        let step = self.db.fetch_move(match_id, sequence).await?;
        Ok(step)
    }

    /// Stores a session-setup payload in one of the match's rendezvous slots.
    pub async fn relay_send(
        &self,
        match_id: &MatchId,
        device_id: &DeviceId,
        kind: RelayKind,
        payload: &str,
    ) -> Result<(), ArenaApiError> {
        if self.db.store_relay_payload(match_id, kind, payload).await? {
            trace!("📡️ {device_id} stored a {kind} payload for match {match_id}");
            return Ok(());
        }
        let game = self.fetch_match(match_id).await?;
        Err(ArenaApiError::MatchTerminal(match_id.clone(), game.status()))
    }

    /// Reads one of the match's rendezvous slots. Picking up the answer completes the rendezvous, so a pending match
    /// is started.
    pub async fn relay_receive(
        &self,
        match_id: &MatchId,
        device_id: &DeviceId,
        kind: RelayKind,
    ) -> Result<RelayMessage, ArenaApiError> {
        let game = self.fetch_match(match_id).await?;
        let payload = game.relay.get(kind).map(String::from);
        if kind == RelayKind::Answer && game.state.is_pending() {
            if self.db.force_start(match_id).await? {
                info!("📡️ {device_id} picked up the answer for match {match_id}. The match has started.");
            } else {
                debug!("📡️ Match {match_id} was no longer pending when {device_id} picked up the answer");
            }
        }
        trace!("📡️ {device_id} read the {kind} slot of match {match_id}: {}", payload.is_some());
        Ok(RelayMessage { match_id: match_id.clone(), kind, payload })
    }
}
