//! Pure match lifecycle rules.
//!
//! Nothing in this module touches storage. The gateway and the reconciliation driver use these functions to decide
//! which guarded write to issue; the store then enforces the same guard in the `WHERE` clause of that write, so a
//! decision made here on a stale read simply fails to land.
use thiserror::Error;

use crate::db_types::{DeviceId, Match, MatchState, MatchStatus, ReportedOutcome, Resolution, Settlement};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("The match is already over ({0})")]
    Terminal(MatchStatus),
    #[error("{0} is not a participant in this match")]
    NotAParticipant(DeviceId),
    #[error("The {0} of this match has already been reported")]
    AlreadyReported(ReportedOutcome),
    #[error("The match has not started")]
    NotStarted,
}

/// What a ready-check should do to the match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadyCheck {
    /// `Init → Wait`, recording the caller as the first to connect.
    Connect,
    /// `Wait → Start`. The caller is the second participant to connect.
    Begin,
    /// The caller already connected and is still waiting for the opponent.
    StillWaiting,
    /// The match is already running.
    AlreadyStarted,
}

impl ReadyCheck {
    /// The status the match will be in once this step has been applied.
    pub fn resulting_status(&self) -> MatchStatus {
        match self {
            ReadyCheck::Connect | ReadyCheck::StillWaiting => MatchStatus::Wait,
            ReadyCheck::Begin | ReadyCheck::AlreadyStarted => MatchStatus::Start,
        }
    }
}

pub fn ready_check(game: &Match, caller: &DeviceId) -> Result<ReadyCheck, TransitionError> {
    if game.state.is_terminal() {
        return Err(TransitionError::Terminal(game.status()));
    }
    if !game.is_participant(caller) {
        return Err(TransitionError::NotAParticipant(caller.clone()));
    }
    let step = match &game.state {
        MatchState::Init => ReadyCheck::Connect,
        MatchState::Wait { first_connect } if first_connect == caller => ReadyCheck::StillWaiting,
        MatchState::Wait { .. } => ReadyCheck::Begin,
        _ => ReadyCheck::AlreadyStarted,
    };
    Ok(step)
}

/// Checks whether a result report could land. Reports never change the status; they may arrive in any non-terminal
/// state, and each of the two fields is written at most once.
pub fn check_report(game: &Match, outcome: ReportedOutcome) -> Result<(), TransitionError> {
    if game.state.is_terminal() {
        return Err(TransitionError::Terminal(game.status()));
    }
    let taken = match outcome {
        ReportedOutcome::Won => game.reports.winner.is_some(),
        ReportedOutcome::Lost => game.reports.loser.is_some(),
    };
    if taken {
        return Err(TransitionError::AlreadyReported(outcome));
    }
    Ok(())
}

/// Moves can only be appended to a running match.
pub fn check_move(game: &Match) -> Result<(), TransitionError> {
    match game.state {
        MatchState::Start => Ok(()),
        ref s if s.is_terminal() => Err(TransitionError::Terminal(s.status())),
        _ => Err(TransitionError::NotStarted),
    }
}

/// Decides the final state of a match that has outlived the match timeout.
///
/// Returns `None` for matches that are already terminal.
pub fn resolve_stale(game: &Match) -> Option<Resolution> {
    let resolution = match &game.state {
        MatchState::Init | MatchState::Wait { .. } => Resolution::TimedOut,
        MatchState::Start => resolve_reports(game),
        _ => return None,
    };
    Some(resolution)
}

fn resolve_reports(game: &Match) -> Resolution {
    let reports = &game.reports;
    let (winner, loser) = match (&reports.winner, &reports.loser) {
        (Some(w), Some(l)) => (w.clone(), l.clone()),
        (Some(w), None) => match game.opponent_of(w) {
            Some(l) => (w.clone(), l.clone()),
            None => return Resolution::Invalidated,
        },
        (None, Some(l)) => match game.opponent_of(l) {
            Some(w) => (w.clone(), l.clone()),
            None => return Resolution::Invalidated,
        },
        (None, None) => return Resolution::Invalidated,
    };
    if winner == loser || !game.is_participant(&winner) || !game.is_participant(&loser) {
        return Resolution::Invalidated;
    }
    Resolution::Settled { winner, loser }
}

/// Builds the guarded settlement for a stale match.
pub fn plan_settlement(game: &Match) -> Option<Settlement> {
    resolve_stale(game).map(|resolution| Settlement {
        match_id: game.id.clone(),
        expected_status: game.status(),
        expected_reports: game.reports.clone(),
        resolution,
    })
}
