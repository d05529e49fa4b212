use thiserror::Error;

use crate::{
    db::errors::StoreError,
    db_types::{DeviceId, MatchId, MatchStatus, ReportedOutcome},
    match_state::TransitionError,
};

#[derive(Debug, Error)]
pub enum ArenaApiError {
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Match {0} does not exist")]
    MatchNotFound(MatchId),
    #[error("Match {0} is already over ({1})")]
    MatchTerminal(MatchId, MatchStatus),
    #[error("{0} is not a participant in match {1}")]
    NotAParticipant(DeviceId, MatchId),
    #[error("The {1} of match {0} has already been reported")]
    ResultAlreadyReported(MatchId, ReportedOutcome),
    #[error("Match {0} has not started")]
    MatchNotStarted(MatchId),
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl ArenaApiError {
    pub fn from_transition(match_id: &MatchId, err: TransitionError) -> Self {
        match err {
            TransitionError::Terminal(status) => Self::MatchTerminal(match_id.clone(), status),
            TransitionError::NotAParticipant(device) => Self::NotAParticipant(device, match_id.clone()),
            TransitionError::AlreadyReported(outcome) => Self::ResultAlreadyReported(match_id.clone(), outcome),
            TransitionError::NotStarted => Self::MatchNotStarted(match_id.clone()),
        }
    }

    /// True for the errors that describe a request that is at odds with the current state of a match.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::MatchTerminal(..) | Self::NotAParticipant(..) | Self::ResultAlreadyReported(..) | Self::MatchNotStarted(..)
        )
    }
}
