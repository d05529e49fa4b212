use crate::{
    db::{
        errors::StoreError,
        traits::{MatchManagement, PlayerManagement},
    },
    db_types::{Match, NewMatch, Settlement},
};

/// The highest level of behaviour a backend must offer to run an arena: the player directory, the match store, and
/// the two batch writes that have to touch several records atomically.
#[allow(async_fn_in_trait)]
pub trait ArenaDatabase: Clone + PlayerManagement + MatchManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// In a single atomic transaction,
    /// * inserts every new match in the `Init` state,
    /// * moves both players of every match from `WaitingForMatch` to `InMatch`.
    ///
    /// If any of the players is no longer waiting, nothing is written and [`StoreError::PlayerNotWaiting`] is
    /// returned.
    async fn create_matches(&self, matches: &[NewMatch]) -> Result<Vec<Match>, StoreError>;

    /// In a single atomic transaction,
    /// * moves every match to the final status of its resolution, provided it is still exactly as it was scanned,
    /// * credits the winner of every settled match with one point.
    ///
    /// Any mismatch, or a winner without a player record, rolls the whole batch back. Returns the number of matches
    /// settled.
    async fn settle_matches(&self, settlements: &[Settlement]) -> Result<usize, StoreError>;
}
