use std::time::Duration;

use log::*;

use crate::{
    db::{errors::StoreError, traits::ArenaDatabase},
    db_types::{Match, NewMatch, Player},
};

pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_secs(6);

/// Pairs players two at a time from the front of the pool. An odd player out stays in the pool for the next cycle.
pub fn pair_players(waiting: &[Player]) -> Vec<NewMatch> {
    waiting.chunks_exact(2).map(|pair| NewMatch::pair(pair[0].device_id.clone(), pair[1].device_id.clone())).collect()
}

/// The matchmaker's adaptive polling interval. Always within `[min, max]`, moving one `min` step at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    min: Duration,
    max: Duration,
    current: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL, DEFAULT_MAX_INTERVAL)
    }
}

impl Backoff {
    /// Starts at `min`. A `max` below `min` is raised to `min`.
    pub fn new(min: Duration, max: Duration) -> Self {
        let max = max.max(min);
        Self { min, max, current: min }
    }

    pub fn current(&self) -> Duration {
        self.current
    }

    /// A cycle created at least one match: poll sooner.
    pub fn productive(&mut self) {
        self.current = self.current.saturating_sub(self.min).max(self.min);
    }

    /// A cycle created nothing: poll later.
    pub fn idle(&mut self) {
        self.current = (self.current + self.min).min(self.max);
    }
}

#[derive(Debug, Clone, Default)]
pub struct MatchmakingReport {
    pub waiting: usize,
    pub created: Vec<Match>,
}

pub struct Matchmaker<B> {
    db: B,
    backoff: Backoff,
}

impl<B> Matchmaker<B>
where B: ArenaDatabase
{
    pub fn new(db: B, backoff: Backoff) -> Self {
        Self { db, backoff }
    }

    /// How long to wait before the next cycle.
    pub fn interval(&self) -> Duration {
        self.backoff.current()
    }

    /// Runs one matchmaking cycle. All matches of the cycle are written in one transaction; if the write fails the
    /// error is returned and the polling interval is left as it was.
    pub async fn run_cycle(&mut self) -> Result<MatchmakingReport, StoreError> {
        let waiting = self.db.fetch_waiting_players().await?;
        let pairs = pair_players(&waiting);
        let created = if pairs.is_empty() { Vec::new() } else { self.db.create_matches(&pairs).await? };
        if created.is_empty() {
            self.backoff.idle();
        } else {
            self.backoff.productive();
            info!("🎲️ {} new matches created from {} waiting players", created.len(), waiting.len());
        }
        trace!("🎲️ Next matchmaking cycle in {:?}", self.backoff.current());
        Ok(MatchmakingReport { waiting: waiting.len(), created })
    }
}
