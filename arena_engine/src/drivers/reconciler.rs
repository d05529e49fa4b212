use chrono::{DateTime, Duration, Utc};
use log::*;

use crate::{
    db::{errors::StoreError, traits::ArenaDatabase},
    db_types::{Match, Resolution, Settlement},
    match_state::plan_settlement,
};

pub const DEFAULT_MATCH_TIMEOUT_SECS: i64 = 600;

/// Works out the settlement of every stale match. Matches that are already terminal are skipped.
pub fn plan_settlements(stale: &[Match]) -> Vec<Settlement> {
    stale.iter().filter_map(plan_settlement).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationReport {
    pub timed_out: usize,
    pub settled: usize,
    pub invalidated: usize,
}

impl ReconciliationReport {
    pub fn from_settlements(settlements: &[Settlement]) -> Self {
        settlements.iter().fold(Self::default(), |mut report, s| {
            match s.resolution {
                Resolution::TimedOut => report.timed_out += 1,
                Resolution::Settled { .. } => report.settled += 1,
                Resolution::Invalidated => report.invalidated += 1,
            }
            report
        })
    }

    pub fn total(&self) -> usize {
        self.timed_out + self.settled + self.invalidated
    }
}

pub struct Reconciler<B> {
    db: B,
    match_timeout: Duration,
}

impl<B> Reconciler<B>
where B: ArenaDatabase
{
    pub fn new(db: B, match_timeout: Duration) -> Self {
        Self { db, match_timeout }
    }

    pub async fn run_cycle(&self) -> Result<ReconciliationReport, StoreError> {
        self.run_cycle_at(Utc::now()).await
    }

    /// Runs one reconciliation cycle as if the time were `now`. Every match created before `now - match_timeout` that
    /// is still active gets its final state, and winners are credited, in a single transaction.
    pub async fn run_cycle_at(&self, now: DateTime<Utc>) -> Result<ReconciliationReport, StoreError> {
        let Some(cutoff) = now.checked_sub_signed(self.match_timeout) else {
            error!("⚖️ Cannot compute the stale-match cutoff. {now} minus {} overflows.", self.match_timeout);
            return Err(StoreError::TimeoutOutOfRange(self.match_timeout.to_string()));
        };
        let stale = self.db.fetch_stale_matches(cutoff).await?;
        let settlements = plan_settlements(&stale);
        if settlements.is_empty() {
            trace!("⚖️ No stale matches older than {cutoff}");
            return Ok(ReconciliationReport::default());
        }
        self.db.settle_matches(&settlements).await?;
        let report = ReconciliationReport::from_settlements(&settlements);
        info!(
            "⚖️ Reconciled {} matches: {} settled, {} timed out, {} invalidated",
            report.total(),
            report.settled,
            report.timed_out,
            report.invalidated
        );
        Ok(report)
    }
}
