//! Background workers that run the matchmaking and reconciliation drivers inside the server process.
//!
//! Each worker is a spawned task that owns a clone of the store handle and a [`CancellationToken`]. Cancellation is only
//! observed between cycles, so a cycle that has started always commits or rolls back before the task exits. Every
//! cycle runs under a timeout; a failed or timed-out cycle is logged and retried on the next schedule.
use std::time::Duration;

use arena_engine::{
    drivers::{
        matchmaker::{Backoff, Matchmaker},
        reconciler::{Reconciler, DEFAULT_MATCH_TIMEOUT_SECS},
    },
    SqliteDatabase,
};
use log::*;
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::WorkerConfig;

/// Join handles of the running workers. Await [`Workers::shutdown`] once the HTTP server has stopped.
pub struct Workers {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl Workers {
    pub fn start(db: SqliteDatabase, config: &WorkerConfig) -> Self {
        let cancel = CancellationToken::new();
        let mut handles = Vec::with_capacity(2);
        if config.matchmaker_enabled {
            handles.push(start_matchmaker_worker(db.clone(), config, cancel.clone()));
        }
        if config.reconciler_enabled {
            handles.push(start_reconciler_worker(db, config, cancel.clone()));
        }
        Self { cancel, handles }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Signals every worker to stop and waits for in-flight cycles to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("🕰️ A background worker did not shut down cleanly. {e}");
            }
        }
        info!("🕰️ All background workers have stopped");
    }
}

/// Starts the matchmaking worker. The delay between cycles follows the matchmaker's own backoff.
pub fn start_matchmaker_worker(db: SqliteDatabase, config: &WorkerConfig, cancel: CancellationToken) -> JoinHandle<()> {
    let backoff = Backoff::new(config.matchmaker_min_interval, config.matchmaker_max_interval);
    let cycle_timeout = config.cycle_timeout;
    tokio::spawn(async move {
        let mut matchmaker = Matchmaker::new(db, backoff);
        info!("🎲️ Matchmaking worker started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(matchmaker.interval()) => {},
            }
            match tokio::time::timeout(cycle_timeout, matchmaker.run_cycle()).await {
                Ok(Ok(report)) => {
                    trace!("🎲️ Matchmaking cycle done. {} waiting, {} paired", report.waiting, report.created.len())
                },
                Ok(Err(e)) => error!("🎲️ Error running matchmaking cycle: {e}"),
                Err(_) => error!("🎲️ Matchmaking cycle did not finish within {cycle_timeout:?}"),
            }
        }
        info!("🎲️ Matchmaking worker stopped");
    })
}

/// Starts the reconciliation worker. The first cycle runs immediately, then every `reconcile_interval`.
pub fn start_reconciler_worker(db: SqliteDatabase, config: &WorkerConfig, cancel: CancellationToken) -> JoinHandle<()> {
    let match_timeout = chrono::Duration::from_std(config.match_timeout).unwrap_or_else(|e| {
        error!("⚖️ Match timeout {:?} is out of range. {e} Using the default.", config.match_timeout);
        chrono::Duration::seconds(DEFAULT_MATCH_TIMEOUT_SECS)
    });
    let period = config.reconcile_interval.max(Duration::from_millis(1));
    let cycle_timeout = config.cycle_timeout;
    tokio::spawn(async move {
        let reconciler = Reconciler::new(db, match_timeout);
        let mut timer = tokio::time::interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("⚖️ Reconciliation worker started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = timer.tick() => {},
            }
            debug!("⚖️ Running reconciliation job");
            match tokio::time::timeout(cycle_timeout, reconciler.run_cycle()).await {
                Ok(Ok(report)) => debug!("⚖️ {} matches reconciled", report.total()),
                Ok(Err(e)) => error!("⚖️ Error running reconciliation job: {e}"),
                Err(_) => error!("⚖️ Reconciliation job did not finish within {cycle_timeout:?}"),
            }
        }
        info!("⚖️ Reconciliation worker stopped");
    })
}
