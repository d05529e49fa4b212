use thiserror::Error;

use crate::db_types::{DeviceId, MatchId};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database driver error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Could not run database migrations: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("Corrupt record for match {0}: {1}")]
    CorruptMatch(String, String),
    #[error("Player {0} is no longer waiting for a match. The matchmaking batch was rolled back.")]
    PlayerNotWaiting(DeviceId),
    #[error("Match {0} changed since it was scanned. The settlement batch was rolled back.")]
    MatchChanged(MatchId),
    #[error("Player {0} does not exist and cannot be credited. The settlement batch was rolled back.")]
    PlayerNotFound(DeviceId),
    #[error("A match timeout of {0} reaches past the earliest representable time")]
    TimeoutOutOfRange(String),
}
