//! # Storage contracts
//!
//! The traits in this module are what a backend must implement to host an arena.
//!
//! * [`PlayerManagement`] is the player directory: status, display metadata and score.
//! * [`MatchManagement`] is the match store: one record per match and its move log. Every mutation is a single
//!   conditional write that carries its own lifecycle guard.
//! * [`ArenaDatabase`] ties the two together and adds the two batch writes that must be atomic across records: pool
//!   pairing (new matches plus player status changes) and settlement (final status plus score credit).
mod arena_database;
mod match_management;
mod player_management;

pub use arena_database::ArenaDatabase;
pub use match_management::MatchManagement;
pub use player_management::PlayerManagement;
