//! # Arena public API
//!
//! The `arena_api` module exposes the request-driven side of the arena: everything a client does between checking in
//! and seeing its result on the leaderboard.
//!
//! * [`player_api`] manages the player directory: status changes, online counts and rank summaries.
//! * [`match_flow_api`] drives a match from the participants' side: ready-check, moves, result reports and the
//!   rendezvous relay.
//!
//! The autonomous side (pairing and settlement) lives in [`crate::drivers`].
//!
//! # API usage
//!
//! An API instance is created by supplying a database backend that implements the backend traits the API needs.
//!
//! ```rust,ignore
//! use arena_engine::{MatchFlowApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/arena.db", 25).await?;
//! let api = MatchFlowApi::new(db);
//! let ready = api.ready_check(&device_id, &match_id).await?;
//! ```
pub mod errors;
pub mod match_flow_api;
pub mod match_objects;
pub mod player_api;
pub mod rank_objects;
