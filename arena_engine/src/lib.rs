//! Arena Engine
//!
//! The Arena Engine pairs anonymous players who are waiting for a real-time match, tracks every match from pairing to
//! settlement, and lets the two participants exchange an ordered sequence of turn-based moves by polling. The library
//! is provider-agnostic: everything is generic over a storage backend.
//!
//! The library is divided into these sections:
//! 1. Storage contracts and backends ([`mod@db`]). The traits ([`PlayerManagement`], [`MatchManagement`] and
//!    [`ArenaDatabase`]) describe what a backend must offer; SQLite is the supported backend. The data types used in
//!    the store are defined in the `db_types` module and are public.
//! 2. The lifecycle rules ([`match_state`]). Pure functions that decide which transition a request or a stale match
//!    calls for. The store enforces the same guards in its conditional writes.
//! 3. The request-driven API ([`MatchFlowApi`], [`PlayerApi`]).
//! 4. The autonomous drivers ([`drivers`]): the matchmaker and the reconciler.
mod arena_api;
mod db;

pub mod db_types;
pub mod drivers;
pub mod match_state;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use arena_api::{
    errors::ArenaApiError,
    match_flow_api::MatchFlowApi,
    match_objects,
    player_api::PlayerApi,
    rank_objects,
};
pub use db::{
    errors::StoreError,
    traits::{ArenaDatabase, MatchManagement, PlayerManagement},
};
#[cfg(feature = "sqlite")]
pub use db::sqlite::{db::SqliteDatabase, matches::MatchQueryFilter};
