//! # Arena server
//! This crate hosts the HTTP surface of the arena. It is responsible for:
//! * Translating JSON requests into calls on the engine's [`MatchFlowApi`](arena_engine::MatchFlowApi) and
//!   [`PlayerApi`](arena_engine::PlayerApi).
//! * Running the matchmaking and reconciliation drivers as supervised background workers.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/player/...`: Player status, online count and rank.
//! * `/api/match/...`: Ready-check, result reports, move exchange and the rendezvous relay.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod routes;
pub mod server;
pub mod workers;

#[cfg(test)]
mod endpoint_tests;
