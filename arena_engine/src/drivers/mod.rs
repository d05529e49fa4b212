//! The two autonomous drivers of the arena.
//!
//! * [`matchmaker::Matchmaker`] pairs players from the waiting pool and adapts its own polling cadence.
//! * [`reconciler::Reconciler`] times out stalled matches and settles finished ones.
//!
//! Each driver exposes a single `run_cycle` step. Scheduling, timeouts and cancellation belong to whoever hosts the
//! driver; a cycle is always one read followed by at most one atomic batch write, so dropping an in-flight cycle
//! leaves no partial state behind.
pub mod matchmaker;
pub mod reconciler;
