mod arena_world;
mod setups;
mod steps;

pub use arena_world::{ArenaSystem, ArenaWorld};
