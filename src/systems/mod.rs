//! Turn systems for the grid-world simulation.
//!
//! Systems run to completion, in order, within one turn:
//!
//! 1. [`perform_actions`] consumes each player's pending action, resolves at
//!    most one movement step against the spatial cache and writes position
//!    changes back through it.
//! 2. [`update_player_memory`] refreshes the field-of-view cache per player
//!    and records impressions of every currently perceived entity.
//!
//! Action resolution strictly precedes memory recording; both mutate the
//! single world/cache triple owned by the engine.

pub mod memory;
pub mod movement;

pub use memory::{update_player_memory, VIEW_RADIUS};
pub use movement::perform_actions;
