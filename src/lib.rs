//! Gloam - Grid-World Simulation Core
//!
//! A deterministic, turn-based simulation of entities on an integer grid.
//! Uses `bevy_ecs` for the entity-component storage, a chunked spatial cache
//! for cell occupancy flags and a cached integer ray caster for player
//! fields of view.

pub mod api;
pub mod components;
pub mod fov;
pub mod math;
pub mod raycast;
pub mod spatial;
pub mod systems;
pub mod world;

pub use api::{Cache, Engine};
pub use components::*;
pub use fov::FieldOfViewCache;
pub use math::Vec3i;
pub use raycast::RayCaster;
pub use spatial::{CellFlag, SpatialCache};
pub use systems::*;
pub use world::{GameWorld, InvalidWorldSize, PlayerView};
