//! ECS components for the grid-world simulation.
//!
//! Components are pure data containers attached to entities. An entity's
//! capabilities are derived from which components it carries: an entity with
//! actor + memory + position is a player, appearance + position makes it
//! visible, collision + position makes it physical. The classification happens
//! exactly once, at insertion into the [`GameWorld`](crate::world::GameWorld).

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::math::Vec3i;

/// Stable numeric entity identifier, assigned monotonically at insertion and
/// never reused. Attached as a component beside the `bevy_ecs` handle.
#[derive(
    Component, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct EntityId(pub u32);

/// Compass direction on the grid plane. North is +y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction2D {
    East,
    NorthEast,
    North,
    NorthWest,
    West,
    SouthWest,
    South,
    SouthEast,
}

impl Direction2D {
    /// The one-cell offset this direction maps to.
    pub fn step(self) -> Vec3i {
        match self {
            Direction2D::East => Vec3i::new(1, 0, 0),
            Direction2D::NorthEast => Vec3i::new(1, 1, 0),
            Direction2D::North => Vec3i::new(0, 1, 0),
            Direction2D::NorthWest => Vec3i::new(-1, 1, 0),
            Direction2D::West => Vec3i::new(-1, 0, 0),
            Direction2D::SouthWest => Vec3i::new(-1, -1, 0),
            Direction2D::South => Vec3i::new(0, -1, 0),
            Direction2D::SouthEast => Vec3i::new(1, -1, 0),
        }
    }

    /// Whether this direction moves along both grid axes at once.
    pub fn is_diagonal(self) -> bool {
        let step = self.step();
        step.x != 0 && step.y != 0
    }
}

/// A pending action for an actor, consumed by action resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    #[default]
    None,
    Walk(Direction2D),
}

/// Marks an entity as able to act; holds its single pending action.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Actor {
    pub next_action: Action,
}

/// Visual category used when recording what a player saw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisualType {
    Floor,
    Plant,
    Player,
    #[default]
    Unknown,
    Wall,
}

/// How an entity looks to observers.
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Appearance {
    pub visual_type: VisualType,
}

impl Appearance {
    pub fn new(visual_type: VisualType) -> Self {
        Self { visual_type }
    }
}

/// Collision shape of an entity within its cell. Only `Filled` contributes
/// blocking flags to the spatial cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shape {
    #[default]
    Empty,
    Floor,
    Filled,
}

/// Physical and light-blocking shapes of an entity.
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Collision {
    pub physical: Shape,
    pub light: Shape,
}

impl Collision {
    pub fn new(physical: Shape, light: Shape) -> Self {
        Self { physical, light }
    }
}

/// A player's last-known snapshot of an observed entity. Once recorded it is
/// never deleted; staleness shows as a `time` older than the world clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Impression {
    pub id: EntityId,
    pub time: u64,
    pub position: Vec3i,
    pub visual_type: VisualType,
}

/// Per-player perception state: impressions keyed by entity id, plus the
/// viewer position and world geometry stamped at the last memory update.
#[derive(Component, Debug, Default)]
pub struct Memory {
    pub entities: HashMap<EntityId, Impression>,
    pub position: Vec3i,
    pub area_size: Vec3i,
    pub area_time: u64,
}

/// Cell position of an entity.
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Position(pub Vec3i);

/// Optional component bundle handed to [`GameWorld::insert`]. Any missing
/// component simply excludes the entity from the corresponding capability
/// view; there is no invalid combination.
///
/// [`GameWorld::insert`]: crate::world::GameWorld::insert
#[derive(Debug, Default)]
pub struct EntityParts {
    pub actor: Option<Actor>,
    pub appearance: Option<Appearance>,
    pub collision: Option<Collision>,
    pub memory: Option<Memory>,
    pub position: Option<Position>,
}

impl EntityParts {
    /// Walkable, see-through ground.
    pub fn floor(position: Vec3i) -> Self {
        Self {
            appearance: Some(Appearance::new(VisualType::Floor)),
            collision: Some(Collision::new(Shape::Floor, Shape::Floor)),
            position: Some(Position(position)),
            ..Default::default()
        }
    }

    /// Solid, opaque wall.
    pub fn wall(position: Vec3i) -> Self {
        Self {
            appearance: Some(Appearance::new(VisualType::Wall)),
            collision: Some(Collision::new(Shape::Filled, Shape::Filled)),
            position: Some(Position(position)),
            ..Default::default()
        }
    }

    /// Decorative plant, neither blocking nor opaque.
    pub fn plant(position: Vec3i) -> Self {
        Self {
            appearance: Some(Appearance::new(VisualType::Plant)),
            collision: Some(Collision::new(Shape::Empty, Shape::Empty)),
            position: Some(Position(position)),
            ..Default::default()
        }
    }

    /// Player: acts, remembers, blocks movement but not light.
    pub fn player(position: Vec3i) -> Self {
        Self {
            actor: Some(Actor::default()),
            appearance: Some(Appearance::new(VisualType::Player)),
            collision: Some(Collision::new(Shape::Filled, Shape::Empty)),
            memory: Some(Memory::default()),
            position: Some(Position(position)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_steps() {
        assert_eq!(Direction2D::North.step(), Vec3i::new(0, 1, 0));
        assert_eq!(Direction2D::SouthWest.step(), Vec3i::new(-1, -1, 0));
        assert!(Direction2D::NorthEast.is_diagonal());
        assert!(!Direction2D::East.is_diagonal());
    }

    #[test]
    fn test_part_constructors() {
        let wall = EntityParts::wall(Vec3i::new(1, 2, 0));
        assert!(wall.actor.is_none());
        assert!(wall.memory.is_none());
        assert_eq!(wall.collision.unwrap().light, Shape::Filled);

        let player = EntityParts::player(Vec3i::ZERO);
        assert!(player.actor.is_some());
        assert!(player.memory.is_some());
        assert_eq!(player.collision.unwrap().physical, Shape::Filled);
        assert_eq!(player.collision.unwrap().light, Shape::Empty);
    }
}
