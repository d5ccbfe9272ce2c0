//! Simulation world container and snapshot types.
//!
//! [`GameWorld`] owns a flat, append-only arena of entities on top of a
//! `bevy_ecs` world. Entities are classified into capability views exactly
//! once at insertion and are never removed or recomposed, so the views stay
//! stable and insertion-ordered for the life of the world.
//!
//! [`PlayerView`] is the serializable slice of state a client layer consumes:
//! the first player's memory, rendered as a JSON-friendly snapshot.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::components::{EntityId, EntityParts, Impression, Memory};
use crate::math::Vec3i;

/// Returned by [`GameWorld::new`] when a world dimension is not positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidWorldSize {
    pub size: Vec3i,
}

impl fmt::Display for InvalidWorldSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "world dimensions must be positive integers, got {:?}",
            self.size
        )
    }
}

impl std::error::Error for InvalidWorldSize {}

/// The game state: an entity arena with capability views, world geometry and
/// a monotonic turn counter.
pub struct GameWorld {
    ecs: World,
    entities: Vec<Entity>,
    physical: Vec<Entity>,
    players: Vec<Entity>,
    visible: Vec<Entity>,
    next_id: u32,
    time: u64,
    size: Vec3i,
}

impl GameWorld {
    /// Create an empty world of the given cell size.
    pub fn new(size: Vec3i) -> Result<Self, InvalidWorldSize> {
        if size.x < 1 || size.y < 1 || size.z < 1 {
            return Err(InvalidWorldSize { size });
        }

        Ok(Self {
            ecs: World::new(),
            entities: Vec::new(),
            physical: Vec::new(),
            players: Vec::new(),
            visible: Vec::new(),
            next_id: 1,
            time: 0,
            size,
        })
    }

    /// Current turn number.
    pub fn time(&self) -> u64 {
        self.time
    }

    /// Advance the turn counter by one.
    pub fn step_time(&mut self) {
        self.time += 1;
    }

    /// World size in cells.
    pub fn size(&self) -> Vec3i {
        self.size
    }

    /// Inclusive lower corner of the world.
    pub fn bounds_min(&self) -> Vec3i {
        Vec3i::ZERO
    }

    /// Inclusive upper corner of the world.
    pub fn bounds_max(&self) -> Vec3i {
        self.size - Vec3i::ONE
    }

    /// Whether a position lies inside the world bounds.
    pub fn contains(&self, position: Vec3i) -> bool {
        position.is_inside(self.bounds_min(), self.bounds_max())
    }

    /// All entities, in insertion order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Entities with collision + position, in insertion order.
    pub fn find_physical(&self) -> &[Entity] {
        &self.physical
    }

    /// Entities with actor + memory + position, in insertion order.
    pub fn find_players(&self) -> &[Entity] {
        &self.players
    }

    /// Entities with appearance + position, in insertion order.
    pub fn find_visible(&self) -> &[Entity] {
        &self.visible
    }

    /// Insert a new entity from an optional component bundle. Capability views
    /// are classified here, once; there is no failure path.
    pub fn insert(&mut self, parts: EntityParts) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;

        let is_player = parts.actor.is_some() && parts.memory.is_some() && parts.position.is_some();
        let is_visible = parts.appearance.is_some() && parts.position.is_some();
        let is_physical = parts.collision.is_some() && parts.position.is_some();

        let mut spawned = self.ecs.spawn(id);
        if let Some(actor) = parts.actor {
            spawned.insert(actor);
        }
        if let Some(appearance) = parts.appearance {
            spawned.insert(appearance);
        }
        if let Some(collision) = parts.collision {
            spawned.insert(collision);
        }
        if let Some(memory) = parts.memory {
            spawned.insert(memory);
        }
        if let Some(position) = parts.position {
            spawned.insert(position);
        }
        let entity = spawned.id();

        self.entities.push(entity);
        if is_physical {
            self.physical.push(entity);
        }
        if is_player {
            self.players.push(entity);
        }
        if is_visible {
            self.visible.push(entity);
        }

        id
    }

    /// Direct access to the underlying entity store.
    pub fn ecs(&self) -> &World {
        &self.ecs
    }

    /// Mutable access to the underlying entity store.
    pub fn ecs_mut(&mut self) -> &mut World {
        &mut self.ecs
    }
}

/// Serializable snapshot of a player's memory for the client layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerView {
    /// Turn counter at snapshot time.
    pub time: u64,
    /// The player's last recorded position.
    pub position: Vec3i,
    /// World size recorded into the player's memory.
    pub area_size: Vec3i,
    /// Turn at which the memory was last refreshed.
    pub area_time: u64,
    /// Every impression the player holds, ordered by entity id.
    pub impressions: Vec<Impression>,
}

impl PlayerView {
    /// Snapshot the first player's memory, if the world has a player.
    pub fn from_world(world: &GameWorld) -> Option<Self> {
        let &player = world.find_players().first()?;
        let memory = world.ecs().get::<Memory>(player)?;

        let mut impressions: Vec<Impression> = memory.entities.values().copied().collect();
        impressions.sort_by_key(|impression| impression.id);

        Some(Self {
            time: world.time(),
            position: memory.position,
            area_size: memory.area_size,
            area_time: memory.area_time,
            impressions,
        })
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to a pretty JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
