//! Public API for the simulation.
//!
//! [`Engine`] is the main interface a client layer drives: load a world,
//! queue player actions, step one turn at a time and read back a
//! serializable [`PlayerView`]. One turn runs the systems to completion in a
//! fixed order (actions, then memory) and advances the world clock, so two
//! engines fed the same world and actions stay in lockstep.

use std::time::Instant;

use crate::components::{Action, Actor};
use crate::fov::FieldOfViewCache;
use crate::spatial::SpatialCache;
use crate::systems::{perform_actions, update_player_memory};
use crate::world::{GameWorld, PlayerView};

/// The derived-state caches a world is simulated against. Both are rebuilt
/// together whenever a world is loaded and kept incremental afterwards.
#[derive(Default)]
pub struct Cache {
    pub spatial: SpatialCache,
    pub field_of_view: FieldOfViewCache,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild both caches from scratch for the given world.
    pub fn rebuild(&mut self, world: &GameWorld) {
        self.spatial.rebuild(world);
        self.field_of_view.rebuild(world);
    }
}

/// The simulation engine: owns at most one world plus the caches derived
/// from it.
#[derive(Default)]
pub struct Engine {
    world: Option<GameWorld>,
    cache: Cache,
}

impl Engine {
    /// Create an engine with no world loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the loaded world. Passing `Some` rebuilds the caches and runs
    /// an initial memory update at the current world time, so players know
    /// their surroundings before the first turn. Passing `None` unloads.
    pub fn set_world(&mut self, world: Option<GameWorld>) {
        self.world = world;
        if let Some(world) = &mut self.world {
            self.cache.rebuild(world);
            update_player_memory(world, &mut self.cache);
        }
    }

    /// Run one turn: resolve pending actions, refresh player memory and
    /// advance the world clock. Does nothing when no world is loaded.
    pub fn step_world(&mut self) {
        let Some(world) = &mut self.world else {
            return;
        };

        let started = Instant::now();
        perform_actions(world, &mut self.cache);
        update_player_memory(world, &mut self.cache);
        world.step_time();
        log::debug!(
            "turn {} took {} us",
            world.time(),
            started.elapsed().as_micros()
        );
    }

    /// Queue an action for the first player. Overwrites any action already
    /// pending for this turn.
    pub fn queue_player_action(&mut self, action: Action) {
        let Some(world) = &mut self.world else {
            return;
        };
        let Some(&player) = world.find_players().first() else {
            return;
        };
        if let Some(mut actor) = world.ecs_mut().get_mut::<Actor>(player) {
            actor.next_action = action;
        }
    }

    /// Snapshot the first player's memory, if a world with a player is loaded.
    pub fn player_view(&self) -> Option<PlayerView> {
        PlayerView::from_world(self.world.as_ref()?)
    }

    /// The loaded world, if any.
    pub fn world(&self) -> Option<&GameWorld> {
        self.world.as_ref()
    }

    /// Mutable access to the loaded world, if any.
    pub fn world_mut(&mut self) -> Option<&mut GameWorld> {
        self.world.as_mut()
    }

    /// The derived-state caches.
    pub fn cache(&self) -> &Cache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Direction2D, EntityParts, VisualType};
    use crate::math::Vec3i;

    /// A size×size room with walls along the border and floors inside, the
    /// player standing in the middle.
    fn bordered_room(size: i32) -> GameWorld {
        let mut world = GameWorld::new(Vec3i::new(size, size, 1)).unwrap();
        for y in 0..size {
            for x in 0..size {
                let position = Vec3i::new(x, y, 0);
                if x == 0 || y == 0 || x == size - 1 || y == size - 1 {
                    world.insert(EntityParts::wall(position));
                } else {
                    world.insert(EntityParts::floor(position));
                }
            }
        }
        world.insert(EntityParts::player(Vec3i::new(size / 2, size / 2, 0)));
        world
    }

    #[test]
    fn test_engine_without_world_is_inert() {
        let mut engine = Engine::new();
        engine.queue_player_action(Action::Walk(Direction2D::North));
        engine.step_world();
        assert!(engine.world().is_none());
        assert!(engine.player_view().is_none());
    }

    #[test]
    fn test_set_world_records_initial_memory() {
        let mut engine = Engine::new();
        engine.set_world(Some(bordered_room(5)));

        let view = engine.player_view().unwrap();
        assert_eq!(view.time, 0);
        assert_eq!(view.area_time, 0);
        assert_eq!(view.position, Vec3i::new(2, 2, 0));
        assert_eq!(view.area_size, Vec3i::new(5, 5, 1));

        // 16 border walls + 9 floors + the player itself, all visible from
        // the center of a small room.
        assert_eq!(view.impressions.len(), 26);
        let walls = view
            .impressions
            .iter()
            .filter(|i| i.visual_type == VisualType::Wall)
            .count();
        assert_eq!(walls, 16);
        assert!(view.impressions.iter().all(|i| i.time == 0));
    }

    #[test]
    fn test_step_world_moves_player_and_advances_clock() {
        let mut engine = Engine::new();
        engine.set_world(Some(bordered_room(5)));

        engine.queue_player_action(Action::Walk(Direction2D::North));
        engine.step_world();

        assert_eq!(engine.world().unwrap().time(), 1);
        let view = engine.player_view().unwrap();
        assert_eq!(view.time, 1);
        // North is +y.
        assert_eq!(view.position, Vec3i::new(2, 3, 0));
        // Memory was refreshed before the clock advanced.
        assert_eq!(view.area_time, 0);
    }

    #[test]
    fn test_walk_into_border_wall_still_advances_clock() {
        let mut engine = Engine::new();
        engine.set_world(Some(bordered_room(3)));

        engine.queue_player_action(Action::Walk(Direction2D::East));
        engine.step_world();

        let view = engine.player_view().unwrap();
        assert_eq!(view.position, Vec3i::new(1, 1, 0));
        assert_eq!(engine.world().unwrap().time(), 1);
    }

    #[test]
    fn test_impressions_update_as_the_player_moves() {
        let mut engine = Engine::new();
        engine.set_world(Some(bordered_room(7)));

        for _ in 0..2 {
            engine.queue_player_action(Action::Walk(Direction2D::North));
            engine.step_world();
        }

        let view = engine.player_view().unwrap();
        assert_eq!(view.position, Vec3i::new(3, 5, 0));

        // The player's own impression tracks its latest seen position.
        let world = engine.world().unwrap();
        let player = world.find_players()[0];
        let player_id = *world
            .ecs()
            .get::<crate::components::EntityId>(player)
            .unwrap();
        let own = view
            .impressions
            .iter()
            .find(|i| i.id == player_id)
            .unwrap();
        assert_eq!(own.position, Vec3i::new(3, 5, 0));
        assert_eq!(own.time, 1);
    }

    #[test]
    fn test_player_view_round_trips_through_json() {
        let mut engine = Engine::new();
        engine.set_world(Some(bordered_room(5)));

        let view = engine.player_view().unwrap();
        let json = view.to_json().unwrap();
        let back: PlayerView = serde_json::from_str(&json).unwrap();
        assert_eq!(back.impressions.len(), view.impressions.len());
        assert_eq!(back.position, view.position);
    }

    #[test]
    fn test_unloading_the_world() {
        let mut engine = Engine::new();
        engine.set_world(Some(bordered_room(5)));
        assert!(engine.player_view().is_some());

        engine.set_world(None);
        assert!(engine.player_view().is_none());
        engine.step_world();
    }
}
