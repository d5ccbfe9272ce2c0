//! Memory recording: what each player currently perceives.

use bevy_ecs::prelude::Entity;

use crate::api::Cache;
use crate::components::{Appearance, EntityId, Impression, Memory, Position};
use crate::world::GameWorld;

/// Perception radius in cells.
pub const VIEW_RADIUS: i32 = 16;

/// Refresh each player's field of view and record impressions of every entity
/// it can currently see. Impressions are upserted by entity id; earlier
/// impressions of entities now out of view are kept with their old timestamp.
pub fn update_player_memory(world: &mut GameWorld, cache: &mut Cache) {
    let Cache {
        spatial,
        field_of_view,
    } = cache;

    let players: Vec<Entity> = world.find_players().to_vec();
    let time = world.time();
    let area_size = world.size();

    for player in players {
        let origin = match world.ecs().get::<Position>(player) {
            Some(&Position(position)) => position,
            None => continue,
        };

        field_of_view.update(origin, VIEW_RADIUS, spatial);

        let mut seen: Vec<Impression> = Vec::new();
        for &entity in world.find_visible() {
            let (id, appearance, position) = match (
                world.ecs().get::<EntityId>(entity),
                world.ecs().get::<Appearance>(entity),
                world.ecs().get::<Position>(entity),
            ) {
                (Some(&id), Some(appearance), Some(position)) => (id, appearance, position.0),
                _ => continue,
            };
            if !field_of_view.is_visible(position) {
                continue;
            }
            seen.push(Impression {
                id,
                time,
                position,
                visual_type: appearance.visual_type,
            });
        }

        if let Some(mut memory) = world.ecs_mut().get_mut::<Memory>(player) {
            memory.position = origin;
            memory.area_size = area_size;
            memory.area_time = time;
            for impression in seen {
                memory.entities.insert(impression.id, impression);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{EntityParts, VisualType};
    use crate::math::Vec3i;

    fn memory_of(world: &GameWorld, player: Entity) -> &Memory {
        world.ecs().get::<Memory>(player).unwrap()
    }

    #[test]
    fn test_records_visible_entities() {
        let mut world = GameWorld::new(Vec3i::new(5, 5, 1)).unwrap();
        let wall_id = world.insert(EntityParts::wall(Vec3i::new(0, 0, 0)));
        let player_id = world.insert(EntityParts::player(Vec3i::new(2, 2, 0)));
        let mut cache = Cache::new();
        cache.rebuild(&world);

        update_player_memory(&mut world, &mut cache);

        let player = world.find_players()[0];
        let memory = memory_of(&world, player);
        assert_eq!(memory.position, Vec3i::new(2, 2, 0));
        assert_eq!(memory.area_size, Vec3i::new(5, 5, 1));
        assert_eq!(memory.area_time, 0);

        let wall = memory.entities[&wall_id];
        assert_eq!(wall.position, Vec3i::new(0, 0, 0));
        assert_eq!(wall.visual_type, VisualType::Wall);
        assert_eq!(wall.time, 0);

        // Players see themselves.
        assert_eq!(memory.entities[&player_id].visual_type, VisualType::Player);
    }

    #[test]
    fn test_hidden_entities_are_not_recorded() {
        let mut world = GameWorld::new(Vec3i::new(7, 3, 1)).unwrap();
        world.insert(EntityParts::wall(Vec3i::new(3, 1, 0)));
        let hidden_id = world.insert(EntityParts::plant(Vec3i::new(5, 1, 0)));
        world.insert(EntityParts::player(Vec3i::new(1, 1, 0)));
        let mut cache = Cache::new();
        cache.rebuild(&world);

        update_player_memory(&mut world, &mut cache);

        let player = world.find_players()[0];
        assert!(!memory_of(&world, player).entities.contains_key(&hidden_id));
    }

    #[test]
    fn test_stale_impressions_keep_their_timestamp() {
        // A plant visible on turn zero, a wall that will hide it once the
        // player steps behind it.
        let mut world = GameWorld::new(Vec3i::new(7, 3, 1)).unwrap();
        world.insert(EntityParts::wall(Vec3i::new(3, 1, 0)));
        let plant_id = world.insert(EntityParts::plant(Vec3i::new(1, 1, 0)));
        world.insert(EntityParts::player(Vec3i::new(2, 1, 0)));
        let mut cache = Cache::new();
        cache.rebuild(&world);
        let player = world.find_players()[0];

        update_player_memory(&mut world, &mut cache);
        assert_eq!(memory_of(&world, player).entities[&plant_id].time, 0);

        // Relocate the player so the wall sits between it and the plant.
        let id = *world.ecs().get::<EntityId>(player).unwrap();
        world.ecs_mut().get_mut::<Position>(player).unwrap().0 = Vec3i::new(4, 1, 0);
        cache
            .spatial
            .entity_moved(id, Vec3i::new(2, 1, 0), Vec3i::new(4, 1, 0));
        world.step_time();
        world.step_time();

        update_player_memory(&mut world, &mut cache);
        let memory = memory_of(&world, player);

        // The impression survives with its original timestamp and position.
        assert_eq!(memory.entities[&plant_id].time, 0);
        assert_eq!(memory.entities[&plant_id].position, Vec3i::new(1, 1, 0));
        assert_eq!(memory.area_time, 2);
    }

    #[test]
    fn test_world_without_players_is_a_no_op() {
        let mut world = GameWorld::new(Vec3i::new(3, 3, 1)).unwrap();
        world.insert(EntityParts::wall(Vec3i::new(0, 0, 0)));
        let mut cache = Cache::new();
        cache.rebuild(&world);
        update_player_memory(&mut world, &mut cache);
        assert!(world.find_players().is_empty());
    }
}
