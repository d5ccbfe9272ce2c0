//! Movement resolution: pending walk actions against the spatial cache.

use bevy_ecs::prelude::Entity;

use crate::api::Cache;
use crate::components::{Action, Actor, Direction2D, EntityId, Position};
use crate::math::Vec3i;
use crate::spatial::{CellFlag, SpatialCache};
use crate::world::GameWorld;

/// Resolve every player's pending action. Each player moves at most one step;
/// the pending action is cleared afterwards whether or not a move happened.
pub fn perform_actions(world: &mut GameWorld, cache: &mut Cache) {
    let players: Vec<Entity> = world.find_players().to_vec();

    for entity in players {
        let action = match world.ecs().get::<Actor>(entity) {
            Some(actor) => actor.next_action,
            None => continue,
        };

        if let Action::Walk(direction) = action {
            resolve_walk(world, cache, entity, direction);
        }

        if let Some(mut actor) = world.ecs_mut().get_mut::<Actor>(entity) {
            actor.next_action = Action::None;
        }
    }
}

/// Whether a cell can be stepped into: inside the world and not filled.
fn is_open(world: &GameWorld, spatial: &SpatialCache, position: Vec3i) -> bool {
    world.contains(position) && spatial.cell_flags(position) & CellFlag::FILLED == 0
}

fn resolve_walk(world: &mut GameWorld, cache: &mut Cache, entity: Entity, direction: Direction2D) {
    let origin = match world.ecs().get::<Position>(entity) {
        Some(&Position(position)) => position,
        None => return,
    };

    let step = direction.step();
    let target = if direction.is_diagonal() {
        let diagonal = origin + step;
        let side_x = origin + Vec3i::new(step.x, 0, 0);
        let side_y = origin + Vec3i::new(0, step.y, 0);

        if is_open(world, &cache.spatial, diagonal) {
            Some(diagonal)
        } else {
            // Slide along the single open orthogonal neighbor. Two open
            // neighbors would cut a corner, two closed ones leave nowhere to
            // go; neither moves.
            match (
                is_open(world, &cache.spatial, side_x),
                is_open(world, &cache.spatial, side_y),
            ) {
                (true, false) => Some(side_x),
                (false, true) => Some(side_y),
                _ => None,
            }
        }
    } else {
        let straight = origin + step;
        is_open(world, &cache.spatial, straight).then_some(straight)
    };

    let Some(target) = target else {
        return;
    };

    let id = match world.ecs().get::<EntityId>(entity) {
        Some(&id) => id,
        None => return,
    };

    if let Some(mut position) = world.ecs_mut().get_mut::<Position>(entity) {
        position.0 = target;
    }
    cache.spatial.entity_moved(id, origin, target);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::EntityParts;

    fn setup(size: Vec3i, walls: &[Vec3i], player_at: Vec3i) -> (GameWorld, Cache, Entity) {
        let mut world = GameWorld::new(size).unwrap();
        for &position in walls {
            world.insert(EntityParts::wall(position));
        }
        world.insert(EntityParts::player(player_at));

        let mut cache = Cache::new();
        cache.rebuild(&world);
        let player = world.find_players()[0];
        (world, cache, player)
    }

    fn queue(world: &mut GameWorld, player: Entity, direction: Direction2D) {
        world.ecs_mut().get_mut::<Actor>(player).unwrap().next_action = Action::Walk(direction);
    }

    fn position_of(world: &GameWorld, player: Entity) -> Vec3i {
        world.ecs().get::<Position>(player).unwrap().0
    }

    #[test]
    fn test_walk_into_open_cell() {
        let (mut world, mut cache, player) = setup(Vec3i::new(5, 5, 1), &[], Vec3i::new(2, 2, 0));
        queue(&mut world, player, Direction2D::North);
        perform_actions(&mut world, &mut cache);

        assert_eq!(position_of(&world, player), Vec3i::new(2, 3, 0));
        // The cache followed the move.
        assert_eq!(cache.spatial.cell_flags(Vec3i::new(2, 2, 0)), CellFlag::EMPTY);
        assert_eq!(cache.spatial.cell_flags(Vec3i::new(2, 3, 0)), CellFlag::FILLED);
        // The action was consumed.
        assert_eq!(
            world.ecs().get::<Actor>(player).unwrap().next_action,
            Action::None
        );
    }

    #[test]
    fn test_walk_into_wall_is_refused() {
        let walls = [Vec3i::new(2, 3, 0)];
        let (mut world, mut cache, player) = setup(Vec3i::new(5, 5, 1), &walls, Vec3i::new(2, 2, 0));
        queue(&mut world, player, Direction2D::North);
        perform_actions(&mut world, &mut cache);

        assert_eq!(position_of(&world, player), Vec3i::new(2, 2, 0));
        assert_eq!(
            world.ecs().get::<Actor>(player).unwrap().next_action,
            Action::None
        );
    }

    #[test]
    fn test_walk_out_of_bounds_is_refused() {
        let (mut world, mut cache, player) = setup(Vec3i::new(5, 5, 1), &[], Vec3i::new(0, 0, 0));
        queue(&mut world, player, Direction2D::West);
        perform_actions(&mut world, &mut cache);
        assert_eq!(position_of(&world, player), Vec3i::new(0, 0, 0));
    }

    #[test]
    fn test_open_diagonal_moves_diagonally() {
        let (mut world, mut cache, player) = setup(Vec3i::new(5, 5, 1), &[], Vec3i::new(2, 2, 0));
        queue(&mut world, player, Direction2D::NorthEast);
        perform_actions(&mut world, &mut cache);
        assert_eq!(position_of(&world, player), Vec3i::new(3, 3, 0));
    }

    #[test]
    fn test_blocked_diagonal_slides_into_single_open_side() {
        // Diagonal target and the east side blocked: slide north.
        let walls = [Vec3i::new(3, 3, 0), Vec3i::new(3, 2, 0)];
        let (mut world, mut cache, player) = setup(Vec3i::new(5, 5, 1), &walls, Vec3i::new(2, 2, 0));
        queue(&mut world, player, Direction2D::NorthEast);
        perform_actions(&mut world, &mut cache);
        assert_eq!(position_of(&world, player), Vec3i::new(2, 3, 0));
    }

    #[test]
    fn test_blocked_diagonal_with_both_sides_open_stays_put() {
        let walls = [Vec3i::new(3, 3, 0)];
        let (mut world, mut cache, player) = setup(Vec3i::new(5, 5, 1), &walls, Vec3i::new(2, 2, 0));
        queue(&mut world, player, Direction2D::NorthEast);
        perform_actions(&mut world, &mut cache);
        assert_eq!(position_of(&world, player), Vec3i::new(2, 2, 0));
    }

    #[test]
    fn test_blocked_diagonal_with_both_sides_closed_stays_put() {
        let walls = [Vec3i::new(3, 3, 0), Vec3i::new(3, 2, 0), Vec3i::new(2, 3, 0)];
        let (mut world, mut cache, player) = setup(Vec3i::new(5, 5, 1), &walls, Vec3i::new(2, 2, 0));
        queue(&mut world, player, Direction2D::NorthEast);
        perform_actions(&mut world, &mut cache);
        assert_eq!(position_of(&world, player), Vec3i::new(2, 2, 0));
    }

    #[test]
    fn test_at_most_one_step_per_invocation() {
        let (mut world, mut cache, player) = setup(Vec3i::new(9, 9, 1), &[], Vec3i::new(1, 1, 0));
        queue(&mut world, player, Direction2D::East);
        perform_actions(&mut world, &mut cache);
        // A second invocation without a newly queued action does nothing.
        perform_actions(&mut world, &mut cache);
        assert_eq!(position_of(&world, player), Vec3i::new(2, 1, 0));
    }

    #[test]
    fn test_players_block_each_other() {
        let mut world = GameWorld::new(Vec3i::new(5, 5, 1)).unwrap();
        world.insert(EntityParts::player(Vec3i::new(1, 1, 0)));
        world.insert(EntityParts::player(Vec3i::new(2, 1, 0)));
        let mut cache = Cache::new();
        cache.rebuild(&world);

        let mover = world.find_players()[0];
        queue(&mut world, mover, Direction2D::East);
        perform_actions(&mut world, &mut cache);
        assert_eq!(position_of(&world, mover), Vec3i::new(1, 1, 0));
    }
}
