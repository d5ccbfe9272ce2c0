//! Basic demonstration of the gloam simulation.
//!
//! Run with: cargo run --example dungeon_walk

use gloam::{Action, Direction2D, Engine, EntityParts, GameWorld, Vec3i, VisualType};

fn main() {
    env_logger::init();

    println!("=== gloam - Dungeon Walk Demo ===\n");

    let mut engine = Engine::new();
    engine.set_world(Some(build_dungeon()));

    println!("Initial view:");
    print_view(&engine);

    // Walk a small loop through the room, past the pillars.
    let route = [
        Direction2D::East,
        Direction2D::East,
        Direction2D::NorthEast,
        Direction2D::North,
        Direction2D::West,
        Direction2D::SouthWest,
    ];

    for direction in route {
        engine.queue_player_action(Action::Walk(direction));
        engine.step_world();

        let time = engine.world().map(GameWorld::time).unwrap_or(0);
        println!("\n--- Turn {} (walked {:?}) ---", time, direction);
        print_view(&engine);
    }

    println!("\n=== Final View (JSON) ===\n");
    if let Some(view) = engine.player_view() {
        match view.to_json_pretty() {
            Ok(json) => println!("{}", json),
            Err(err) => eprintln!("failed to serialize view: {}", err),
        }
    }
}

/// A 12x8 walled room with floors inside and two opaque pillars near the
/// middle, the player starting in the southwest corner area.
fn build_dungeon() -> GameWorld {
    let size = Vec3i::new(12, 8, 1);
    let mut world = GameWorld::new(size).expect("static world size is valid");

    for y in 0..size.y {
        for x in 0..size.x {
            let position = Vec3i::new(x, y, 0);
            if x == 0 || y == 0 || x == size.x - 1 || y == size.y - 1 {
                world.insert(EntityParts::wall(position));
            } else {
                world.insert(EntityParts::floor(position));
            }
        }
    }

    world.insert(EntityParts::wall(Vec3i::new(5, 3, 0)));
    world.insert(EntityParts::wall(Vec3i::new(5, 4, 0)));
    world.insert(EntityParts::plant(Vec3i::new(9, 5, 0)));
    world.insert(EntityParts::player(Vec3i::new(2, 2, 0)));

    world
}

fn print_view(engine: &Engine) {
    let Some(view) = engine.player_view() else {
        println!("  no player view");
        return;
    };

    println!(
        "  player at ({}, {}), {} impressions",
        view.position.x,
        view.position.y,
        view.impressions.len()
    );

    // Render remembered cells: fresh impressions uppercase, stale lowercase.
    let mut rows = vec![vec![' '; view.area_size.x as usize]; view.area_size.y as usize];
    for impression in &view.impressions {
        let glyph = match impression.visual_type {
            VisualType::Floor => '.',
            VisualType::Plant => 'P',
            VisualType::Player => '@',
            VisualType::Wall => '#',
            VisualType::Unknown => '?',
        };
        let glyph = if impression.time == view.area_time {
            glyph
        } else {
            glyph.to_ascii_lowercase()
        };
        rows[impression.position.y as usize][impression.position.x as usize] = glyph;
    }

    // Print north side up.
    for row in rows.iter().rev() {
        println!("  {}", row.iter().collect::<String>());
    }
}
