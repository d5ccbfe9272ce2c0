//! Chunked spatial occupancy cache.
//!
//! The world is partitioned into fixed 4×4×1-cell chunks. Each chunk tracks
//! the positioned entities inside it so that a single entity move only
//! recomputes the cell flags of the chunk (or two chunks) it touches, instead
//! of the whole grid.
//!
//! Queries never fail: out-of-bounds reads log a structured diagnostic and
//! return empty flags, and an inconsistent move update aborts that update
//! only, leaving the rest of the turn to proceed.

use crate::components::{Collision, EntityId, Position, Shape};
use crate::math::Vec3i;
use crate::world::GameWorld;

const CHUNK_SIZE: Vec3i = Vec3i::new(4, 4, 1);

/// Per-cell blocking flags. A cell's flags are the OR of the contributions of
/// every entity at that cell.
pub struct CellFlag;

impl CellFlag {
    pub const EMPTY: u8 = 0;
    /// The cell blocks movement.
    pub const FILLED: u8 = 1 << 0;
    /// The cell blocks light.
    pub const OPAQUE: u8 = 1 << 1;
}

/// Blocking flags contributed by a collision component.
pub fn collision_flags(collision: &Collision) -> u8 {
    let mut flags = CellFlag::EMPTY;
    if collision.physical == Shape::Filled {
        flags |= CellFlag::FILLED;
    }
    if collision.light == Shape::Filled {
        flags |= CellFlag::OPAQUE;
    }
    flags
}

/// Entry in a spatial chunk: a snapshot of one positioned entity.
#[derive(Debug, Clone, Copy)]
struct SpatialEntry {
    id: EntityId,
    position: Vec3i,
    flags: u8,
}

/// A 4×4×1-cell region and the entities currently inside it.
#[derive(Debug)]
struct Chunk {
    entries: Vec<SpatialEntry>,
    origo: Vec3i,
    limit: Vec3i,
}

/// Flat per-cell blocking flags over the whole world, maintained chunk by
/// chunk as entities move.
#[derive(Default)]
pub struct SpatialCache {
    size: Vec3i,
    bounds_min: Vec3i,
    bounds_max: Vec3i,
    x_stride_cells: i32,
    xy_stride_cells: i32,
    cells: Vec<u8>,

    x_stride_chunks: i32,
    xy_stride_chunks: i32,
    chunks: Vec<Chunk>,
}

impl SpatialCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// World size the cache was last rebuilt for.
    pub fn size(&self) -> Vec3i {
        self.size
    }

    /// The raw cell flag buffer, indexed x + y * size.x + z * size.x * size.y.
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    fn cell_index(&self, position: Vec3i) -> usize {
        (position.x + position.y * self.x_stride_cells + position.z * self.xy_stride_cells) as usize
    }

    fn chunk_index(&self, position: Vec3i) -> usize {
        let chunk = position.div_floor(CHUNK_SIZE);
        (chunk.x + chunk.y * self.x_stride_chunks + chunk.z * self.xy_stride_chunks) as usize
    }

    fn update_cells_by_chunk_index(&mut self, chunk_index: usize) {
        let chunk = &self.chunks[chunk_index];
        let origo = chunk.origo;
        let limit = chunk.limit;

        for z in origo.z..limit.z {
            for y in origo.y..limit.y {
                for x in origo.x..limit.x {
                    let index = (x + y * self.x_stride_cells + z * self.xy_stride_cells) as usize;
                    self.cells[index] = CellFlag::EMPTY;
                }
            }
        }

        for i in 0..self.chunks[chunk_index].entries.len() {
            let entry = self.chunks[chunk_index].entries[i];
            let index = self.cell_index(entry.position);
            self.cells[index] |= entry.flags;
        }
    }

    /// Rebuild the whole cache from the world: allocate the chunk grid, bucket
    /// every positioned entity, then recompute every chunk's cell region.
    pub fn rebuild(&mut self, world: &GameWorld) {
        let size = world.size();
        let chunk_counts = size.div_ceil(CHUNK_SIZE);

        self.size = size;
        self.bounds_min = world.bounds_min();
        self.bounds_max = world.bounds_max();
        self.x_stride_cells = size.x;
        self.xy_stride_cells = size.x * size.y;
        self.cells = vec![CellFlag::EMPTY; size.volume()];

        self.x_stride_chunks = chunk_counts.x;
        self.xy_stride_chunks = chunk_counts.x * chunk_counts.y;
        self.chunks.clear();

        for z in 0..chunk_counts.z {
            for y in 0..chunk_counts.y {
                for x in 0..chunk_counts.x {
                    let origo = Vec3i::new(
                        x * CHUNK_SIZE.x,
                        y * CHUNK_SIZE.y,
                        z * CHUNK_SIZE.z,
                    );
                    let limit = size.min(origo + CHUNK_SIZE);
                    self.chunks.push(Chunk {
                        entries: Vec::new(),
                        origo,
                        limit,
                    });
                }
            }
        }

        for &entity in world.entities() {
            let Some(&Position(position)) = world.ecs().get::<Position>(entity) else {
                continue;
            };
            let Some(&id) = world.ecs().get::<EntityId>(entity) else {
                continue;
            };
            let flags = world
                .ecs()
                .get::<Collision>(entity)
                .map(collision_flags)
                .unwrap_or(CellFlag::EMPTY);

            let index = self.chunk_index(position);
            self.chunks[index].entries.push(SpatialEntry {
                id,
                position,
                flags,
            });
        }

        for i in 0..self.chunks.len() {
            self.update_cells_by_chunk_index(i);
        }
    }

    /// Blocking flags at a cell. Out-of-bounds positions log a diagnostic and
    /// read as empty; a query never interrupts the turn loop.
    pub fn cell_flags(&self, position: Vec3i) -> u8 {
        if !position.is_inside(self.bounds_min, self.bounds_max) {
            log::error!(
                "tried accessing cell flags out of bounds: position={:?} bounds_min={:?} bounds_max={:?}",
                position,
                self.bounds_min,
                self.bounds_max,
            );
            return CellFlag::EMPTY;
        }

        let index = self.cell_index(position);
        self.cells.get(index).copied().unwrap_or(CellFlag::EMPTY)
    }

    /// Patch the cache after an entity moved from `old_position` to
    /// `new_position`. Within one chunk only that chunk is recomputed; across
    /// chunks the entry is swap-removed from the old chunk and appended to the
    /// new one, and both regions are recomputed.
    ///
    /// If the entity is not listed in the expected old chunk the cache is
    /// already inconsistent; the update is logged and aborted with no partial
    /// correction.
    pub fn entity_moved(&mut self, id: EntityId, old_position: Vec3i, new_position: Vec3i) {
        if !old_position.is_inside(self.bounds_min, self.bounds_max) {
            log::error!(
                "invalid old position while moving entity: id={:?} old_position={:?} bounds_min={:?} bounds_max={:?}",
                id,
                old_position,
                self.bounds_min,
                self.bounds_max,
            );
            return;
        }

        if !new_position.is_inside(self.bounds_min, self.bounds_max) {
            log::error!(
                "invalid new position while moving entity: id={:?} new_position={:?} bounds_min={:?} bounds_max={:?}",
                id,
                new_position,
                self.bounds_min,
                self.bounds_max,
            );
            return;
        }

        let old_chunk_index = self.chunk_index(old_position);
        let new_chunk_index = self.chunk_index(new_position);

        let Some(index_in_old) = self.chunks[old_chunk_index]
            .entries
            .iter()
            .position(|entry| entry.id == id)
        else {
            log::error!(
                "failed to find moved entity in old chunk: id={:?} old_position={:?} chunk_index={}",
                id,
                old_position,
                old_chunk_index,
            );
            return;
        };

        if old_chunk_index == new_chunk_index {
            self.chunks[old_chunk_index].entries[index_in_old].position = new_position;
            self.update_cells_by_chunk_index(old_chunk_index);
        } else {
            let mut entry = self.chunks[old_chunk_index].entries.swap_remove(index_in_old);
            entry.position = new_position;
            self.chunks[new_chunk_index].entries.push(entry);
            self.update_cells_by_chunk_index(old_chunk_index);
            self.update_cells_by_chunk_index(new_chunk_index);
        }
    }
}
