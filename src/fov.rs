//! Field-of-view cache.
//!
//! Wraps the [`RayCaster`] templates with a per-frame visibility bitmap for a
//! single viewer. Templates are memoized by value equality on the exact
//! (radius, world maxima) tuple; the world size never mutates in place after
//! load, so the memo needs no invalidation.

use std::collections::HashMap;

use crate::math::Vec3i;
use crate::raycast::RayCaster;
use crate::spatial::{CellFlag, SpatialCache};
use crate::world::GameWorld;

/// Bit set in the visibility buffer for a reachable cell.
const VISIBLE: u8 = 1;

/// Visibility bitmap for one viewer position, refreshed once per turn per
/// player from the spatial cache's light-blocking flags.
#[derive(Default)]
pub struct FieldOfViewCache {
    size: Vec3i,
    bounds_min: Vec3i,
    bounds_max: Vec3i,
    buffer: Vec<u8>,
    casters: HashMap<(i32, Vec3i), RayCaster>,
}

impl FieldOfViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-allocate the visibility buffer for a freshly loaded world. Memoized
    /// ray templates are kept; they are keyed by parameters, not by world.
    pub fn rebuild(&mut self, world: &GameWorld) {
        let size = world.size();
        self.size = size;
        self.bounds_min = world.bounds_min();
        self.bounds_max = world.bounds_max();
        self.buffer = vec![0; size.volume()];
    }

    /// World size the cache was last rebuilt for.
    pub fn size(&self) -> Vec3i {
        self.size
    }

    /// Recompute visibility from `origin` out to `radius`, treating the
    /// spatial cache's opaque cells as occluders. An out-of-bounds origin or
    /// a size mismatch with the spatial cache is logged and skips the update.
    pub fn update(&mut self, origin: Vec3i, radius: i32, spatial: &SpatialCache) {
        if !origin.is_inside(self.bounds_min, self.bounds_max) {
            log::error!(
                "field of view origin out of bounds: origin={:?} bounds_min={:?} bounds_max={:?}",
                origin,
                self.bounds_min,
                self.bounds_max,
            );
            return;
        }

        if self.size != spatial.size() {
            log::error!(
                "field of view size does not match the spatial cache: fov_size={:?} spatial_size={:?}",
                self.size,
                spatial.size(),
            );
            return;
        }

        let maxima = self.size - Vec3i::ONE;
        let caster = self
            .casters
            .entry((radius, maxima))
            .or_insert_with(|| RayCaster::new(radius, maxima));

        self.buffer.fill(0);
        caster.cast(
            &mut self.buffer,
            spatial.cells(),
            self.size,
            origin,
            VISIBLE,
            CellFlag::OPAQUE,
        );
    }

    /// Whether a cell was reachable in the last update. Out-of-bounds
    /// positions log a diagnostic and read as not visible.
    pub fn is_visible(&self, position: Vec3i) -> bool {
        if !position.is_inside(self.bounds_min, self.bounds_max) {
            log::error!(
                "tried checking visibility out of bounds: position={:?} bounds_min={:?} bounds_max={:?}",
                position,
                self.bounds_min,
                self.bounds_max,
            );
            return false;
        }

        let index =
            (position.x + position.y * self.size.x + position.z * self.size.x * self.size.y) as usize;
        self.buffer.get(index).copied().unwrap_or(0) & VISIBLE != 0
    }
}
