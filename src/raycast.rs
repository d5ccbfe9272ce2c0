//! Exact integer ray-voxel traversal and precomputed ray templates.
//!
//! A [`RayCaster`] is built once per (radius, world maxima) pair. The build
//! enumerates every cell offset inside the visibility sphere, deduplicates
//! offsets that share a ray direction from the origin, and traces each
//! surviving target with an exact fixed-point traversal. The resulting voxel
//! sequences are replayed against arbitrary origins each frame, so the
//! expensive geometry runs once per parameter tuple instead of once per turn.
//!
//! All traversal arithmetic is integer: the fixed-point unit is chosen
//! divisible by every non-zero axis delta, so ray steps land exactly on voxel
//! boundaries and no floating-point rounding can desynchronize the axes.

use std::collections::BTreeMap;

use crate::math::{greatest_divisor, Vec3i};

/// Rays longer than this on any axis are rejected at build time.
const MAX_DELTA: i64 = 256;

/// Cell offsets within an axis-clamped radius `r` whose squared distance does
/// not exceed `max(3, r² + 1)`.
///
/// The inclusion slack keeps the eight immediate diagonals of the origin
/// inside every non-degenerate sphere; it is part of the visibility contract
/// and must not be tightened.
pub fn radius_to_cell_coordinates(r: i32, maxima: Vec3i) -> Vec<Vec3i> {
    let mut output = Vec::new();
    let rx = maxima.x.min(r);
    let ry = maxima.y.min(r);
    let rz = maxima.z.min(r);
    let s = (r as i64 * r as i64 + 1).max(3);

    for z in -rz..=rz {
        for y in -ry..=ry {
            for x in -rx..=rx {
                let candidate = Vec3i::new(x, y, z);
                if candidate.dot(candidate) <= s {
                    output.push(candidate);
                }
            }
        }
    }

    output
}

/// Collapse targets that lie on the same ray from `origo`, keeping only the
/// farthest target per direction. The direction key is the delta divided by
/// the greatest common divisor of its components; ties keep the first seen.
fn filter_ray_targets(origo: Vec3i, targets: &[Vec3i]) -> Vec<Vec3i> {
    let mut direction_to_entry: BTreeMap<Vec3i, (Vec3i, i64)> = BTreeMap::new();

    for &target in targets {
        let delta = target - origo;
        let div = greatest_divisor(delta);
        let direction = if div == 0 {
            delta
        } else {
            Vec3i::new(delta.x / div, delta.y / div, delta.z / div)
        };
        let sqr = delta.dot(delta);

        match direction_to_entry.get(&direction) {
            Some(&(_, known_sqr)) if known_sqr >= sqr => {}
            _ => {
                direction_to_entry.insert(direction, (target, sqr));
            }
        }
    }

    direction_to_entry.into_values().map(|(v, _)| v).collect()
}

/// Casts a ray from `a` to `b` and appends every voxel it intersects to
/// `out`. A voxel counts as intersected only when the ray passes through its
/// interior; grazing a face, edge or corner does not count. `scale` is the
/// voxel size relative to the coordinate grid.
///
/// Produces nothing when `a == b`, when any axis delta reaches [`MAX_DELTA`]
/// (logged as a diagnostic), or when the ray starts exactly on a grid plane
/// of a zero-delta axis and so can never leave its own plane.
pub fn cast_ray(out: &mut Vec<Vec3i>, a: Vec3i, b: Vec3i, scale: i32) {
    if a == b {
        return;
    }

    let delta = b - a;

    // Only the magnitude of the delta matters for stepping; the sign is
    // reapplied when voxels are emitted.
    let x_step = delta.x.abs() as i64;
    let y_step = delta.y.abs() as i64;
    let z_step = delta.z.abs() as i64;

    if x_step >= MAX_DELTA || y_step >= MAX_DELTA || z_step >= MAX_DELTA {
        log::error!(
            "cast ray delta exceeds the maximum length of {}: a={:?} b={:?} scale={}",
            MAX_DELTA,
            a,
            b,
            scale,
        );
        return;
    }

    // Divisible by all non-zero step lengths, so every step lands exactly on
    // a voxel boundary and the per-axis remainders stay exact.
    let unit = x_step.max(1) * y_step.max(1) * z_step.max(1);
    let voxel_size = unit * scale as i64;

    let mut ax = a.x as i64 * unit;
    let mut ay = a.y as i64 * unit;
    let mut az = a.z as i64 * unit;

    if (x_step == 0 && ax % voxel_size == 0)
        || (y_step == 0 && ay % voxel_size == 0)
        || (z_step == 0 && az % voxel_size == 0)
    {
        // Locked onto one or more grid planes; no voxel interior is reachable.
        return;
    }

    if delta.x < 0 {
        ax = -ax;
    }
    if delta.y < 0 {
        ay = -ay;
    }
    if delta.z < 0 {
        az = -az;
    }

    let x_mod: i64 = if delta.x < 0 { -1 } else { 1 };
    let y_mod: i64 = if delta.y < 0 { -1 } else { 1 };
    let z_mod: i64 = if delta.z < 0 { -1 } else { 1 };

    let mut rx = if ax < 0 { ax % voxel_size + voxel_size } else { ax % voxel_size };
    let mut ry = if ay < 0 { ay % voxel_size + voxel_size } else { ay % voxel_size };
    let mut rz = if az < 0 { az % voxel_size + voxel_size } else { az % voxel_size };

    let rx_max = rx + unit * x_step;
    let ry_max = ry + unit * y_step;
    let rz_max = rz + unit * z_step;

    let x_offset = (a.x as i64).div_euclid(scale as i64);
    let y_offset = (a.y as i64).div_euclid(scale as i64);
    let z_offset = (a.z as i64).div_euclid(scale as i64);

    while rx < rx_max || ry < ry_max || rz < rz_max {
        out.push(Vec3i::new(
            (x_offset + x_mod * (rx / voxel_size)) as i32,
            (y_offset + y_mod * (ry / voxel_size)) as i32,
            (z_offset + z_mod * (rz / voxel_size)) as i32,
        ));

        // Advance every axis by the smallest step fraction that makes some
        // axis wrap to its next voxel boundary. Each candidate quotient is an
        // exact integer because the remainders stay multiples of their steps.
        let mut multiplier = i64::MAX;
        if x_step > 0 {
            multiplier = multiplier.min((voxel_size - rx % voxel_size) / x_step);
        }
        if y_step > 0 {
            multiplier = multiplier.min((voxel_size - ry % voxel_size) / y_step);
        }
        if z_step > 0 {
            multiplier = multiplier.min((voxel_size - rz % voxel_size) / z_step);
        }

        rx += multiplier * x_step;
        ry += multiplier * y_step;
        rz += multiplier * z_step;
    }
}

/// A precomputed, deduplicated set of voxel rays from a canonical origin,
/// replayable against arbitrary origins.
pub struct RayCaster {
    /// Voxel offsets of every ray, concatenated.
    rays: Vec<Vec3i>,
    /// Cumulative end index of each ray within `rays`.
    limits: Vec<usize>,
}

impl RayCaster {
    /// Precompute the ray template for a visibility radius clamped to the
    /// world's per-axis maxima.
    ///
    /// Targets are transformed into a doubled-resolution grid around the
    /// synthetic origin (1,1,1) so that sub-cell ray alignment is exact
    /// without fractional arithmetic.
    pub fn new(radius: i32, maxima: Vec3i) -> Self {
        let origo = Vec3i::ONE;
        let cells = radius_to_cell_coordinates(radius, maxima);
        let transformed: Vec<Vec3i> = cells.iter().map(|&v| v * 2 + origo).collect();
        let unique = filter_ray_targets(origo, &transformed);

        let mut rays = Vec::new();
        let mut limits = Vec::new();

        for target in unique {
            cast_ray(&mut rays, origo, target, 2);
            limits.push(rays.len());
        }

        Self { rays, limits }
    }

    /// Replay the template from `origo`, marking `output` with `write_mask`
    /// at every reached in-bounds voxel. Voxels outside `[0, size)` are
    /// skipped without marking while the ray continues. A voxel whose
    /// `target` flags intersect `read_mask` terminates that ray only;
    /// occlusion never affects sibling rays.
    pub fn cast(
        &self,
        output: &mut [u8],
        target: &[u8],
        size: Vec3i,
        origo: Vec3i,
        write_mask: u8,
        read_mask: u8,
    ) {
        let x_stride = size.x as usize;
        let xy_stride = (size.x * size.y) as usize;

        let mut start = 0;
        for &end in &self.limits {
            for &offset in &self.rays[start..end] {
                let p = origo + offset;
                if p.x < 0
                    || p.x >= size.x
                    || p.y < 0
                    || p.y >= size.y
                    || p.z < 0
                    || p.z >= size.z
                {
                    continue;
                }

                let index = p.x as usize + p.y as usize * x_stride + p.z as usize * xy_stride;
                output[index] |= write_mask;
                if target[index] & read_mask != 0 {
                    break;
                }
            }
            start = end;
        }
    }
}
