//! Integer vector math for cell-grid geometry.
//!
//! All world positions, sizes and bounds are integer 3-vectors. Squared
//! distances and dot products are widened to `i64` so ray precomputation
//! never rounds or overflows.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// A three-component integer vector.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Vec3i {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Vec3i {
    pub const ZERO: Vec3i = Vec3i { x: 0, y: 0, z: 0 };
    pub const ONE: Vec3i = Vec3i { x: 1, y: 1, z: 1 };

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub const fn splat(v: i32) -> Self {
        Self { x: v, y: v, z: v }
    }

    /// Componentwise minimum.
    pub fn min(self, other: Vec3i) -> Vec3i {
        Vec3i::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    /// Componentwise maximum.
    pub fn max(self, other: Vec3i) -> Vec3i {
        Vec3i::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    /// Componentwise floor division.
    pub fn div_floor(self, rhs: Vec3i) -> Vec3i {
        Vec3i::new(
            self.x.div_euclid(rhs.x),
            self.y.div_euclid(rhs.y),
            self.z.div_euclid(rhs.z),
        )
    }

    /// Componentwise ceiling division. Divisors must be positive.
    pub fn div_ceil(self, rhs: Vec3i) -> Vec3i {
        Vec3i::new(
            (self.x + rhs.x - 1).div_euclid(rhs.x),
            (self.y + rhs.y - 1).div_euclid(rhs.y),
            (self.z + rhs.z - 1).div_euclid(rhs.z),
        )
    }

    /// Inclusive bounds check on every axis.
    pub fn is_inside(self, min: Vec3i, max: Vec3i) -> bool {
        self.x >= min.x
            && self.x <= max.x
            && self.y >= min.y
            && self.y <= max.y
            && self.z >= min.z
            && self.z <= max.z
    }

    /// Number of cells in a box of this size. Components must be non-negative.
    pub fn volume(self) -> usize {
        self.x as usize * self.y as usize * self.z as usize
    }

    pub fn dot(self, other: Vec3i) -> i64 {
        self.x as i64 * other.x as i64
            + self.y as i64 * other.y as i64
            + self.z as i64 * other.z as i64
    }
}

impl Add for Vec3i {
    type Output = Vec3i;

    fn add(self, rhs: Vec3i) -> Vec3i {
        Vec3i::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3i {
    type Output = Vec3i;

    fn sub(self, rhs: Vec3i) -> Vec3i {
        Vec3i::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<i32> for Vec3i {
    type Output = Vec3i;

    fn mul(self, rhs: i32) -> Vec3i {
        Vec3i::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Greatest common divisor of two non-negative integers.
pub fn gcd(mut a: i32, mut b: i32) -> i32 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Greatest common divisor of a vector's absolute components.
///
/// Returns 0 for the zero vector.
pub fn greatest_divisor(v: Vec3i) -> i32 {
    gcd(v.x.abs(), gcd(v.y.abs(), v.z.abs()))
}
