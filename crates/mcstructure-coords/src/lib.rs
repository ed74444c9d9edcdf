//! Volume dimensions, cell coordinates, and inclusive box regions for fixed-size structures.
//!
//! Cells are linearized row-major with `z` varying fastest:
//! `index = size.z * size.y * x + size.z * y + z`.

mod region;

pub use region::{Region, RegionIter};

use serde::{Deserialize, Serialize};

/// Dimensions of a structure volume. Every axis is positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Size {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns `true` if every axis is strictly positive.
    pub fn is_valid(&self) -> bool {
        self.x > 0 && self.y > 0 && self.z > 0
    }

    /// Total number of cells.
    ///
    /// Factors are widened to `u64` before multiplying, so sizes up to tens of
    /// thousands per axis cannot overflow on 64-bit targets.
    pub fn volume(&self) -> usize {
        (self.x.max(0) as u64 * self.y.max(0) as u64 * self.z.max(0) as u64) as usize
    }

    /// Like [`volume`](Self::volume) but returns `None` instead of wrapping.
    pub fn checked_volume(&self) -> Option<usize> {
        if !self.is_valid() {
            return None;
        }
        let volume = (self.x as u64)
            .checked_mul(self.y as u64)?
            .checked_mul(self.z as u64)?;
        usize::try_from(volume).ok()
    }

    /// Returns `true` if `point` lies in `[0, x) × [0, y) × [0, z)`.
    pub fn contains(&self, point: Coordinate) -> bool {
        point.x >= 0
            && point.y >= 0
            && point.z >= 0
            && point.x < self.x
            && point.y < self.y
            && point.z < self.z
    }

    /// Flat index of `point`, or `None` if it lies outside the volume.
    pub fn index_of(&self, point: Coordinate) -> Option<usize> {
        self.contains(point).then(|| point.to_index(*self))
    }
}

/// Integer cell position inside (or relative to) a structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Coordinate {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Converts a flat index back to a coordinate. Inverse of [`to_index`](Self::to_index).
    pub fn from_index(index: usize, size: Size) -> Self {
        debug_assert!(index < size.volume(), "index {index} outside volume {size:?}");
        let sy = size.y as usize;
        let sz = size.z as usize;
        Self {
            x: (index / sz / sy) as i32,
            y: (index / sz % sy) as i32,
            z: (index % sz) as i32,
        }
    }

    /// Row-major flat index with `z` fastest-varying.
    ///
    /// The coordinate must lie inside `size`; use [`Size::index_of`] for a checked variant.
    pub fn to_index(self, size: Size) -> usize {
        debug_assert!(size.contains(self), "{self:?} outside volume {size:?}");
        let sy = size.y as usize;
        let sz = size.z as usize;
        sz * sy * self.x as usize + sz * self.y as usize + self.z as usize
    }
}

impl From<(i32, i32, i32)> for Coordinate {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Self::new(x, y, z)
    }
}

impl From<[i32; 3]> for Coordinate {
    fn from([x, y, z]: [i32; 3]) -> Self {
        Self::new(x, y, z)
    }
}
