//! Coordinate spaces: absolute blocks, chunks, and regions.
//!
//! A chunk is 16x16 blocks in the horizontal plane, a region is 32x32
//! chunks (512x512 blocks). Conversions are total and round-trip exactly
//! on aligned inputs: `chunk_origin(r).region() == r` for any region and
//! `block_origin(c) >> 4 == c` for any chunk.

use std::fmt;
use std::ops::{Add, Sub};

/// An absolute block position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Location {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The chunk containing this block.
    pub fn chunk(self) -> ChunkPos {
        ChunkPos::new(self.x >> 4, self.z >> 4)
    }

    /// The region containing this block.
    pub fn region(self) -> RegionPos {
        RegionPos::new(self.x >> 9, self.z >> 9)
    }

    /// Componentwise minimum.
    pub fn min(self, other: Self) -> Self {
        Self::new(
            self.x.min(other.x),
            self.y.min(other.y),
            self.z.min(other.z),
        )
    }

    /// Componentwise maximum.
    pub fn max(self, other: Self) -> Self {
        Self::new(
            self.x.max(other.x),
            self.y.max(other.y),
            self.z.max(other.z),
        )
    }
}

impl Add for Location {
    type Output = Location;

    fn add(self, rhs: Location) -> Location {
        Location::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Location {
    type Output = Location;

    fn sub(self, rhs: Location) -> Location {
        Location::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A chunk column position (block coordinates >> 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Absolute block coordinates of this chunk's minimum corner.
    pub fn block_origin(self) -> (i32, i32) {
        (self.x * 16, self.z * 16)
    }

    /// The region owning this chunk.
    pub fn region(self) -> RegionPos {
        RegionPos::new(self.x >> 5, self.z >> 5)
    }

    /// Chunk coordinates within the owning region, each in 0..32.
    pub fn region_relative(self) -> (usize, usize) {
        ((self.x & 31) as usize, (self.z & 31) as usize)
    }
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// A region position (chunk coordinates >> 5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionPos {
    pub x: i32,
    pub z: i32,
}

impl RegionPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk coordinates of this region's first chunk.
    pub fn chunk_origin(self) -> ChunkPos {
        ChunkPos::new(self.x * 32, self.z * 32)
    }

    /// Absolute block coordinates of this region's minimum corner.
    pub fn block_origin(self) -> (i32, i32) {
        (self.x * 512, self.z * 512)
    }

    /// File name of the container holding this region.
    pub fn file_name(self) -> String {
        format!("r.{}.{}.mca", self.x, self.z)
    }
}

impl fmt::Display for RegionPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_to_chunk() {
        assert_eq!(Location::new(0, 64, 0).chunk(), ChunkPos::new(0, 0));
        assert_eq!(Location::new(15, 0, 15).chunk(), ChunkPos::new(0, 0));
        assert_eq!(Location::new(16, 0, 31).chunk(), ChunkPos::new(1, 1));
        assert_eq!(Location::new(-1, 0, -1).chunk(), ChunkPos::new(-1, -1));
        assert_eq!(Location::new(-16, 0, -17).chunk(), ChunkPos::new(-1, -2));
    }

    #[test]
    fn block_to_region() {
        assert_eq!(Location::new(511, 0, 0).region(), RegionPos::new(0, 0));
        assert_eq!(Location::new(512, 0, -1).region(), RegionPos::new(1, -1));
        assert_eq!(Location::new(-513, 0, 0).region(), RegionPos::new(-2, 0));
    }

    #[test]
    fn region_to_chunk_example() {
        assert_eq!(RegionPos::new(3, -2).chunk_origin(), ChunkPos::new(96, -64));
    }

    #[test]
    fn chunk_region_roundtrip() {
        for x in [-70, -33, -32, -1, 0, 1, 31, 32, 100] {
            for z in [-70, -33, -32, -1, 0, 1, 31, 32, 100] {
                let r = ChunkPos::new(x, z).region();
                let origin = r.chunk_origin();
                assert_eq!(origin.region(), r);
                assert!(origin.x <= x && x < origin.x + 32);
                assert!(origin.z <= z && z < origin.z + 32);
            }
        }
    }

    #[test]
    fn chunk_block_roundtrip() {
        for x in [-5, -1, 0, 1, 42] {
            for z in [-5, -1, 0, 1, 42] {
                let c = ChunkPos::new(x, z);
                let (bx, bz) = c.block_origin();
                assert_eq!(Location::new(bx, 0, bz).chunk(), c);
            }
        }
    }

    #[test]
    fn region_relative_wraps_negatives() {
        assert_eq!(ChunkPos::new(0, 0).region_relative(), (0, 0));
        assert_eq!(ChunkPos::new(33, 31).region_relative(), (1, 31));
        assert_eq!(ChunkPos::new(-1, -32).region_relative(), (31, 0));
    }

    #[test]
    fn region_file_name() {
        assert_eq!(RegionPos::new(0, 0).file_name(), "r.0.0.mca");
        assert_eq!(RegionPos::new(-3, 12).file_name(), "r.-3.12.mca");
    }
}
