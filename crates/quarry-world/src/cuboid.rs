//! Inclusive axis-aligned boxes of block positions.

use crate::coord::{ChunkPos, Location};

/// A cuboid of absolute block positions, both corners inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cuboid {
    min: Location,
    max: Location,
}

impl Cuboid {
    /// Build a cuboid from two opposite corners, in any order; each axis is
    /// normalized independently.
    pub fn new(a: Location, b: Location) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn min(&self) -> Location {
        self.min
    }

    pub fn max(&self) -> Location {
        self.max
    }

    pub fn volume(&self) -> u64 {
        let d = self.max - self.min + Location::new(1, 1, 1);
        d.x as u64 * d.y as u64 * d.z as u64
    }

    pub fn contains(&self, loc: Location) -> bool {
        loc.x >= self.min.x
            && loc.x <= self.max.x
            && loc.y >= self.min.y
            && loc.y <= self.max.y
            && loc.z >= self.min.z
            && loc.z <= self.max.z
    }

    /// Intersection of two cuboids, or `None` if they are disjoint.
    pub fn intersection(&self, other: &Cuboid) -> Option<Cuboid> {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);
        if min.x > max.x || min.y > max.y || min.z > max.z {
            return None;
        }
        Some(Cuboid { min, max })
    }

    /// Every block position in the cuboid, y-major then z then x.
    pub fn locations(&self) -> Locations {
        Locations {
            cuboid: *self,
            next: Some(self.min),
        }
    }

    /// Every chunk overlapped by this cuboid, x-major.
    pub fn chunks(&self) -> impl Iterator<Item = ChunkPos> {
        let min = self.min.chunk();
        let max = self.max.chunk();
        (min.x..=max.x).flat_map(move |x| (min.z..=max.z).map(move |z| ChunkPos::new(x, z)))
    }
}

/// Lazy iterator over every position in a cuboid.
pub struct Locations {
    cuboid: Cuboid,
    next: Option<Location>,
}

impl Iterator for Locations {
    type Item = Location;

    fn next(&mut self) -> Option<Location> {
        let cur = self.next?;
        let (min, max) = (self.cuboid.min, self.cuboid.max);
        let mut nxt = cur;
        nxt.x += 1;
        if nxt.x > max.x {
            nxt.x = min.x;
            nxt.z += 1;
            if nxt.z > max.z {
                nxt.z = min.z;
                nxt.y += 1;
            }
        }
        self.next = (nxt.y <= max.y).then_some(nxt);
        Some(cur)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_normalize_per_axis() {
        let c = Cuboid::new(Location::new(5, -1, 0), Location::new(-2, 3, 0));
        assert_eq!(c.min(), Location::new(-2, -1, 0));
        assert_eq!(c.max(), Location::new(5, 3, 0));
    }

    #[test]
    fn volume_counts_inclusive_bounds() {
        let c = Cuboid::new(Location::new(0, 0, 0), Location::new(1, 2, 3));
        assert_eq!(c.volume(), 2 * 3 * 4);
        let single = Cuboid::new(Location::new(7, 7, 7), Location::new(7, 7, 7));
        assert_eq!(single.volume(), 1);
    }

    #[test]
    fn contains_is_inclusive() {
        let c = Cuboid::new(Location::new(0, 0, 0), Location::new(2, 2, 2));
        assert!(c.contains(Location::new(0, 0, 0)));
        assert!(c.contains(Location::new(2, 2, 2)));
        assert!(!c.contains(Location::new(3, 0, 0)));
        assert!(!c.contains(Location::new(0, -1, 0)));
    }

    #[test]
    fn intersection_overlapping() {
        let a = Cuboid::new(Location::new(0, 0, 0), Location::new(10, 10, 10));
        let b = Cuboid::new(Location::new(5, 5, 5), Location::new(20, 20, 20));
        let got = a.intersection(&b).unwrap();
        assert_eq!(got.min(), Location::new(5, 5, 5));
        assert_eq!(got.max(), Location::new(10, 10, 10));
    }

    #[test]
    fn intersection_disjoint() {
        let a = Cuboid::new(Location::new(0, 0, 0), Location::new(1, 1, 1));
        let b = Cuboid::new(Location::new(3, 0, 0), Location::new(4, 1, 1));
        assert!(a.intersection(&b).is_none());
    }

    #[test]
    fn locations_order_and_count() {
        let c = Cuboid::new(Location::new(0, 0, 0), Location::new(1, 1, 1));
        let locs: Vec<Location> = c.locations().collect();
        assert_eq!(locs.len(), 8);
        // y-major, then z, then x
        assert_eq!(locs[0], Location::new(0, 0, 0));
        assert_eq!(locs[1], Location::new(1, 0, 0));
        assert_eq!(locs[2], Location::new(0, 0, 1));
        assert_eq!(locs[4], Location::new(0, 1, 0));
        assert_eq!(locs[7], Location::new(1, 1, 1));
    }

    #[test]
    fn chunks_spanning_a_border() {
        let c = Cuboid::new(Location::new(14, 0, 0), Location::new(17, 0, 5));
        let chunks: Vec<ChunkPos> = c.chunks().collect();
        assert_eq!(chunks, [ChunkPos::new(0, 0), ChunkPos::new(1, 0)]);
    }
}
