//! Coordinate types for parcel grid cells, chunks, and continuous world positions.

use serde::{Deserialize, Serialize};

/// Cell of the square parcel grid, both axes in `[0, grid_size)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    /// Column
    pub x: u32,
    /// Row
    pub y: u32,
}

impl GridPos {
    /// Creates a new grid position.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Center cell of a grid of the given side length.
    ///
    /// Even sizes have no true center; the cell up-left of the midpoint wins.
    #[must_use]
    pub const fn center(grid_size: u32) -> Self {
        let c = grid_size.saturating_sub(1) / 2;
        Self { x: c, y: c }
    }

    /// Chebyshev distance from the grid center.
    #[must_use]
    pub fn ring(self, grid_size: u32) -> u32 {
        let center = Self::center(grid_size);
        self.x.abs_diff(center.x).max(self.y.abs_diff(center.y))
    }
}

/// Chunk coordinate on the streaming plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    /// X coordinate in chunk space
    pub x: i32,
    /// Z coordinate in chunk space
    pub z: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Returns the coordinate shifted by `(dx, dz)`.
    #[must_use]
    pub const fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            x: self.x.wrapping_add(dx),
            z: self.z.wrapping_add(dz),
        }
    }

    /// Chessboard distance to another chunk.
    #[must_use]
    pub fn chebyshev_distance(self, other: Self) -> u32 {
        self.x.abs_diff(other.x).max(self.z.abs_diff(other.z))
    }

    /// Squared euclidean distance to another chunk, used for nearest-first ordering.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dz = i64::from(self.z) - i64::from(other.z);
        dx * dx + dz * dz
    }

    /// True when either axis is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.x < 0 || self.z < 0
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Continuous viewer position in world units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPos {
    /// X position in world space
    pub x: f64,
    /// Z position in world space
    pub z: f64,
}

impl WorldPos {
    /// Creates a new world position.
    #[must_use]
    pub const fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }

    /// Converts to the containing chunk, flooring toward negative infinity.
    #[must_use]
    pub fn to_chunk_coord(self, chunk_world_size: f64) -> ChunkCoord {
        ChunkCoord {
            x: (self.x / chunk_world_size).floor() as i32,
            z: (self.z / chunk_world_size).floor() as i32,
        }
    }

    /// World position of a chunk's origin corner.
    #[must_use]
    pub fn from_chunk_origin(coord: ChunkCoord, chunk_world_size: f64) -> Self {
        Self {
            x: f64::from(coord.x) * chunk_world_size,
            z: f64::from(coord.z) * chunk_world_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_center_and_ring() {
        assert_eq!(GridPos::center(20), GridPos::new(9, 9));
        assert_eq!(GridPos::center(21), GridPos::new(10, 10));
        assert_eq!(GridPos::center(1), GridPos::new(0, 0));
        assert_eq!(GridPos::new(9, 9).ring(20), 0);
        assert_eq!(GridPos::new(8, 10).ring(20), 1);
        assert_eq!(GridPos::new(19, 0).ring(20), 10);
    }

    #[test]
    fn test_world_to_chunk_floors_negative() {
        let size = 16.0;
        assert_eq!(WorldPos::new(0.0, 15.9).to_chunk_coord(size), ChunkCoord::new(0, 0));
        assert_eq!(WorldPos::new(16.0, 32.5).to_chunk_coord(size), ChunkCoord::new(1, 2));
        assert_eq!(WorldPos::new(-0.1, -16.0).to_chunk_coord(size), ChunkCoord::new(-1, -1));
        assert_eq!(WorldPos::new(-16.1, 0.0).to_chunk_coord(size), ChunkCoord::new(-2, 0));
    }

    #[test]
    fn test_chunk_origin_maps_back_to_chunk() {
        for coord in [ChunkCoord::new(0, 0), ChunkCoord::new(3, -2), ChunkCoord::new(-7, 11)] {
            let origin = WorldPos::from_chunk_origin(coord, 16.0);
            assert_eq!(origin.to_chunk_coord(16.0), coord);
            assert_eq!(WorldPos::new(origin.x - 0.5, origin.z).to_chunk_coord(16.0).x, coord.x - 1);
        }
        let origin = WorldPos::from_chunk_origin(ChunkCoord::new(3, -2), 16.0);
        assert_eq!(origin, WorldPos::new(48.0, -32.0));
    }

    #[test]
    fn test_chebyshev_distance() {
        let a = ChunkCoord::new(2, 3);
        assert_eq!(a.chebyshev_distance(a), 0);
        assert_eq!(a.chebyshev_distance(ChunkCoord::new(5, 1)), 3);
        assert_eq!(a.chebyshev_distance(ChunkCoord::new(-4, 3)), 6);
    }
}
