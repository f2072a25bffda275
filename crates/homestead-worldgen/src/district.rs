//! District zoning.
//!
//! Zones come from weighted nearest-seed (Voronoi) assignment against a
//! fixed set of hand-placed [`DistrictNode`]s. A node's `weight` divides its
//! squared distance by `weight²`, so heavier nodes claim more ground.
//!
//! There are two entry points:
//!
//! - [`generate_zone_map_with_noise`] builds a whole table, jittering every
//!   distance with `rng.next_f64() * 0.8`. It then runs a smoothing pass and
//!   a park-clustering pass. Two seeds give two slightly different maps.
//! - [`chunk_zone_pure`] / [`sub_zone_pure`] answer for a single chunk with
//!   no noise at all. They are the source of truth for point queries and do
//!   not depend on any table size or offset.
//!
//! Mixing a noisy table with pure point lookups shows mismatched borders, so
//! callers pick one per use.

use homestead_common::{ChunkCoord, SeededRandom};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Amplitude of the per-cell, per-node distance jitter in noisy tables.
pub const ZONE_NOISE: f64 = 0.8;

/// Category of a district node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// Shops and offices
    Commercial,
    /// Housing
    Residential,
    /// Green space
    Park,
    /// Public buildings
    Civic,
}

impl NodeType {
    /// Concrete zones this category can resolve to.
    #[must_use]
    pub const fn sub_zones(self) -> &'static [Zone] {
        match self {
            Self::Commercial => &[Zone::CoreCommercial, Zone::MixedUse],
            Self::Residential => &[Zone::ResidentialLow, Zone::ResidentialHigh],
            Self::Park => &[Zone::Park],
            Self::Civic => &[Zone::Civic],
        }
    }
}

/// Concrete zone of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    /// Dense commercial core
    CoreCommercial,
    /// Shops with housing above
    MixedUse,
    /// Detached housing
    ResidentialLow,
    /// Apartment blocks
    ResidentialHigh,
    /// Park land
    Park,
    /// Civic buildings
    Civic,
}

impl Zone {
    /// Category this zone belongs to.
    #[must_use]
    pub const fn node_type(self) -> NodeType {
        match self {
            Self::CoreCommercial | Self::MixedUse => NodeType::Commercial,
            Self::ResidentialLow | Self::ResidentialHigh => NodeType::Residential,
            Self::Park => NodeType::Park,
            Self::Civic => NodeType::Civic,
        }
    }

    /// Stable catalog key.
    #[must_use]
    pub const fn as_key(self) -> &'static str {
        match self {
            Self::CoreCommercial => "core_commercial",
            Self::MixedUse => "mixed_use",
            Self::ResidentialLow => "residential_low",
            Self::ResidentialHigh => "residential_high",
            Self::Park => "park",
            Self::Civic => "civic",
        }
    }

    /// One-character map glyph.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::CoreCommercial => 'C',
            Self::MixedUse => 'm',
            Self::ResidentialLow => 'r',
            Self::ResidentialHigh => 'R',
            Self::Park => 'p',
            Self::Civic => '#',
        }
    }
}

/// Hand-placed Voronoi seed in chunk space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistrictNode {
    /// Display name
    pub name: &'static str,
    /// Category
    pub node_type: NodeType,
    /// Chunk X
    pub x: i32,
    /// Chunk Z
    pub z: i32,
    /// Growth weight; larger claims more territory
    pub weight: f64,
}

impl DistrictNode {
    /// Squared distance to `(x, z)` divided by `weight²`.
    #[must_use]
    pub fn weighted_distance(&self, x: f64, z: f64) -> f64 {
        let dx = x - f64::from(self.x);
        let dz = z - f64::from(self.z);
        (dx * dx + dz * dz) / (self.weight * self.weight)
    }
}

/// The district layout of every world.
pub const DISTRICT_NODES: &[DistrictNode] = &[
    DistrictNode { name: "Market Square", node_type: NodeType::Commercial, x: 0, z: 0, weight: 1.5 },
    DistrictNode { name: "Harbor Row", node_type: NodeType::Commercial, x: 14, z: 6, weight: 1.1 },
    DistrictNode { name: "Old Town", node_type: NodeType::Residential, x: -9, z: -7, weight: 1.4 },
    DistrictNode { name: "Hillside", node_type: NodeType::Residential, x: -6, z: 11, weight: 1.3 },
    DistrictNode { name: "Riverside", node_type: NodeType::Residential, x: 11, z: -9, weight: 1.2 },
    DistrictNode { name: "Orchard Lanes", node_type: NodeType::Residential, x: 6, z: 16, weight: 1.2 },
    DistrictNode { name: "Greenway Park", node_type: NodeType::Park, x: 5, z: -15, weight: 0.9 },
    DistrictNode { name: "Lakeside Commons", node_type: NodeType::Park, x: -15, z: 3, weight: 0.9 },
    DistrictNode { name: "Civic Center", node_type: NodeType::Civic, x: -3, z: 5, weight: 0.7 },
];

/// Index of the node with the smallest weighted distance. Ties keep the earlier node.
fn nearest_index(x: f64, z: f64, mut noise: impl FnMut() -> f64) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, node) in DISTRICT_NODES.iter().enumerate() {
        let dist = node.weighted_distance(x, z) + noise();
        if dist < best_dist {
            best_dist = dist;
            best = i;
        }
    }
    best
}

/// Nearest district node to a chunk, without noise.
#[must_use]
pub fn nearest_district(chunk_x: i32, chunk_z: i32) -> &'static DistrictNode {
    &DISTRICT_NODES[nearest_index(f64::from(chunk_x), f64::from(chunk_z), || 0.0)]
}

/// Category of a chunk, without noise.
#[must_use]
pub fn chunk_zone_pure(chunk_x: i32, chunk_z: i32) -> NodeType {
    nearest_district(chunk_x, chunk_z).node_type
}

/// Concrete zone of a chunk, without noise.
///
/// The sub-zone band comes from a hash of the coordinate: commercial splits
/// 40/60 core/mixed, residential 65/35 low/high.
#[must_use]
pub fn sub_zone_pure(chunk_x: i32, chunk_z: i32) -> Zone {
    let roll = coord_hash(chunk_x, chunk_z) % 100;
    match chunk_zone_pure(chunk_x, chunk_z) {
        NodeType::Commercial if roll < 40 => Zone::CoreCommercial,
        NodeType::Commercial => Zone::MixedUse,
        NodeType::Residential if roll < 65 => Zone::ResidentialLow,
        NodeType::Residential => Zone::ResidentialHigh,
        NodeType::Park => Zone::Park,
        NodeType::Civic => Zone::Civic,
    }
}

/// Non-zero seed for a per-chunk [`SeededRandom`].
#[must_use]
pub fn chunk_seed(chunk_x: i32, chunk_z: i32) -> u32 {
    const A: i64 = 73_856_093;
    const B: i64 = 19_349_663;
    const C: i64 = 83_492_791;
    const PRIME: i64 = 2_147_483_647;
    let mixed = (i64::from(chunk_x) * A + i64::from(chunk_z) * B + C).abs() % PRIME;
    if mixed == 0 {
        1
    } else {
        mixed as u32
    }
}

/// Integer avalanche hash of a chunk coordinate.
fn coord_hash(x: i32, z: i32) -> u32 {
    let mut h = (x as u32).wrapping_mul(374_761_393) ^ (z as u32).wrapping_mul(668_265_263);
    h = (h ^ (h >> 13)).wrapping_mul(1_274_126_177);
    h ^ (h >> 16)
}

/// Square table of zones centered on chunk (0, 0).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneMap {
    size: u32,
    cells: Vec<Zone>,
}

impl ZoneMap {
    /// Side length.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Row-major cells, `z * size + x`.
    #[must_use]
    pub fn cells(&self) -> &[Zone] {
        &self.cells
    }

    /// Table offset of chunk (0, 0) on both axes.
    #[must_use]
    pub const fn origin_offset(&self) -> i32 {
        (self.size / 2) as i32
    }

    /// Chunk coordinate of a table cell.
    #[must_use]
    pub const fn chunk_of(&self, x: u32, z: u32) -> ChunkCoord {
        ChunkCoord::new(x as i32 - self.origin_offset(), z as i32 - self.origin_offset())
    }

    /// Zone at table cell `(x, z)`.
    #[must_use]
    pub fn get(&self, x: u32, z: u32) -> Option<Zone> {
        if x >= self.size || z >= self.size {
            return None;
        }
        self.cells.get(self.index(x, z)).copied()
    }

    /// Number of cells holding `zone`.
    #[must_use]
    pub fn count(&self, zone: Zone) -> usize {
        self.cells.iter().filter(|z| **z == zone).count()
    }

    /// 4-neighbors of a cell in north, south, west, east order.
    #[must_use]
    pub fn neighbors(&self, x: u32, z: u32) -> Vec<Zone> {
        let mut out = Vec::with_capacity(4);
        if z > 0 {
            out.extend(self.get(x, z - 1));
        }
        out.extend(self.get(x, z + 1));
        if x > 0 {
            out.extend(self.get(x - 1, z));
        }
        out.extend(self.get(x + 1, z));
        out
    }

    /// One line per row, one glyph per cell.
    #[must_use]
    pub fn render_ascii(&self) -> String {
        let mut out = String::with_capacity(self.cells.len() + self.size as usize);
        for row in self.cells.chunks(self.size.max(1) as usize) {
            out.extend(row.iter().map(|z| z.glyph()));
            out.push('\n');
        }
        out
    }

    fn index(&self, x: u32, z: u32) -> usize {
        z as usize * self.size as usize + x as usize
    }

    /// Replaces every cell that matches none of its neighbors with the
    /// plurality neighbor zone. Ties go to the earliest neighbor in N, S, W,
    /// E order.
    ///
    /// A replaced cell shared its old zone with no neighbor, so the rewrite
    /// never strips support from another cell; one sweep is enough.
    fn smooth(&mut self) -> usize {
        let mut changed = 0;
        for z in 0..self.size {
            for x in 0..self.size {
                let index = self.index(x, z);
                let current = self.cells[index];
                let neighbors = self.neighbors(x, z);
                if neighbors.is_empty() || neighbors.contains(&current) {
                    continue;
                }
                let mut best = neighbors[0];
                let mut best_count = 0;
                for candidate in &neighbors {
                    let count = neighbors.iter().filter(|n| *n == candidate).count();
                    if count > best_count {
                        best = *candidate;
                        best_count = count;
                    }
                }
                self.cells[index] = best;
                changed += 1;
            }
        }
        changed
    }

    /// Downgrades park cells with no park or low-density residential
    /// neighbor to low-density residential.
    fn cluster_parks(&mut self) -> usize {
        let snapshot = self.clone();
        let mut changed = 0;
        for z in 0..self.size {
            for x in 0..self.size {
                if snapshot.get(x, z) != Some(Zone::Park) {
                    continue;
                }
                let supported = snapshot
                    .neighbors(x, z)
                    .iter()
                    .any(|n| matches!(n, Zone::Park | Zone::ResidentialLow));
                if !supported {
                    let index = self.index(x, z);
                    self.cells[index] = Zone::ResidentialLow;
                    changed += 1;
                }
            }
        }
        changed
    }
}

/// Weighted nearest-node assignment for every cell of a `size × size` table.
fn assign_zones(size: u32, node_zones: &[Zone], mut noise: impl FnMut() -> f64) -> ZoneMap {
    let offset = f64::from(size / 2);
    let mut cells = Vec::with_capacity(size as usize * size as usize);
    for z in 0..size {
        for x in 0..size {
            let cx = f64::from(x) - offset;
            let cz = f64::from(z) - offset;
            cells.push(node_zones[nearest_index(cx, cz, &mut noise)]);
        }
    }
    ZoneMap { size, cells }
}

/// Builds a noisy zone table, then smooths it and clusters its parks.
///
/// Each node draws its sub-zone with `rng.choice` when it has more than one,
/// in node order. Distances are jittered per cell and per node.
pub fn generate_zone_map_with_noise(size: u32, rng: &mut SeededRandom) -> ZoneMap {
    let node_zones: Vec<Zone> = DISTRICT_NODES
        .iter()
        .map(|node| {
            let subs = node.node_type.sub_zones();
            if subs.len() > 1 {
                rng.choice(subs).copied().unwrap_or(subs[0])
            } else {
                subs[0]
            }
        })
        .collect();

    let mut map = assign_zones(size, &node_zones, || rng.next_f64() * ZONE_NOISE);
    let smoothed = map.smooth();
    let clustered = map.cluster_parks();
    debug!("Zone map {size}x{size}: smoothed {smoothed} cells, downgraded {clustered} parks");
    map
}
