//! Chunk content generation.
//!
//! The standard build callback for the streaming cache. A chunk's zone comes
//! from the noise-free district lookup. Its ground comes from Perlin noise
//! keyed by the world seed. Its props are scattered by a `SeededRandom`
//! seeded from `chunk_seed`. Rebuilding a chunk always yields the same
//! content.

use homestead_common::{ChunkCoord, SeededRandom, WorldConfig};
use homestead_worldgen::{chunk_seed, nearest_district, sub_zone_pure, NodeType, Zone};
use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tracing::trace;

use crate::chunk::{BuildOutcome, BuildTicket, ChunkSource};

/// Content generator configuration.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// World seed for ground noise
    pub seed: u32,
    /// Ground samples per chunk edge
    pub tiles_per_chunk: u32,
    /// Ground noise scale in tiles (larger = smoother)
    pub terrain_scale: f64,
    /// Maximum ground height
    pub height_scale: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            tiles_per_chunk: 16,
            terrain_scale: 64.0,
            height_scale: 6.0,
        }
    }
}

/// Decorative object placed on a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropKind {
    /// Tree
    Tree,
    /// Bench
    Bench,
    /// Flower bed
    Flowerbed,
    /// Market stall
    Stall,
    /// Street lamp
    Lamp,
    /// House
    House,
    /// Garden plot
    Garden,
    /// Statue
    Statue,
    /// Fountain
    Fountain,
}

/// One placed prop, in chunk-local tile units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prop {
    /// Kind
    pub kind: PropKind,
    /// Local X in tile units
    pub x: f32,
    /// Local Z in tile units
    pub z: f32,
    /// Facing in quarter turns, 0..=3
    pub facing: u8,
}

/// Payload of a loaded chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkContent {
    /// Chunk key
    pub coord: ChunkCoord,
    /// District category
    pub node_type: NodeType,
    /// Concrete zone
    pub zone: Zone,
    /// Name of the nearest district node
    pub district: String,
    /// Seed used for prop scattering
    pub seed: u32,
    /// Ground samples per edge
    pub tiles: u32,
    /// Row-major ground heights, `tiles × tiles`
    pub heights: Vec<f32>,
    /// Placed props
    pub props: Vec<Prop>,
}

impl ChunkContent {
    /// Ground height at a local tile.
    #[must_use]
    pub fn height(&self, x: u32, z: u32) -> Option<f32> {
        if x >= self.tiles || z >= self.tiles {
            return None;
        }
        self.heights.get((z * self.tiles + x) as usize).copied()
    }
}

const COMMERCIAL_PROPS: &[PropKind] = &[PropKind::Stall, PropKind::Lamp];
const MIXED_PROPS: &[PropKind] = &[PropKind::Stall, PropKind::Lamp, PropKind::House];
const LOW_DENSITY_PROPS: &[PropKind] = &[PropKind::House, PropKind::Garden, PropKind::Tree];
const HIGH_DENSITY_PROPS: &[PropKind] = &[PropKind::House, PropKind::Lamp];
// Trees listed twice to double their share.
const PARK_PROPS: &[PropKind] = &[
    PropKind::Tree,
    PropKind::Tree,
    PropKind::Bench,
    PropKind::Flowerbed,
];
const CIVIC_PROPS: &[PropKind] = &[PropKind::Statue, PropKind::Fountain, PropKind::Lamp];

/// Prop palette and inclusive count range for a zone.
const fn palette(zone: Zone) -> (&'static [PropKind], i64, i64) {
    match zone {
        Zone::CoreCommercial => (COMMERCIAL_PROPS, 3, 6),
        Zone::MixedUse => (MIXED_PROPS, 2, 5),
        Zone::ResidentialLow => (LOW_DENSITY_PROPS, 2, 4),
        Zone::ResidentialHigh => (HIGH_DENSITY_PROPS, 3, 5),
        Zone::Park => (PARK_PROPS, 4, 9),
        Zone::Civic => (CIVIC_PROPS, 1, 3),
    }
}

/// Builds chunk content.
pub struct ContentGenerator {
    config: GeneratorConfig,
    ground: Perlin,
    built: u64,
    disposed: u64,
}

impl ContentGenerator {
    /// Creates a new generator with the given config.
    #[must_use]
    pub fn new(config: GeneratorConfig) -> Self {
        let ground = Perlin::new(config.seed);
        Self {
            config,
            ground,
            built: 0,
            disposed: 0,
        }
    }

    /// Creates a generator seeded from world configuration.
    #[must_use]
    pub fn from_world_config(config: &WorldConfig) -> Self {
        Self::new(GeneratorConfig {
            seed: config.world_seed,
            ..Default::default()
        })
    }

    /// Returns the generator configuration.
    #[must_use]
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Chunks built through the [`ChunkSource`] interface.
    #[must_use]
    pub const fn built_count(&self) -> u64 {
        self.built
    }

    /// Chunks disposed through the [`ChunkSource`] interface.
    #[must_use]
    pub const fn disposed_count(&self) -> u64 {
        self.disposed
    }

    /// Generates the content of one chunk.
    #[must_use]
    pub fn generate_chunk(&self, coord: ChunkCoord) -> ChunkContent {
        let tiles = self.config.tiles_per_chunk;
        let zone = sub_zone_pure(coord.x, coord.z);
        let district = nearest_district(coord.x, coord.z);
        let seed = chunk_seed(coord.x, coord.z);

        let origin_x = f64::from(coord.x) * f64::from(tiles);
        let origin_z = f64::from(coord.z) * f64::from(tiles);
        let mut heights = Vec::with_capacity((tiles * tiles) as usize);
        for z in 0..tiles {
            for x in 0..tiles {
                let wx = (origin_x + f64::from(x)) / self.config.terrain_scale;
                let wz = (origin_z + f64::from(z)) / self.config.terrain_scale;
                let n = ((self.ground.get([wx, wz]) + 1.0) / 2.0).clamp(0.0, 1.0);
                let flatten = if zone == Zone::Park { 0.5 } else { 1.0 };
                heights.push((n * self.config.height_scale * flatten) as f32);
            }
        }

        let mut rng = SeededRandom::from_seed_u32(seed);
        let (kinds, min, max) = palette(zone);
        let count = rng.next_int(min, max);
        let span = f64::from(tiles);
        let props = (0..count)
            .filter_map(|_| {
                let kind = *rng.choice(kinds)?;
                Some(Prop {
                    kind,
                    x: (rng.next_f64() * span) as f32,
                    z: (rng.next_f64() * span) as f32,
                    facing: rng.next_int(0, 3) as u8,
                })
            })
            .collect();

        ChunkContent {
            coord,
            node_type: zone.node_type(),
            zone,
            district: district.name.to_owned(),
            seed,
            tiles,
            heights,
            props,
        }
    }
}

impl ChunkSource for ContentGenerator {
    type Payload = ChunkContent;
    type Error = Infallible;

    fn build(&mut self, ticket: BuildTicket) -> BuildOutcome<ChunkContent, Infallible> {
        self.built += 1;
        BuildOutcome::Ready(self.generate_chunk(ticket.coord))
    }

    fn dispose(&mut self, coord: ChunkCoord, payload: ChunkContent) {
        trace!("Disposing chunk {coord} ({} props)", payload.props.len());
        self.disposed += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homestead_worldgen::chunk_zone_pure;

    #[test]
    fn test_generation_deterministic() {
        let gen1 = ContentGenerator::new(GeneratorConfig::default());
        let gen2 = ContentGenerator::new(GeneratorConfig::default());
        let coord = ChunkCoord::new(4, 9);
        assert_eq!(gen1.generate_chunk(coord), gen2.generate_chunk(coord));
    }

    #[test]
    fn test_different_seeds_different_ground() {
        let gen1 = ContentGenerator::new(GeneratorConfig {
            seed: 42,
            ..Default::default()
        });
        let gen2 = ContentGenerator::new(GeneratorConfig {
            seed: 999,
            ..Default::default()
        });
        let coord = ChunkCoord::new(3, 2);
        let a = gen1.generate_chunk(coord);
        let b = gen2.generate_chunk(coord);
        assert_ne!(a.heights, b.heights);
        // Zoning and props do not depend on the ground seed.
        assert_eq!(a.zone, b.zone);
        assert_eq!(a.props, b.props);
    }

    #[test]
    fn test_content_matches_zoning() {
        let gen = ContentGenerator::new(GeneratorConfig::default());
        for (x, z) in [(0, 0), (5, 5), (12, 3), (2, 14)] {
            let content = gen.generate_chunk(ChunkCoord::new(x, z));
            assert_eq!(content.node_type, chunk_zone_pure(x, z));
            assert_eq!(content.zone, sub_zone_pure(x, z));
            assert_eq!(content.seed, chunk_seed(x, z));
            assert_eq!(content.district, nearest_district(x, z).name);
        }
    }

    #[test]
    fn test_props_within_chunk_and_palette() {
        let gen = ContentGenerator::new(GeneratorConfig::default());
        for x in 0..8 {
            for z in 0..8 {
                let content = gen.generate_chunk(ChunkCoord::new(x, z));
                let (kinds, min, max) = palette(content.zone);
                let n = content.props.len() as i64;
                assert!((min..=max).contains(&n));
                for prop in &content.props {
                    assert!(kinds.contains(&prop.kind));
                    assert!((0.0..=16.0).contains(&prop.x));
                    assert!((0.0..=16.0).contains(&prop.z));
                    assert!(prop.facing <= 3);
                }
            }
        }
    }

    #[test]
    fn test_heightfield_shape() {
        let gen = ContentGenerator::new(GeneratorConfig::default());
        let content = gen.generate_chunk(ChunkCoord::new(1, 1));
        assert_eq!(content.heights.len(), 256);
        assert!(content.height(15, 15).is_some());
        assert!(content.height(16, 0).is_none());
        assert!(content.heights.iter().all(|h| (0.0..=6.0).contains(h)));
    }

    #[test]
    fn test_source_counts() {
        let mut gen = ContentGenerator::new(GeneratorConfig::default());
        let ticket = BuildTicket {
            coord: ChunkCoord::new(0, 0),
            epoch: 0,
            serial: 0,
        };
        let BuildOutcome::Ready(content) = gen.build(ticket) else {
            panic!("content generator builds synchronously");
        };
        gen.dispose(ticket.coord, content);
        assert_eq!(gen.built_count(), 1);
        assert_eq!(gen.disposed_count(), 1);
    }
}
