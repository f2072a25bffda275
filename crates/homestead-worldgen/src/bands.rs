//! Attribute derivation from identity-hash bytes.
//!
//! Each table splits `0..100` into contiguous bands whose widths are the
//! weights. A byte is reduced with `byte % 100` and lands in the first band
//! whose cumulative weight exceeds it. Anything past the last cumulative
//! bound falls into the last band.

use serde::{Deserialize, Serialize};

/// Weighted band table over `0..100`.
#[derive(Debug, Clone, Copy)]
pub struct BandTable<T: 'static> {
    bands: &'static [(T, u8)],
}

impl<T: Copy + 'static> BandTable<T> {
    /// Wraps a static list of `(value, weight)` pairs.
    #[must_use]
    pub const fn new(bands: &'static [(T, u8)]) -> Self {
        Self { bands }
    }

    /// The `(value, weight)` pairs, in band order.
    #[must_use]
    pub const fn bands(&self) -> &'static [(T, u8)] {
        self.bands
    }

    /// Sum of all weights.
    #[must_use]
    pub fn total_weight(&self) -> u32 {
        self.bands.iter().map(|(_, w)| u32::from(*w)).sum()
    }

    /// Value of the band containing `byte % 100`.
    ///
    /// # Panics
    /// Never for the non-empty tables in this module.
    #[must_use]
    pub fn pick(&self, byte: u8) -> T {
        let roll = u32::from(byte % 100);
        let mut cumulative = 0u32;
        for (value, weight) in self.bands {
            cumulative += u32::from(*weight);
            if roll < cumulative {
                return *value;
            }
        }
        self.bands[self.bands.len() - 1].0
    }
}

/// Terrain of a parcel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    /// Open farmland
    Plains,
    /// Woodland
    Forest,
    /// High rocky ground
    Mountain,
    /// Ore-bearing ground
    Mine,
    /// Riverbank
    River,
    /// Volcanic soil
    Volcanic,
}

impl Terrain {
    /// Stable catalog key.
    #[must_use]
    pub const fn as_key(self) -> &'static str {
        match self {
            Self::Plains => "plains",
            Self::Forest => "forest",
            Self::Mountain => "mountain",
            Self::Mine => "mine",
            Self::River => "river",
            Self::Volcanic => "volcanic",
        }
    }
}

/// Building a parcel starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartingContent {
    /// Crop field
    Farm,
    /// Small dwelling
    Cottage,
    /// Craft workshop
    Workshop,
    /// Stone quarry
    Quarry,
    /// Grain store
    Granary,
    /// Wayside shrine
    Shrine,
}

impl StartingContent {
    /// Stable catalog key.
    #[must_use]
    pub const fn as_key(self) -> &'static str {
        match self {
            Self::Farm => "farm",
            Self::Cottage => "cottage",
            Self::Workshop => "workshop",
            Self::Quarry => "quarry",
            Self::Granary => "granary",
            Self::Shrine => "shrine",
        }
    }
}

/// Terrain bands: plains 30, forest 20, mountain 18, mine 12, river 12, volcanic 8.
pub const TERRAIN_BANDS: BandTable<Terrain> = BandTable::new(&[
    (Terrain::Plains, 30),
    (Terrain::Forest, 20),
    (Terrain::Mountain, 18),
    (Terrain::Mine, 12),
    (Terrain::River, 12),
    (Terrain::Volcanic, 8),
]);

/// Starting content bands: 30/20/15/10/15/10.
pub const CONTENT_BANDS: BandTable<StartingContent> = BandTable::new(&[
    (StartingContent::Farm, 30),
    (StartingContent::Cottage, 20),
    (StartingContent::Workshop, 15),
    (StartingContent::Quarry, 10),
    (StartingContent::Granary, 15),
    (StartingContent::Shrine, 10),
]);

/// Lowest fertility.
pub const MIN_FERTILITY: u8 = 1;
/// Highest fertility.
pub const MAX_FERTILITY: u8 = 5;

/// Terrain for a hash byte.
#[must_use]
pub fn derive_terrain(byte: u8) -> Terrain {
    TERRAIN_BANDS.pick(byte)
}

/// Starting content for a hash byte.
#[must_use]
pub fn derive_content(byte: u8) -> StartingContent {
    CONTENT_BANDS.pick(byte)
}

/// Fertility for a hash byte at a given ring.
///
/// Base `byte % 5 + 1`, minus one for every four rings out, clamped to 1..=5.
#[must_use]
pub fn derive_fertility(byte: u8, ring: u32) -> u8 {
    let base = i64::from(byte % 5) + 1;
    let penalty = i64::from(ring / 4);
    (base - penalty).clamp(i64::from(MIN_FERTILITY), i64::from(MAX_FERTILITY)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_band_totals() {
        assert_eq!(TERRAIN_BANDS.total_weight(), 100);
        assert_eq!(CONTENT_BANDS.total_weight(), 100);
    }

    #[test]
    fn test_terrain_reference_rolls() {
        assert_eq!(derive_terrain(10), Terrain::Plains);
        assert_eq!(derive_terrain(45), Terrain::Forest);
        assert_eq!(derive_terrain(60), Terrain::Mountain);
        assert_eq!(derive_terrain(75), Terrain::Mine);
        assert_eq!(derive_terrain(85), Terrain::River);
        assert_eq!(derive_terrain(95), Terrain::Volcanic);
    }

    #[test]
    fn test_terrain_band_edges() {
        assert_eq!(derive_terrain(29), Terrain::Plains);
        assert_eq!(derive_terrain(30), Terrain::Forest);
        assert_eq!(derive_terrain(67), Terrain::Mountain);
        assert_eq!(derive_terrain(68), Terrain::Mine);
        assert_eq!(derive_terrain(99), Terrain::Volcanic);
        // 130 % 100 == 30
        assert_eq!(derive_terrain(130), Terrain::Forest);
        assert_eq!(derive_terrain(255), Terrain::Mountain);
    }

    #[test]
    fn test_content_band_edges() {
        assert_eq!(derive_content(0), StartingContent::Farm);
        assert_eq!(derive_content(30), StartingContent::Cottage);
        assert_eq!(derive_content(50), StartingContent::Workshop);
        assert_eq!(derive_content(65), StartingContent::Quarry);
        assert_eq!(derive_content(75), StartingContent::Granary);
        assert_eq!(derive_content(90), StartingContent::Shrine);
    }

    #[test]
    fn test_fertility_ring_penalty() {
        // byte 4 -> base 5
        assert_eq!(derive_fertility(4, 0), 5);
        assert_eq!(derive_fertility(4, 3), 5);
        assert_eq!(derive_fertility(4, 4), 4);
        assert_eq!(derive_fertility(4, 12), 2);
        assert_eq!(derive_fertility(4, 40), 1);
        // byte 0 -> base 1, never below 1
        assert_eq!(derive_fertility(0, 9), 1);
    }

    #[test]
    fn test_keys_are_distinct() {
        let keys: std::collections::HashSet<_> =
            TERRAIN_BANDS.bands().iter().map(|(t, _)| t.as_key()).collect();
        assert_eq!(keys.len(), TERRAIN_BANDS.bands().len());
        assert_eq!(StartingContent::Granary.as_key(), "granary");
    }

    proptest! {
        #[test]
        fn prop_fertility_bounds(byte in any::<u8>(), ring in any::<u32>()) {
            let f = derive_fertility(byte, ring);
            prop_assert!((MIN_FERTILITY..=MAX_FERTILITY).contains(&f));
        }

        #[test]
        fn prop_every_byte_lands_in_a_band(byte in any::<u8>()) {
            let terrain = derive_terrain(byte);
            prop_assert!(TERRAIN_BANDS.bands().iter().any(|(t, _)| *t == terrain));
        }
    }
}
