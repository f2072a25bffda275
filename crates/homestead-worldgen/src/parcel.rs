//! Parcel generation from registration identity.

use homestead_common::{identity_hash, ConfigError, GridPos, ParcelId, WorldConfig};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::bands::{derive_content, derive_fertility, derive_terrain, StartingContent, Terrain};
use crate::spiral::{Placement, SpiralTable};

/// Identity-addressed land unit.
///
/// Every field is a pure function of `(world_id, owner_id, owner_name,
/// reg_order)` and the grid size. Creation timestamps and persistence belong
/// to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parcel {
    /// Key unique per (world, x, y)
    pub id: ParcelId,
    /// Owning world or shard
    pub world_id: String,
    /// Grid column
    pub x: u32,
    /// Grid row
    pub y: u32,
    /// Chebyshev distance from the grid center
    pub ring: u32,
    /// Registering identity
    pub owner_id: String,
    /// Terrain type
    pub terrain: Terrain,
    /// Fertility, 1..=5
    pub fertility: u8,
    /// Starting building
    pub initial_content: StartingContent,
    /// 1-based registration index
    pub reg_order: u64,
}

impl Parcel {
    /// Cell of this parcel.
    #[must_use]
    pub const fn pos(&self) -> GridPos {
        GridPos::new(self.x, self.y)
    }
}

/// One registration event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    /// World or shard id
    pub world_id: String,
    /// Identity id from the account system
    pub owner_id: String,
    /// Display name of the identity
    pub owner_name: String,
    /// 1-based registration index
    pub reg_order: u64,
}

/// Composes spiral placement and identity hashing into parcels.
#[derive(Debug, Clone)]
pub struct ParcelGenerator {
    table: Arc<SpiralTable>,
}

impl ParcelGenerator {
    /// Creates a generator for a `grid_size × grid_size` world.
    pub fn new(grid_size: u32) -> Result<Self, ConfigError> {
        if grid_size == 0 {
            return Err(ConfigError::InvalidGridSize(grid_size));
        }
        Ok(Self {
            table: SpiralTable::get(grid_size),
        })
    }

    /// Creates a generator from world configuration.
    pub fn from_config(config: &WorldConfig) -> Result<Self, ConfigError> {
        Self::new(config.grid_size)
    }

    /// Grid side length.
    #[must_use]
    pub fn grid_size(&self) -> u32 {
        self.table.grid_size()
    }

    /// Number of distinct cells.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.table.len()
    }

    /// Cell for a registration order, with the overflow flag.
    #[must_use]
    pub fn placement(&self, reg_order: u64) -> Placement {
        // The constructor rejects empty grids, so the table always has a cell.
        self.table.placement(reg_order).unwrap_or(Placement {
            pos: GridPos::center(self.grid_size()),
            ring: 0,
            clamped: true,
        })
    }

    /// Generates the parcel for one registration.
    #[must_use]
    pub fn generate(
        &self,
        world_id: &str,
        owner_id: &str,
        owner_name: &str,
        reg_order: u64,
    ) -> Parcel {
        let placement = self.placement(reg_order);
        if placement.clamped {
            warn!(
                "Registration order {reg_order} exceeds grid capacity {}; clamped to {:?}",
                self.capacity(),
                placement.pos
            );
        }

        let order = reg_order.to_string();
        let bytes = identity_hash(&[world_id, owner_id, owner_name, order.as_str()]);

        let parcel = Parcel {
            id: ParcelId::new(world_id, placement.pos),
            world_id: world_id.to_owned(),
            x: placement.pos.x,
            y: placement.pos.y,
            ring: placement.ring,
            owner_id: owner_id.to_owned(),
            terrain: derive_terrain(bytes[0]),
            fertility: derive_fertility(bytes[1], placement.ring),
            initial_content: derive_content(bytes[2]),
            reg_order,
        };
        debug!(
            "Generated parcel {} for {owner_id}: {:?} fertility {}",
            parcel.id, parcel.terrain, parcel.fertility
        );
        parcel
    }

    /// Generates the parcel for a registration record.
    #[must_use]
    pub fn generate_for(&self, registration: &Registration) -> Parcel {
        self.generate(
            &registration.world_id,
            &registration.owner_id,
            &registration.owner_name,
            registration.reg_order,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn generator() -> ParcelGenerator {
        ParcelGenerator::new(20).expect("valid grid")
    }

    #[test]
    fn test_rejects_empty_grid() {
        assert!(matches!(
            ParcelGenerator::new(0),
            Err(ConfigError::InvalidGridSize(0))
        ));
    }

    #[test]
    fn test_first_registration_at_center() {
        let parcel = generator().generate("w1", "owner-a", "Ada", 1);
        assert_eq!(parcel.pos(), GridPos::new(9, 9));
        assert_eq!(parcel.ring, 0);
        assert_eq!(parcel.id.as_str(), "w1:9:9");
        assert_eq!(parcel.owner_id, "owner-a");
        assert_eq!(parcel.reg_order, 1);
    }

    #[test]
    fn test_attributes_follow_hash_bytes() {
        let parcel = generator().generate("w1", "owner-b", "Bram", 5);
        let bytes = identity_hash(&["w1", "owner-b", "Bram", "5"]);
        assert_eq!(parcel.pos(), GridPos::new(8, 10));
        assert_eq!(parcel.terrain, derive_terrain(bytes[0]));
        assert_eq!(parcel.fertility, derive_fertility(bytes[1], 1));
        assert_eq!(parcel.initial_content, derive_content(bytes[2]));
    }

    #[test]
    fn test_byte_identical_across_calls() {
        let gen = generator();
        let a = bincode::serialize(&gen.generate("w", "o", "Name", 42)).expect("serialize");
        let b = bincode::serialize(&generator().generate("w", "o", "Name", 42))
            .expect("serialize");
        assert_eq!(a, b);
    }

    #[test]
    fn test_overflow_clamps_to_last_cell() {
        let gen = ParcelGenerator::new(3).expect("valid grid");
        let last = gen.generate("w", "a", "A", 9);
        let over = gen.generate("w", "b", "B", 500);
        assert_eq!(last.pos(), over.pos());
        assert_eq!(last.id, over.id);
        assert!(gen.placement(500).clamped);
        assert!(!gen.placement(9).clamped);
    }

    #[test]
    fn test_generate_for_registration() {
        let reg = Registration {
            world_id: "w".into(),
            owner_id: "o".into(),
            owner_name: "N".into(),
            reg_order: 3,
        };
        assert_eq!(generator().generate_for(&reg), generator().generate("w", "o", "N", 3));
    }

    #[test]
    fn test_parallel_generation_matches_serial() {
        let gen = generator();
        let serial: Vec<Parcel> = (1..=64)
            .map(|i| gen.generate("w", &format!("owner-{i}"), "Name", i))
            .collect();
        let parallel: Vec<Parcel> = std::thread::scope(|scope| {
            let handles: Vec<_> = (1..=64u64)
                .map(|i| {
                    let gen = gen.clone();
                    scope.spawn(move || gen.generate("w", &format!("owner-{i}"), "Name", i))
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().expect("thread panicked"))
                .collect()
        });
        assert_eq!(serial, parallel);
    }

    #[test]
    fn test_distinct_orders_distinct_cells_within_capacity() {
        let gen = generator();
        let cells: std::collections::HashSet<_> = (1..=400)
            .map(|i| gen.generate("w", "o", "n", i).pos())
            .collect();
        assert_eq!(cells.len(), 400);
    }

    proptest! {
        #[test]
        fn prop_generation_deterministic(
            world in "[a-z0-9]{1,8}",
            owner in "[a-z0-9-]{1,12}",
            name in "\\PC{0,12}",
            order in 1u64..1000,
        ) {
            let gen = generator();
            let a = gen.generate(&world, &owner, &name, order);
            let b = gen.generate(&world, &owner, &name, order);
            prop_assert_eq!(a, b);
        }
    }
}
