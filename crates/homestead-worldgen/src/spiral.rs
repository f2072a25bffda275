//! Outward square spiral allocation of parcel cells.
//!
//! Registration order `n` (1-based) maps to the `n`th entry of a spiral that
//! starts at the grid center and winds right, down, left, up with arm
//! lengths 1, 1, 2, 2, 3, 3, ... Steps that leave the grid are walked but not
//! recorded, so the table (not the raw spiral path) is canonical.
//!
//! Tables are memoized per grid size for the lifetime of the process and are
//! immutable once built.

use ahash::AHashMap;
use homestead_common::GridPos;
use parking_lot::RwLock;
use std::sync::{Arc, OnceLock};
use tracing::info;

/// Spiral walking directions: right, down, left, up.
const DIRECTIONS: [(i64, i64); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

/// Memoized tables keyed by grid size.
static TABLES: OnceLock<RwLock<AHashMap<u32, Arc<SpiralTable>>>> = OnceLock::new();

/// Spiral-ordered cells of one grid size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpiralTable {
    grid_size: u32,
    positions: Vec<GridPos>,
}

/// Result of resolving a registration order to a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Resolved cell
    pub pos: GridPos,
    /// Chebyshev distance from the grid center
    pub ring: u32,
    /// True when the order exceeded grid capacity and was clamped to the last cell
    pub clamped: bool,
}

impl SpiralTable {
    /// Returns the shared table for `grid_size`, building it on first use.
    pub fn get(grid_size: u32) -> Arc<Self> {
        let tables = TABLES.get_or_init(|| RwLock::new(AHashMap::new()));
        if let Some(table) = tables.read().get(&grid_size) {
            return Arc::clone(table);
        }

        let built = Arc::new(Self::compute(grid_size));
        let mut guard = tables.write();
        let table = guard.entry(grid_size).or_insert_with(|| {
            info!(
                "Computed spiral table for grid {grid_size} ({} cells)",
                built.len()
            );
            Arc::clone(&built)
        });
        Arc::clone(table)
    }

    /// Builds a table without touching the shared cache.
    #[must_use]
    pub fn compute(grid_size: u32) -> Self {
        let total = (grid_size as usize) * (grid_size as usize);
        let mut positions = Vec::with_capacity(total);
        if total == 0 {
            return Self {
                grid_size,
                positions,
            };
        }

        let size = i64::from(grid_size);
        let center = GridPos::center(grid_size);
        let (mut x, mut y) = (i64::from(center.x), i64::from(center.y));
        positions.push(center);

        let mut dir_index = 0;
        let mut step = 1;
        'spiral: while positions.len() < total {
            for _ in 0..2 {
                let (dx, dy) = DIRECTIONS[dir_index];
                for _ in 0..step {
                    x += dx;
                    y += dy;
                    if (0..size).contains(&x) && (0..size).contains(&y) {
                        positions.push(GridPos::new(x as u32, y as u32));
                        if positions.len() == total {
                            break 'spiral;
                        }
                    }
                }
                dir_index = (dir_index + 1) % DIRECTIONS.len();
            }
            step += 1;
        }

        Self {
            grid_size,
            positions,
        }
    }

    /// Grid side length this table was built for.
    #[must_use]
    pub const fn grid_size(&self) -> u32 {
        self.grid_size
    }

    /// All cells in allocation order.
    #[must_use]
    pub fn positions(&self) -> &[GridPos] {
        &self.positions
    }

    /// Number of cells (`grid_size²`).
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// True for a zero-sized grid.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Resolves a 1-based registration order.
    ///
    /// Orders past capacity clamp to the last cell. Order 0 is treated as 1.
    /// Returns `None` only for an empty grid.
    #[must_use]
    pub fn placement(&self, reg_order: u64) -> Option<Placement> {
        let last = self.positions.len().checked_sub(1)?;
        let index = usize::try_from(reg_order.saturating_sub(1)).unwrap_or(usize::MAX);
        let clamped = index > last;
        let pos = self.positions[index.min(last)];
        Some(Placement {
            pos,
            ring: ring(pos, self.grid_size),
            clamped,
        })
    }
}

/// Chebyshev distance of `pos` from the center of a `grid_size` grid.
#[must_use]
pub fn ring(pos: GridPos, grid_size: u32) -> u32 {
    pos.ring(grid_size)
}

/// Number of in-grid cells at exactly `ring` from the center.
#[must_use]
pub fn ring_capacity(ring: u32, grid_size: u32) -> u32 {
    if grid_size == 0 {
        return 0;
    }
    let center = i64::from(GridPos::center(grid_size).x);
    let max = i64::from(grid_size) - 1;
    let filled = |r: i64| -> i64 {
        if r < 0 {
            return 0;
        }
        let side = (center + r).min(max) - (center - r).max(0) + 1;
        side * side
    };
    let r = i64::from(ring);
    (filled(r) - filled(r - 1)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_first_positions_grid_20() {
        let table = SpiralTable::compute(20);
        let expected = [
            GridPos::new(9, 9),
            GridPos::new(10, 9),
            GridPos::new(10, 10),
            GridPos::new(9, 10),
            GridPos::new(8, 10),
            GridPos::new(8, 9),
            GridPos::new(8, 8),
        ];
        assert_eq!(&table.positions()[..7], &expected);
        assert_eq!(ring(expected[0], 20), 0);
        for pos in &expected[1..] {
            assert_eq!(ring(*pos, 20), 1);
        }
    }

    #[test]
    fn test_covers_every_cell_once() {
        for size in [1, 2, 3, 4, 7, 20] {
            let table = SpiralTable::compute(size);
            assert_eq!(table.len(), (size * size) as usize);
            let unique: HashSet<_> = table.positions().iter().collect();
            assert_eq!(unique.len(), table.len());
            assert!(table
                .positions()
                .iter()
                .all(|p| p.x < size && p.y < size));
        }
    }

    #[test]
    fn test_rings_never_decrease_in_odd_grid() {
        let table = SpiralTable::compute(9);
        let rings: Vec<u32> = table.positions().iter().map(|p| ring(*p, 9)).collect();
        assert!(rings.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_empty_grid() {
        let table = SpiralTable::compute(0);
        assert!(table.is_empty());
        assert!(table.placement(1).is_none());
    }

    #[test]
    fn test_placement_clamps_overflow() {
        let table = SpiralTable::compute(3);
        let last = *table.positions().last().expect("non-empty");
        let p = table.placement(9).expect("placement");
        assert_eq!(p.pos, last);
        assert!(!p.clamped);
        let over = table.placement(10).expect("placement");
        assert_eq!(over.pos, last);
        assert!(over.clamped);
        let zero = table.placement(0).expect("placement");
        assert_eq!(zero.pos, GridPos::new(1, 1));
        assert!(!zero.clamped);
    }

    #[test]
    fn test_shared_table_is_memoized() {
        let a = SpiralTable::get(17);
        let b = SpiralTable::get(17);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(*a, SpiralTable::compute(17));
    }

    #[test]
    fn test_ring_capacity_sums_to_grid() {
        for size in [1u32, 2, 5, 20] {
            let total: u32 = (0..=size).map(|r| ring_capacity(r, size)).sum();
            assert_eq!(total, size * size);
        }
        assert_eq!(ring_capacity(0, 20), 1);
        assert_eq!(ring_capacity(1, 20), 8);
        assert_eq!(ring_capacity(2, 20), 16);
        // Ring 10 only exists on the right and bottom edges of a 20 grid.
        assert_eq!(ring_capacity(10, 20), 20 * 20 - 19 * 19);
        assert_eq!(ring_capacity(11, 20), 0);
    }
}
