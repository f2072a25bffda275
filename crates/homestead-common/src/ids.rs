//! Identifier types.

use serde::{Deserialize, Serialize};

use crate::coords::GridPos;

/// Key of a parcel, derived from its world and cell.
///
/// Formatted as `"{world_id}:{x}:{y}"`. The two numeric fields always come
/// last, so the key stays unambiguous even when the world id contains `:`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParcelId(String);

impl ParcelId {
    /// Derives the id of the parcel at `pos` in `world_id`.
    #[must_use]
    pub fn new(world_id: &str, pos: GridPos) -> Self {
        Self(format!("{world_id}:{}:{}", pos.x, pos.y))
    }

    /// Returns the raw key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits the key back into world id and cell.
    #[must_use]
    pub fn parse(&self) -> Option<(&str, GridPos)> {
        let (rest, y) = self.0.rsplit_once(':')?;
        let (world, x) = rest.rsplit_once(':')?;
        Some((world, GridPos::new(x.parse().ok()?, y.parse().ok()?)))
    }
}

impl std::fmt::Display for ParcelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
