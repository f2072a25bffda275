//! # Homestead Worldgen
//!
//! Deterministic world generation for Homestead.
//!
//! This crate handles:
//! - Spiral allocation of parcel cells by registration order
//! - Identity-derived parcel attributes (terrain, fertility, starting content)
//! - Parcel pricing
//! - District zoning, both noisy tables and noise-free point lookups
//!
//! Nothing here performs I/O or holds mutable shared state apart from the
//! write-once spiral table cache.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod bands;
pub mod district;
pub mod parcel;
pub mod pricing;
pub mod spiral;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::bands::*;
    pub use crate::district::*;
    pub use crate::parcel::*;
    pub use crate::pricing::*;
    pub use crate::spiral::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parcel_price_uses_ring_capacity() {
        let gen = ParcelGenerator::new(20).expect("valid grid");
        let parcel = gen.generate("w", "o", "n", 12);
        assert_eq!(parcel.ring, 2);
        let inputs = PriceInputs {
            ring: parcel.ring,
            empire_total_parcels: 150,
            ring_sold: 4,
            ring_total: u64::from(ring_capacity(parcel.ring, gen.grid_size())),
            owner_parcel_count: 5,
        };
        assert_eq!(inputs.ring_total, 16);
        assert_eq!(price(&inputs), 677);
    }
}
