//! # Homestead Common
//!
//! Common types, utilities, and shared abstractions for Homestead.
//!
//! This crate provides foundational types used across all Homestead crates:
//! - Coordinate types (grid, chunk, world)
//! - Parcel ids
//! - World configuration
//! - Deterministic PRNG and identity hashing
//! - Common error types

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod coords;
pub mod error;
pub mod hash;
pub mod ids;
pub mod rng;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::*;
    pub use crate::coords::*;
    pub use crate::error::*;
    pub use crate::hash::*;
    pub use crate::ids::*;
    pub use crate::rng::*;
}

pub use prelude::*;
