//! # Homestead World
//!
//! World streaming for Homestead.
//!
//! This crate handles:
//! - Camera-relative chunk loading/unloading with radius hysteresis
//! - Deferred chunk builds on worker threads
//! - Deterministic chunk content from district zoning

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod chunk;
pub mod deferred;
pub mod generation;
pub mod streaming;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::chunk::*;
    pub use crate::deferred::*;
    pub use crate::generation::*;
    pub use crate::streaming::*;
}

pub use prelude::*;
