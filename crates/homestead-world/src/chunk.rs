//! Chunk lifecycle types and the build/dispose seam.

use homestead_common::ChunkCoord;
use std::fmt::Display;

/// Residency of a chunk key in the streaming cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkState {
    /// Not resident
    Unloaded,
    /// Build requested, result not yet delivered
    Pending,
    /// Resident with a payload
    Loaded,
}

/// Handle for one build request.
///
/// A deferred result is accepted only if its ticket still matches the
/// cache's pending entry for that chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BuildTicket {
    /// Chunk being built
    pub coord: ChunkCoord,
    /// Cache epoch at request time; bumped by `invalidate_all`
    pub epoch: u64,
    /// Per-cache request serial
    pub serial: u64,
}

/// Result of asking a source to build a chunk.
#[derive(Debug)]
pub enum BuildOutcome<P, E> {
    /// Payload is ready now
    Ready(P),
    /// Payload will be delivered later through `complete_build`
    Pending,
    /// Build failed; the chunk stays unloaded and is retried later
    Failed(E),
}

/// Caller-supplied chunk content.
///
/// The cache never looks inside a payload. It only decides when to build and
/// when to dispose.
pub trait ChunkSource {
    /// Content stored per loaded chunk.
    type Payload;
    /// Build failure.
    type Error: Display;

    /// Builds, or starts building, the chunk named by `ticket`.
    fn build(&mut self, ticket: BuildTicket) -> BuildOutcome<Self::Payload, Self::Error>;

    /// Releases a payload the cache no longer holds.
    fn dispose(&mut self, coord: ChunkCoord, payload: Self::Payload);
}

/// Adapts a pair of closures into a synchronous [`ChunkSource`].
pub struct ChunkCallbacks<B, D> {
    build: B,
    dispose: D,
}

impl<B, D> ChunkCallbacks<B, D> {
    /// Wraps a `build(coord) -> Result<payload, error>` and a `dispose(coord, payload)`.
    pub const fn new(build: B, dispose: D) -> Self {
        Self { build, dispose }
    }
}

impl<P, E, B, D> ChunkSource for ChunkCallbacks<B, D>
where
    E: Display,
    B: FnMut(ChunkCoord) -> Result<P, E>,
    D: FnMut(ChunkCoord, P),
{
    type Payload = P;
    type Error = E;

    fn build(&mut self, ticket: BuildTicket) -> BuildOutcome<P, E> {
        match (self.build)(ticket.coord) {
            Ok(payload) => BuildOutcome::Ready(payload),
            Err(e) => BuildOutcome::Failed(e),
        }
    }

    fn dispose(&mut self, coord: ChunkCoord, payload: P) {
        (self.dispose)(coord, payload);
    }
}
