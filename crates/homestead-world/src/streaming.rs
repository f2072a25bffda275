//! Camera-relative chunk streaming.
//!
//! The cache keeps every chunk within `load_radius` of the viewer's chunk
//! resident. It disposes a loaded chunk only once it drifts past
//! `unload_radius`. The gap between the two radii is what stops a viewer
//! hovering near a border from loading and disposing the same chunks every
//! tick.
//!
//! Builds may complete later (see [`BuildOutcome::Pending`]). A result that
//! arrives for a chunk the cache has since given up on is disposed on
//! arrival and never inserted.

use ahash::AHashMap;
use homestead_common::{ChunkCoord, ConfigError, StreamError, WorldConfig, WorldPos};
use tracing::{debug, trace, warn};

use crate::chunk::{BuildOutcome, BuildTicket, ChunkSource, ChunkState};

/// Streaming cache configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamingConfig {
    /// World units per chunk edge
    pub chunk_world_size: f64,
    /// Chebyshev radius that is always loaded
    pub load_radius: u32,
    /// Chebyshev radius past which loaded chunks are disposed
    pub unload_radius: u32,
    /// Skip candidate chunks with a negative X or Z index
    pub skip_negative_chunks: bool,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self::from(&WorldConfig::default())
    }
}

impl From<&WorldConfig> for StreamingConfig {
    fn from(config: &WorldConfig) -> Self {
        Self {
            chunk_world_size: config.chunk_world_size,
            load_radius: config.load_radius,
            unload_radius: config.unload_radius,
            skip_negative_chunks: config.skip_negative_chunks,
        }
    }
}

impl StreamingConfig {
    /// Checks chunk size and the hysteresis gap.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.chunk_world_size.is_finite() || self.chunk_world_size <= 0.0 {
            return Err(ConfigError::InvalidChunkSize(self.chunk_world_size));
        }
        if self.unload_radius <= self.load_radius {
            return Err(ConfigError::RadiusOrder {
                load: self.load_radius,
                unload: self.unload_radius,
            });
        }
        Ok(())
    }
}

/// What one `set_viewer_position` call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamUpdate {
    /// Viewer chunk for this update
    pub center: ChunkCoord,
    /// Chunks built and inserted synchronously
    pub built: Vec<ChunkCoord>,
    /// Chunks whose build was deferred
    pub requested: Vec<ChunkCoord>,
    /// Chunks disposed for leaving the unload radius
    pub disposed: Vec<ChunkCoord>,
    /// Chunks whose build failed; they stay unloaded
    pub failed: Vec<ChunkCoord>,
}

impl StreamUpdate {
    fn new(center: ChunkCoord) -> Self {
        Self {
            center,
            built: Vec::new(),
            requested: Vec::new(),
            disposed: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// True when nothing was built, requested, disposed, or failed.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.built.is_empty()
            && self.requested.is_empty()
            && self.disposed.is_empty()
            && self.failed.is_empty()
    }
}

/// Cumulative counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Build calls issued
    pub builds_requested: u64,
    /// Payloads inserted
    pub built: u64,
    /// Payloads disposed after being loaded
    pub disposed: u64,
    /// Failed builds
    pub failed: u64,
    /// Late payloads disposed without insertion
    pub late_disposed: u64,
}

/// What happened to a deferred build result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Inserted as loaded
    Inserted,
    /// Build failed; chunk left unloaded
    Failed,
    /// Payload arrived for a chunk no longer wanted and was disposed
    Disposed,
    /// Failure arrived for a request the cache had already forgotten
    Discarded,
}

/// Radius-hysteresis chunk cache.
///
/// Single writer: one caller drives `set_viewer_position`, `complete_build`
/// and `invalidate_all`.
pub struct ChunkStreamCache<P> {
    config: StreamingConfig,
    loaded: AHashMap<ChunkCoord, P>,
    pending: AHashMap<ChunkCoord, BuildTicket>,
    center: Option<ChunkCoord>,
    epoch: u64,
    next_serial: u64,
    stats: StreamStats,
}

impl<P> ChunkStreamCache<P> {
    /// Creates an empty cache.
    pub fn new(config: StreamingConfig) -> Result<Self, StreamError> {
        config.validate()?;
        Ok(Self {
            config,
            loaded: AHashMap::new(),
            pending: AHashMap::new(),
            center: None,
            epoch: 0,
            next_serial: 0,
            stats: StreamStats::default(),
        })
    }

    /// Creates an empty cache from world configuration.
    pub fn from_world_config(config: &WorldConfig) -> Result<Self, StreamError> {
        Self::new(StreamingConfig::from(config))
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &StreamingConfig {
        &self.config
    }

    /// Viewer chunk of the last update, if any since creation or invalidation.
    #[must_use]
    pub const fn center(&self) -> Option<ChunkCoord> {
        self.center
    }

    /// Cumulative counters.
    #[must_use]
    pub const fn stats(&self) -> StreamStats {
        self.stats
    }

    /// Residency of a chunk.
    #[must_use]
    pub fn state(&self, coord: ChunkCoord) -> ChunkState {
        if self.loaded.contains_key(&coord) {
            ChunkState::Loaded
        } else if self.pending.contains_key(&coord) {
            ChunkState::Pending
        } else {
            ChunkState::Unloaded
        }
    }

    /// True when the chunk is resident.
    #[must_use]
    pub fn is_loaded(&self, coord: ChunkCoord) -> bool {
        self.loaded.contains_key(&coord)
    }

    /// Payload of a resident chunk.
    #[must_use]
    pub fn get(&self, coord: ChunkCoord) -> Option<&P> {
        self.loaded.get(&coord)
    }

    /// Number of resident chunks.
    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }

    /// Number of outstanding deferred builds.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Resident chunk keys, sorted.
    #[must_use]
    pub fn loaded_coords(&self) -> Vec<ChunkCoord> {
        let mut coords: Vec<_> = self.loaded.keys().copied().collect();
        coords.sort_unstable();
        coords
    }

    /// Chunks that should be loaded around `center`, nearest first.
    #[must_use]
    pub fn load_candidates(&self, center: ChunkCoord) -> Vec<ChunkCoord> {
        let r = self.config.load_radius as i32;
        let mut out = Vec::with_capacity(((2 * r + 1) * (2 * r + 1)) as usize);
        for dz in -r..=r {
            for dx in -r..=r {
                let coord = center.offset(dx, dz);
                // Streaming stays anchored to the non-negative quadrant.
                if self.config.skip_negative_chunks && coord.is_negative() {
                    continue;
                }
                out.push(coord);
            }
        }
        out.sort_unstable_by_key(|c| (c.distance_squared(center), *c));
        out
    }

    /// Moves the viewer, building newly in-range chunks and disposing ones
    /// past the unload radius.
    pub fn set_viewer_position<S>(&mut self, source: &mut S, pos: WorldPos) -> StreamUpdate
    where
        S: ChunkSource<Payload = P>,
    {
        let center = pos.to_chunk_coord(self.config.chunk_world_size);
        self.center = Some(center);
        let mut update = StreamUpdate::new(center);

        for coord in self.load_candidates(center) {
            if self.loaded.contains_key(&coord) || self.pending.contains_key(&coord) {
                continue;
            }
            let ticket = self.issue_ticket(coord);
            self.stats.builds_requested += 1;
            match source.build(ticket) {
                BuildOutcome::Ready(payload) => {
                    self.loaded.insert(coord, payload);
                    self.stats.built += 1;
                    update.built.push(coord);
                },
                BuildOutcome::Pending => {
                    self.pending.insert(coord, ticket);
                    update.requested.push(coord);
                },
                BuildOutcome::Failed(e) => {
                    warn!("Chunk {coord} build failed: {e}");
                    self.stats.failed += 1;
                    update.failed.push(coord);
                },
            }
        }

        let radius = self.config.unload_radius;
        let mut leaving: Vec<ChunkCoord> = self
            .loaded
            .keys()
            .filter(|c| c.chebyshev_distance(center) > radius)
            .copied()
            .collect();
        leaving.sort_unstable();
        for coord in leaving {
            if let Some(payload) = self.loaded.remove(&coord) {
                source.dispose(coord, payload);
                self.stats.disposed += 1;
                update.disposed.push(coord);
            }
        }

        let before = self.pending.len();
        self.pending
            .retain(|coord, _| coord.chebyshev_distance(center) <= radius);
        let forgotten = before - self.pending.len();
        if forgotten > 0 {
            trace!("Forgot {forgotten} pending builds past the unload radius");
        }

        if !update.is_idle() {
            debug!(
                "Viewer at chunk {center}: built {}, requested {}, disposed {}, failed {}, resident {}",
                update.built.len(),
                update.requested.len(),
                update.disposed.len(),
                update.failed.len(),
                self.loaded.len()
            );
        }
        update
    }

    /// Delivers a deferred build result.
    ///
    /// The payload is inserted only if the ticket is still the live request
    /// for its chunk and the chunk is within the unload radius of the current
    /// viewer. Otherwise it is disposed immediately.
    pub fn complete_build<S>(
        &mut self,
        source: &mut S,
        ticket: BuildTicket,
        result: Result<P, S::Error>,
    ) -> Completion
    where
        S: ChunkSource<Payload = P>,
    {
        let coord = ticket.coord;
        if self.pending.get(&coord) != Some(&ticket) {
            return match result {
                Ok(payload) => {
                    debug!("Disposing stale build of chunk {coord}");
                    source.dispose(coord, payload);
                    self.stats.late_disposed += 1;
                    Completion::Disposed
                },
                Err(_) => Completion::Discarded,
            };
        }
        self.pending.remove(&coord);

        match result {
            Err(e) => {
                warn!("Chunk {coord} build failed: {e}");
                self.stats.failed += 1;
                Completion::Failed
            },
            Ok(payload) => {
                let in_range = self
                    .center
                    .is_some_and(|c| coord.chebyshev_distance(c) <= self.config.unload_radius);
                if in_range {
                    self.loaded.insert(coord, payload);
                    self.stats.built += 1;
                    Completion::Inserted
                } else {
                    debug!("Disposing late build of out-of-range chunk {coord}");
                    source.dispose(coord, payload);
                    self.stats.late_disposed += 1;
                    Completion::Disposed
                }
            },
        }
    }

    /// Disposes every loaded chunk and forgets all pending builds.
    ///
    /// The next `set_viewer_position` rebuilds from empty.
    pub fn invalidate_all<S>(&mut self, source: &mut S) -> usize
    where
        S: ChunkSource<Payload = P>,
    {
        self.epoch += 1;
        self.pending.clear();
        self.center = None;

        let mut coords: Vec<ChunkCoord> = self.loaded.keys().copied().collect();
        coords.sort_unstable();
        for coord in &coords {
            if let Some(payload) = self.loaded.remove(coord) {
                source.dispose(*coord, payload);
                self.stats.disposed += 1;
            }
        }
        debug!("Invalidated chunk cache: disposed {}", coords.len());
        coords.len()
    }

    fn issue_ticket(&mut self, coord: ChunkCoord) -> BuildTicket {
        let ticket = BuildTicket {
            coord,
            epoch: self.epoch,
            serial: self.next_serial,
        };
        self.next_serial += 1;
        ticket
    }
}
