//! Background chunk building.
//!
//! `DeferredBuilder` runs a build closure on worker threads. `build` only
//! enqueues the ticket and reports [`BuildOutcome::Pending`]. Results flow
//! back over a channel and are handed to the cache with
//! [`DeferredBuilder::drain_into`] or [`DeferredBuilder::settle`] from the
//! cache's owning thread. By then the viewer may have moved on; the cache
//! decides whether each late result is inserted or disposed.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use homestead_common::{ChunkCoord, HomesteadResult, StreamError};
use std::any::Any;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::chunk::{BuildOutcome, BuildTicket, ChunkSource};
use crate::streaming::ChunkStreamCache;

/// Failure of a deferred build.
#[derive(Debug, Error)]
pub enum DeferredError<E> {
    /// The build closure returned an error
    #[error("build failed: {0}")]
    Build(E),
    /// The build closure panicked
    #[error("build panicked: {0}")]
    Panicked(String),
    /// No worker is left to run the build
    #[error(transparent)]
    Stream(#[from] StreamError),
}

type BuildResult<P, E> = (BuildTicket, Result<P, DeferredError<E>>);

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

/// Worker-pool [`ChunkSource`].
pub struct DeferredBuilder<P, E> {
    jobs: Option<Sender<BuildTicket>>,
    results: Receiver<BuildResult<P, E>>,
    workers: Vec<JoinHandle<()>>,
    in_flight: usize,
    disposed: u64,
}

impl<P, E> DeferredBuilder<P, E>
where
    P: Send + 'static,
    E: Display + Send + 'static,
{
    /// Spawns `workers` threads (at least one) running `build`.
    pub fn new<F>(workers: usize, build: F) -> HomesteadResult<Self>
    where
        F: Fn(ChunkCoord) -> Result<P, E> + Send + Sync + 'static,
    {
        let (job_tx, job_rx) = crossbeam_channel::unbounded::<BuildTicket>();
        let (result_tx, result_rx) = crossbeam_channel::unbounded();
        let build = Arc::new(build);

        let mut handles = Vec::with_capacity(workers.max(1));
        for i in 0..workers.max(1) {
            let jobs = job_rx.clone();
            let results = result_tx.clone();
            let build = Arc::clone(&build);
            let handle = thread::Builder::new()
                .name(format!("chunk-build-{i}"))
                .spawn(move || {
                    for ticket in &jobs {
                        // Panics are reported back as failures.
                        let outcome = panic::catch_unwind(AssertUnwindSafe(|| build(ticket.coord)));
                        let result = match outcome {
                            Ok(built) => built.map_err(DeferredError::Build),
                            Err(payload) => {
                                Err(DeferredError::Panicked(panic_message(payload.as_ref())))
                            },
                        };
                        if results.send((ticket, result)).is_err() {
                            break;
                        }
                    }
                })?;
            handles.push(handle);
        }
        debug!("Started {} chunk build workers", handles.len());

        Ok(Self {
            jobs: Some(job_tx),
            results: result_rx,
            workers: handles,
            in_flight: 0,
            disposed: 0,
        })
    }

    /// Builds requested but not yet handed back.
    #[must_use]
    pub const fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Payloads disposed so far.
    #[must_use]
    pub const fn disposed_count(&self) -> u64 {
        self.disposed
    }

    /// Hands every finished result to the cache without blocking.
    pub fn drain_into(&mut self, cache: &mut ChunkStreamCache<P>) -> usize {
        let ready: Vec<BuildResult<P, E>> = self.results.try_iter().collect();
        let count = ready.len();
        for (ticket, result) in ready {
            self.deliver(cache, ticket, result);
        }
        count
    }

    /// Blocks until every in-flight build is delivered or `timeout` passes.
    pub fn settle(&mut self, cache: &mut ChunkStreamCache<P>, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        let mut delivered = 0;
        while self.in_flight > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.results.recv_timeout(remaining) {
                Ok((ticket, result)) => {
                    self.deliver(cache, ticket, result);
                    delivered += 1;
                },
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => break,
            }
        }
        delivered
    }

    fn deliver(
        &mut self,
        cache: &mut ChunkStreamCache<P>,
        ticket: BuildTicket,
        result: Result<P, DeferredError<E>>,
    ) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let completion = cache.complete_build(self, ticket, result);
        trace!("Chunk {} completion: {completion:?}", ticket.coord);
    }
}

impl<P, E> ChunkSource for DeferredBuilder<P, E>
where
    P: Send + 'static,
    E: Display + Send + 'static,
{
    type Payload = P;
    type Error = DeferredError<E>;

    fn build(&mut self, ticket: BuildTicket) -> BuildOutcome<P, DeferredError<E>> {
        let sent = self
            .jobs
            .as_ref()
            .is_some_and(|jobs| jobs.send(ticket).is_ok());
        if sent {
            self.in_flight += 1;
            BuildOutcome::Pending
        } else {
            BuildOutcome::Failed(StreamError::WorkersDisconnected.into())
        }
    }

    fn dispose(&mut self, _coord: ChunkCoord, payload: P) {
        drop(payload);
        self.disposed += 1;
    }
}

impl<P, E> Drop for DeferredBuilder<P, E> {
    fn drop(&mut self) {
        // Closing the job channel ends each worker's receive loop.
        self.jobs.take();
        for handle in self.workers.drain(..) {
            let name = handle.thread().name().unwrap_or("chunk-build").to_owned();
            if handle.join().is_err() {
                warn!("Worker {name} panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkState;
    use crate::streaming::StreamingConfig;
    use homestead_common::WorldPos;
    use std::sync::atomic::{AtomicBool, Ordering};

    const WAIT: Duration = Duration::from_secs(10);

    fn cache() -> ChunkStreamCache<i64> {
        ChunkStreamCache::new(StreamingConfig {
            chunk_world_size: 1.0,
            load_radius: 1,
            unload_radius: 2,
            skip_negative_chunks: false,
        })
        .expect("valid config")
    }

    fn builder() -> DeferredBuilder<i64, String> {
        DeferredBuilder::new(2, |coord: ChunkCoord| {
            if coord.x == 99 {
                Err("bad chunk".to_string())
            } else {
                Ok(i64::from(coord.x) * 1000 + i64::from(coord.z))
            }
        })
        .expect("spawn workers")
    }

    #[test]
    fn test_deferred_builds_settle_into_cache() {
        let mut cache = cache();
        let mut source = builder();
        let update = cache.set_viewer_position(&mut source, WorldPos::new(0.5, 0.5));
        assert!(update.built.is_empty());
        assert_eq!(update.requested.len(), 9);
        assert_eq!(source.in_flight(), 9);

        assert_eq!(source.settle(&mut cache, WAIT), 9);
        assert_eq!(cache.loaded_count(), 9);
        assert_eq!(cache.pending_count(), 0);
        assert_eq!(cache.get(ChunkCoord::new(1, -1)), Some(&999));
    }

    #[test]
    fn test_results_for_abandoned_chunks_are_disposed() {
        let mut cache = cache();
        let mut source = builder();
        cache.set_viewer_position(&mut source, WorldPos::new(0.5, 0.5));
        // Jump far away before any result is delivered.
        cache.set_viewer_position(&mut source, WorldPos::new(50.5, 50.5));
        assert_eq!(source.in_flight(), 18);

        source.settle(&mut cache, WAIT);
        assert_eq!(source.in_flight(), 0);
        assert_eq!(source.disposed_count(), 9);
        assert_eq!(cache.loaded_count(), 9);
        assert!(cache
            .loaded_coords()
            .iter()
            .all(|c| c.chebyshev_distance(ChunkCoord::new(50, 50)) <= 1));
        assert_eq!(cache.stats().late_disposed, 9);
    }

    #[test]
    fn test_failed_deferred_build_stays_unloaded() {
        let mut cache = cache();
        let mut source = builder();
        cache.set_viewer_position(&mut source, WorldPos::new(99.5, 0.5));
        source.settle(&mut cache, WAIT);
        assert_eq!(cache.loaded_count(), 6);
        assert_eq!(cache.state(ChunkCoord::new(99, 0)), ChunkState::Unloaded);
        assert_eq!(cache.stats().failed, 3);
    }

    #[test]
    fn test_panicking_build_fails_and_is_retried() {
        let crashed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&crashed);
        let mut source = DeferredBuilder::new(2, move |coord: ChunkCoord| {
            if coord == ChunkCoord::new(1, 1) && !flag.swap(true, Ordering::SeqCst) {
                panic!("ground sampler crashed");
            }
            Ok::<_, String>(i64::from(coord.x))
        })
        .expect("spawn workers");
        let mut cache = cache();

        cache.set_viewer_position(&mut source, WorldPos::new(0.5, 0.5));
        assert_eq!(source.settle(&mut cache, WAIT), 9);
        assert!(crashed.load(Ordering::SeqCst));
        assert_eq!(source.in_flight(), 0);
        assert_eq!(cache.loaded_count(), 8);
        assert_eq!(cache.state(ChunkCoord::new(1, 1)), ChunkState::Unloaded);
        assert_eq!(cache.stats().failed, 1);

        let retry = cache.set_viewer_position(&mut source, WorldPos::new(0.5, 0.5));
        assert_eq!(retry.requested, vec![ChunkCoord::new(1, 1)]);
        assert_eq!(source.settle(&mut cache, WAIT), 1);
        assert_eq!(cache.loaded_count(), 9);
        assert_eq!(cache.get(ChunkCoord::new(1, 1)), Some(&1));
    }

    #[test]
    fn test_panic_message_extraction() {
        let from_str = panic::catch_unwind(|| panic!("static message")).expect_err("panics");
        assert_eq!(panic_message(from_str.as_ref()), "static message");
        let from_string = panic::catch_unwind(|| panic!("chunk {}", 4)).expect_err("panics");
        assert_eq!(panic_message(from_string.as_ref()), "chunk 4");
    }

    #[test]
    fn test_drain_into_does_not_block() {
        let mut cache = cache();
        let mut source = builder();
        assert_eq!(source.drain_into(&mut cache), 0);
        cache.set_viewer_position(&mut source, WorldPos::new(0.5, 0.5));
        let deadline = Instant::now() + WAIT;
        let mut delivered = 0;
        while delivered < 9 && Instant::now() < deadline {
            delivered += source.drain_into(&mut cache);
            thread::yield_now();
        }
        assert_eq!(delivered, 9);
        assert_eq!(cache.loaded_count(), 9);
    }
}
