use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, unbounded};
use glam::{IVec2, Vec2};
use tilechunk_common::{ChunkId, GridGeometry, Projection, neighborhood};
use tilechunk_map::MasterDescriptor;

use crate::loader::{Completion, LoadError, LoadTicket, Loader, Renderer};

/// Streaming configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// How world positions map to tiles.
    pub projection: Projection,
    /// Chunks kept resident on each side of the viewpoint's chunk.
    pub padding: IVec2,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            projection: Projection::Orthogonal,
            padding: IVec2::ONE,
        }
    }
}

/// Per-update streaming statistics for instrumentation.
#[derive(Debug, Clone, Default)]
pub struct StreamStats {
    pub loads_requested: usize,
    pub unloaded: usize,
    pub resident: usize,
    pub in_flight: usize,
    pub update_time: Duration,
}

/// Instructions issued by one [`ChunkStreamer::update`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Chunks handed to the loader.
    pub requested: Vec<ChunkId>,
    /// Chunks disposed and dropped from the resident set.
    pub unloaded: Vec<ChunkId>,
}

impl UpdateReport {
    pub fn is_empty(&self) -> bool {
        self.requested.is_empty() && self.unloaded.is_empty()
    }
}

/// Load completions handled by one [`ChunkStreamer::poll`].
#[derive(Debug, Default)]
pub struct CompletionReport {
    /// Chunks that became resident and were passed to the renderer.
    pub ready: Vec<ChunkId>,
    /// Results for chunks no longer wanted; dropped.
    pub discarded: Vec<ChunkId>,
    /// Loads that failed. Not retried until [`ChunkStreamer::retry`].
    pub failed: Vec<(ChunkId, LoadError)>,
}

/// Keeps the chunks around a viewpoint resident.
///
/// Each update diffs the desired neighborhood against the resident and
/// in-flight sets, issues loads for what is missing and disposes what is no
/// longer wanted. Loads complete asynchronously; their results are applied in
/// [`ChunkStreamer::poll`], which re-checks that the chunk is still wanted.
///
/// A chunk is never both resident and in flight.
pub struct ChunkStreamer<L, R> {
    config: StreamConfig,
    geometry: GridGeometry,
    loader: L,
    renderer: R,
    resident: BTreeSet<ChunkId>,
    in_flight: BTreeSet<ChunkId>,
    desired: BTreeSet<ChunkId>,
    failed: BTreeSet<ChunkId>,
    completions_tx: Sender<Completion>,
    completions_rx: Receiver<Completion>,
    stats: StreamStats,
}

impl<L: Loader, R: Renderer> ChunkStreamer<L, R> {
    pub fn new(master: &MasterDescriptor, config: StreamConfig, loader: L, renderer: R) -> Self {
        let (completions_tx, completions_rx) = unbounded();
        Self {
            geometry: master.geometry(config.projection),
            config,
            loader,
            renderer,
            resident: BTreeSet::new(),
            in_flight: BTreeSet::new(),
            desired: BTreeSet::new(),
            failed: BTreeSet::new(),
            completions_tx,
            completions_rx,
            stats: StreamStats::default(),
        }
    }

    /// Chunks that should be resident for a viewpoint at `viewpoint` (world pixels).
    pub fn desired_chunks(&self, viewpoint: Vec2) -> BTreeSet<ChunkId> {
        let anchor = self
            .geometry
            .chunk_coord_from_tile(self.geometry.tile_from_world(viewpoint));
        neighborhood(
            anchor,
            IVec2::ONE,
            self.config.padding,
            self.geometry.chunk_bounds(),
            true,
        )
        .into_iter()
        .filter_map(|coord| self.geometry.chunk_id(coord))
        .collect()
    }

    /// Recompute the desired set for `viewpoint` and issue load/unload instructions.
    ///
    /// Unloads happen immediately. Calling this again with the same viewpoint
    /// issues nothing.
    pub fn update(&mut self, viewpoint: Vec2) -> UpdateReport {
        let _span = tracing::info_span!("stream_update").entered();
        let start = Instant::now();

        self.desired = self.desired_chunks(viewpoint);
        let desired = &self.desired;
        self.failed.retain(|id| desired.contains(id));

        let to_load: Vec<ChunkId> = self
            .desired
            .iter()
            .filter(|id| {
                !self.resident.contains(*id)
                    && !self.in_flight.contains(*id)
                    && !self.failed.contains(*id)
            })
            .copied()
            .collect();

        let to_unload: Vec<ChunkId> = self
            .resident
            .iter()
            .filter(|id| !self.desired.contains(*id))
            .copied()
            .collect();

        for &id in &to_load {
            tracing::debug!(chunk = %id, "loading chunk");
            self.in_flight.insert(id);
            self.loader
                .request_load(LoadTicket::new(id, self.completions_tx.clone()));
        }
        for &id in &to_unload {
            tracing::debug!(chunk = %id, "destroying chunk");
            self.resident.remove(&id);
            self.renderer.dispose_chunk(id);
        }

        self.stats = StreamStats {
            loads_requested: to_load.len(),
            unloaded: to_unload.len(),
            resident: self.resident.len(),
            in_flight: self.in_flight.len(),
            update_time: start.elapsed(),
        };

        tracing::trace!(
            requested = to_load.len(),
            unloaded = to_unload.len(),
            resident = self.resident.len(),
            in_flight = self.in_flight.len(),
            "stream update complete"
        );

        UpdateReport {
            requested: to_load,
            unloaded: to_unload,
        }
    }

    /// Apply every load completion delivered so far. Never blocks.
    pub fn poll(&mut self) -> CompletionReport {
        let mut report = CompletionReport::default();
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.apply(completion, &mut report);
        }
        report
    }

    fn apply(&mut self, completion: Completion, report: &mut CompletionReport) {
        let Completion { id, result } = completion;
        if !self.in_flight.remove(&id) {
            tracing::warn!(chunk = %id, "completion for a chunk that was not requested");
            return;
        }
        match result {
            Ok(chunk) if self.desired.contains(&id) => {
                tracing::debug!(chunk = %id, "chunk ready");
                self.resident.insert(id);
                self.renderer.on_chunk_ready(id, chunk);
                report.ready.push(id);
            }
            Ok(_) => {
                tracing::debug!(chunk = %id, "discarding stale chunk");
                report.discarded.push(id);
            }
            Err(e) => {
                tracing::warn!(chunk = %id, error = %e, "chunk load failed");
                if self.desired.contains(&id) {
                    self.failed.insert(id);
                }
                report.failed.push((id, e));
            }
        }
    }

    /// Allow a failed chunk to be requested again on the next update.
    pub fn retry(&mut self, id: ChunkId) -> bool {
        self.failed.remove(&id)
    }

    pub fn retry_all_failed(&mut self) {
        self.failed.clear();
    }

    /// Dispose every resident chunk. Loads still in flight are discarded when they land.
    pub fn shutdown(&mut self) -> Vec<ChunkId> {
        self.desired.clear();
        self.failed.clear();
        let disposed: Vec<ChunkId> = std::mem::take(&mut self.resident).into_iter().collect();
        for &id in &disposed {
            self.renderer.dispose_chunk(id);
        }
        tracing::info!(disposed = disposed.len(), "streamer shut down");
        disposed
    }

    pub fn resident(&self) -> &BTreeSet<ChunkId> {
        &self.resident
    }

    pub fn in_flight(&self) -> &BTreeSet<ChunkId> {
        &self.in_flight
    }

    pub fn desired(&self) -> &BTreeSet<ChunkId> {
        &self.desired
    }

    pub fn failed(&self) -> &BTreeSet<ChunkId> {
        &self.failed
    }

    pub fn is_resident(&self, id: ChunkId) -> bool {
        self.resident.contains(&id)
    }

    /// Statistics from the last update.
    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn loader_mut(&mut self) -> &mut L {
        &mut self.loader
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }
}
