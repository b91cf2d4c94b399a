use std::collections::BTreeSet;

use glam::{IVec2, Vec2};
use proptest::prelude::*;
use serde_json::Map;
use tilechunk_common::{ChunkId, Projection};
use tilechunk_map::{Chunk, MasterDescriptor, TileMap};
use tilechunk_stream::{ChunkStreamer, LoadError, LoadTicket, Loader, Renderer, StreamConfig};

/// Holds tickets so the test decides when, and in what order, they resolve.
#[derive(Default)]
struct HeldLoader {
    pending: Vec<LoadTicket>,
}

impl Loader for HeldLoader {
    fn request_load(&mut self, ticket: LoadTicket) {
        self.pending.push(ticket);
    }
}

/// Mirrors what a real renderer would have on screen.
#[derive(Default)]
struct ShownRenderer {
    shown: BTreeSet<ChunkId>,
}

impl Renderer for ShownRenderer {
    fn on_chunk_ready(&mut self, id: ChunkId, chunk: Chunk) {
        assert_eq!(chunk.id, id);
        assert!(self.shown.insert(id), "{id} shown twice");
    }

    fn dispose_chunk(&mut self, id: ChunkId) {
        assert!(self.shown.remove(&id), "{id} disposed while not shown");
    }
}

#[derive(Debug, Clone)]
enum Op {
    /// Move the viewpoint to a tile, possibly off the map.
    Update(i32, i32),
    /// Resolve the pending ticket at this index (modulo), as success or failure.
    Complete(usize, bool),
    /// Drop a pending ticket without resolving it.
    Abandon(usize),
    Poll,
    RetryAllFailed,
    Shutdown,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (-30i32..110, -30i32..110).prop_map(|(x, y)| Op::Update(x, y)),
        4 => (any::<usize>(), prop::bool::weighted(0.8)).prop_map(|(i, ok)| Op::Complete(i, ok)),
        1 => any::<usize>().prop_map(Op::Abandon),
        3 => Just(Op::Poll),
        1 => Just(Op::RetryAllFailed),
        1 => Just(Op::Shutdown),
    ]
}

/// 80x80 tiles in 20x20 chunks of 32px tiles: a 4x4 chunk grid.
fn master() -> MasterDescriptor {
    MasterDescriptor {
        chunk_width: 20,
        chunk_height: 20,
        nb_chunks_x: 4,
        nb_chunks_y: 4,
        map_width: 80,
        map_height: 80,
        tile_width: 32,
        tile_height: 32,
        tile_sets: Vec::new(),
    }
}

fn chunk(id: ChunkId) -> Chunk {
    Chunk {
        id,
        map: TileMap {
            width: 20,
            height: 20,
            tile_width: 32,
            tile_height: 32,
            layers: Vec::new(),
            tilesets: Vec::new(),
            extra: Map::new(),
        },
    }
}

fn tile_center(x: i32, y: i32) -> Vec2 {
    Vec2::new(x as f32 * 32.0 + 16.0, y as f32 * 32.0 + 16.0)
}

fn check_bookkeeping(
    s: &ChunkStreamer<HeldLoader, ShownRenderer>,
    padding: i32,
) -> Result<(), TestCaseError> {
    let side = (2 * padding + 1) as usize;
    prop_assert!(s.resident().is_disjoint(s.in_flight()));
    prop_assert!(s.resident().is_disjoint(s.failed()));
    prop_assert!(s.in_flight().is_disjoint(s.failed()));
    prop_assert!(s.resident().is_subset(s.desired()));
    prop_assert!(s.failed().is_subset(s.desired()));
    prop_assert!(s.resident().len() <= side * side);
    prop_assert_eq!(&s.renderer().shown, s.resident());
    Ok(())
}

proptest! {
    // bookkeeping holds after every step of any interleaving of updates,
    // out-of-order completions, failures, polls and retries
    #[test]
    fn streamer_bookkeeping_survives_any_sequence(
        padding in 0i32..=2,
        ops in prop::collection::vec(op(), 1..60),
    ) {
        let config = StreamConfig {
            projection: Projection::Orthogonal,
            padding: IVec2::splat(padding),
        };
        let mut s = ChunkStreamer::new(
            &master(),
            config,
            HeldLoader::default(),
            ShownRenderer::default(),
        );

        for op in ops {
            match op {
                Op::Update(x, y) => {
                    let viewpoint = tile_center(x, y);
                    let report = s.update(viewpoint);
                    for id in &report.requested {
                        prop_assert!(s.in_flight().contains(id));
                    }
                    check_bookkeeping(&s, padding)?;

                    let again = s.update(viewpoint);
                    prop_assert!(again.is_empty(), "repeat update issued {:?}", again);
                }
                Op::Complete(i, ok) => {
                    let pending = &mut s.loader_mut().pending;
                    if !pending.is_empty() {
                        let ticket = pending.swap_remove(i % pending.len());
                        let id = ticket.id();
                        let result = if ok {
                            Ok(chunk(id))
                        } else {
                            Err(LoadError::Other(format!("{id} unreadable")))
                        };
                        ticket.complete(result);
                    }
                }
                Op::Abandon(i) => {
                    let pending = &mut s.loader_mut().pending;
                    if !pending.is_empty() {
                        drop(pending.swap_remove(i % pending.len()));
                    }
                }
                Op::Poll => {
                    let done = s.poll();
                    for id in &done.ready {
                        prop_assert!(s.is_resident(*id));
                    }
                    for id in &done.discarded {
                        prop_assert!(!s.is_resident(*id));
                    }
                    for (id, _) in &done.failed {
                        prop_assert!(!s.is_resident(*id));
                    }
                }
                Op::RetryAllFailed => {
                    s.retry_all_failed();
                    prop_assert!(s.failed().is_empty());
                }
                Op::Shutdown => {
                    s.shutdown();
                    prop_assert!(s.resident().is_empty());
                    prop_assert!(s.desired().is_empty());
                }
            }
            check_bookkeeping(&s, padding)?;
        }

        // Once every outstanding load lands, nothing is left in flight.
        let mut tickets = std::mem::take(&mut s.loader_mut().pending);
        for ticket in tickets.drain(..) {
            let id = ticket.id();
            ticket.complete(Ok(chunk(id)));
        }
        s.poll();
        prop_assert!(s.in_flight().is_empty());
        check_bookkeeping(&s, padding)?;
    }
}
