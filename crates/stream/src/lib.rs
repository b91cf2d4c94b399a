//! Streaming: keeps the chunks around a moving viewpoint resident.
//!
//! # Invariants
//! - A chunk is never resident and in flight at the same time.
//! - Repeating an update without moving issues no instructions.
//! - Stale or failed loads never corrupt the resident/in-flight bookkeeping.
//!
//! The streamer is single-threaded. Loads are asynchronous: the host's
//! [`Loader`] resolves each [`LoadTicket`] whenever it likes, and the results
//! are applied on the next [`ChunkStreamer::poll`].

mod loader;
mod streamer;

pub use loader::{FsChunkLoader, LoadError, LoadResult, LoadTicket, Loader, Renderer};
pub use streamer::{ChunkStreamer, CompletionReport, StreamConfig, StreamStats, UpdateReport};

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use std::time::{Duration, Instant};
    use tilechunk_common::ChunkId;
    use tilechunk_map::{Chunk, ChunkStore};
    use tilechunk_split::{SplitConfig, split_file};

    #[derive(Default)]
    struct CountingRenderer {
        ready: Vec<ChunkId>,
        disposed: Vec<ChunkId>,
    }

    impl Renderer for CountingRenderer {
        fn on_chunk_ready(&mut self, id: ChunkId, _chunk: Chunk) {
            self.ready.push(id);
        }

        fn dispose_chunk(&mut self, id: ChunkId) {
            self.disposed.push(id);
        }
    }

    fn write_map(path: &std::path::Path, width: u32, height: u32) {
        let map = serde_json::json!({
            "width": width,
            "height": height,
            "tilewidth": 32,
            "tileheight": 32,
            "layers": [{
                "type": "tilelayer",
                "width": width,
                "height": height,
                "data": (0..width * height).collect::<Vec<u32>>(),
            }],
            "tilesets": [{"image": "tiles.png"}],
        });
        std::fs::write(path, serde_json::to_vec(&map).unwrap()).unwrap();
    }

    #[test]
    fn streams_split_chunks_from_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("world.json");
        write_map(&input, 64, 64);
        let output = tmp.path().join("chunks");
        split_file(&SplitConfig {
            output: output.clone(),
            ..SplitConfig::new(&input)
        })
        .unwrap();

        let store = ChunkStore::open(&output).unwrap();
        let master = store.master().clone();
        let loader = FsChunkLoader::new(store).unwrap();
        let mut streamer = ChunkStreamer::new(
            &master,
            StreamConfig::default(),
            loader,
            CountingRenderer::default(),
        );

        // Tile (30, 30) sits in chunk (1, 1).
        let vp = Vec2::new(30.0 * 32.0, 30.0 * 32.0);
        assert_eq!(streamer.update(vp).requested.len(), 9);

        let deadline = Instant::now() + Duration::from_secs(10);
        while !streamer.in_flight().is_empty() && Instant::now() < deadline {
            let done = streamer.poll();
            assert!(done.failed.is_empty());
            std::thread::sleep(Duration::from_millis(5));
        }
        streamer.poll();

        assert_eq!(streamer.resident().len(), 9);
        assert_eq!(streamer.renderer().ready.len(), 9);
        assert!(streamer.update(vp).is_empty());

        assert_eq!(streamer.shutdown().len(), 9);
        assert_eq!(streamer.renderer().disposed.len(), 9);
    }

    #[test]
    fn missing_chunk_file_surfaces_as_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("world.json");
        write_map(&input, 40, 20);
        let output = tmp.path().join("chunks");
        split_file(&SplitConfig {
            output: output.clone(),
            ..SplitConfig::new(&input)
        })
        .unwrap();
        std::fs::remove_file(output.join("chunk1.json")).unwrap();

        let store = ChunkStore::open(&output).unwrap();
        let master = store.master().clone();
        let mut streamer = ChunkStreamer::new(
            &master,
            StreamConfig::default(),
            FsChunkLoader::new(store).unwrap(),
            CountingRenderer::default(),
        );
        streamer.update(Vec2::new(10.0, 10.0));

        let deadline = Instant::now() + Duration::from_secs(10);
        let mut failed = Vec::new();
        while !streamer.in_flight().is_empty() && Instant::now() < deadline {
            failed.extend(streamer.poll().failed.into_iter().map(|(id, _)| id));
            std::thread::sleep(Duration::from_millis(5));
        }
        failed.extend(streamer.poll().failed.into_iter().map(|(id, _)| id));

        assert_eq!(failed, vec![ChunkId(1)]);
        assert_eq!(streamer.resident().iter().copied().collect::<Vec<_>>(), vec![ChunkId(0)]);
    }
}
