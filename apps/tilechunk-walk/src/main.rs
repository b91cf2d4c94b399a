use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use glam::{IVec2, Vec2};
use tilechunk_common::{ChunkId, GridGeometry, Projection};
use tilechunk_map::{Chunk, ChunkStore};
use tilechunk_stream::{ChunkStreamer, FsChunkLoader, Renderer, StreamConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "tilechunk-walk",
    about = "Stream a split map along a path of viewpoints and report what loads and unloads"
)]
struct Cli {
    /// Chunk set directory produced by tilechunk-split
    #[arg(short, long, default_value = "chunks")]
    chunks: PathBuf,

    /// Tile projection: orthogonal or staggered
    #[arg(short, long, default_value_t = Projection::Orthogonal)]
    projection: Projection,

    /// Chunks kept around the viewpoint's chunk on each side
    #[arg(long, default_value_t = 1)]
    padding: i32,

    /// Seconds to wait for outstanding loads at each step
    #[arg(long, default_value_t = 5.0)]
    settle: f64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Viewpoints in world pixels, as `x,y`
    #[arg(
        required = true,
        value_name = "X,Y",
        value_parser = parse_point,
        allow_hyphen_values = true
    )]
    path: Vec<Vec2>,
}

fn parse_point(s: &str) -> Result<Vec2, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got {s:?}"))?;
    let x: f32 = x.trim().parse().map_err(|e| format!("bad x in {s:?}: {e}"))?;
    let y: f32 = y.trim().parse().map_err(|e| format!("bad y in {s:?}: {e}"))?;
    Ok(Vec2::new(x, y))
}

/// Text renderer: prints each chunk as it appears or goes away.
struct LogRenderer {
    geometry: GridGeometry,
    shown: usize,
}

impl Renderer for LogRenderer {
    fn on_chunk_ready(&mut self, id: ChunkId, chunk: Chunk) {
        let offset = self.geometry.chunk_placement_offset(id);
        self.shown += 1;
        println!(
            "  + {id} at ({:.1}, {:.1}), {}x{} tiles, {} layers",
            offset.x,
            offset.y,
            chunk.width(),
            chunk.height(),
            chunk.map.layers.len()
        );
    }

    fn dispose_chunk(&mut self, id: ChunkId) {
        self.shown = self.shown.saturating_sub(1);
        println!("  - {id}");
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let store = ChunkStore::open(&cli.chunks)
        .with_context(|| format!("failed to open chunk set {}", cli.chunks.display()))?;
    let master = store.master().clone();
    let config = StreamConfig {
        projection: cli.projection,
        padding: IVec2::splat(cli.padding),
    };
    let renderer = LogRenderer {
        geometry: master.geometry(config.projection),
        shown: 0,
    };
    let loader = FsChunkLoader::new(store).context("failed to start chunk loader")?;
    let mut streamer = ChunkStreamer::new(&master, config, loader, renderer);

    println!(
        "{} chunks ({} x {}) of {}x{} tiles, {} projection",
        master.chunk_count(),
        master.nb_chunks_x,
        master.nb_chunks_y,
        master.chunk_width,
        master.chunk_height,
        cli.projection
    );

    let settle = Duration::from_secs_f64(cli.settle.max(0.0));
    for viewpoint in &cli.path {
        let report = streamer.update(*viewpoint);
        println!(
            "viewpoint ({:.1}, {:.1}): {} requested, {} unloaded",
            viewpoint.x,
            viewpoint.y,
            report.requested.len(),
            report.unloaded.len()
        );

        let deadline = Instant::now() + settle;
        loop {
            let done = streamer.poll();
            for (id, e) in &done.failed {
                println!("  ! {id}: {e}");
            }
            if streamer.in_flight().is_empty() || Instant::now() >= deadline {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        if !streamer.in_flight().is_empty() {
            tracing::warn!(
                pending = streamer.in_flight().len(),
                "loads still outstanding, moving on"
            );
        }
    }

    println!(
        "resident: {} chunks, renderer showing {}",
        streamer.resident().len(),
        streamer.renderer().shown
    );
    streamer.shutdown();
    Ok(())
}
