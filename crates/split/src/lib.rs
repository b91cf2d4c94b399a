//! Chunk splitter: partitions one large tile map into a master descriptor
//! plus one file per chunk.
//!
//! # Invariants
//! - Reassembling every chunk's layer windows in grid order reproduces the
//!   source layers exactly.
//! - Any failure aborts the whole split; a partial chunk set is never published.

mod splitter;

use std::path::{Path, PathBuf};

use tilechunk_map::{ChunkStore, MapError, read_tile_map};

pub use splitter::{reassemble_layer, split};

/// Default chunk size in tiles.
pub const DEFAULT_CHUNK_SIZE: u32 = 20;
/// Default output directory.
pub const DEFAULT_OUTPUT_DIR: &str = "chunks";

/// Errors from splitting a map.
#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    #[error("invalid split configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid map: {0}")]
    InvalidMap(String),
    #[error(transparent)]
    Map(#[from] MapError),
}

/// What to split and where to put the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitConfig {
    /// Source map; the `.json` extension may be omitted.
    pub input: PathBuf,
    /// Output directory. Replaced entirely on success.
    pub output: PathBuf,
    /// Chunk size in tiles.
    pub chunk_width: u32,
    pub chunk_height: u32,
}

impl SplitConfig {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: PathBuf::from(DEFAULT_OUTPUT_DIR),
            chunk_width: DEFAULT_CHUNK_SIZE,
            chunk_height: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Outcome of a successful split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitSummary {
    pub output: PathBuf,
    pub nb_chunks_x: u32,
    pub nb_chunks_y: u32,
    pub chunk_count: u32,
    pub layer_count: usize,
}

/// Read the source map, split it and publish the chunk set.
pub fn split_file(config: &SplitConfig) -> Result<SplitSummary, SplitError> {
    let _span = tracing::info_span!("split", input = %config.input.display()).entered();

    if config.input.as_os_str().is_empty() {
        return Err(SplitError::InvalidConfig("no input map given".into()));
    }
    if config.chunk_width == 0 || config.chunk_height == 0 {
        return Err(SplitError::InvalidConfig(format!(
            "chunk size must be positive, got {}x{}",
            config.chunk_width, config.chunk_height
        )));
    }

    let input = resolve_input(&config.input);
    let map = read_tile_map(&input)?;
    let (master, chunks) = split(&map, config.chunk_width, config.chunk_height)?;

    tracing::info!(
        "splitting into {} chunks ({} x {}) of size ({} x {})",
        master.chunk_count(),
        master.nb_chunks_x,
        master.nb_chunks_y,
        master.chunk_width,
        master.chunk_height
    );
    tracing::info!(output = %config.output.display(), "writing chunk set");

    ChunkStore::publish(&config.output, &master, &chunks)?;
    tracing::info!("all chunks created");

    Ok(SplitSummary {
        output: config.output.clone(),
        nb_chunks_x: master.nb_chunks_x,
        nb_chunks_y: master.nb_chunks_y,
        chunk_count: master.chunk_count(),
        layer_count: map.layers.len(),
    })
}

/// `path` as given, or with `.json` appended when that is what exists.
fn resolve_input(path: &Path) -> PathBuf {
    if path.exists() || path.extension().is_some() {
        return path.to_path_buf();
    }
    let with_ext = path.with_extension("json");
    if with_ext.exists() {
        with_ext
    } else {
        path.to_path_buf()
    }
}
