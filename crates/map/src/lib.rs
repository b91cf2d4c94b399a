//! On-disk formats for split tile maps.
//!
//! # Invariants
//! - Chunk sets are published atomically: a reader sees either the previous
//!   complete set or the new complete set, never a mix.
//! - Fields this crate does not model are carried through untouched.

mod schema;
mod store;

pub use schema::{Chunk, Layer, MasterDescriptor, TILE_LAYER, TileMap, TileSet};
pub use store::{ChunkStore, MASTER_FILE, MapError, chunk_file_name, read_tile_map};
