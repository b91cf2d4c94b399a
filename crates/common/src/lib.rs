//! Shared grid math for splitting and streaming.
//!
//! # Invariants
//! - Everything here is pure: no I/O, no interior state.
//! - `chunk_id` and `chunk_coord_from_id` are exact inverses on the chunk grid.

pub mod grid;
pub mod neighborhood;
pub mod types;

pub use grid::{GridGeometry, chunk_grid_dims};
pub use neighborhood::{footprint_tiles, neighborhood};
pub use types::{Bounds, CellCoord, ChunkId, ParseProjectionError, Projection};
