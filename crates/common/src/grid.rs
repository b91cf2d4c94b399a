use glam::Vec2;

use crate::types::{Bounds, CellCoord, ChunkId, Projection};

/// Number of chunks along each axis for a map split into `chunk_width` x `chunk_height` chunks.
///
/// The last column/row absorbs the remainder, so this rounds up.
pub fn chunk_grid_dims(
    map_width: u32,
    map_height: u32,
    chunk_width: u32,
    chunk_height: u32,
) -> (u32, u32) {
    assert!(chunk_width > 0 && chunk_height > 0, "chunk size must be positive");
    (
        map_width.div_ceil(chunk_width),
        map_height.div_ceil(chunk_height),
    )
}

/// Tile and chunk geometry of a split map.
///
/// Converts world positions to tiles, tiles to chunks and chunks to row-major
/// ids. One canonical implementation, selected by `projection`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridGeometry {
    pub projection: Projection,
    /// Tile size in pixels.
    pub tile_width: u32,
    pub tile_height: u32,
    /// Chunk size in tiles.
    pub chunk_width: u32,
    pub chunk_height: u32,
    /// Chunk grid dimensions.
    pub nb_chunks_x: u32,
    pub nb_chunks_y: u32,
}

impl GridGeometry {
    /// Total number of chunks in the grid.
    pub fn chunk_count(&self) -> u32 {
        self.nb_chunks_x * self.nb_chunks_y
    }

    /// Convert a world position (pixels) to the tile under it.
    pub fn tile_from_world(&self, pos: Vec2) -> CellCoord {
        let tx = pos.x / self.tile_width as f32;
        let ty = pos.y / self.tile_height as f32;
        match self.projection {
            Projection::Orthogonal => CellCoord::new(tx.floor() as i32, ty.floor() as i32),
            // Inverse of the isometric diamond projection used for placement.
            Projection::Staggered => {
                CellCoord::new((ty + tx).floor() as i32, ((tx - ty) * -1.0).floor() as i32)
            }
        }
    }

    /// Chunk cell containing the given tile. Floors, so negative tiles map to negative chunks.
    pub fn chunk_coord_from_tile(&self, tile: CellCoord) -> CellCoord {
        CellCoord::new(
            tile.x.div_euclid(self.chunk_width as i32),
            tile.y.div_euclid(self.chunk_height as i32),
        )
    }

    /// Whether a chunk cell lies on the chunk grid.
    pub fn contains_chunk(&self, coord: CellCoord) -> bool {
        self.chunk_bounds().contains(coord)
    }

    /// Inclusive bounds of the chunk grid: `[0, nb_chunks_x - 1] x [0, nb_chunks_y - 1]`.
    pub fn chunk_bounds(&self) -> Bounds {
        Bounds::new(
            0,
            0,
            self.nb_chunks_x as i32 - 1,
            self.nb_chunks_y as i32 - 1,
        )
    }

    /// Row-major id of a chunk cell, or `None` if it is off the grid.
    pub fn chunk_id(&self, coord: CellCoord) -> Option<ChunkId> {
        if !self.contains_chunk(coord) {
            return None;
        }
        Some(ChunkId(coord.y as u32 * self.nb_chunks_x + coord.x as u32))
    }

    /// Chunk cell of a row-major id. Inverse of [`GridGeometry::chunk_id`].
    pub fn chunk_coord_from_id(&self, id: ChunkId) -> CellCoord {
        CellCoord::new(
            (id.0 % self.nb_chunks_x) as i32,
            (id.0 / self.nb_chunks_x) as i32,
        )
    }

    /// Chunk under a world position, if any.
    pub fn chunk_at_world(&self, pos: Vec2) -> Option<ChunkId> {
        self.chunk_id(self.chunk_coord_from_tile(self.tile_from_world(pos)))
    }

    /// Pixel offset at which a chunk's layers are drawn.
    ///
    /// Orthogonal chunks sit at their pixel origin. Staggered chunks follow a
    /// three-way split around the main diagonal (`cx == cy`): diagonal chunks
    /// move straight down, chunks above and below the diagonal combine row and
    /// column contributions of half a chunk in pixels.
    pub fn chunk_placement_offset(&self, id: ChunkId) -> Vec2 {
        let coord = self.chunk_coord_from_id(id);
        let (col, row) = (coord.x as f32, coord.y as f32);

        if self.projection == Projection::Orthogonal {
            return Vec2::new(
                col * (self.chunk_width * self.tile_width) as f32,
                row * (self.chunk_height * self.tile_height) as f32,
            );
        }

        let half_width = (self.chunk_width as f32 / 2.0) * self.tile_width as f32;
        let half_height = (self.chunk_height as f32 / 2.0) * self.tile_height as f32;
        let n = self.nb_chunks_x;
        let row_index = coord.y as u32;

        if (id.0 - row_index) % n == 0 {
            Vec2::new(0.0, row * half_width)
        } else if id.0 < n * row_index + row_index {
            let col_in_row = (id.0 % n) as f32;
            Vec2::new(
                -(row * half_width) + col_in_row * half_width,
                row * half_height + col_in_row * half_height,
            )
        } else {
            let diff = (coord.x - coord.y).rem_euclid(n as i32) as f32;
            Vec2::new(diff * half_width, (row + col) * half_height)
        }
    }
}
