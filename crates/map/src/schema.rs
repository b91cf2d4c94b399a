use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tilechunk_common::{CellCoord, ChunkId, GridGeometry, Projection, chunk_grid_dims};

/// Layer `type` of layers that carry a flat tile id array.
pub const TILE_LAYER: &str = "tilelayer";

/// A tile map as exported by the map editor. Read-only input of the splitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileMap {
    /// Width in tiles.
    pub width: u32,
    /// Height in tiles.
    pub height: u32,
    #[serde(rename = "tilewidth")]
    pub tile_width: u32,
    #[serde(rename = "tileheight")]
    pub tile_height: u32,
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub tilesets: Vec<TileSet>,
    /// Everything else the editor wrote (orientation, properties, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One plane of map data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    /// Row-major tile ids, `width * height` long. Only tile layers have it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<u32>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Layer {
    pub fn is_tile_layer(&self) -> bool {
        self.kind == TILE_LAYER
    }
}

/// Tileset reference. Only the image path is interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TileSet {
    /// Copy of this tileset with its image path moved one directory up.
    ///
    /// Absolute paths and URLs are left alone.
    pub fn rebased(&self) -> Self {
        let image = self.image.as_ref().map(|image| {
            if image.starts_with('/') || image.contains("://") {
                image.clone()
            } else {
                format!("../{image}")
            }
        });
        Self {
            image,
            extra: self.extra.clone(),
        }
    }
}

impl TileMap {
    /// Check the structural invariants the splitter relies on.
    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!("map is {}x{} tiles", self.width, self.height));
        }
        if self.tile_width == 0 || self.tile_height == 0 {
            return Err(format!(
                "tile size is {}x{} pixels",
                self.tile_width, self.tile_height
            ));
        }
        let expected = self.width as usize * self.height as usize;
        for (i, layer) in self.layers.iter().enumerate() {
            if !layer.is_tile_layer() {
                continue;
            }
            if layer.width != self.width || layer.height != self.height {
                return Err(format!(
                    "layer {i} is {}x{}, map is {}x{}",
                    layer.width, layer.height, self.width, self.height
                ));
            }
            let len = layer.data.as_ref().map_or(0, Vec::len);
            if len != expected {
                return Err(format!(
                    "layer {i} has {len} tiles, expected {expected}"
                ));
            }
        }
        Ok(())
    }
}

/// Describes a split: chunk size, chunk grid and the source map geometry.
///
/// Written once next to the chunk files and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterDescriptor {
    pub chunk_width: u32,
    pub chunk_height: u32,
    pub nb_chunks_x: u32,
    pub nb_chunks_y: u32,
    pub map_width: u32,
    pub map_height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub tile_sets: Vec<TileSet>,
}

impl MasterDescriptor {
    pub fn chunk_count(&self) -> u32 {
        self.nb_chunks_x * self.nb_chunks_y
    }

    /// Grid geometry for streaming this chunk set under `projection`.
    pub fn geometry(&self, projection: Projection) -> GridGeometry {
        GridGeometry {
            projection,
            tile_width: self.tile_width,
            tile_height: self.tile_height,
            chunk_width: self.chunk_width,
            chunk_height: self.chunk_height,
            nb_chunks_x: self.nb_chunks_x,
            nb_chunks_y: self.nb_chunks_y,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_width == 0 || self.chunk_height == 0 {
            return Err(format!(
                "chunk size is {}x{} tiles",
                self.chunk_width, self.chunk_height
            ));
        }
        if self.tile_width == 0 || self.tile_height == 0 {
            return Err(format!(
                "tile size is {}x{} pixels",
                self.tile_width, self.tile_height
            ));
        }
        let dims = chunk_grid_dims(
            self.map_width,
            self.map_height,
            self.chunk_width,
            self.chunk_height,
        );
        if dims != (self.nb_chunks_x, self.nb_chunks_y) {
            return Err(format!(
                "chunk grid is {}x{}, map geometry implies {}x{}",
                self.nb_chunks_x, self.nb_chunks_y, dims.0, dims.1
            ));
        }
        Ok(())
    }
}

/// One chunk file: the source map restricted to the chunk's window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    /// Clipped width/height, windowed layer data, rebased tilesets.
    #[serde(flatten)]
    pub map: TileMap,
}

impl Chunk {
    /// Grid column and row of this chunk.
    pub fn grid_position(&self, nb_chunks_x: u32) -> CellCoord {
        CellCoord::new((self.id.0 % nb_chunks_x) as i32, (self.id.0 / nb_chunks_x) as i32)
    }

    pub fn width(&self) -> u32 {
        self.map.width
    }

    pub fn height(&self) -> u32 {
        self.map.height
    }
}
