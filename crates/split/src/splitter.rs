use tilechunk_common::{ChunkId, chunk_grid_dims};
use tilechunk_map::{Chunk, Layer, MasterDescriptor, TileMap};

use crate::SplitError;

/// Partition `map` into chunks of `chunk_width` x `chunk_height` tiles.
///
/// Chunks are returned in id order. Chunks in the last column/row are
/// clipped to the remainder of the map. Identical input always produces
/// identical chunks.
pub fn split(
    map: &TileMap,
    chunk_width: u32,
    chunk_height: u32,
) -> Result<(MasterDescriptor, Vec<Chunk>), SplitError> {
    if chunk_width == 0 || chunk_height == 0 {
        return Err(SplitError::InvalidConfig(format!(
            "chunk size must be positive, got {chunk_width}x{chunk_height}"
        )));
    }
    map.validate().map_err(SplitError::InvalidMap)?;

    let (nb_chunks_x, nb_chunks_y) =
        chunk_grid_dims(map.width, map.height, chunk_width, chunk_height);
    let nb_chunks = nb_chunks_x * nb_chunks_y;

    let master = MasterDescriptor {
        chunk_width,
        chunk_height,
        nb_chunks_x,
        nb_chunks_y,
        map_width: map.width,
        map_height: map.height,
        tile_width: map.tile_width,
        tile_height: map.tile_height,
        tile_sets: map.tilesets.clone(),
    };

    let tilesets: Vec<_> = map.tilesets.iter().map(|ts| ts.rebased()).collect();

    let mut chunks = Vec::with_capacity(nb_chunks as usize);
    for i in 0..nb_chunks {
        // Top-left tile of the chunk in the source map.
        let origin_x = (i % nb_chunks_x) * chunk_width;
        let origin_y = (i / nb_chunks_x) * chunk_height;
        let width = chunk_width.min(map.width - origin_x);
        let height = chunk_height.min(map.height - origin_y);

        let layers = map
            .layers
            .iter()
            .map(|layer| window_layer(layer, map.width, origin_x, origin_y, width, height))
            .collect();

        chunks.push(Chunk {
            id: ChunkId(i),
            map: TileMap {
                width,
                height,
                tile_width: map.tile_width,
                tile_height: map.tile_height,
                layers,
                tilesets: tilesets.clone(),
                extra: map.extra.clone(),
            },
        });

        tracing::debug!(
            "chunk {i} of {nb_chunks} created ({:.0}%)",
            (i + 1) as f64 / nb_chunks as f64 * 100.0
        );
    }

    Ok((master, chunks))
}

/// Copy of `layer` restricted to the window at (`x`, `y`) of `width` x `height` tiles.
///
/// Only tile layers have their data cut; other layers just take the new size.
fn window_layer(layer: &Layer, stride: u32, x: u32, y: u32, width: u32, height: u32) -> Layer {
    let data = match &layer.data {
        Some(data) if layer.is_tile_layer() => {
            let (stride, x, width) = (stride as usize, x as usize, width as usize);
            let mut window = Vec::with_capacity(width * height as usize);
            for row in y as usize..(y + height) as usize {
                let begin = row * stride + x;
                window.extend_from_slice(&data[begin..begin + width]);
            }
            Some(window)
        }
        other => other.clone(),
    };
    Layer {
        kind: layer.kind.clone(),
        width,
        height,
        data,
        extra: layer.extra.clone(),
    }
}

/// Rebuild the full-map data of tile layer `layer_index` from its chunks.
///
/// Inverse of the windowing done by [`split`]. Returns `None` if a chunk is
/// missing, does not carry the layer, or its data does not fill the chunk.
pub fn reassemble_layer(
    master: &MasterDescriptor,
    chunks: &[Chunk],
    layer_index: usize,
) -> Option<Vec<u32>> {
    if chunks.len() != master.chunk_count() as usize {
        return None;
    }
    let stride = master.map_width as usize;
    let mut data = vec![0; stride * master.map_height as usize];

    for chunk in chunks {
        let pos = chunk.grid_position(master.nb_chunks_x);
        let origin_x = pos.x as usize * master.chunk_width as usize;
        let origin_y = pos.y as usize * master.chunk_height as usize;
        let width = chunk.width() as usize;
        let layer = chunk.map.layers.get(layer_index)?;
        let tiles = layer.data.as_ref()?;
        if width == 0
            || origin_x + width > stride
            || tiles.len() != width * chunk.height() as usize
        {
            return None;
        }

        for (row, line) in tiles.chunks(width).enumerate() {
            let begin = (origin_y + row) * stride + origin_x;
            data.get_mut(begin..begin + width)?.copy_from_slice(line);
        }
    }
    Some(data)
}
