//! Padded rectangular neighborhoods on an integer grid.
//!
//! Works the same on the tile grid (which tiles surround an object) and on
//! the chunk grid (which chunks surround the viewpoint's chunk).

use glam::IVec2;

use crate::types::{Bounds, CellCoord};

/// Cells occupied by an object of `size` anchored at its top-left cell, row-major.
///
/// A non-positive size on either axis yields no cells.
pub fn footprint_tiles(anchor: CellCoord, size: IVec2) -> Vec<CellCoord> {
    if size.x <= 0 || size.y <= 0 {
        return Vec::new();
    }
    let mut tiles = Vec::with_capacity((size.x * size.y) as usize);
    for y in anchor.y..anchor.y + size.y {
        for x in anchor.x..anchor.x + size.x {
            tiles.push(CellCoord::new(x, y));
        }
    }
    tiles
}

/// Cells within `padding` of the footprint at `anchor`, clipped to `bounds`, row-major.
///
/// Returns nothing for an anchor that is negative or outside `bounds`. Unless `include_footprint` is set,
/// the footprint itself is left out, and a degenerate footprint disqualifies
/// the whole query.
pub fn neighborhood(
    anchor: CellCoord,
    size: IVec2,
    padding: IVec2,
    bounds: Bounds,
    include_footprint: bool,
) -> Vec<CellCoord> {
    if anchor.x < 0 || anchor.y < 0 || !bounds.contains(anchor) {
        return Vec::new();
    }
    if !include_footprint && footprint_tiles(anchor, size).is_empty() {
        return Vec::new();
    }

    let in_footprint = |c: CellCoord| {
        c.x >= anchor.x && c.x < anchor.x + size.x && c.y >= anchor.y && c.y < anchor.y + size.y
    };

    let mut cells = Vec::new();
    for y in anchor.y - padding.y..anchor.y + size.y + padding.y {
        for x in anchor.x - padding.x..anchor.x + size.x + padding.x {
            let c = CellCoord::new(x, y);
            if !bounds.contains(c) {
                continue;
            }
            if !include_footprint && in_footprint(c) {
                continue;
            }
            cells.push(c);
        }
    }
    cells
}
