use std::fmt;
use std::str::FromStr;

use glam::IVec2;
use serde::{Deserialize, Serialize};

/// A cell on an integer grid: a tile on the tile grid, or a chunk on the chunk grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellCoord {
    pub x: i32,
    pub y: i32,
}

impl CellCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<IVec2> for CellCoord {
    fn from(v: IVec2) -> Self {
        Self::new(v.x, v.y)
    }
}

impl From<CellCoord> for IVec2 {
    fn from(c: CellCoord) -> Self {
        IVec2::new(c.x, c.y)
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Row-major chunk identifier: `row * nb_chunks_x + column`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkId(pub u32);

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chunk{}", self.0)
    }
}

/// How tile coordinates map to world (pixel) space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    /// Plain rectangular grid.
    #[default]
    Orthogonal,
    /// Staggered isometric diamond layout.
    Staggered,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown projection {0:?} (expected \"orthogonal\" or \"staggered\")")]
pub struct ParseProjectionError(pub String);

impl FromStr for Projection {
    type Err = ParseProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "orthogonal" => Ok(Self::Orthogonal),
            "staggered" | "isometric" => Ok(Self::Staggered),
            _ => Err(ParseProjectionError(s.to_string())),
        }
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Orthogonal => f.write_str("orthogonal"),
            Self::Staggered => f.write_str("staggered"),
        }
    }
}

/// Rectangular clipping region, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub start_x: i32,
    pub start_y: i32,
    pub end_x: i32,
    pub end_y: i32,
}

impl Bounds {
    pub const fn new(start_x: i32, start_y: i32, end_x: i32, end_y: i32) -> Self {
        Self {
            start_x,
            start_y,
            end_x,
            end_y,
        }
    }

    pub fn contains(&self, c: CellCoord) -> bool {
        c.x >= self.start_x && c.x <= self.end_x && c.y >= self.start_y && c.y <= self.end_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_parses_case_insensitively() {
        assert_eq!("Staggered".parse::<Projection>(), Ok(Projection::Staggered));
        assert_eq!("isometric".parse::<Projection>(), Ok(Projection::Staggered));
        assert_eq!("orthogonal".parse::<Projection>(), Ok(Projection::Orthogonal));
        assert!("hex".parse::<Projection>().is_err());
    }

    #[test]
    fn projection_default_is_orthogonal() {
        assert_eq!(Projection::default(), Projection::Orthogonal);
        assert_eq!(Projection::Staggered.to_string(), "staggered");
    }

    #[test]
    fn chunk_id_display_matches_file_stem() {
        assert_eq!(ChunkId(12).to_string(), "chunk12");
    }

    #[test]
    fn bounds_are_inclusive() {
        let b = Bounds::new(0, 0, 3, 3);
        assert!(b.contains(CellCoord::new(0, 0)));
        assert!(b.contains(CellCoord::new(3, 3)));
        assert!(!b.contains(CellCoord::new(-1, 0)));
        assert!(!b.contains(CellCoord::new(0, 4)));
    }

    #[test]
    fn cell_coord_ivec2_conversion() {
        let c = CellCoord::from(IVec2::new(4, -2));
        assert_eq!(c, CellCoord::new(4, -2));
        assert_eq!(IVec2::from(c), IVec2::new(4, -2));
    }
}
