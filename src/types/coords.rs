//! World grid coordinates: tiles, anchors and chunk keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MarbleError, Result};

/// Geometry of the world raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    /// Logical pixels per tile side.
    pub tile_size: u32,
    /// Upscale factor; each logical pixel becomes a `draw_mult × draw_mult` block.
    pub draw_mult: u32,
}

impl Grid {
    pub const DEFAULT_TILE_SIZE: u32 = 1000;
    pub const DEFAULT_DRAW_MULT: u32 = 3;

    /// Local offset of the colour-carrying cell inside each block.
    pub const CENTRE: u32 = 1;

    /// Create a validated grid.
    pub fn new(tile_size: u32, draw_mult: u32) -> Result<Self> {
        if tile_size == 0 {
            return Err(MarbleError::Validation {
                message: "tile_size must be at least 1".to_string(),
                help: Some("The default world tile size is 1000".to_string()),
            });
        }
        if draw_mult < 2 {
            return Err(MarbleError::Validation {
                message: format!("draw_mult must be at least 2, got {}", draw_mult),
                help: Some("Each pixel needs a centre cell plus a border; the default is 3".to_string()),
            });
        }
        Ok(Self {
            tile_size,
            draw_mult,
        })
    }

    /// Side length of a tile once upscaled.
    pub fn draw_size(&self) -> u32 {
        self.tile_size * self.draw_mult
    }

    /// Whether a local cell coordinate is a colour-carrying centre cell.
    pub fn is_centre(&self, x: u32, y: u32) -> bool {
        x % self.draw_mult == Self::CENTRE && y % self.draw_mult == Self::CENTRE
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            tile_size: Self::DEFAULT_TILE_SIZE,
            draw_mult: Self::DEFAULT_DRAW_MULT,
        }
    }
}

/// A world tile coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// The zero-padded prefix every chunk key on this tile starts with.
    pub fn key_prefix(&self) -> String {
        format!("{:04},{:04}", self.x, self.y)
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Where a template's top-left pixel sits in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Anchor {
    pub tile_x: u32,
    pub tile_y: u32,
    pub pixel_x: u32,
    pub pixel_y: u32,
}

impl Anchor {
    pub const fn new(tile_x: u32, tile_y: u32, pixel_x: u32, pixel_y: u32) -> Self {
        Self {
            tile_x,
            tile_y,
            pixel_x,
            pixel_y,
        }
    }

    /// Build an anchor from four user-supplied numbers.
    ///
    /// Every value must be finite, non-negative and whole.
    pub fn from_values(values: [f64; 4]) -> Result<Self> {
        const LABELS: [&str; 4] = ["tile X", "tile Y", "pixel X", "pixel Y"];

        let mut out = [0u32; 4];
        for (i, value) in values.iter().enumerate() {
            if !value.is_finite() {
                return Err(MarbleError::Validation {
                    message: format!("{} coordinate is not a finite number", LABELS[i]),
                    help: Some("Coordinates are four numbers: TX,TY,PX,PY".to_string()),
                });
            }
            if *value < 0.0 || value.fract() != 0.0 || *value > u32::MAX as f64 {
                return Err(MarbleError::Validation {
                    message: format!("{} coordinate {} is not a non-negative whole number", LABELS[i], value),
                    help: Some("Coordinates are four numbers: TX,TY,PX,PY".to_string()),
                });
            }
            out[i] = *value as u32;
        }

        Ok(Self::new(out[0], out[1], out[2], out[3]))
    }

    /// Absolute logical pixel position of the anchor.
    pub fn absolute(&self, grid: &Grid) -> (u64, u64) {
        let ts = grid.tile_size as u64;
        (
            self.tile_x as u64 * ts + self.pixel_x as u64,
            self.tile_y as u64 * ts + self.pixel_y as u64,
        )
    }

    /// The `"tx,ty,px,py"` form stored in the template container.
    pub fn to_coords_string(&self) -> String {
        format!("{},{},{},{}", self.tile_x, self.tile_y, self.pixel_x, self.pixel_y)
    }
}

impl FromStr for Anchor {
    type Err = MarbleError;

    fn from_str(s: &str) -> Result<Self> {
        let values: Vec<f64> = s
            .split(',')
            .map(|p| {
                p.trim().parse::<f64>().map_err(|_| MarbleError::Parse {
                    message: format!("Invalid coordinate '{}' in '{}'", p.trim(), s),
                    help: Some("Coordinates are four numbers: TX,TY,PX,PY".to_string()),
                })
            })
            .collect::<Result<_>>()?;

        let values: [f64; 4] = values.try_into().map_err(|v: Vec<f64>| MarbleError::Parse {
            message: format!("Expected 4 coordinates, got {}", v.len()),
            help: Some("Coordinates are four numbers: TX,TY,PX,PY".to_string()),
        })?;

        Self::from_values(values)
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tile {},{} px {},{}",
            self.tile_x, self.tile_y, self.pixel_x, self.pixel_y
        )
    }
}

/// Identifies one chunk of a template: the tile it lands on and the
/// logical pixel offset of its top-left corner within that tile.
///
/// Rendered as `"0012,0034,500,500"`; lookups by tile match the
/// `"0012,0034"` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkKey {
    pub tile: TileCoord,
    pub pixel_x: u32,
    pub pixel_y: u32,
}

impl ChunkKey {
    pub const fn new(tile: TileCoord, pixel_x: u32, pixel_y: u32) -> Self {
        Self {
            tile,
            pixel_x,
            pixel_y,
        }
    }

    /// Whether this chunk lies on the given tile.
    pub fn has_prefix(&self, tile: &TileCoord) -> bool {
        self.to_string()
            .strip_prefix(&tile.key_prefix())
            .is_some_and(|rest| rest.starts_with(','))
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{:03},{:03}",
            self.tile.key_prefix(),
            self.pixel_x,
            self.pixel_y
        )
    }
}

impl FromStr for ChunkKey {
    type Err = MarbleError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 4 {
            return Err(MarbleError::parse(format!(
                "Invalid chunk key '{}': expected TX,TY,PX,PY",
                s
            )));
        }

        let mut values = [0u32; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part.trim().parse().map_err(|_| {
                MarbleError::parse(format!("Invalid number '{}' in chunk key '{}'", part, s))
            })?;
        }

        Ok(Self::new(
            TileCoord::new(values[0], values[1]),
            values[2],
            values[3],
        ))
    }
}
