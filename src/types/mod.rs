//! Core domain types for marble.
//!
//! This module contains the fundamental types used throughout the engine:
//! - `Rgb` - palette colours and the transparent marker
//! - `Grid`, `TileCoord`, `Anchor`, `ChunkKey` - world geometry
//! - `ColourPalette` - per-template colour counts with visibility
//! - `Template` - a sliced template and its metadata

mod colour;
mod coords;
mod palette;
mod template;

pub use colour::{Rgb, ALPHA_THRESHOLD};
pub use coords::{Anchor, ChunkKey, Grid, TileCoord};
pub use palette::{ColourPalette, PaletteEntry, PersistedColour};
pub use template::Template;
