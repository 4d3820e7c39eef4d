//! Pixel pipeline for marble.
//!
//! This module handles slicing template images into upscaled chunks,
//! extracting their palettes, and compositing them onto live tiles.

mod diff;
mod palette;
mod png;
mod slice;

pub use diff::{compose_tile, TileComposite};
pub use palette::{count_colours, extract_palette, restore_palette};
pub use png::{decode_rgba, encode_png, scale_nearest};
pub use slice::{centre_cells, count_required, slice_template, SlicedTemplate};
