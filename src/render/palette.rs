//! Colour extraction from sliced chunks.

use std::collections::BTreeMap;

use image::RgbaImage;

use crate::types::{ChunkKey, ColourPalette, Grid, PersistedColour, Rgb, ALPHA_THRESHOLD};

use super::slice::centre_cells;

/// Count the colours of every required centre cell.
///
/// Cells below the alpha threshold and the transparent marker are skipped.
pub fn count_colours<'a>(
    chunks: impl IntoIterator<Item = &'a RgbaImage>,
    grid: &Grid,
) -> BTreeMap<Rgb, u64> {
    let mut counts = BTreeMap::new();
    for chunk in chunks {
        for (_, _, rgba) in centre_cells(chunk, grid) {
            if rgba[3] < ALPHA_THRESHOLD {
                continue;
            }
            let rgb = Rgb::from_rgba(rgba);
            if rgb.is_sentinel() {
                continue;
            }
            *counts.entry(rgb).or_insert(0) += 1;
        }
    }
    counts
}

/// Build the palette for a freshly sliced template.
pub fn extract_palette(chunks: &BTreeMap<ChunkKey, RgbaImage>, grid: &Grid) -> ColourPalette {
    ColourPalette::from_counts(count_colours(chunks.values(), grid))
}

/// Rebuild the palette of a reloaded template, keeping stored visibility.
pub fn restore_palette(
    chunks: &BTreeMap<ChunkKey, RgbaImage>,
    persisted: &BTreeMap<String, PersistedColour>,
    grid: &Grid,
) -> ColourPalette {
    ColourPalette::merge_persisted(count_colours(chunks.values(), grid), persisted)
}
