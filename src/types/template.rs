//! A sliced template and its metadata.

use std::collections::BTreeMap;

use image::RgbaImage;

use crate::registry::StorageKey;

use super::{Anchor, ChunkKey, ColourPalette, Rgb, TileCoord};

/// A template image placed on the world grid.
///
/// Chunks and colour counts are fixed once sliced; only the `enabled`
/// and `selected` flags and per-colour visibility change afterwards.
#[derive(Debug, Clone)]
pub struct Template {
    /// Unique `"{sortID} {authorID}"` identifier.
    pub storage_key: StorageKey,

    /// Name shown to the user.
    pub display_name: String,

    /// World position of the top-left pixel.
    pub anchor: Anchor,

    /// Upscaled chunk bitmaps, one per intersected tile.
    pub chunks: BTreeMap<ChunkKey, RgbaImage>,

    /// Colours used by the template.
    pub palette: ColourPalette,

    /// Centre cells that must be painted (alpha ≥ 64, not the marker colour).
    pub required_pixel_count: u64,

    /// Disabled templates are neither drawn nor counted.
    pub enabled: bool,

    /// At most one template in a registry is selected.
    pub selected: bool,
}

impl Template {
    /// Monotonic sort identifier.
    pub fn sort_id(&self) -> u64 {
        self.storage_key.sort_id
    }

    /// Encoded owner identifier.
    pub fn author_id(&self) -> &str {
        &self.storage_key.author_id
    }

    /// The chunk landing on `tile`, if any.
    pub fn chunk_for_tile(&self, tile: &TileCoord) -> Option<(&ChunkKey, &RgbaImage)> {
        self.chunks.iter().find(|(key, _)| key.has_prefix(tile))
    }

    /// Whether any chunk lands on `tile`.
    pub fn touches(&self, tile: &TileCoord) -> bool {
        self.chunk_for_tile(tile).is_some()
    }

    /// Tiles covered by this template, in key order.
    pub fn tiles(&self) -> Vec<TileCoord> {
        let mut tiles: Vec<TileCoord> = self.chunks.keys().map(|k| k.tile).collect();
        tiles.dedup();
        tiles
    }

    /// Whether pixels of this colour are drawn and counted.
    pub fn colour_visible(&self, rgb: Rgb) -> bool {
        self.palette.is_enabled(rgb)
    }

    /// Required pixels left once hidden colours are taken out.
    pub fn visible_required_count(&self) -> u64 {
        let hidden: u64 = self
            .palette
            .iter()
            .filter(|(_, entry)| !entry.enabled)
            .map(|(_, entry)| entry.count)
            .sum();
        self.required_pixel_count.saturating_sub(hidden)
    }
}
