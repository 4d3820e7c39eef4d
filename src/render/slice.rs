//! Template slicing.
//!
//! Upsamples a source image by `draw_mult` and cuts it along world tile
//! boundaries. Only the centre cell of each `draw_mult × draw_mult` block
//! carries the source colour; the rest of the block stays transparent so the
//! live canvas shows through around every template pixel.

use std::collections::BTreeMap;

use image::{Rgba, RgbaImage};

use crate::error::{MarbleError, Result};
use crate::types::{Anchor, ChunkKey, Grid, Rgb, TileCoord, ALPHA_THRESHOLD};

/// Output of slicing one template image.
#[derive(Debug, Clone)]
pub struct SlicedTemplate {
    /// Upscaled chunks keyed by tile and in-tile pixel offset.
    pub chunks: BTreeMap<ChunkKey, RgbaImage>,
    /// Centre cells with alpha ≥ 64 that are not the transparent marker.
    pub required_pixel_count: u64,
}

/// Slice `source` into grid-aligned chunks starting at `anchor`.
pub fn slice_template(source: &RgbaImage, anchor: Anchor, grid: Grid) -> Result<SlicedTemplate> {
    let (width, height) = (source.width() as u64, source.height() as u64);
    if width == 0 || height == 0 {
        return Err(MarbleError::Validation {
            message: format!("Template image has zero dimensions ({}x{})", width, height),
            help: Some("Template images must have non-zero width and height".to_string()),
        });
    }

    let tile_size = grid.tile_size as u64;
    let k = grid.draw_mult;
    let (origin_x, origin_y) = anchor.absolute(&grid);

    let mut chunks = BTreeMap::new();
    let mut required = 0u64;

    let mut py = origin_y;
    while py < origin_y + height {
        let draw_h = (tile_size - py % tile_size).min(origin_y + height - py);

        let mut px = origin_x;
        while px < origin_x + width {
            let draw_w = (tile_size - px % tile_size).min(origin_x + width - px);

            let chunk = upsample_region(
                source,
                (px - origin_x) as u32,
                (py - origin_y) as u32,
                draw_w as u32,
                draw_h as u32,
                k,
            );
            required += count_required(&chunk, &grid);

            let tile = TileCoord::new(to_u32(px / tile_size)?, to_u32(py / tile_size)?);
            let key = ChunkKey::new(tile, (px % tile_size) as u32, (py % tile_size) as u32);
            chunks.insert(key, chunk);

            px += draw_w;
        }

        py += draw_h;
    }

    Ok(SlicedTemplate {
        chunks,
        required_pixel_count: required,
    })
}

/// Copy a `w × h` source region into a `w·k × h·k` chunk, centre cells only.
fn upsample_region(source: &RgbaImage, sx: u32, sy: u32, w: u32, h: u32, k: u32) -> RgbaImage {
    let mut chunk = RgbaImage::new(w * k, h * k);
    for y in 0..h {
        for x in 0..w {
            let pixel = source.get_pixel(sx + x, sy + y);
            // Fully transparent pixels are normalised so chunks compare byte-for-byte
            let pixel = if pixel[3] == 0 { Rgba([0, 0, 0, 0]) } else { *pixel };
            chunk.put_pixel(x * k + Grid::CENTRE, y * k + Grid::CENTRE, pixel);
        }
    }
    chunk
}

/// Count centre cells that must be painted.
pub fn count_required(chunk: &RgbaImage, grid: &Grid) -> u64 {
    centre_cells(chunk, grid)
        .filter(|(_, _, rgba)| rgba[3] >= ALPHA_THRESHOLD && !Rgb::from_rgba(*rgba).is_sentinel())
        .count() as u64
}

/// Iterate the colour-carrying cells of a chunk as `(x, y, rgba)`.
pub fn centre_cells<'a>(
    chunk: &'a RgbaImage,
    grid: &Grid,
) -> impl Iterator<Item = (u32, u32, [u8; 4])> + 'a {
    let k = grid.draw_mult;
    let (w, h) = (chunk.width(), chunk.height());
    (Grid::CENTRE..h).step_by(k as usize).flat_map(move |y| {
        (Grid::CENTRE..w)
            .step_by(k as usize)
            .map(move |x| (x, y, chunk.get_pixel(x, y).0))
    })
}

fn to_u32(value: u64) -> Result<u32> {
    u32::try_from(value).map_err(|_| MarbleError::validation(format!("Tile coordinate {} is out of range", value)))
}
