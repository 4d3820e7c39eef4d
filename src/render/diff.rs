//! Compositing templates onto live tiles and counting painted pixels.
//!
//! The live tile is upscaled to `tile_size · draw_mult` and kept untouched as
//! the comparison source; a second copy receives the template chunks. Every
//! centre cell of an intersecting chunk is classified as painted, wrong or
//! missing against the live pixel underneath it.

use std::collections::HashSet;

use image::{Rgba, RgbaImage};

use crate::progress::TileStats;
use crate::types::{Grid, Rgb, Template, TileCoord, ALPHA_THRESHOLD};

use super::png::scale_nearest;
use super::slice::centre_cells;

/// Result of drawing templates onto one live tile.
#[derive(Debug, Clone)]
pub struct TileComposite {
    /// The upscaled tile with template chunks drawn over it.
    pub image: RgbaImage,
    /// Counts for this tile only.
    pub stats: TileStats,
    /// Storage keys of the templates that touched the tile, in draw order.
    pub drawn: Vec<String>,
}

/// Draw every template touching `tile` over `live` and count pixels.
///
/// `templates` must already be filtered to active templates; they are drawn
/// in ascending sortID order so higher sortIDs end up on top. Returns `None`
/// when no template has a chunk on this tile.
pub fn compose_tile(
    live: &RgbaImage,
    tile: TileCoord,
    templates: &[&Template],
    grid: &Grid,
) -> Option<TileComposite> {
    let mut ordered: Vec<&Template> = templates.iter().copied().filter(|t| t.touches(&tile)).collect();
    if ordered.is_empty() {
        return None;
    }
    ordered.sort_by_key(|t| t.sort_id());

    let draw_size = grid.draw_size();
    let reference = scale_nearest(live, draw_size, draw_size);
    let mut canvas = reference.clone();
    let known_colours = known_colours(templates);

    let mut stats = TileStats::default();
    let mut drawn = Vec::with_capacity(ordered.len());

    for template in ordered {
        let Some((key, chunk)) = template.chunk_for_tile(&tile) else {
            continue;
        };
        let filtered = filter_chunk(chunk, template, grid);
        let off_x = key.pixel_x * grid.draw_mult;
        let off_y = key.pixel_y * grid.draw_mult;

        count_chunk(chunk, template, (off_x, off_y), &reference, &known_colours, grid, &mut stats);
        draw_chunk(&mut canvas, &filtered, (off_x, off_y));
        drawn.push(template.storage_key.to_string());
    }

    Some(TileComposite {
        image: canvas,
        stats,
        drawn,
    })
}

/// Colours any active template uses; live paint in these colours at a spot
/// no template asks for counts as wrong.
fn known_colours(templates: &[&Template]) -> HashSet<Rgb> {
    templates
        .iter()
        .flat_map(|t| t.palette.iter().map(|(rgb, _)| rgb))
        .collect()
}

/// Clear the centre cells a template does not want drawn: colours switched
/// off in its palette and transparent markers.
fn filter_chunk(chunk: &RgbaImage, template: &Template, grid: &Grid) -> RgbaImage {
    let mut filtered = chunk.clone();
    let hidden: Vec<(u32, u32)> = centre_cells(chunk, grid)
        .filter(|(_, _, rgba)| {
            let rgb = Rgb::from_rgba(*rgba);
            rgba[3] > 0 && (rgb.is_sentinel() || !template.colour_visible(rgb))
        })
        .map(|(x, y, _)| (x, y))
        .collect();

    for (x, y) in hidden {
        filtered.get_pixel_mut(x, y)[3] = 0;
    }
    filtered
}

/// Classify every centre cell of `chunk` against the live reference.
///
/// Cells in a colour the template hides take no part in the counts.
fn count_chunk(
    chunk: &RgbaImage,
    template: &Template,
    (off_x, off_y): (u32, u32),
    reference: &RgbaImage,
    known_colours: &HashSet<Rgb>,
    grid: &Grid,
    stats: &mut TileStats,
) {
    for (x, y, template_px) in centre_cells(chunk, grid) {
        let (gx, gy) = (x + off_x, y + off_y);
        if gx >= reference.width() || gy >= reference.height() {
            continue;
        }
        let live_px = reference.get_pixel(gx, gy).0;
        let live_rgb = Rgb::from_rgba(live_px);
        let template_rgb = Rgb::from_rgba(template_px);

        if template_px[3] > 0 && !template_rgb.is_sentinel() && !template.colour_visible(template_rgb) {
            continue;
        }

        if template_px[3] < ALPHA_THRESHOLD || template_rgb.is_sentinel() {
            if live_px[3] >= ALPHA_THRESHOLD && known_colours.contains(&live_rgb) {
                stats.wrong += 1;
            }
            continue;
        }

        stats.required += 1;
        // Unpainted cells are missing, which the summary derives from required
        if live_px[3] >= ALPHA_THRESHOLD {
            if live_rgb == template_rgb {
                stats.painted += 1;
            } else {
                stats.wrong += 1;
            }
        }
    }
}

/// Nearest-neighbour copy of every non-transparent chunk pixel; no blending.
fn draw_chunk(canvas: &mut RgbaImage, chunk: &RgbaImage, (off_x, off_y): (u32, u32)) {
    for (x, y, pixel) in chunk.enumerate_pixels() {
        if pixel[3] == 0 {
            continue;
        }
        let (gx, gy) = (x + off_x, y + off_y);
        if gx < canvas.width() && gy < canvas.height() {
            canvas.put_pixel(gx, gy, Rgba(pixel.0));
        }
    }
}
