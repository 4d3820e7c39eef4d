//! Shared overlay state for concurrent tile fetches.
//!
//! An [`OverlaySession`] pairs the registry with the progress table. Tile
//! overlays only read the registry, so many can run at once; progress writes
//! are serialised behind a mutex.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use image::RgbaImage;

use crate::error::{MarbleError, Result};
use crate::progress::{ProgressSummary, ProgressTable};
use crate::registry::TemplateRegistry;
use crate::render::{compose_tile, decode_rgba, encode_png, TileComposite};
use crate::types::TileCoord;

/// Registry plus per-tile progress, safe to share across threads.
#[derive(Debug)]
pub struct OverlaySession {
    registry: RwLock<TemplateRegistry>,
    progress: Mutex<ProgressTable>,
    draw_enabled: AtomicBool,
    /// Keys of every template drawn on some tile so far.
    shown: Mutex<HashSet<String>>,
}

impl OverlaySession {
    pub fn new(registry: TemplateRegistry) -> Self {
        Self {
            registry: RwLock::new(registry),
            progress: Mutex::new(ProgressTable::new()),
            draw_enabled: AtomicBool::new(true),
            shown: Mutex::new(HashSet::new()),
        }
    }

    /// Whether tiles get templates drawn on them at all.
    pub fn draw_enabled(&self) -> bool {
        self.draw_enabled.load(Ordering::Relaxed)
    }

    pub fn set_draw_enabled(&self, enabled: bool) {
        self.draw_enabled.store(enabled, Ordering::Relaxed);
    }

    /// Overlay templates on an encoded live tile.
    ///
    /// Returns PNG bytes at `tile_size · draw_mult` resolution, or the input
    /// unchanged when drawing is off, no template touches the tile, or
    /// anything fails along the way.
    pub fn overlay_tile(&self, bytes: &[u8], tile: TileCoord) -> Vec<u8> {
        match self.try_overlay_tile(bytes, tile) {
            Ok(Some(png)) => png,
            Ok(None) => bytes.to_vec(),
            Err(e) => {
                tracing::warn!(tile = %tile, error = %e, "overlay failed, returning tile unchanged");
                bytes.to_vec()
            }
        }
    }

    /// Like [`overlay_tile`](Self::overlay_tile) but reports failures.
    ///
    /// `Ok(None)` when drawing is off or no active template touches the tile.
    pub fn try_overlay_tile(&self, bytes: &[u8], tile: TileCoord) -> Result<Option<Vec<u8>>> {
        if !self.draw_enabled() {
            return Ok(None);
        }
        let live = decode_rgba(bytes)?;
        self.overlay_image(&live, tile)?
            .map(|composite| encode_png(&composite.image))
            .transpose()
    }

    /// Overlay templates on a decoded live tile and record its counts.
    ///
    /// `None` when no active template touches the tile; the progress table is
    /// left alone in that case.
    pub fn overlay_image(&self, live: &RgbaImage, tile: TileCoord) -> Result<Option<TileComposite>> {
        let registry = self.registry()?;
        let active = registry.active_sorted();
        let Some(composite) = compose_tile(live, tile, &active, registry.grid()) else {
            return Ok(None);
        };

        self.progress()?.record(tile, composite.stats);
        self.shown()?.extend(composite.drawn.iter().cloned());
        tracing::debug!(
            tile = %tile,
            painted = composite.stats.painted,
            required = composite.stats.required,
            wrong = composite.stats.wrong,
            "tile overlaid"
        );
        Ok(Some(composite))
    }

    /// Aggregate progress over every tile seen so far.
    ///
    /// "Showing" counts the active templates drawn on at least one tile, so
    /// the result does not depend on which tile finished last.
    pub fn summary(&self) -> Result<ProgressSummary> {
        let registry = self.registry()?;
        let active = registry.active_sorted();
        let progress = self.progress()?;
        let shown = {
            let drawn = self.shown()?;
            active
                .iter()
                .filter(|t| drawn.contains(&t.storage_key.to_string()))
                .count()
        };
        Ok(progress.summarize(&active, shown, registry.len()))
    }

    /// Forget all recorded tile counts.
    pub fn reset_progress(&self) -> Result<()> {
        self.progress()?.clear();
        self.shown()?.clear();
        Ok(())
    }

    /// Shared access to the registry.
    pub fn registry(&self) -> Result<RwLockReadGuard<'_, TemplateRegistry>> {
        self.registry.read().map_err(|_| poisoned("registry"))
    }

    /// Exclusive access to the registry, for mutations.
    pub fn registry_mut(&self) -> Result<RwLockWriteGuard<'_, TemplateRegistry>> {
        self.registry.write().map_err(|_| poisoned("registry"))
    }

    /// Give back the registry.
    pub fn into_registry(self) -> Result<TemplateRegistry> {
        self.registry.into_inner().map_err(|_| poisoned("registry"))
    }

    fn progress(&self) -> Result<std::sync::MutexGuard<'_, ProgressTable>> {
        self.progress.lock().map_err(|_| poisoned("progress"))
    }

    fn shown(&self) -> Result<std::sync::MutexGuard<'_, HashSet<String>>> {
        self.shown.lock().map_err(|_| poisoned("shown templates"))
    }
}

fn poisoned(what: &str) -> MarbleError {
    MarbleError::Store {
        message: format!("{} lock poisoned by a panicked thread", what),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryOptions;
    use crate::types::{Grid, Rgb};
    use image::Rgba;
    use pretty_assertions::assert_eq;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];
    const GREEN: [u8; 4] = [0, 255, 0, 255];

    fn flag() -> RgbaImage {
        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(0, 0, Rgba(RED));
        img.put_pixel(1, 0, Rgba(RED));
        img.put_pixel(0, 1, Rgba(BLUE));
        img
    }

    fn session(grid: Grid, anchor: [f64; 4]) -> OverlaySession {
        let mut registry = TemplateRegistry::in_memory(RegistryOptions {
            grid,
            ..RegistryOptions::default()
        });
        let png = encode_png(&flag()).unwrap();
        registry.create(&png, "Flag", anchor).unwrap();
        OverlaySession::new(registry)
    }

    fn live(size: u32, painted: &[(u32, u32, [u8; 4])]) -> RgbaImage {
        let mut tile = RgbaImage::new(size, size);
        for (x, y, p) in painted {
            tile.put_pixel(*x, *y, Rgba(*p));
        }
        tile
    }

    #[test]
    fn test_flag_scenario() {
        let session = session(Grid::default(), [12.0, 34.0, 500.0, 500.0]);
        let tile = live(1000, &[(500, 500, RED), (501, 500, RED), (500, 501, GREEN)]);

        let composite = session.overlay_image(&tile, TileCoord::new(12, 34)).unwrap().unwrap();
        assert_eq!(composite.image.dimensions(), (3000, 3000));
        assert_eq!(composite.image.get_pixel(1504, 1501).0, RED);
        assert_eq!(composite.image.get_pixel(1501, 1504).0, BLUE);

        let summary = session.summary().unwrap();
        assert_eq!(summary.painted, 2);
        assert_eq!(summary.required, 3);
        assert_eq!(summary.wrong, 1);
        assert_eq!(summary.missing, 1);
        assert_eq!(summary.extra, 0);
        assert_eq!(
            summary.to_string(),
            "Showing 1 template (of 1 loaded).\nPainted 2 / 3 • Missing 1 • Wrong 1"
        );
    }

    #[test]
    fn test_untouched_tile_returned_unchanged() {
        let session = session(Grid::new(10, 3).unwrap(), [1.0, 1.0, 0.0, 0.0]);
        let bytes = encode_png(&live(10, &[])).unwrap();

        assert_eq!(session.overlay_tile(&bytes, TileCoord::new(5, 5)), bytes);
        assert!(session.progress().unwrap().is_empty());
    }

    #[test]
    fn test_undecodable_tile_returned_unchanged() {
        let session = session(Grid::new(10, 3).unwrap(), [1.0, 1.0, 0.0, 0.0]);
        let bytes = b"not an image".to_vec();
        assert_eq!(session.overlay_tile(&bytes, TileCoord::new(1, 1)), bytes);
    }

    #[test]
    fn test_draw_switch() {
        let session = session(Grid::new(10, 3).unwrap(), [1.0, 1.0, 0.0, 0.0]);
        let bytes = encode_png(&live(10, &[])).unwrap();

        session.set_draw_enabled(false);
        assert_eq!(session.overlay_tile(&bytes, TileCoord::new(1, 1)), bytes);

        session.set_draw_enabled(true);
        let out = session.overlay_tile(&bytes, TileCoord::new(1, 1));
        assert_eq!(decode_rgba(&out).unwrap().dimensions(), (30, 30));
    }

    #[test]
    fn test_refetch_overwrites() {
        let session = session(Grid::new(10, 3).unwrap(), [1.0, 1.0, 0.0, 0.0]);
        let tile = TileCoord::new(1, 1);

        session.overlay_image(&live(10, &[(0, 0, RED)]), tile).unwrap();
        session.overlay_image(&live(10, &[(0, 0, RED), (1, 0, RED)]), tile).unwrap();

        let summary = session.summary().unwrap();
        assert_eq!(summary.painted, 2);
        assert_eq!(session.progress().unwrap().len(), 1);
    }

    #[test]
    fn test_concurrent_fetches() {
        let session = session(Grid::new(10, 3).unwrap(), [1.0, 1.0, 8.0, 8.0]);
        let bytes = encode_png(&live(10, &[])).unwrap();

        std::thread::scope(|scope| {
            for i in 0..8 {
                let session = &session;
                let bytes = &bytes;
                scope.spawn(move || {
                    let tile = TileCoord::new(1 + i % 2, 1 + (i / 2) % 2);
                    session.overlay_tile(bytes, tile)
                });
            }
        });

        // The 2×2 flag at (8,8) in tile (1,1) of a 10px grid stays in one tile
        assert_eq!(session.progress().unwrap().len(), 1);
        assert_eq!(session.summary().unwrap().required, 3);
    }

    #[test]
    fn test_shown_counts_templates_across_tiles() {
        for order in [[1, 2], [2, 1]] {
            let mut registry = TemplateRegistry::in_memory(RegistryOptions {
                grid: Grid::new(10, 3).unwrap(),
                ..RegistryOptions::default()
            });
            let png = encode_png(&flag()).unwrap();
            registry.create(&png, "West", [1.0, 1.0, 0.0, 0.0]).unwrap();
            registry.create(&png, "East", [2.0, 1.0, 0.0, 0.0]).unwrap();

            let session = OverlaySession::new(registry);
            for x in order {
                session.overlay_image(&live(10, &[]), TileCoord::new(x, 1)).unwrap();
            }
            assert_eq!(session.summary().unwrap().shown, 2);
        }
    }

    #[test]
    fn test_try_overlay_reports_failures() {
        let session = session(Grid::new(10, 3).unwrap(), [1.0, 1.0, 0.0, 0.0]);
        assert!(session.try_overlay_tile(b"not an image", TileCoord::new(1, 1)).is_err());

        let bytes = encode_png(&live(10, &[])).unwrap();
        assert_eq!(session.try_overlay_tile(&bytes, TileCoord::new(5, 5)).unwrap(), None);
        assert!(session.try_overlay_tile(&bytes, TileCoord::new(1, 1)).unwrap().is_some());
    }

    #[test]
    fn test_disabled_colour_excluded() {
        let session = session(Grid::new(10, 3).unwrap(), [1.0, 1.0, 0.0, 0.0]);
        session
            .registry_mut()
            .unwrap()
            .set_colour_enabled("0 !", Rgb::new(0, 0, 255), false)
            .unwrap();

        let composite = session
            .overlay_image(&live(10, &[(0, 1, GREEN)]), TileCoord::new(1, 1))
            .unwrap()
            .unwrap();
        assert_eq!(composite.stats.required, 2);
        assert_eq!(composite.stats.wrong, 0);
    }
}
