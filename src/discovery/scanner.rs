//! File system scanner for live tile images.
//!
//! Tiles are recognised by path: `X/Y.png` (a directory per column) or
//! `X_Y.png`, where X and Y are the tile coordinates.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::types::TileCoord;

use super::manifest::Manifest;

/// Image extensions accepted as tiles.
const TILE_EXTENSIONS: [&str; 4] = ["png", "webp", "jpg", "jpeg"];

/// A tile image found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileFile {
    pub path: PathBuf,
    pub coord: TileCoord,
}

/// Result of scanning a directory for tiles.
#[derive(Debug, Default)]
pub struct TileScan {
    /// Recognised tiles, ordered by coordinate.
    pub tiles: Vec<TileFile>,
    /// Image files whose path does not name a tile.
    pub skipped: Vec<PathBuf>,
}

impl TileScan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Merge another scan result into this one.
    pub fn merge(&mut self, other: TileScan) {
        self.tiles.extend(other.tiles);
        self.skipped.extend(other.skipped);
        self.tiles.sort_by_key(|t| t.coord);
        self.tiles.dedup_by(|a, b| a.path == b.path);
    }
}

/// Scan a directory, or a single file, for tile images.
pub fn scan_tiles(root: &Path, manifest: &Manifest) -> TileScan {
    let mut result = TileScan::new();

    if !root.exists() {
        return result;
    }

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if path.is_dir() || !is_image(path) {
            continue;
        }

        let relative = path.strip_prefix(root).unwrap_or(path);
        if manifest.is_excluded(relative) {
            continue;
        }

        match detect_tile_coord(path) {
            Some(coord) => result.tiles.push(TileFile {
                path: path.to_path_buf(),
                coord,
            }),
            None => result.skipped.push(path.to_path_buf()),
        }
    }

    result.tiles.sort_by_key(|t| t.coord);
    result
}

/// Scan several roots.
pub fn scan_tile_sources(roots: &[PathBuf], manifest: &Manifest) -> TileScan {
    let mut result = TileScan::new();
    for root in roots {
        result.merge(scan_tiles(root, manifest));
    }
    result
}

/// Read the tile coordinate out of a path.
pub fn detect_tile_coord(path: &Path) -> Option<TileCoord> {
    let stem = path.file_stem()?.to_str()?;

    if let Some((x, y)) = stem.split_once('_') {
        return Some(TileCoord::new(x.parse().ok()?, y.parse().ok()?));
    }

    let y: u32 = stem.parse().ok()?;
    let x: u32 = path.parent()?.file_name()?.to_str()?.parse().ok()?;
    Some(TileCoord::new(x, y))
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| TILE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_detect_tile_coord() {
        assert_eq!(detect_tile_coord(Path::new("tiles/12/34.png")), Some(TileCoord::new(12, 34)));
        assert_eq!(detect_tile_coord(Path::new("tiles/12_34.png")), Some(TileCoord::new(12, 34)));
        assert_eq!(detect_tile_coord(Path::new("0_0.webp")), Some(TileCoord::new(0, 0)));
    }

    #[test]
    fn test_detect_tile_coord_rejects() {
        assert_eq!(detect_tile_coord(Path::new("tiles/34.png")), None);
        assert_eq!(detect_tile_coord(Path::new("tiles/a_b.png")), None);
        assert_eq!(detect_tile_coord(Path::new("tiles/12/cover.png")), None);
        assert_eq!(detect_tile_coord(Path::new("-1_2.png")), None);
    }

    #[test]
    fn test_scan_tiles() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("5")).unwrap();
        fs::write(dir.path().join("5/7.png"), b"").unwrap();
        fs::write(dir.path().join("1_2.png"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();
        fs::write(dir.path().join("cover.png"), b"").unwrap();

        let scan = scan_tiles(dir.path(), &Manifest::default());

        let coords: Vec<TileCoord> = scan.tiles.iter().map(|t| t.coord).collect();
        assert_eq!(coords, vec![TileCoord::new(1, 2), TileCoord::new(5, 7)]);
        assert_eq!(scan.skipped.len(), 1);
    }

    #[test]
    fn test_scan_tiles_with_excludes() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("old")).unwrap();
        fs::write(dir.path().join("old/1_1.png"), b"").unwrap();
        fs::write(dir.path().join("2_2.png"), b"").unwrap();

        let manifest = Manifest {
            excludes: vec!["old/*".to_string()],
            ..Default::default()
        };
        let scan = scan_tiles(dir.path(), &manifest);
        assert_eq!(scan.len(), 1);
        assert_eq!(scan.tiles[0].coord, TileCoord::new(2, 2));
    }

    #[test]
    fn test_scan_single_file_and_missing() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("3_4.png");
        fs::write(&file, b"").unwrap();

        let scan = scan_tile_sources(&[file.clone(), dir.path().join("missing")], &Manifest::default());
        assert_eq!(scan.tiles, vec![TileFile { path: file, coord: TileCoord::new(3, 4) }]);
    }
}
