//! Overlay command implementation.
//!
//! Draws the active templates over a set of live tile images in parallel
//! and reports painting progress.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use rayon::prelude::*;

use crate::discovery::{scan_tile_sources, Project, TileFile};
use crate::error::{MarbleError, Result};
use crate::output::{display_path, plural, Printer};
use crate::session::OverlaySession;

/// Draw templates over live tile images and report progress
#[derive(Args, Debug)]
pub struct OverlayArgs {
    /// Tile images or directories (`X/Y.png` or `X_Y.png`)
    #[arg(required = true)]
    pub tiles: Vec<PathBuf>,

    /// Output directory; tiles are written as `X/Y.png`
    #[arg(long, short)]
    pub output: PathBuf,

    /// Count progress without writing images
    #[arg(long)]
    pub dry_run: bool,
}

/// What happened to one tile.
enum TileResult {
    Overlaid,
    /// No active template touches the tile.
    Untouched,
    /// Overlaying failed; the original tile was written instead.
    FellBack(MarbleError),
}

pub fn run(args: OverlayArgs, project: &Project, printer: &Printer) -> Result<()> {
    let scan = scan_tile_sources(&args.tiles, &project.manifest);
    for skipped in &scan.skipped {
        printer.warning("Skipping", &format!("{} (not a tile path)", display_path(skipped)));
    }
    if scan.is_empty() {
        return Err(MarbleError::Validation {
            message: "No tile images found".to_string(),
            help: Some("Name tiles `X/Y.png` or `X_Y.png` after their tile coordinates".to_string()),
        });
    }

    let registry = project.open_registry()?;
    if registry.active_sorted().is_empty() {
        printer.warning("Empty", "no active templates; tiles are copied unchanged");
    }
    let session = OverlaySession::new(registry);

    printer.status("Overlaying", &plural(scan.len(), "tile", "tiles"));
    let results: Vec<Result<TileResult>> = scan
        .tiles
        .par_iter()
        .map(|tile| overlay_one(&session, tile, &args.output, args.dry_run))
        .collect();

    let (mut overlaid, mut untouched, mut fell_back, mut failed) = (0, 0, 0, 0);
    for (tile, result) in scan.tiles.iter().zip(&results) {
        match result {
            Ok(TileResult::Overlaid) => overlaid += 1,
            Ok(TileResult::Untouched) => untouched += 1,
            Ok(TileResult::FellBack(e)) => {
                fell_back += 1;
                printer.warning("Unchanged", &format!("{} ({})", display_path(&tile.path), e));
            }
            Err(e) => {
                failed += 1;
                printer.warning("Failed", &format!("{} ({})", display_path(&tile.path), e));
            }
        }
    }

    if !args.dry_run {
        printer.status(
            "Wrote",
            &format!(
                "{} to {} {}",
                plural(overlaid + untouched + fell_back, "tile", "tiles"),
                printer.cyan(&display_path(&args.output)),
                printer.dim(&format!(
                    "({} overlaid, {} without templates, {} unchanged after errors)",
                    overlaid, untouched, fell_back
                ))
            ),
        );
    }

    printer.progress(&session.summary()?);

    if failed > 0 {
        return Err(MarbleError::Validation {
            message: format!("{} could not be read or written", plural(failed, "tile", "tiles")),
            help: Some("The remaining tiles were processed; see the warnings above".to_string()),
        });
    }
    Ok(())
}

/// Overlay one tile file. Errors are read or write failures; overlay
/// failures fall back to the original bytes.
fn overlay_one(session: &OverlaySession, tile: &TileFile, output: &Path, dry_run: bool) -> Result<TileResult> {
    let bytes = fs::read(&tile.path).map_err(|e| MarbleError::Io {
        path: tile.path.clone(),
        message: format!("Failed to read tile: {}", e),
    })?;

    let (out, result) = match session.try_overlay_tile(&bytes, tile.coord) {
        Ok(Some(png)) => (png, TileResult::Overlaid),
        Ok(None) => (bytes, TileResult::Untouched),
        Err(e) => (bytes, TileResult::FellBack(e)),
    };

    if !dry_run {
        let dir = output.join(tile.coord.x.to_string());
        fs::create_dir_all(&dir).map_err(|e| MarbleError::Io {
            path: dir.clone(),
            message: format!("Failed to create output directory: {}", e),
        })?;
        let path = dir.join(format!("{}.png", tile.coord.y));
        fs::write(&path, &out).map_err(|e| MarbleError::Io {
            path: path.clone(),
            message: format!("Failed to write tile: {}", e),
        })?;
    }

    Ok(result)
}
