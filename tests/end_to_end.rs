//! Whole-pipeline tests through file-backed projects.

use std::fs;

use image::{Rgba, RgbaImage};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

use marble::render::{decode_rgba, encode_png};
use marble::{discover, DeleteOutcome, ImportOutcome, OverlaySession, TileCoord};

const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];

/// Two red pixels on top, one blue below, one transparent.
fn flag_png() -> Vec<u8> {
    let mut img = RgbaImage::new(2, 2);
    img.put_pixel(0, 0, Rgba(RED));
    img.put_pixel(1, 0, Rgba(RED));
    img.put_pixel(0, 1, Rgba(BLUE));
    encode_png(&img).unwrap()
}

#[test]
fn flag_overlay_and_progress() {
    let dir = tempdir().unwrap();
    let project = discover(dir.path()).unwrap();
    project
        .open_registry()
        .unwrap()
        .create(&flag_png(), "Flag", [12.0, 34.0, 500.0, 500.0])
        .unwrap();

    // Reopened from disk
    let session = OverlaySession::new(project.open_registry().unwrap());
    let mut live = RgbaImage::new(1000, 1000);
    live.put_pixel(500, 500, Rgba(RED));
    live.put_pixel(501, 500, Rgba(RED));
    live.put_pixel(500, 501, Rgba(GREEN));

    let out = session.overlay_tile(&encode_png(&live).unwrap(), TileCoord::new(12, 34));
    let drawn = decode_rgba(&out).unwrap();
    assert_eq!(drawn.dimensions(), (3000, 3000));
    assert_eq!(drawn.get_pixel(1501, 1501).0, RED);
    assert_eq!(drawn.get_pixel(1501, 1504).0, BLUE);

    let summary = session.summary().unwrap();
    assert_eq!(
        (summary.painted, summary.required, summary.missing, summary.wrong),
        (2, 3, 1, 1)
    );

    // A tile no template touches passes through byte for byte
    let blank = encode_png(&RgbaImage::new(1000, 1000)).unwrap();
    assert_eq!(session.overlay_tile(&blank, TileCoord::new(0, 0)), blank);
}

#[test]
fn share_between_projects() {
    let source_dir = tempdir().unwrap();
    let target_dir = tempdir().unwrap();
    fs::write(source_dir.path().join("marble.yaml"), "name: Source\n").unwrap();

    let source = discover(source_dir.path()).unwrap();
    let mut registry = source.open_registry().unwrap();
    let key = registry
        .create(&flag_png(), "Flag", [12.0, 34.0, 500.0, 500.0])
        .unwrap()
        .storage_key
        .to_string();
    registry.set_colour_enabled(&key, "0,0,255".parse().unwrap(), false).unwrap();
    let shared = registry.export_template_as_string(&key).unwrap();

    let target = discover(target_dir.path()).unwrap();
    let mut registry = target.open_registry().unwrap();
    registry.create(&flag_png(), "Local", [0.0, 0.0, 0.0, 0.0]).unwrap();

    // Same key on both sides, so the import is re-keyed
    let outcome = registry.import_template_from_string(&shared).unwrap();
    let ImportOutcome::Imported(keys) = outcome else {
        panic!("expected an import");
    };
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].sort_id, 1);
    drop(registry);

    let registry = target.open_registry().unwrap();
    let imported = registry.get(&keys[0].to_string()).unwrap();
    assert_eq!(imported.display_name, "Flag");
    assert_eq!(imported.anchor.to_coords_string(), "12,34,500,500");
    assert_eq!(imported.required_pixel_count, 3);
    assert!(!imported.palette.is_enabled("0,0,255".parse().unwrap()));
    assert_eq!(registry.len(), 2);
}

#[test]
fn sort_ids_never_reused() {
    let dir = tempdir().unwrap();
    let project = discover(dir.path()).unwrap();
    let png = flag_png();

    let mut registry = project.open_registry().unwrap();
    for i in 0..3 {
        registry.create(&png, &format!("t{}", i), [0.0, 0.0, 0.0, 0.0]).unwrap();
    }
    assert_eq!(registry.delete("2 !").unwrap(), DeleteOutcome::Deleted);
    assert_eq!(registry.delete("2 !").unwrap(), DeleteOutcome::NotFound);
    drop(registry);

    let mut registry = project.open_registry().unwrap();
    assert_eq!(registry.next_sort_id(), 3);
    let key = registry.create(&png, "", [0.0, 0.0, 0.0, 0.0]).unwrap().storage_key.clone();
    assert_eq!(key.to_string(), "3 !");
    assert_eq!(registry.get("3 !").unwrap().display_name, "Template 3");
}

#[test]
fn corrupt_store_recovers_empty() {
    let dir = tempdir().unwrap();
    let project = discover(dir.path()).unwrap();
    fs::create_dir_all(project.store_path()).unwrap();
    fs::write(project.store_path().join("bmTemplates.json"), "{ not json").unwrap();

    let mut registry = project.open_registry().unwrap();
    assert!(registry.is_empty());
    registry.create(&flag_png(), "Flag", [0.0, 0.0, 0.0, 0.0]).unwrap();
    assert_eq!(project.open_registry().unwrap().len(), 1);
}
