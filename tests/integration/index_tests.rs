//! Tile index integration tests.
//!
//! Tests verify:
//! - Building from memory and from a directory on disk
//! - Unusable tiles are skipped, not fatal
//! - Rebuild swaps contents without touching existing snapshots

use std::sync::Arc;

use image::ImageFormat;

use tile_mosaic::{Color3, FsTileSource, TileIndex};

use super::test_utils::{solid_image, unique_temp_dir, MemoryTileSource, BLACK, WHITE};

#[test]
fn test_build_from_memory_source() {
    let source = MemoryTileSource::new()
        .with_tile("black.png", 4, BLACK)
        .with_tile("white.png", 4, WHITE);

    let index = TileIndex::build(Arc::new(source)).unwrap();
    assert_eq!(index.len(), 2);
    assert_eq!(index.get("black.png"), Some(Color3::new(0.0, 0.0, 0.0)));
    assert_eq!(index.get("white.png"), Some(Color3::new(255.0, 255.0, 255.0)));
}

#[test]
fn test_corrupt_tiles_are_skipped() {
    let source = MemoryTileSource::new()
        .with_tile("black.png", 4, BLACK)
        .with_corrupt_tile("broken.png");

    let index = TileIndex::build(Arc::new(source.clone())).unwrap();
    assert_eq!(index.len(), 1);
    assert!(index.get("broken.png").is_none());

    let stats = index.rebuild().unwrap();
    assert_eq!((stats.indexed, stats.skipped), (1, 1));
}

#[test]
fn test_rebuild_leaves_existing_snapshot_intact() {
    let source = MemoryTileSource::new().with_tile("black.png", 4, BLACK);
    let index = TileIndex::build(Arc::new(source.clone())).unwrap();
    let before = index.snapshot();

    source.remove("black.png");
    let source = source.with_tile("white.png", 4, WHITE);
    index.rebuild().unwrap();

    assert_eq!(before.len(), 1);
    assert_eq!(before.entries()[0].id, "black.png");

    let after = index.snapshot();
    assert_eq!(after.len(), 1);
    assert_eq!(after.entries()[0].id, "white.png");
    assert_eq!(source.load_count(), 2);
}

#[test]
fn test_build_from_directory() {
    let dir = unique_temp_dir("index");
    solid_image(6, 6, BLACK)
        .save_with_format(dir.join("black.png"), ImageFormat::Png)
        .unwrap();
    solid_image(6, 6, WHITE)
        .save_with_format(dir.join("white.png"), ImageFormat::Png)
        .unwrap();
    std::fs::write(dir.join("notes.txt"), b"not a tile").unwrap();
    std::fs::write(dir.join(".hidden.png"), b"ignored").unwrap();
    std::fs::create_dir(dir.join("nested")).unwrap();

    let index = TileIndex::build(Arc::new(FsTileSource::new(&dir))).unwrap();

    let snapshot = index.snapshot();
    let ids: Vec<_> = snapshot.entries().iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["black.png", "white.png"]);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_missing_directory_fails_build() {
    let dir = unique_temp_dir("missing").join("does-not-exist");
    assert!(TileIndex::build(Arc::new(FsTileSource::new(&dir))).is_err());
}

#[test]
fn test_snapshot_nearest_after_build() {
    let source = MemoryTileSource::new()
        .with_tile("black.png", 2, BLACK)
        .with_tile("white.png", 2, WHITE);
    let index = TileIndex::build(Arc::new(source)).unwrap();
    let snapshot = index.snapshot();

    let dark = snapshot.nearest(Color3::new(10.0, 10.0, 10.0)).unwrap();
    assert_eq!(dark.id, "black.png");

    let light = snapshot.nearest(Color3::new(250.0, 250.0, 250.0)).unwrap();
    assert_eq!(light.id, "white.png");
}
