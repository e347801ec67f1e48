//! Mosaic assembly integration tests.
//!
//! Tests verify:
//! - A uniform source with one matching tile becomes that tile everywhere
//! - An empty index yields a blank mosaic of the source dimensions
//! - The 4x4 black source resolves every cell to the black tile
//! - Tiles are loaded once per size through the shared cache
//! - Tiles cached by a job from before a rebuild are not reused after it
//! - The full service path from encoded upload to encoded output

use std::sync::Arc;

use bytes::Bytes;
use image::{ImageFormat, Rgba, RgbaImage};

use tile_mosaic::{
    FsTileSource, MosaicAssembler, MosaicEncoder, MosaicService, OutputFormat, TileCache,
    TileIndex, TileSource,
};

use super::test_utils::{
    decode_rgba, encode_png, is_valid_jpeg, solid_image, unique_temp_dir, MemoryTileSource, BLACK,
    WHITE,
};

const TEAL: Rgba<u8> = Rgba([0, 128, 128, 255]);
const BLANK: Rgba<u8> = Rgba([0, 0, 0, 0]);

fn png_assembler(source: Arc<dyn TileSource>) -> MosaicAssembler {
    MosaicAssembler::new(source, Arc::new(TileCache::new())).with_encoder(MosaicEncoder::png())
}

fn build(source: MemoryTileSource) -> (TileIndex, MosaicAssembler) {
    let source: Arc<dyn TileSource> = Arc::new(source);
    let index = TileIndex::build(Arc::clone(&source)).unwrap();
    (index, png_assembler(source))
}

// =============================================================================
// Assembly
// =============================================================================

#[test]
fn test_uniform_source_uses_single_tile_everywhere() {
    let (index, assembler) = build(MemoryTileSource::new().with_tile("teal.png", 8, TEAL));
    let source = solid_image(30, 18, TEAL);

    let output = assembler
        .assemble_blocking(&source, 6, &index.snapshot())
        .unwrap();

    assert_eq!(output.format, OutputFormat::Png);
    assert_eq!((output.width, output.height), (30, 18));
    assert_eq!(output.stats.cells_unmatched + output.stats.cells_failed, 0);
    assert_eq!(decode_rgba(&output.data), source);
}

#[test]
fn test_empty_index_gives_blank_mosaic() {
    let (index, assembler) = build(MemoryTileSource::new());
    assert!(index.is_empty());

    let output = assembler
        .assemble_blocking(&solid_image(9, 7, WHITE), 3, &index.snapshot())
        .unwrap();

    assert_eq!((output.width, output.height), (9, 7));
    assert_eq!(output.stats.cells_drawn, 0);
    assert!(output.stats.cells_unmatched > 0);

    let decoded = decode_rgba(&output.data);
    assert_eq!(decoded.dimensions(), (9, 7));
    assert!(decoded.pixels().all(|p| *p == BLANK));
}

#[test]
fn test_black_source_resolves_to_black_tile() {
    let (index, assembler) = build(
        MemoryTileSource::new()
            .with_tile("black.png", 2, BLACK)
            .with_tile("white.png", 2, WHITE),
    );

    let output = assembler
        .assemble_blocking(&solid_image(4, 4, BLACK), 2, &index.snapshot())
        .unwrap();

    // One 2x2 cell per quadrant
    assert_eq!(output.stats.cells_drawn, 4);
    assert_eq!(decode_rgba(&output.data), solid_image(4, 4, BLACK));
}

#[test]
fn test_mixed_source_picks_tile_per_quadrant() {
    let (index, assembler) = build(
        MemoryTileSource::new()
            .with_tile("black.png", 5, BLACK)
            .with_tile("white.png", 5, WHITE),
    );

    // Left half dark, right half light
    let source = RgbaImage::from_fn(8, 8, |x, _| {
        if x < 4 {
            Rgba([20, 20, 20, 255])
        } else {
            Rgba([230, 230, 230, 255])
        }
    });

    let output = assembler
        .assemble_blocking(&source, 4, &index.snapshot())
        .unwrap();

    let expected = RgbaImage::from_fn(8, 8, |x, _| if x < 4 { BLACK } else { WHITE });
    assert_eq!(decode_rgba(&output.data), expected);
}

#[test]
fn test_broken_tile_leaves_cells_blank() {
    let source = MemoryTileSource::new().with_tile("teal.png", 4, TEAL);
    let (index, assembler) = build(source.clone());

    // Tile vanishes after indexing; rendering must still succeed
    source.put("teal.png", b"truncated".to_vec());

    let output = assembler
        .assemble_blocking(&solid_image(4, 4, TEAL), 2, &index.snapshot())
        .unwrap();

    assert_eq!(output.stats.cells_failed, 4);
    assert!(decode_rgba(&output.data).pixels().all(|p| *p == BLANK));
}

#[test]
fn test_tiles_loaded_once_per_size() {
    let source = MemoryTileSource::new().with_tile("teal.png", 8, TEAL);
    let (index, assembler) = build(source.clone());
    let snapshot = index.snapshot();
    let after_index = source.load_count();

    let image = solid_image(16, 16, TEAL);
    assembler.assemble_blocking(&image, 2, &snapshot).unwrap();
    assembler.assemble_blocking(&image, 2, &snapshot).unwrap();

    // Concurrent quadrants can race on the first miss, but never more than
    // once each
    let loads = source.load_count() - after_index;
    assert!((1..=4).contains(&loads), "loads = {}", loads);

    let (hits, _) = assembler.cache().stats();
    assert!(hits > 0);
}

#[test]
fn test_tiles_cached_before_rebuild_are_not_reused() {
    let source = MemoryTileSource::new().with_tile("tile.png", 2, BLACK);
    let (index, assembler) = build(source.clone());
    let image = solid_image(4, 4, WHITE);

    // A job that started before the rebuild fills the cache with the old tile
    let old = index.snapshot();
    let before = assembler.assemble_blocking(&image, 2, &old).unwrap();
    assert_eq!(decode_rgba(&before.data), solid_image(4, 4, BLACK));

    let _source = source.with_tile("tile.png", 2, WHITE);
    index.rebuild().unwrap();

    let new = index.snapshot();
    assert!(new.generation() > old.generation());
    let after = assembler.assemble_blocking(&image, 2, &new).unwrap();
    assert_eq!(decode_rgba(&after.data), solid_image(4, 4, WHITE));
}

#[test]
fn test_jpeg_output() {
    let (index, assembler) = build(MemoryTileSource::new().with_tile("teal.png", 4, TEAL));
    let assembler = assembler.with_encoder(MosaicEncoder::jpeg(90));

    let output = assembler
        .assemble_blocking(&solid_image(12, 12, TEAL), 4, &index.snapshot())
        .unwrap();

    assert_eq!(output.format, OutputFormat::Jpeg);
    assert!(is_valid_jpeg(&output.data));
    assert_eq!(decode_rgba(&output.data).dimensions(), (12, 12));
}

// =============================================================================
// Service
// =============================================================================

#[tokio::test]
async fn test_service_end_to_end_from_directory() {
    let dir = unique_temp_dir("mosaic");
    solid_image(6, 6, BLACK)
        .save_with_format(dir.join("black.png"), ImageFormat::Png)
        .unwrap();
    solid_image(6, 6, WHITE)
        .save_with_format(dir.join("white.png"), ImageFormat::Png)
        .unwrap();

    let index = TileIndex::build(Arc::new(FsTileSource::new(&dir))).unwrap();
    let service = MosaicService::new(Arc::new(index)).with_encoder(MosaicEncoder::png());
    assert_eq!(service.tile_count(), 2);

    let upload = Bytes::from(encode_png(&solid_image(4, 4, BLACK)));
    let response = service.create_mosaic(upload, 2).await.unwrap();

    assert_eq!(decode_rgba(&response.original), solid_image(4, 4, BLACK));
    assert_eq!(decode_rgba(&response.mosaic.data), solid_image(4, 4, BLACK));
    assert!(response.elapsed >= response.mosaic.elapsed);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_service_rebuild_picks_up_new_tiles() {
    let source = MemoryTileSource::new().with_tile("black.png", 2, BLACK);
    let index = TileIndex::build(Arc::new(source.clone())).unwrap();
    let service = MosaicService::new(Arc::new(index)).with_encoder(MosaicEncoder::png());

    let upload = Bytes::from(encode_png(&solid_image(4, 4, WHITE)));
    let before = service.create_mosaic(upload.clone(), 2).await.unwrap();
    assert_eq!(decode_rgba(&before.mosaic.data), solid_image(4, 4, BLACK));

    let _source = source.with_tile("white.png", 2, WHITE);
    let stats = service.rebuild_index().await.unwrap();
    assert_eq!(stats.indexed, 2);

    let after = service.create_mosaic(upload, 2).await.unwrap();
    assert_eq!(decode_rgba(&after.mosaic.data), solid_image(4, 4, WHITE));
}
