//! Mosaic service: the entry point for mosaic jobs.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        MosaicService                          │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │                   create_mosaic()                      │  │
//! │  │  1. Validate tile size   3. Decode upload              │  │
//! │  │  2. Snapshot index       4. Assemble + encode original │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │          │                       │                │          │
//! │          ▼                       ▼                ▼          │
//! │    ┌───────────┐       ┌─────────────────┐  ┌───────────┐    │
//! │    │ TileIndex │       │ MosaicAssembler │  │ TileCache │    │
//! │    └───────────┘       └─────────────────┘  └───────────┘    │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use image::RgbaImage;
use tracing::{debug, info};

use crate::error::MosaicError;
use crate::index::{IndexStats, TileIndex};

use super::assembler::{validate_tile_size, MosaicAssembler, MosaicOutput};
use super::cache::TileCache;
use super::encoder::MosaicEncoder;

// =============================================================================
// Mosaic Response
// =============================================================================

/// Result of one mosaic job.
#[derive(Debug, Clone)]
pub struct MosaicResponse {
    /// The uploaded image re-encoded with the same encoder as the mosaic
    pub original: Bytes,

    pub mosaic: MosaicOutput,

    /// Wall-clock time from receiving the upload to both images encoded
    pub elapsed: Duration,
}

// =============================================================================
// Mosaic Service
// =============================================================================

/// Service for building mosaics against a shared tile index.
///
/// Every job works from its own [`TileIndexSnapshot`](crate::index::TileIndexSnapshot),
/// so [`rebuild_index`](Self::rebuild_index) can run while jobs are in
/// flight.
pub struct MosaicService {
    index: Arc<TileIndex>,
    assembler: MosaicAssembler,
}

impl MosaicService {
    /// Create a service with a default-sized tile cache and JPEG output.
    pub fn new(index: Arc<TileIndex>) -> Self {
        let cache = Arc::new(TileCache::new());
        let assembler = MosaicAssembler::new(Arc::clone(index.source()), cache);
        Self { index, assembler }
    }

    /// Create a service whose tile cache holds at most `capacity` bytes.
    pub fn with_cache_capacity(index: Arc<TileIndex>, capacity: usize) -> Self {
        let cache = Arc::new(TileCache::with_capacity(capacity));
        let assembler = MosaicAssembler::new(Arc::clone(index.source()), cache);
        Self { index, assembler }
    }

    pub fn with_encoder(mut self, encoder: MosaicEncoder) -> Self {
        self.assembler = self.assembler.with_encoder(encoder);
        self
    }

    pub fn index(&self) -> &Arc<TileIndex> {
        &self.index
    }

    pub fn assembler(&self) -> &MosaicAssembler {
        &self.assembler
    }

    /// Number of tiles currently indexed.
    pub fn tile_count(&self) -> usize {
        self.index.len()
    }

    /// Build a mosaic from an encoded upload.
    ///
    /// The tile size is checked before the upload is decoded. The original
    /// is re-encoded on its own worker while the mosaic is assembled.
    ///
    /// # Errors
    ///
    /// - [`MosaicError::InvalidTileSize`] for a non-positive tile size
    /// - [`MosaicError::Decode`] if the upload is not a supported image
    /// - [`MosaicError::EmptyImage`] if the upload has no pixels
    /// - [`MosaicError::Encode`] or [`MosaicError::Worker`] if the job fails
    pub async fn create_mosaic(
        &self,
        upload: Bytes,
        tile_size: i64,
    ) -> Result<MosaicResponse, MosaicError> {
        let start = Instant::now();
        let tile_size = validate_tile_size(tile_size)?;

        let snapshot = Arc::new(self.index.snapshot());
        debug!(tiles = snapshot.len(), tile_size, bytes = upload.len(), "Starting mosaic job");

        let image = Arc::new(tokio::task::spawn_blocking(move || decode_upload(&upload)).await??);

        let encoder = *self.assembler.encoder();
        let original_image = Arc::clone(&image);
        let original = tokio::task::spawn_blocking(move || encoder.encode(&original_image));
        let mosaic = self.assembler.assemble(image, tile_size, snapshot);

        let (original, mosaic) = tokio::join!(original, mosaic);
        let original = original??;
        let mosaic = mosaic?;

        let elapsed = start.elapsed();
        info!(
            width = mosaic.width,
            height = mosaic.height,
            tile_size,
            elapsed_ms = elapsed.as_millis() as u64,
            "Mosaic job finished"
        );

        Ok(MosaicResponse {
            original,
            mosaic,
            elapsed,
        })
    }

    /// Rescan the tile source and drop every cached tile.
    ///
    /// Jobs already running keep their snapshot and finish against the old
    /// contents.
    pub async fn rebuild_index(&self) -> Result<IndexStats, MosaicError> {
        let index = Arc::clone(&self.index);
        let stats = tokio::task::spawn_blocking(move || index.rebuild()).await??;
        self.assembler.cache().clear();

        info!(indexed = stats.indexed, skipped = stats.skipped, "Tile index rebuilt");
        Ok(stats)
    }
}

/// Decode an uploaded image into RGBA.
fn decode_upload(data: &[u8]) -> Result<RgbaImage, MosaicError> {
    let image = image::load_from_memory(data)
        .map_err(|e| MosaicError::decode("upload", e))?
        .into_rgba8();

    if image.width() == 0 || image.height() == 0 {
        return Err(MosaicError::EmptyImage);
    }
    Ok(image)
}
