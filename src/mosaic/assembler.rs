//! Fan-out/fan-in assembly of a full mosaic.
//!
//! # Execution
//!
//! ```text
//!                 ┌──────────── source image + snapshot ────────────┐
//!                 ▼               ▼               ▼                 ▼
//!            render TL       render TR       render BL         render BR     (4 threads)
//!                 │               │               │                 │
//!                 └───────────────┴──── mpsc ─────┴─────────────────┘
//!                                        │  in completion order
//!                                        ▼
//!                        spawn compositor for that quadrant           (1 thread each)
//!                                        │
//!                                        ▼
//!                    scope barrier: all renders + all composites joined
//!                                        │
//!                                        ▼
//!                                     encode
//! ```
//!
//! The output canvas is split into four disjoint per-quadrant views before any
//! thread starts ([`split_canvas`]). A compositor owns exactly one view, so it
//! can run while other quadrants are still rendering and cannot write outside
//! its quadrant. The canvas is only read again after `thread::scope` returns.

use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use bytes::Bytes;
use image::RgbaImage;
use tracing::{debug, info, warn};

use crate::error::MosaicError;
use crate::index::{TileIndexSnapshot, TileSource};

use super::cache::TileCache;
use super::encoder::{MosaicEncoder, OutputFormat};
use super::region::{quadrants, split_canvas};
use super::renderer::{RegionRenderer, RenderStats, RenderedRegion};

/// Check a requested tile size and convert it to pixels.
///
/// # Errors
///
/// Returns [`MosaicError::InvalidTileSize`] for zero, negative, or
/// out-of-range values.
pub fn validate_tile_size(tile_size: i64) -> Result<u32, MosaicError> {
    u32::try_from(tile_size)
        .ok()
        .filter(|size| *size > 0)
        .ok_or(MosaicError::InvalidTileSize { tile_size })
}

/// An encoded mosaic and how it was made.
#[derive(Debug, Clone)]
pub struct MosaicOutput {
    /// Encoded image bytes
    pub data: Bytes,

    pub format: OutputFormat,

    /// Same dimensions as the source image
    pub width: u32,
    pub height: u32,

    pub tile_size: u32,

    /// Cell counters summed over the four quadrants
    pub stats: RenderStats,

    /// Wall-clock time from validation to encoded bytes
    pub elapsed: Duration,
}

/// Builds mosaics by rendering the four quadrants of the source in parallel.
///
/// Cheap to clone; clones share the tile source and the tile cache.
#[derive(Clone)]
pub struct MosaicAssembler {
    source: Arc<dyn TileSource>,
    cache: Arc<TileCache>,
    encoder: MosaicEncoder,
}

impl MosaicAssembler {
    /// Create an assembler producing JPEG at the default quality.
    pub fn new(source: Arc<dyn TileSource>, cache: Arc<TileCache>) -> Self {
        Self {
            source,
            cache,
            encoder: MosaicEncoder::default(),
        }
    }

    pub fn with_encoder(mut self, encoder: MosaicEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn encoder(&self) -> &MosaicEncoder {
        &self.encoder
    }

    pub fn cache(&self) -> &Arc<TileCache> {
        &self.cache
    }

    /// Build and encode a mosaic of `image` on a blocking worker thread.
    ///
    /// See [`assemble_blocking`](Self::assemble_blocking).
    pub async fn assemble(
        &self,
        image: Arc<RgbaImage>,
        tile_size: u32,
        snapshot: Arc<TileIndexSnapshot>,
    ) -> Result<MosaicOutput, MosaicError> {
        let assembler = self.clone();
        tokio::task::spawn_blocking(move || {
            assembler.assemble_blocking(&image, tile_size, &snapshot)
        })
        .await?
    }

    /// Build and encode a mosaic of `image` on the calling thread.
    ///
    /// Parameters are checked before any rendering starts. Cells that cannot
    /// be matched or whose tile fails to load are left blank; they never fail
    /// the job.
    ///
    /// # Errors
    ///
    /// - [`MosaicError::InvalidTileSize`] if `tile_size` is 0
    /// - [`MosaicError::EmptyImage`] if `image` has no pixels
    /// - [`MosaicError::Encode`] if the finished canvas cannot be encoded
    pub fn assemble_blocking(
        &self,
        image: &RgbaImage,
        tile_size: u32,
        snapshot: &TileIndexSnapshot,
    ) -> Result<MosaicOutput, MosaicError> {
        let start = Instant::now();

        if tile_size == 0 {
            return Err(MosaicError::InvalidTileSize { tile_size: 0 });
        }
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(MosaicError::EmptyImage);
        }

        let renderer = RegionRenderer::new(Arc::clone(&self.source), Arc::clone(&self.cache), tile_size);
        let (canvas, stats) = compose(image, snapshot, &renderer);
        let data = self.encoder.encode(&canvas)?;

        let elapsed = start.elapsed();
        info!(
            width,
            height,
            tile_size,
            tiles = snapshot.len(),
            drawn = stats.cells_drawn,
            blank = stats.cells_unmatched + stats.cells_failed,
            elapsed_ms = elapsed.as_millis() as u64,
            "Assembled mosaic"
        );

        Ok(MosaicOutput {
            data,
            format: self.encoder.format(),
            width,
            height,
            tile_size,
            stats,
            elapsed,
        })
    }
}

/// Render the four quadrants of `image` concurrently and composite each into
/// a full-size canvas as soon as it is ready.
///
/// Returns once every render and every composite has finished.
pub fn compose(
    image: &RgbaImage,
    snapshot: &TileIndexSnapshot,
    renderer: &RegionRenderer,
) -> (RgbaImage, RenderStats) {
    let (width, height) = image.dimensions();
    let regions = quadrants(width, height);
    let mut canvas = RgbaImage::new(width, height);
    let mut stats = RenderStats::default();

    {
        let mut targets = split_canvas(&mut canvas, &regions).map(Some);

        thread::scope(|scope| {
            let (tx, rx) = mpsc::channel::<RenderedRegion>();

            for region in regions {
                let tx = tx.clone();
                scope.spawn(move || {
                    let rendered = renderer.render(image, snapshot, region);
                    // Receiver outlives every sender inside the scope
                    let _ = tx.send(rendered);
                });
            }
            drop(tx);

            for rendered in rx {
                let quadrant = rendered.region.quadrant;
                debug!(quadrant = quadrant.name(), "Region ready, compositing");
                stats += rendered.stats;

                match targets[quadrant.index()].take() {
                    Some(target) => {
                        scope.spawn(move || target.composite(&rendered.buffer));
                    }
                    None => warn!(quadrant = quadrant.name(), "Quadrant rendered twice"),
                }
            }
        });
    }

    (canvas, stats)
}
