//! Rendering of one region of the mosaic.

use std::ops::AddAssign;
use std::sync::Arc;

use image::{imageops, RgbaImage};
use serde::Serialize;
use tracing::{debug, warn};

use crate::color::sample_color;
use crate::index::{TileIndexSnapshot, TileSource};

use super::cache::{TileCache, TileCacheKey};
use super::region::Region;

/// Per-region (and, summed, per-job) cell counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RenderStats {
    /// Cells filled with a tile
    pub cells_drawn: u64,

    /// Cells left blank because the snapshot had no tiles
    pub cells_unmatched: u64,

    /// Cells left blank because the chosen tile failed to load
    pub cells_failed: u64,
}

impl RenderStats {
    pub fn total_cells(&self) -> u64 {
        self.cells_drawn + self.cells_unmatched + self.cells_failed
    }
}

impl AddAssign for RenderStats {
    fn add_assign(&mut self, other: Self) {
        self.cells_drawn += other.cells_drawn;
        self.cells_unmatched += other.cells_unmatched;
        self.cells_failed += other.cells_failed;
    }
}

/// Output of [`RegionRenderer::render`].
#[derive(Debug, Clone)]
pub struct RenderedRegion {
    pub region: Region,

    /// Pixels covering exactly `region`; blank cells are transparent black
    pub buffer: RgbaImage,

    pub stats: RenderStats,
}

/// Renders one region of the source image out of tiles.
///
/// The renderer walks the region in `tile_size` steps. For each step it
/// samples the single source pixel at the step position, picks the nearest
/// tile from the snapshot and copies that tile, resized to `tile_size`, into
/// the region buffer. A cell that extends past the region's far edge is
/// clipped to the region; only its visible corner is ever resized.
///
/// Nothing in a region aborts the region: an empty snapshot or a tile that
/// fails to load leaves that one cell blank.
#[derive(Clone)]
pub struct RegionRenderer {
    source: Arc<dyn TileSource>,
    cache: Arc<TileCache>,
    tile_size: u32,
}

impl RegionRenderer {
    /// `tile_size` must be positive; the assembler validates it before
    /// constructing a renderer.
    pub fn new(source: Arc<dyn TileSource>, cache: Arc<TileCache>, tile_size: u32) -> Self {
        debug_assert!(tile_size > 0);
        Self {
            source,
            cache,
            tile_size,
        }
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Render `region` of `image` using tiles from `snapshot`.
    ///
    /// `region` must lie inside `image`.
    pub fn render(
        &self,
        image: &RgbaImage,
        snapshot: &TileIndexSnapshot,
        region: Region,
    ) -> RenderedRegion {
        let mut buffer = RgbaImage::new(region.width(), region.height());
        let mut stats = RenderStats::default();
        let step = self.tile_size.max(1) as usize;

        for y in (region.y1..region.y2).step_by(step) {
            for x in (region.x1..region.x2).step_by(step) {
                let target = sample_color(image, x, y);

                let Some(entry) = snapshot.nearest(target) else {
                    stats.cells_unmatched += 1;
                    continue;
                };

                let key =
                    TileCacheKey::new(entry.id.as_str(), snapshot.generation(), self.tile_size)
                        .clipped(region.x2 - x, region.y2 - y);

                let tile = match self.cache.get_or_load(self.source.as_ref(), &key) {
                    Ok(tile) => tile,
                    Err(e) => {
                        warn!(tile = %entry.id, x, y, error = %e, "Leaving cell blank");
                        stats.cells_failed += 1;
                        continue;
                    }
                };

                // Opaque copy; the tile already fits inside the buffer
                imageops::replace(
                    &mut buffer,
                    &*tile,
                    (x - region.x1) as i64,
                    (y - region.y1) as i64,
                );
                stats.cells_drawn += 1;
            }
        }

        debug!(
            quadrant = region.quadrant.name(),
            drawn = stats.cells_drawn,
            unmatched = stats.cells_unmatched,
            failed = stats.cells_failed,
            "Rendered region"
        );

        RenderedRegion {
            region,
            buffer,
            stats,
        }
    }
}
