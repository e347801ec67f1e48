//! Mosaic generation.
//!
//! This module turns a decoded source image and a [`TileIndexSnapshot`]
//! into an encoded mosaic.
//!
//! # Pipeline
//!
//! ```text
//! source image ──► quadrants() ──► 4 x RegionRenderer (parallel)
//!                                        │
//!                                        │ sample pixel ─► nearest tile
//!                                        │ TileCache ─► resize()
//!                                        ▼
//!                             composite into canvas as each finishes
//!                                        │
//!                                        ▼
//!                                 MosaicEncoder ──► bytes
//! ```
//!
//! [`MosaicService`] wraps the pipeline for async callers: it validates the
//! request, takes the snapshot, decodes the upload and runs the CPU-bound
//! work on blocking workers.
//!
//! [`TileIndexSnapshot`]: crate::index::TileIndexSnapshot

mod assembler;
mod cache;
mod encoder;
mod region;
mod renderer;
mod resize;
mod service;

pub use assembler::{compose, validate_tile_size, MosaicAssembler, MosaicOutput};
pub use cache::{TileCache, TileCacheKey, DEFAULT_TILE_CACHE_CAPACITY};
pub use encoder::{
    clamp_quality, is_valid_quality, MosaicEncoder, OutputFormat, DEFAULT_JPEG_QUALITY,
    MAX_JPEG_QUALITY, MIN_JPEG_QUALITY,
};
pub use region::{quadrants, split_canvas, CompositeTarget, Quadrant, Region};
pub use renderer::{RegionRenderer, RenderStats, RenderedRegion};
pub use resize::{resize, resize_clipped};
pub use service::{MosaicResponse, MosaicService};
