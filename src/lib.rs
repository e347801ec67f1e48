//! # Tile Mosaic
//!
//! Builds photo mosaics: a source image is rebuilt out of small tile images,
//! each cell using the tile whose average color is closest to the source at
//! that point.
//!
//! ## Features
//!
//! - **Tile index**: average color of every tile in a directory, rebuildable
//!   while the server runs
//! - **Parallel assembly**: the four quadrants of the source render on their
//!   own threads and are composited as each one finishes
//! - **Tile cache**: resized tiles are kept in an LRU and reused across cells
//!   and jobs
//! - **Web front end**: upload form, results page, health and rebuild
//!   endpoints
//!
//! ## Architecture
//!
//! - [`color`] - Color triples, distance, averaging and sampling
//! - [`index`] - Tile index, snapshots and the tile storage seam
//! - [`mosaic`] - Resizing, region rendering, assembly and encoding
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tile_mosaic::{FsTileSource, MosaicService, TileIndex};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let index = TileIndex::build(Arc::new(FsTileSource::new("tiles")))?;
//!     let service = MosaicService::new(Arc::new(index));
//!
//!     let upload = std::fs::read("photo.jpg")?;
//!     let response = service.create_mosaic(upload.into(), 15).await?;
//!     std::fs::write("mosaic.jpg", &response.mosaic.data)?;
//!     Ok(())
//! }
//! ```

pub mod color;
pub mod config;
pub mod error;
pub mod index;
pub mod mosaic;
pub mod server;

// Re-export commonly used types
pub use color::{average_color, sample_color, Color3};
pub use config::{Cli, Command, RenderConfig, ServeConfig};
pub use error::MosaicError;
pub use index::{FsTileSource, IndexStats, TileEntry, TileIndex, TileIndexSnapshot, TileSource};
pub use mosaic::{
    quadrants, resize, MosaicAssembler, MosaicEncoder, MosaicOutput, MosaicResponse,
    MosaicService, OutputFormat, Quadrant, Region, RegionRenderer, RenderStats, TileCache,
};
pub use server::{create_router, AppState, ErrorResponse, HealthResponse, RouterConfig};
