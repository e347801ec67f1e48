//! Tile color index.
//!
//! This module owns the mapping from tile identifier to average color and the
//! storage seam tiles are read through.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │             Mosaic Service              │
//! └────────────────────┬────────────────────┘
//!                      │ snapshot() per job
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │               TileIndex                 │
//! │  (id -> average color, RwLock, rebuild) │
//! └────────────────────┬────────────────────┘
//!                      │ list_tiles / load_tile
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            TileSource Trait             │
//! └────────────────────┬────────────────────┘
//!                      ▼
//!            ┌─────────────────┐
//!            │  FsTileSource   │
//!            │ (flat directory)│
//!            └─────────────────┘
//! ```
//!
//! A [`TileIndexSnapshot`] is an immutable copy of the index taken once per
//! mosaic job. Renderers share it without locking, and a rebuild running at
//! the same time never disturbs it.
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use tile_mosaic::index::{FsTileSource, TileIndex};
//! use tile_mosaic::color::Color3;
//!
//! let index = TileIndex::build(Arc::new(FsTileSource::new("tiles")))?;
//! let snapshot = index.snapshot();
//!
//! if let Some(entry) = snapshot.nearest(Color3::new(12.0, 40.0, 200.0)) {
//!     println!("closest tile: {}", entry.id);
//! }
//! ```

mod snapshot;
mod source;
mod tile_index;

pub use snapshot::{TileEntry, TileIndexSnapshot};
pub use source::{FsTileSource, TileSource};
pub use tile_index::{IndexStats, TileIndex};
