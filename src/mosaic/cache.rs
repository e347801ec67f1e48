//! Cache of resized tiles.
//!
//! The same tile is usually chosen for many cells of a mosaic, and for many
//! mosaics in a row. This module provides an LRU cache of tiles that have
//! already been decoded and resized, so each tile is loaded from the
//! [`TileSource`] once per cell shape.
//!
//! # Cache Key
//!
//! Entries are keyed by:
//! - Tile identifier
//! - Index generation the tile was matched against
//! - Target edge length in pixels
//! - Visible extent of the cell (cells at a region edge are clipped)
//!
//! The generation keeps a job that started before an index rebuild from
//! handing its tiles to jobs that started after it.
//!
//! # Size-Based Eviction
//!
//! The cache tracks the total size of cached pixel buffers in bytes and
//! evicts least-recently-used entries when the capacity is exceeded. A tile
//! larger than the whole capacity is returned but not cached.
//!
//! # Locking
//!
//! The cache is used from renderer worker threads, so it sits behind a
//! `std::sync::Mutex`. The lock is held for the lookup and for the insert,
//! never while a tile is being decoded or resized.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use image::RgbaImage;
use lru::LruCache;

use crate::error::MosaicError;
use crate::index::TileSource;

use super::resize::resize_clipped;

/// Default cache capacity: 64MB of decoded pixels
pub const DEFAULT_TILE_CACHE_CAPACITY: usize = 64 * 1024 * 1024;

/// Default maximum number of entries (to bound LRU overhead)
const DEFAULT_MAX_ENTRIES: usize = 10_000;

// =============================================================================
// Cache Key
// =============================================================================

/// Cache key for a resized tile.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileCacheKey {
    /// Tile identifier within the source
    pub tile_id: Arc<str>,

    /// Index generation of the snapshot that chose the tile
    pub generation: u64,

    /// Edge length of the full resized square
    pub size: u32,

    /// Visible width of the cell, at most `size`
    pub width: u32,

    /// Visible height of the cell, at most `size`
    pub height: u32,
}

impl TileCacheKey {
    /// Key for a full, unclipped `size x size` tile.
    pub fn new(tile_id: impl Into<Arc<str>>, generation: u64, size: u32) -> Self {
        Self {
            tile_id: tile_id.into(),
            generation,
            size,
            width: size,
            height: size,
        }
    }

    /// Restrict the key to the visible `width x height` corner of the cell.
    pub fn clipped(mut self, width: u32, height: u32) -> Self {
        self.width = width.min(self.size);
        self.height = height.min(self.size);
        self
    }
}

// =============================================================================
// Tile Cache
// =============================================================================

struct CacheState {
    entries: LruCache<TileCacheKey, Arc<RgbaImage>>,

    /// Sum of the pixel buffer sizes of every entry
    current_size: usize,
}

/// LRU cache of decoded, resized tiles with size-based capacity.
///
/// # Thread Safety
///
/// Safe to share across threads via `Arc`.
pub struct TileCache {
    state: Mutex<CacheState>,

    /// Maximum total size in bytes
    max_size: usize,

    /// Lookups answered from the cache
    hits: AtomicU64,

    /// Lookups that had to load from the source
    misses: AtomicU64,
}

impl TileCache {
    /// Create a cache with the default capacity (64MB).
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TILE_CACHE_CAPACITY)
    }

    /// Create a cache holding at most `max_size` bytes of pixels.
    pub fn with_capacity(max_size: usize) -> Self {
        Self::with_capacity_and_entries(max_size, DEFAULT_MAX_ENTRIES)
    }

    /// Create a cache with a byte capacity and a maximum number of entries
    /// (minimum 1).
    pub fn with_capacity_and_entries(max_size: usize, max_entries: usize) -> Self {
        let max_entries = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            state: Mutex::new(CacheState {
                entries: LruCache::new(max_entries),
                current_size: 0,
            }),
            max_size,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &TileCacheKey) -> Option<Arc<RgbaImage>> {
        self.lock().entries.get(key).cloned()
    }

    /// Store a tile, evicting least-recently-used entries until the cache is
    /// within capacity. Tiles larger than the whole capacity are not stored.
    pub fn put(&self, key: TileCacheKey, tile: Arc<RgbaImage>) {
        let tile_size = tile_bytes(&tile);
        if tile_size > self.max_size {
            return;
        }

        let mut state = self.lock();

        // `push` hands back either the replaced value for this key or the
        // entry evicted by the entry-count limit
        if let Some((_, evicted)) = state.entries.push(key, tile) {
            let evicted_size = tile_bytes(&evicted);
            state.current_size = state.current_size.saturating_sub(evicted_size);
        }
        state.current_size += tile_size;

        while state.current_size > self.max_size {
            match state.entries.pop_lru() {
                Some((_, evicted)) => {
                    let evicted_size = tile_bytes(&evicted);
                    state.current_size = state.current_size.saturating_sub(evicted_size);
                }
                None => {
                    state.current_size = 0;
                    break;
                }
            }
        }
    }

    /// Return the tile for `key`, loading and resizing it from `source` on a
    /// miss.
    ///
    /// Only the visible `key.width x key.height` corner is produced. Failed
    /// loads are not cached; the next request tries the source again.
    pub fn get_or_load(
        &self,
        source: &dyn TileSource,
        key: &TileCacheKey,
    ) -> Result<Arc<RgbaImage>, MosaicError> {
        if let Some(tile) = self.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(tile);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        // Two workers missing on the same key both load it; last write wins
        let loaded = source.load_tile(&key.tile_id)?;
        let tile = Arc::new(resize_clipped(&loaded, key.size, key.width, key.height)?);
        self.put(key.clone(), Arc::clone(&tile));
        Ok(tile)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Maximum total size in bytes.
    pub fn capacity(&self) -> usize {
        self.max_size
    }

    /// Current total size of cached pixels in bytes.
    pub fn size(&self) -> usize {
        self.lock().current_size
    }

    /// Drop every cached tile.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.current_size = 0;
    }

    /// `(hits, misses)` since the cache was created.
    pub fn stats(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TileCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Bytes held by a tile's pixel buffer.
fn tile_bytes(tile: &RgbaImage) -> usize {
    tile.as_raw().len()
}

// =============================================================================
// Tests
// =============================================================================
