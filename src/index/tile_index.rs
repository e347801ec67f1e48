//! Tile index: tile identifier to average color.
//!
//! The index is built once at startup by scanning a [`TileSource`] and can be
//! rebuilt later. Jobs never read it directly; they take a
//! [`TileIndexSnapshot`] and work from that.
//!
//! # Locking
//!
//! The current map sits behind an `RwLock<Arc<..>>`. A snapshot copies the map
//! under the read lock. A rebuild scans the source with no lock held and only
//! takes the write lock to swap the finished map in, so a snapshot sees either
//! the old map or the new one in full.
//!
//! Every swap bumps a generation counter stored alongside the map. Snapshots
//! carry the generation they were copied from, and the tile cache keys on it,
//! so tiles resized for a job that started before a rebuild are never served
//! to a job that started after it.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info, warn};

use crate::color::{average_color, Color3};
use crate::error::MosaicError;

use super::snapshot::{TileEntry, TileIndexSnapshot};
use super::source::TileSource;

type ColorMap = BTreeMap<String, Color3>;

/// Current map plus the number of rebuilds that produced it.
struct Contents {
    map: Arc<ColorMap>,
    generation: u64,
}

impl Contents {
    fn initial(map: ColorMap) -> Self {
        Self {
            map: Arc::new(map),
            generation: 0,
        }
    }
}

/// Outcome of one index scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Tiles decoded and added to the index
    pub indexed: usize,

    /// Tiles skipped because they could not be opened or decoded
    pub skipped: usize,
}

/// Process-wide tile color index.
///
/// Share it behind an `Arc`; every method takes `&self`.
pub struct TileIndex {
    /// Where tiles are listed and loaded from
    source: Arc<dyn TileSource>,

    /// Current id -> average color map and its generation
    contents: RwLock<Contents>,
}

impl TileIndex {
    /// Build an index by scanning every tile in `source`.
    ///
    /// Tiles that fail to open or decode are logged and skipped. An index
    /// with no usable tiles is still returned.
    ///
    /// # Errors
    ///
    /// Returns an error only if the source cannot be listed at all.
    pub fn build(source: Arc<dyn TileSource>) -> Result<Self, MosaicError> {
        let (entries, _) = scan(source.as_ref())?;
        Ok(Self {
            source,
            contents: RwLock::new(Contents::initial(entries)),
        })
    }

    /// Create an index from precomputed colors, without scanning the source.
    pub fn from_entries<S, I>(source: Arc<dyn TileSource>, entries: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, Color3)>,
    {
        let entries = entries
            .into_iter()
            .map(|(id, color)| (id.into(), color))
            .collect();
        Self {
            source,
            contents: RwLock::new(Contents::initial(entries)),
        }
    }

    /// Rescan the source and replace the current contents.
    ///
    /// On error the previous contents are kept.
    pub fn rebuild(&self) -> Result<IndexStats, MosaicError> {
        let (entries, stats) = scan(self.source.as_ref())?;

        let mut current = self.contents.write().unwrap_or_else(PoisonError::into_inner);
        current.map = Arc::new(entries);
        current.generation += 1;
        debug!(generation = current.generation, "Swapped in rebuilt tile index");

        Ok(stats)
    }

    /// Take an independent copy of the current contents.
    pub fn snapshot(&self) -> TileIndexSnapshot {
        let current = self.contents.read().unwrap_or_else(PoisonError::into_inner);
        let entries = current
            .map
            .iter()
            .map(|(id, color)| TileEntry::new(id.clone(), *color))
            .collect();
        TileIndexSnapshot::new(entries).with_generation(current.generation)
    }

    /// Number of successful rebuilds since the index was created.
    pub fn generation(&self) -> u64 {
        self.contents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .generation
    }

    /// Average color of one tile, if indexed.
    pub fn get(&self, tile_id: &str) -> Option<Color3> {
        self.current().get(tile_id).copied()
    }

    pub fn len(&self) -> usize {
        self.current().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current().is_empty()
    }

    /// The source this index was built from.
    pub fn source(&self) -> &Arc<dyn TileSource> {
        &self.source
    }

    fn current(&self) -> Arc<ColorMap> {
        Arc::clone(&self.contents.read().unwrap_or_else(PoisonError::into_inner).map)
    }
}

/// Compute the average color of every tile the source lists.
fn scan(source: &dyn TileSource) -> Result<(ColorMap, IndexStats), MosaicError> {
    let name = source.name();
    info!("Populating tile index from {}", name);

    let tile_ids = source.list_tiles()?;
    let mut entries = ColorMap::new();
    let mut stats = IndexStats::default();

    for tile_id in tile_ids {
        let image = match source.load_tile(&tile_id) {
            Ok(image) => image,
            Err(e) => {
                warn!(tile = %tile_id, error = %e, "Skipping tile");
                stats.skipped += 1;
                continue;
            }
        };

        match average_color(&image) {
            Some(color) => {
                debug!(tile = %tile_id, r = color.r, g = color.g, b = color.b, "Indexed tile");
                entries.insert(tile_id, color);
                stats.indexed += 1;
            }
            None => {
                warn!(tile = %tile_id, "Skipping empty tile");
                stats.skipped += 1;
            }
        }
    }

    info!(
        indexed = stats.indexed,
        skipped = stats.skipped,
        "Finished populating tile index from {}",
        name
    );
    Ok((entries, stats))
}
