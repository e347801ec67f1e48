//! Tile storage backends.

use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageReader, RgbaImage};

use crate::error::MosaicError;

/// Trait for listing and loading tile images by identifier.
///
/// The index and the renderers only ever talk to tiles through this trait,
/// which keeps them independent of where the tiles live. Implementations are
/// called from blocking worker threads, never from async tasks directly.
pub trait TileSource: Send + Sync {
    /// Identifiers of every candidate tile, in a stable order.
    fn list_tiles(&self) -> Result<Vec<String>, MosaicError>;

    /// Open and decode the tile with the given identifier.
    fn load_tile(&self, tile_id: &str) -> Result<RgbaImage, MosaicError>;

    /// Human-readable name used in log lines and errors.
    fn name(&self) -> String;
}

/// Flat directory of tile images on the local filesystem.
///
/// Identifiers are file names relative to the directory. Subdirectories and
/// hidden files are ignored.
#[derive(Debug, Clone)]
pub struct FsTileSource {
    root: PathBuf,
}

impl FsTileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn tile_path(&self, tile_id: &str) -> PathBuf {
        self.root.join(tile_id)
    }
}

impl TileSource for FsTileSource {
    fn list_tiles(&self) -> Result<Vec<String>, MosaicError> {
        let entries =
            fs::read_dir(&self.root).map_err(|e| MosaicError::io(self.root.display(), e))?;

        let mut tiles = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| MosaicError::io(self.root.display(), e))?;
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }

            // Non UTF-8 names cannot round-trip through the index key
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            tiles.push(name);
        }

        tiles.sort();
        Ok(tiles)
    }

    fn load_tile(&self, tile_id: &str) -> Result<RgbaImage, MosaicError> {
        let path = self.tile_path(tile_id);

        let reader = ImageReader::open(&path)
            .and_then(|r| r.with_guessed_format())
            .map_err(|e| MosaicError::io(path.display(), e))?;

        let image = reader
            .decode()
            .map_err(|e| MosaicError::decode(path.display(), e))?;

        Ok(image.into_rgba8())
    }

    fn name(&self) -> String {
        self.root.display().to_string()
    }
}
