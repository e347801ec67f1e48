use std::fmt::Display;

use thiserror::Error;

/// Errors produced while indexing tiles or building a mosaic.
///
/// Per-tile `Io` and `Decode` failures are normally logged and skipped by the
/// index builder and the region renderer; they only reach callers when a
/// whole directory or upload is unreadable.
#[derive(Debug, Clone, Error)]
pub enum MosaicError {
    /// A tile, source file or directory could not be opened or read
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    /// The file was read but is not a decodable image
    #[error("Failed to decode {path}: {message}")]
    Decode { path: String, message: String },

    /// Tile size must be a positive number of pixels
    #[error("Invalid tile size: {tile_size} (must be greater than 0)")]
    InvalidTileSize { tile_size: i64 },

    /// A job parameter is missing or malformed
    #[error("Invalid parameter {name}: {message}")]
    InvalidParameter { name: &'static str, message: String },

    /// The image has zero width or height
    #[error("Image is empty (zero width or height)")]
    EmptyImage,

    /// No usable tiles were found in the tile directory
    #[error("No usable tiles found in {source_name}")]
    EmptyTileIndex { source_name: String },

    /// The final mosaic could not be serialized
    #[error("Failed to encode mosaic: {message}")]
    Encode { message: String },

    /// A blocking worker carrying the job failed to complete
    #[error("Mosaic worker failed: {message}")]
    Worker { message: String },
}

impl MosaicError {
    /// Build an [`MosaicError::Io`] from a path and any displayable error.
    pub fn io(path: impl Display, err: impl Display) -> Self {
        MosaicError::Io {
            path: path.to_string(),
            message: err.to_string(),
        }
    }

    /// Build a [`MosaicError::Decode`] from a path and any displayable error.
    pub fn decode(path: impl Display, err: impl Display) -> Self {
        MosaicError::Decode {
            path: path.to_string(),
            message: err.to_string(),
        }
    }

    /// Whether this error describes bad job parameters rather than a failure
    /// while processing them.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            MosaicError::InvalidTileSize { .. }
                | MosaicError::InvalidParameter { .. }
                | MosaicError::EmptyImage
                | MosaicError::EmptyTileIndex { .. }
        )
    }
}

impl From<tokio::task::JoinError> for MosaicError {
    fn from(err: tokio::task::JoinError) -> Self {
        MosaicError::Worker {
            message: err.to_string(),
        }
    }
}
