//! Configuration management for the mosaic server.
//!
//! Options come from:
//! - Command-line arguments via clap
//! - Environment variables with the `MOSAIC_` prefix
//! - Defaults for everything else
//!
//! # Subcommands
//!
//! - `serve` - index the tile directory and start the HTTP server
//! - `render` - build one mosaic from a file on disk and exit
//!
//! # Environment Variables
//!
//! - `MOSAIC_HOST` - Server bind address (default: 0.0.0.0)
//! - `MOSAIC_PORT` - Server port (default: 8080)
//! - `MOSAIC_TILES_DIR` - Directory of tile images (default: tiles)
//! - `MOSAIC_STATIC_DIR` - Directory served under `/static` (default: none)
//! - `MOSAIC_JPEG_QUALITY` - JPEG quality for served images (default: 75)
//! - `MOSAIC_DEFAULT_TILE_SIZE` - Tile size when the form leaves it blank (default: 15)
//! - `MOSAIC_MAX_UPLOAD_BYTES` - Request body limit (default: 10 MiB)
//! - `MOSAIC_CACHE_TILES` - Resized tile cache budget in bytes (default: 64 MiB)
//! - `MOSAIC_ALLOW_EMPTY_INDEX` - Start even if no tiles were indexed

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::mosaic::{is_valid_quality, DEFAULT_JPEG_QUALITY, DEFAULT_TILE_CACHE_CAPACITY};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default tile directory.
pub const DEFAULT_TILES_DIR: &str = "tiles";

/// Tile size used when a request does not name one.
pub const DEFAULT_TILE_SIZE: u32 = 15;

/// Default request body limit (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Tile Mosaic - builds photo mosaics out of a directory of tile images.
#[derive(Parser, Debug, Clone)]
#[command(name = "tile-mosaic")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Index the tile directory and serve the upload form.
    Serve(ServeConfig),

    /// Build a single mosaic from an image file.
    Render(RenderConfig),
}

// =============================================================================
// Serve Configuration
// =============================================================================

#[derive(Parser, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "MOSAIC_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "MOSAIC_PORT")]
    pub port: u16,

    /// Directory served under `/static`.
    ///
    /// If not specified, no `/static` route is mounted.
    #[arg(long, env = "MOSAIC_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    /// Largest accepted request body, in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES, env = "MOSAIC_MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: usize,

    // =========================================================================
    // Tile Configuration
    // =========================================================================
    /// Flat directory of tile images.
    #[arg(long, default_value = DEFAULT_TILES_DIR, env = "MOSAIC_TILES_DIR")]
    pub tiles_dir: PathBuf,

    /// Start even when no usable tiles are found.
    ///
    /// Mosaics built from an empty index are entirely blank.
    #[arg(long, default_value_t = false, env = "MOSAIC_ALLOW_EMPTY_INDEX")]
    pub allow_empty_index: bool,

    /// Resized tile cache budget in bytes (default: 64MB).
    ///
    /// Tiles are weighed by their decoded pixel buffer.
    #[arg(long, default_value_t = DEFAULT_TILE_CACHE_CAPACITY, env = "MOSAIC_CACHE_TILES")]
    pub cache_tiles: usize,

    // =========================================================================
    // Mosaic Configuration
    // =========================================================================
    /// JPEG quality for the mosaic and the original (1-100).
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY, env = "MOSAIC_JPEG_QUALITY")]
    pub jpeg_quality: u8,

    /// Tile size used when the upload form leaves it blank.
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE, env = "MOSAIC_DEFAULT_TILE_SIZE")]
    pub default_tile_size: u32,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.tiles_dir.as_os_str().is_empty() {
            return Err("Tile directory is required. Set --tiles-dir or MOSAIC_TILES_DIR".to_string());
        }

        if self.cache_tiles == 0 {
            return Err("cache_tiles must be greater than 0".to_string());
        }

        if self.max_upload_bytes == 0 {
            return Err("max_upload_bytes must be greater than 0".to_string());
        }

        if !is_valid_quality(self.jpeg_quality) {
            return Err("jpeg_quality must be between 1 and 100".to_string());
        }

        if self.default_tile_size == 0 {
            return Err("default_tile_size must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// Render Configuration
// =============================================================================

#[derive(Parser, Debug, Clone)]
pub struct RenderConfig {
    /// Image to turn into a mosaic.
    #[arg(long)]
    pub source: PathBuf,

    /// Flat directory of tile images.
    #[arg(long, default_value = DEFAULT_TILES_DIR, env = "MOSAIC_TILES_DIR")]
    pub tiles_dir: PathBuf,

    /// Edge length of each mosaic cell in pixels.
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE)]
    pub tile_size: u32,

    /// Where to write the mosaic. A `.png` extension selects PNG, anything
    /// else JPEG.
    #[arg(short, long)]
    pub output: PathBuf,

    /// JPEG quality (1-100); ignored for PNG output.
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY, env = "MOSAIC_JPEG_QUALITY")]
    pub jpeg_quality: u8,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl RenderConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.tile_size == 0 {
            return Err("tile_size must be greater than 0".to_string());
        }

        if !is_valid_quality(self.jpeg_quality) {
            return Err("jpeg_quality must be between 1 and 100".to_string());
        }

        if self.source == self.output {
            return Err("output must not overwrite the source image".to_string());
        }

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
