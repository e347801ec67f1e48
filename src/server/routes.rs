//! Router configuration for the mosaic server.
//!
//! # Route Structure
//!
//! ```text
//! /                 - Upload form
//! /mosaic           - Mosaic endpoint (multipart POST)
//! /health           - Health check
//! /tiles/rebuild    - Rescan the tile directory (POST)
//! /static/*         - Static files (only with a static directory)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tile_mosaic::index::{FsTileSource, TileIndex};
//! use tile_mosaic::mosaic::MosaicService;
//! use tile_mosaic::server::{create_router, RouterConfig};
//!
//! let index = TileIndex::build(Arc::new(FsTileSource::new("tiles")))?;
//! let service = MosaicService::new(Arc::new(index));
//!
//! let config = RouterConfig::new().with_static_dir("static");
//! let router = create_router(service, config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::{DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_TILE_SIZE};
use crate::mosaic::MosaicService;

use super::handlers::{health_handler, index_handler, mosaic_handler, rebuild_handler, AppState};

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Largest accepted request body in bytes
    pub max_upload_bytes: usize,

    /// Tile size used when the upload form leaves it blank
    pub default_tile_size: u32,

    /// Directory served under `/static`
    pub static_dir: Option<PathBuf>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a router configuration.
    ///
    /// By default:
    /// - Uploads are limited to 10 MiB
    /// - The default tile size is 15 pixels
    /// - No static directory is served
    /// - Tracing is enabled
    pub fn new() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            default_tile_size: DEFAULT_TILE_SIZE,
            static_dir: None,
            enable_tracing: true,
        }
    }

    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    pub fn with_default_tile_size(mut self, tile_size: u32) -> Self {
        self.default_tile_size = tile_size;
        self
    }

    /// Serve files from `dir` under `/static`.
    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(dir.into());
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// # Arguments
///
/// * `service` - The mosaic service handling uploads
/// * `config` - Router configuration
pub fn create_router(service: MosaicService, config: RouterConfig) -> Router {
    let state = AppState::new(Arc::new(service)).with_default_tile_size(config.default_tile_size);

    let mut router = Router::new()
        .route("/", get(index_handler))
        .route("/mosaic", post(mosaic_handler))
        .route("/health", get(health_handler))
        .route("/tiles/rebuild", post(rebuild_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes));

    if let Some(dir) = &config.static_dir {
        router = router.nest_service("/static", ServeDir::new(dir));
    }

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}
