//! HTTP request handlers for the mosaic server.
//!
//! # Endpoints
//!
//! - `GET /` - Upload form
//! - `POST /mosaic` - Build a mosaic from a multipart upload
//! - `GET /health` - Health check with the current tile count
//! - `POST /tiles/rebuild` - Rescan the tile directory

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::DEFAULT_TILE_SIZE;
use crate::error::MosaicError;
use crate::mosaic::MosaicService;

use super::pages::{results_page, upload_page};

/// Multipart field carrying the source image.
pub const IMAGE_FIELD: &str = "image";

/// Multipart field carrying the tile size.
pub const TILE_SIZE_FIELD: &str = "tile_size";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state passed to all handlers via Axum's State
/// extractor.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MosaicService>,

    /// Tile size used when the form leaves the field blank
    pub default_tile_size: u32,
}

impl AppState {
    pub fn new(service: Arc<MosaicService>) -> Self {
        Self {
            service,
            default_tile_size: DEFAULT_TILE_SIZE,
        }
    }

    pub fn with_default_tile_size(mut self, tile_size: u32) -> Self {
        self.default_tile_size = tile_size;
        self
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "invalid_request", "invalid_image")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,

    /// Tiles currently indexed
    pub tiles: usize,
}

/// Response from the index rebuild endpoint.
#[derive(Debug, Serialize)]
pub struct RebuildResponse {
    /// Tiles in the index after the rebuild
    pub tiles: usize,

    /// Files skipped because they could not be decoded
    pub skipped: usize,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Status code and error type identifier for a mosaic error.
pub fn error_status(err: &MosaicError) -> (StatusCode, &'static str) {
    match err {
        MosaicError::InvalidTileSize { .. } | MosaicError::InvalidParameter { .. } => {
            (StatusCode::BAD_REQUEST, "invalid_request")
        }
        MosaicError::Decode { .. } | MosaicError::EmptyImage => {
            (StatusCode::BAD_REQUEST, "invalid_image")
        }
        MosaicError::EmptyTileIndex { .. } => (StatusCode::BAD_REQUEST, "empty_tile_index"),
        MosaicError::Io { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
        MosaicError::Encode { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "encode_error"),
        MosaicError::Worker { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    }
}

/// Convert a MosaicError to an HTTP response.
///
/// - 4xx errors are logged at WARN level (client errors)
/// - 5xx errors are logged at ERROR level (server errors)
impl IntoResponse for MosaicError {
    fn into_response(self) -> Response {
        let (status, error_type) = error_status(&self);
        let message = self.to_string();

        if status.is_server_error() {
            error!(error_type, %message, "Mosaic request failed");
        } else {
            warn!(error_type, %message, "Rejected mosaic request");
        }

        let body = ErrorResponse::with_status(error_type, message, status);
        (status, Json(body)).into_response()
    }
}

/// Errors a handler can return.
#[derive(Debug)]
pub enum HandlerError {
    /// The job itself failed or was rejected
    Mosaic(MosaicError),

    /// The multipart body could not be read (malformed or over the size limit)
    Upload(MultipartError),
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        match self {
            HandlerError::Mosaic(err) => err.into_response(),
            HandlerError::Upload(err) => {
                let status = err.status();
                let message = err.body_text();
                let error_type = if status == StatusCode::PAYLOAD_TOO_LARGE {
                    "upload_too_large"
                } else {
                    "invalid_upload"
                };
                debug!(error_type, %message, "Rejected upload");

                let body = ErrorResponse::with_status(error_type, message, status);
                (status, Json(body)).into_response()
            }
        }
    }
}

impl From<MosaicError> for HandlerError {
    fn from(err: MosaicError) -> Self {
        HandlerError::Mosaic(err)
    }
}

impl From<MultipartError> for HandlerError {
    fn from(err: MultipartError) -> Self {
        HandlerError::Upload(err)
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Serve the upload form.
///
/// `GET /`
pub async fn index_handler(State(state): State<AppState>) -> Html<String> {
    Html(upload_page(state.default_tile_size))
}

/// Build a mosaic from an uploaded image.
///
/// # Endpoint
///
/// `POST /mosaic` with a `multipart/form-data` body
///
/// # Fields
///
/// - `image`: the source image (JPEG, PNG or GIF)
/// - `tile_size`: cell edge length in pixels; blank uses the server default
///
/// # Response
///
/// `200 OK` with an HTML page showing the original and the mosaic.
///
/// # Errors
///
/// - `400 Bad Request`: missing image, bad tile size, undecodable image
/// - `413 Payload Too Large`: upload exceeds the configured limit
/// - `500 Internal Server Error`: encoding or worker failure
pub async fn mosaic_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Html<String>, HandlerError> {
    let mut upload: Option<Bytes> = None;
    let mut tile_size_field: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(IMAGE_FIELD) => upload = Some(field.bytes().await?),
            Some(TILE_SIZE_FIELD) => tile_size_field = Some(field.text().await?),
            _ => debug!(field = ?name, "Ignoring unknown form field"),
        }
    }

    let upload = upload
        .filter(|data| !data.is_empty())
        .ok_or(MosaicError::InvalidParameter {
            name: IMAGE_FIELD,
            message: "no image uploaded".to_string(),
        })?;
    let tile_size = parse_tile_size(tile_size_field.as_deref(), state.default_tile_size)?;

    let response = state.service.create_mosaic(upload, tile_size).await?;
    Ok(Html(results_page(&response)))
}

/// Health check endpoint.
///
/// `GET /health`
///
/// ```json
/// { "status": "healthy", "version": "0.1.0", "tiles": 512 }
/// ```
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        tiles: state.service.tile_count(),
    })
}

/// Rescan the tile directory.
///
/// `POST /tiles/rebuild`
///
/// Jobs already running finish against the index they started with.
pub async fn rebuild_handler(
    State(state): State<AppState>,
) -> Result<Json<RebuildResponse>, HandlerError> {
    let stats = state.service.rebuild_index().await?;
    info!(tiles = stats.indexed, "Index rebuilt on request");

    Ok(Json(RebuildResponse {
        tiles: stats.indexed,
        skipped: stats.skipped,
    }))
}

/// Read the tile size form field; blank or absent falls back to `default`.
///
/// Range checking is left to the mosaic service so that every entry point
/// rejects bad sizes the same way.
fn parse_tile_size(field: Option<&str>, default: u32) -> Result<i64, MosaicError> {
    match field.map(str::trim) {
        None | Some("") => Ok(i64::from(default)),
        Some(value) => value.parse().map_err(|_| MosaicError::InvalidParameter {
            name: TILE_SIZE_FIELD,
            message: format!("'{}' is not a whole number", value),
        }),
    }
}

// =============================================================================
// Tests
// =============================================================================
