//! Mosaic image encoder.
//!
//! # Design Decisions
//!
//! - **JPEG by default**: the mosaic and the original are both served as JPEG,
//!   which drops the alpha channel. Blank cells (transparent black in the
//!   canvas) come out black.
//!
//! - **PNG for exact output**: PNG keeps the alpha channel, so blank cells
//!   stay transparent. Used by the CLI when the output path ends in `.png`.
//!
//! - **No retries**: an encoding failure fails the job.

use std::path::Path;

use bytes::Bytes;
use image::buffer::ConvertBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage, RgbaImage};

use crate::error::MosaicError;

/// Default JPEG quality (1-100).
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Minimum allowed JPEG quality.
pub const MIN_JPEG_QUALITY: u8 = 1;

/// Maximum allowed JPEG quality.
pub const MAX_JPEG_QUALITY: u8 = 100;

// =============================================================================
// Output Format
// =============================================================================

/// Container format of an encoded mosaic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
}

impl OutputFormat {
    /// Pick a format from a file extension; anything but `.png` is JPEG.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("png") => OutputFormat::Png,
            _ => OutputFormat::Jpeg,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }
}

// =============================================================================
// Encoder
// =============================================================================

/// Encoder for finished mosaics (and for the original image shown beside
/// them).
#[derive(Debug, Clone, Copy)]
pub struct MosaicEncoder {
    format: OutputFormat,
    quality: u8,
}

impl MosaicEncoder {
    /// JPEG encoder at the given quality, clamped to 1-100.
    pub fn jpeg(quality: u8) -> Self {
        Self {
            format: OutputFormat::Jpeg,
            quality: clamp_quality(quality),
        }
    }

    /// Lossless PNG encoder.
    pub fn png() -> Self {
        Self {
            format: OutputFormat::Png,
            quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn with_format(format: OutputFormat, quality: u8) -> Self {
        match format {
            OutputFormat::Jpeg => Self::jpeg(quality),
            OutputFormat::Png => Self::png(),
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Encode `image` in this encoder's format.
    ///
    /// # Errors
    ///
    /// Returns [`MosaicError::Encode`] if the codec rejects the image.
    pub fn encode(&self, image: &RgbaImage) -> Result<Bytes, MosaicError> {
        let mut output = Vec::new();

        let result = match self.format {
            OutputFormat::Jpeg => {
                let rgb: RgbImage = image.convert();
                JpegEncoder::new_with_quality(&mut output, self.quality).write_image(
                    rgb.as_raw(),
                    rgb.width(),
                    rgb.height(),
                    ExtendedColorType::Rgb8,
                )
            }
            OutputFormat::Png => PngEncoder::new(&mut output).write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                ExtendedColorType::Rgba8,
            ),
        };

        result.map_err(|e| MosaicError::Encode {
            message: e.to_string(),
        })?;

        Ok(Bytes::from(output))
    }
}

impl Default for MosaicEncoder {
    fn default() -> Self {
        Self::jpeg(DEFAULT_JPEG_QUALITY)
    }
}

// =============================================================================
// Utility Functions
// =============================================================================

/// Returns `true` if quality is in the valid range (1-100).
#[inline]
pub fn is_valid_quality(quality: u8) -> bool {
    (MIN_JPEG_QUALITY..=MAX_JPEG_QUALITY).contains(&quality)
}

/// Clamp quality to the valid range.
#[inline]
pub fn clamp_quality(quality: u8) -> u8 {
    quality.clamp(MIN_JPEG_QUALITY, MAX_JPEG_QUALITY)
}

// =============================================================================
// Tests
// =============================================================================
