//! Point-sampled square resizing of tile images.
//!
//! # Sampling rule
//!
//! - The step is the integer ratio `source_width / target`.
//! - Output pixel `(i, j)` copies source pixel `(i * step, j * step)`.
//! - When the ratio does not divide evenly, the trailing source rows and
//!   columns are simply never sampled. There is no interpolation.
//!
//! # Edge policy
//!
//! - Upscaling (`source_width < target`) would give a step of 0; the step is
//!   clamped to 1 instead.
//! - Sample coordinates past the source edge (upscaling, or a source that is
//!   not square) are clamped to the last row or column, so edge pixels are
//!   repeated.
//!
//! # Clipping
//!
//! [`resize_clipped`] produces only the corner of a cell that is visible
//! inside a region, so a tile size far larger than the source never
//! allocates a full `target x target` buffer.

use image::RgbaImage;

use crate::error::MosaicError;

/// Resize `tile` to exactly `target x target` pixels.
///
/// # Errors
///
/// - [`MosaicError::InvalidTileSize`] if `target` is 0
/// - [`MosaicError::EmptyImage`] if `tile` has no pixels
pub fn resize(tile: &RgbaImage, target: u32) -> Result<RgbaImage, MosaicError> {
    resize_clipped(tile, target, target, target)
}

/// Resize `tile` to `target x target` but only produce the top-left
/// `width x height` corner of the result.
///
/// Pixels are sampled exactly as [`resize`] would sample them, so the output
/// equals the same corner of the full resize. `width` and `height` are
/// capped at `target`. The cost is bounded by the visible area, not by
/// `target`.
///
/// # Errors
///
/// - [`MosaicError::InvalidTileSize`] if `target` is 0
/// - [`MosaicError::EmptyImage`] if `tile` has no pixels
pub fn resize_clipped(
    tile: &RgbaImage,
    target: u32,
    width: u32,
    height: u32,
) -> Result<RgbaImage, MosaicError> {
    if target == 0 {
        return Err(MosaicError::InvalidTileSize { tile_size: 0 });
    }

    let (tile_width, tile_height) = tile.dimensions();
    if tile_width == 0 || tile_height == 0 {
        return Err(MosaicError::EmptyImage);
    }

    let step = u64::from(sample_step(tile_width, target));
    let last_x = tile_width - 1;
    let last_y = tile_height - 1;

    Ok(RgbaImage::from_fn(
        width.min(target),
        height.min(target),
        |i, j| {
            let x = clamp_coord(u64::from(i) * step, last_x);
            let y = clamp_coord(u64::from(j) * step, last_y);
            *tile.get_pixel(x, y)
        },
    ))
}

#[inline]
fn clamp_coord(coord: u64, last: u32) -> u32 {
    u32::try_from(coord).map_or(last, |c| c.min(last))
}

/// Source pixels advanced per output pixel, never less than 1.
#[inline]
pub fn sample_step(source_width: u32, target: u32) -> u32 {
    (source_width / target).max(1)
}
