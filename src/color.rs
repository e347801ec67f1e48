//! Color signatures for tiles and sampled source pixels.
//!
//! Every color in the crate lives on the same scale: the 8-bit channel value
//! of a pixel, stored as `f64` so averages keep their fractional part.

use image::{Rgba, RgbaImage};

/// An `(r, g, b)` channel triple on the 0-255 scale.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color3 {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color3 {
    pub const BLACK: Color3 = Color3::new(0.0, 0.0, 0.0);
    pub const WHITE: Color3 = Color3::new(255.0, 255.0, 255.0);

    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Color of a single pixel. Alpha is ignored.
    pub fn from_pixel(pixel: &Rgba<u8>) -> Self {
        let [r, g, b, _] = pixel.0;
        Self::new(r as f64, g as f64, b as f64)
    }

    /// Euclidean distance between two colors.
    pub fn distance(&self, other: &Color3) -> f64 {
        let dr = self.r - other.r;
        let dg = self.g - other.g;
        let db = self.b - other.b;
        (dr * dr + dg * dg + db * db).sqrt()
    }
}

/// Mean of each channel over every pixel of `image`.
///
/// Returns `None` for an image with no pixels.
pub fn average_color(image: &RgbaImage) -> Option<Color3> {
    let total = image.width() as u64 * image.height() as u64;
    if total == 0 {
        return None;
    }

    let (mut r, mut g, mut b) = (0.0, 0.0, 0.0);
    for pixel in image.pixels() {
        r += pixel[0] as f64;
        g += pixel[1] as f64;
        b += pixel[2] as f64;
    }

    let total = total as f64;
    Some(Color3::new(r / total, g / total, b / total))
}

/// Color of the single pixel at `(x, y)`.
///
/// # Panics
///
/// Panics if `(x, y)` is outside the image.
#[inline]
pub fn sample_color(image: &RgbaImage, x: u32, y: u32) -> Color3 {
    Color3::from_pixel(image.get_pixel(x, y))
}
