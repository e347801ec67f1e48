//! Quadrant partition of the source image and the disjoint canvas views the
//! compositors write through.

use image::RgbaImage;

/// Position of a region within the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::TopLeft,
        Quadrant::TopRight,
        Quadrant::BottomLeft,
        Quadrant::BottomRight,
    ];

    /// Position in [`Quadrant::ALL`].
    pub const fn index(self) -> usize {
        match self {
            Quadrant::TopLeft => 0,
            Quadrant::TopRight => 1,
            Quadrant::BottomLeft => 2,
            Quadrant::BottomRight => 3,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Quadrant::TopLeft => "top_left",
            Quadrant::TopRight => "top_right",
            Quadrant::BottomLeft => "bottom_left",
            Quadrant::BottomRight => "bottom_right",
        }
    }
}

/// Half-open rectangle `[x1, x2) x [y1, y2)` of the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub quadrant: Quadrant,
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl Region {
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x1 && x < self.x2 && y >= self.y1 && y < self.y2
    }
}

/// Split a `width x height` image into four quadrants around the integer
/// midpoints `width / 2` and `height / 2`.
///
/// On odd dimensions the right and bottom quadrants are one pixel larger, so
/// the union is always exactly the whole image. For a 1-pixel-wide or -tall
/// image the left or top quadrants are empty.
///
/// Returned in [`Quadrant::ALL`] order.
pub fn quadrants(width: u32, height: u32) -> [Region; 4] {
    let mx = width / 2;
    let my = height / 2;

    Quadrant::ALL.map(|quadrant| {
        let (x1, x2) = match quadrant {
            Quadrant::TopLeft | Quadrant::BottomLeft => (0, mx),
            Quadrant::TopRight | Quadrant::BottomRight => (mx, width),
        };
        let (y1, y2) = match quadrant {
            Quadrant::TopLeft | Quadrant::TopRight => (0, my),
            Quadrant::BottomLeft | Quadrant::BottomRight => (my, height),
        };
        Region {
            quadrant,
            x1,
            y1,
            x2,
            y2,
        }
    })
}

// =============================================================================
// Composite Targets
// =============================================================================

/// Mutable view of one quadrant of the output canvas.
///
/// Holds one byte slice per canvas row, covering exactly the quadrant's
/// columns. The four targets produced by [`split_canvas`] borrow disjoint
/// parts of the canvas, so they can be written from separate threads and
/// none of them can reach outside its own quadrant.
pub struct CompositeTarget<'a> {
    region: Region,
    rows: Vec<&'a mut [u8]>,
}

impl CompositeTarget<'_> {
    pub fn region(&self) -> Region {
        self.region
    }

    /// Copy a rendered region buffer into this quadrant, overwriting every
    /// pixel.
    ///
    /// # Panics
    ///
    /// Panics if `buffer` is not exactly the size of the region.
    pub fn composite(mut self, buffer: &RgbaImage) {
        assert_eq!(
            buffer.dimensions(),
            (self.region.width(), self.region.height()),
            "region buffer does not match {} quadrant",
            self.region.quadrant.name()
        );
        if self.region.is_empty() {
            return;
        }

        let row_len = self.region.width() as usize * 4;
        for (dst, src) in self.rows.iter_mut().zip(buffer.as_raw().chunks_exact(row_len)) {
            dst.copy_from_slice(src);
        }
    }
}

/// Split `canvas` into four non-overlapping views, one per quadrant of
/// `regions` (as returned by [`quadrants`] for the canvas dimensions).
///
/// Returned in [`Quadrant::ALL`] order.
pub fn split_canvas<'a>(canvas: &'a mut RgbaImage, regions: &[Region; 4]) -> [CompositeTarget<'a>; 4] {
    let width = canvas.width() as usize;
    let mx = regions[Quadrant::TopLeft.index()].x2 as usize;
    let my = regions[Quadrant::TopLeft.index()].y2 as usize;

    let mut targets = regions.map(|region| CompositeTarget {
        region,
        rows: Vec::with_capacity(region.height() as usize),
    });

    if width == 0 {
        return targets;
    }

    for (y, row) in canvas.chunks_exact_mut(width * 4).enumerate() {
        let (left, right) = row.split_at_mut(mx * 4);
        let (left_quadrant, right_quadrant) = if y < my {
            (Quadrant::TopLeft, Quadrant::TopRight)
        } else {
            (Quadrant::BottomLeft, Quadrant::BottomRight)
        };
        targets[left_quadrant.index()].rows.push(left);
        targets[right_quadrant.index()].rows.push(right);
    }

    targets
}
