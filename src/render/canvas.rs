//! # Monochrome Canvas
//!
//! A fixed-size 1-bit pixel grid. `true` is a printable (black) dot.
//!
//! ```text
//! (0,0) ──────────────────────► x (width dots)
//!   │
//!   │   one bool per dot, row-major
//!   ▼
//!   y (height rows, paper feed direction)
//! ```

use image::{GrayImage, Luma};

/// A 1-bit image of exact device dimensions.
///
/// Immutable once built: the pixel grid can only be produced by one of the
/// constructors, and every constructor checks its dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonochromeCanvas {
    width: usize,
    height: usize,
    pixels: Vec<bool>,
}

impl MonochromeCanvas {
    /// All-white canvas.
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, false)
    }

    /// Canvas with every dot set to `black`.
    pub fn filled(width: usize, height: usize, black: bool) -> Self {
        Self {
            width,
            height,
            pixels: vec![black; width * height],
        }
    }

    /// Build a canvas by evaluating `f(x, y)` for every dot.
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> bool,
    {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Wrap an existing row-major pixel vector. Returns `None` if
    /// `pixels.len() != width * height`.
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<bool>) -> Option<Self> {
        (pixels.len() == width * height).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Synthetic calibration canvas used instead of a logo image.
    ///
    /// A 1-dot border, the left half of the second row filled, and a
    /// falling diagonal. Every candidate encoding mode produces a different
    /// byte stream for it, so a printout shows at a glance whether rows,
    /// columns or bit order came out swapped.
    pub fn test_pattern(width: usize, height: usize) -> Self {
        Self::from_fn(width, height, |x, y| {
            let border = x == 0 || y == 0 || x + 1 == width || y + 1 == height;
            let marker = y == 1 && x < width / 2;
            let diagonal = height > 0 && x * height / width.max(1) == y;
            border || marker || diagonal
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Bytes per row: `ceil(width / 8)`.
    #[inline]
    pub fn width_bytes(&self) -> usize {
        self.width.div_ceil(8)
    }

    /// Number of 8-row slices: `ceil(height / 8)`.
    #[inline]
    pub fn height_slices(&self) -> usize {
        self.height.div_ceil(8)
    }

    /// Dot at `(x, y)`. Coordinates outside the canvas read as white, which
    /// is what pads partial bytes and partial slices.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.pixels[y * self.width + x]
    }

    /// Number of black dots.
    pub fn black_count(&self) -> usize {
        self.pixels.iter().filter(|&&p| p).count()
    }

    /// Row-major dots.
    pub fn pixels(&self) -> &[bool] {
        &self.pixels
    }

    /// Grayscale preview image: black dots are 0, white dots 255.
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            Luma([if self.get(x as usize, y as usize) { 0 } else { 255 }])
        })
    }
}
