//! Display Surface Traits
//!
//! Defines the interface every matrix backend must provide.
//!
//! Coordinates have their origin in the top-left corner: `x` grows to the
//! right, `y` grows downwards. Renderers that draw bars bottom-up map a bar
//! row `j` to `y = height - 1 - j`.

use crate::error::DisplayResult;
use crate::pixel::Rgb;

/// A writable grid of pixels
pub trait Canvas {
    /// Number of columns
    fn width(&self) -> usize;

    /// Number of rows
    fn height(&self) -> usize;

    /// Set every pixel to black
    fn clear(&mut self);

    /// Write one pixel. Coordinates outside the grid are ignored.
    fn set_pixel(&mut self, x: usize, y: usize, color: Rgb);
}

/// A canvas that can be shown on physical (or emulated) hardware
///
/// Drawing happens off-screen; `present` makes the finished frame visible.
pub trait MatrixDisplay: Canvas {
    fn present(&mut self) -> DisplayResult<()>;
}
