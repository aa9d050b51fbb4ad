//! Matrixviz Display - Pixel Surfaces
//!
//! This crate provides the output side of Matrixviz:
//! - `Rgb` pixel type with the color math every renderer needs
//! - `Canvas` / `MatrixDisplay` traits implemented by every backend
//! - `FrameBuffer`, an in-memory double buffer (tests, benchmarks, headless runs)
//! - `TerminalDisplay`, a truecolor terminal emulation of an LED panel

mod canvas;
mod error;
mod framebuffer;
mod pixel;
mod terminal;

pub use canvas::{Canvas, MatrixDisplay};
pub use error::{DisplayError, DisplayResult};
pub use framebuffer::FrameBuffer;
pub use pixel::Rgb;
pub use terminal::TerminalDisplay;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_exports() {
        let mut fb = FrameBuffer::new(64, 32).unwrap();
        fb.set_pixel(0, 0, Rgb::WHITE);
        assert_eq!(fb.width(), 64);
    }
}
