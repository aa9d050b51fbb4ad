//! In-Memory Frame Buffer
//!
//! A double-buffered canvas with no hardware attached. The renderer draws
//! into the back buffer; `present` copies it to the front buffer.
//!
//! The buffer also counts writes per pixel since the last `clear`, which
//! makes overdraw visible when checking renderers.

use crate::canvas::{Canvas, MatrixDisplay};
use crate::error::{DisplayError, DisplayResult};
use crate::pixel::Rgb;

#[derive(Debug, Clone)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    back: Vec<Rgb>,
    front: Vec<Rgb>,
    writes: Vec<u32>,
    frames_presented: u64,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> DisplayResult<Self> {
        if width == 0 || height == 0 {
            return Err(DisplayError::InvalidDimensions { width, height });
        }

        let len = width * height;
        Ok(Self {
            width,
            height,
            back: vec![Rgb::BLACK; len],
            front: vec![Rgb::BLACK; len],
            writes: vec![0; len],
            frames_presented: 0,
        })
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    /// Pixel in the frame currently being drawn
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        self.index(x, y).map(|i| self.back[i])
    }

    /// Pixel in the last presented frame
    pub fn presented_pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        self.index(x, y).map(|i| self.front[i])
    }

    /// Number of `set_pixel` calls that hit (x, y) since the last clear
    pub fn writes(&self, x: usize, y: usize) -> u32 {
        self.index(x, y).map(|i| self.writes[i]).unwrap_or(0)
    }

    pub fn total_writes(&self) -> u64 {
        self.writes.iter().map(|&w| w as u64).sum()
    }

    /// Count of pixels in the back buffer that are not black
    pub fn lit_pixels(&self) -> usize {
        self.back.iter().filter(|c| !c.is_black()).count()
    }

    /// Rows of the back buffer, top first
    pub fn rows(&self) -> impl Iterator<Item = &[Rgb]> {
        self.back.chunks(self.width)
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }
}

impl Canvas for FrameBuffer {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn clear(&mut self) {
        self.back.fill(Rgb::BLACK);
        self.writes.fill(0);
    }

    #[inline]
    fn set_pixel(&mut self, x: usize, y: usize, color: Rgb) {
        if let Some(i) = self.index(x, y) {
            self.back[i] = color;
            self.writes[i] += 1;
        }
    }
}

impl MatrixDisplay for FrameBuffer {
    fn present(&mut self) -> DisplayResult<()> {
        self.front.copy_from_slice(&self.back);
        self.frames_presented += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_dimensions() {
        assert!(FrameBuffer::new(0, 8).is_err());
        assert!(FrameBuffer::new(8, 0).is_err());
    }

    #[test]
    fn test_set_and_clear() {
        let mut fb = FrameBuffer::new(4, 3).unwrap();
        fb.set_pixel(1, 2, Rgb::WHITE);
        fb.set_pixel(1, 2, Rgb::WHITE);
        assert_eq!(fb.pixel(1, 2), Some(Rgb::WHITE));
        assert_eq!(fb.writes(1, 2), 2);
        assert_eq!(fb.lit_pixels(), 1);

        fb.clear();
        assert_eq!(fb.pixel(1, 2), Some(Rgb::BLACK));
        assert_eq!(fb.total_writes(), 0);
    }

    #[test]
    fn test_out_of_range_ignored() {
        let mut fb = FrameBuffer::new(4, 3).unwrap();
        fb.set_pixel(4, 0, Rgb::WHITE);
        fb.set_pixel(0, 3, Rgb::WHITE);
        assert_eq!(fb.total_writes(), 0);
        assert_eq!(fb.pixel(4, 0), None);
    }

    #[test]
    fn test_present_copies_back_buffer() {
        let mut fb = FrameBuffer::new(2, 2).unwrap();
        fb.set_pixel(0, 0, Rgb::new(1, 2, 3));
        assert_eq!(fb.presented_pixel(0, 0), Some(Rgb::BLACK));

        fb.present().unwrap();
        assert_eq!(fb.presented_pixel(0, 0), Some(Rgb::new(1, 2, 3)));
        assert_eq!(fb.frames_presented(), 1);

        // Clearing the back buffer leaves the shown frame intact
        fb.clear();
        assert_eq!(fb.presented_pixel(0, 0), Some(Rgb::new(1, 2, 3)));
    }
}
