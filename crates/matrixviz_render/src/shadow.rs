//! Shadow Trails
//!
//! Remembers the last color written to each pixel and fades it out over
//! time, leaving a trail behind falling bars. Pixels written this frame are
//! shown by the bars themselves; only older pixels are drawn as shadows.

use matrixviz_display::{Canvas, Rgb};

#[derive(Debug, Clone)]
pub struct ShadowBuffer {
    width: usize,
    height: usize,
    intensity: Vec<f32>,
    colors: Vec<Rgb>,
    fresh: Vec<bool>,
    /// Intensity removed per decay step
    decay_amount: f32,
    /// Frames between decay steps
    decay_interval: u32,
    frame: u32,
}

impl ShadowBuffer {
    pub fn new(width: usize, height: usize, decay_amount: f32, decay_interval: u32) -> Self {
        let len = width * height;
        Self {
            width,
            height,
            intensity: vec![0.0; len],
            colors: vec![Rgb::BLACK; len],
            fresh: vec![false; len],
            decay_amount: decay_amount.clamp(0.0, 1.0),
            decay_interval: decay_interval.max(1),
            frame: 0,
        }
    }

    pub fn matches(&self, width: usize, height: usize) -> bool {
        self.width == width && self.height == height
    }

    pub fn set_decay(&mut self, decay_amount: f32, decay_interval: u32) {
        self.decay_amount = decay_amount.clamp(0.0, 1.0);
        self.decay_interval = decay_interval.max(1);
    }

    /// Advance one frame: fade every `decay_interval` frames and forget which
    /// pixels were written last frame
    pub fn begin_frame(&mut self) {
        self.frame = self.frame.wrapping_add(1);
        if self.frame % self.decay_interval == 0 {
            for i in self.intensity.iter_mut() {
                *i = (*i - self.decay_amount).max(0.0);
            }
        }
        self.fresh.fill(false);
    }

    /// Record a pixel drawn at full intensity this frame
    pub fn stamp(&mut self, x: usize, y: usize, color: Rgb) {
        if x < self.width && y < self.height {
            let i = y * self.width + x;
            self.intensity[i] = 1.0;
            self.colors[i] = color;
            self.fresh[i] = true;
        }
    }

    pub fn intensity(&self, x: usize, y: usize) -> f32 {
        if x < self.width && y < self.height {
            self.intensity[y * self.width + x]
        } else {
            0.0
        }
    }

    /// Draw every fading pixel that was not rewritten this frame
    pub fn draw_trails<C: Canvas + ?Sized>(&self, canvas: &mut C) {
        for y in 0..self.height {
            for x in 0..self.width {
                let i = y * self.width + x;
                if self.fresh[i] || self.intensity[i] <= 0.0 {
                    continue;
                }
                canvas.set_pixel(x, y, self.colors[i].scaled(self.intensity[i]));
            }
        }
    }

    pub fn clear(&mut self) {
        self.intensity.fill(0.0);
        self.fresh.fill(false);
        self.frame = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matrixviz_display::FrameBuffer;

    #[test]
    fn test_stamp_and_decay() {
        let mut shadow = ShadowBuffer::new(2, 2, 0.25, 2);
        shadow.begin_frame();
        shadow.stamp(1, 1, Rgb::new(200, 100, 0));
        assert_eq!(shadow.intensity(1, 1), 1.0);

        shadow.begin_frame(); // frame 2: decays
        assert_eq!(shadow.intensity(1, 1), 0.75);
        shadow.begin_frame(); // frame 3: holds
        assert_eq!(shadow.intensity(1, 1), 0.75);
        shadow.begin_frame();
        assert_eq!(shadow.intensity(1, 1), 0.5);
    }

    #[test]
    fn test_trails_skip_fresh_pixels() {
        let mut fb = FrameBuffer::new(2, 2).unwrap();
        let mut shadow = ShadowBuffer::new(2, 2, 0.5, 1);

        shadow.begin_frame();
        shadow.stamp(0, 0, Rgb::new(200, 200, 200));
        shadow.draw_trails(&mut fb);
        assert_eq!(fb.total_writes(), 0);

        shadow.begin_frame();
        shadow.draw_trails(&mut fb);
        assert_eq!(fb.pixel(0, 0), Some(Rgb::new(100, 100, 100)));

        shadow.begin_frame();
        fb.clear();
        shadow.draw_trails(&mut fb);
        assert_eq!(fb.total_writes(), 0);
    }

    #[test]
    fn test_clear() {
        let mut shadow = ShadowBuffer::new(3, 3, 0.1, 1);
        shadow.stamp(2, 2, Rgb::WHITE);
        shadow.clear();
        assert_eq!(shadow.intensity(2, 2), 0.0);
        assert!(shadow.matches(3, 3));
        assert!(!shadow.matches(3, 4));
    }
}
