//! Overflow Layer Geometry
//!
//! A bar taller than the matrix wraps around: pixels beyond the top start a
//! new layer drawn from the bottom again, on top of the layer below. For a
//! column of height `H` holding `total` logical pixels:
//!
//! ```text
//! top_layer = (total - 1) / H
//! remainder = total % H            (0 means the top layer is full)
//! rows [0, remainder)   -> top_layer
//! rows [remainder, H)   -> top_layer - 1
//! ```
//!
//! Every screen row is assigned exactly one layer, so each pixel is written
//! once no matter how many layers are stacked.

/// Layer layout of one overflowing column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverflowStack {
    total: usize,
    height: usize,
}

impl OverflowStack {
    /// Layout for a normalized bar `value` scaled by `multiplier`
    pub fn new(value: f32, height: usize, multiplier: f32) -> Self {
        let pixels = value * height as f32 * multiplier;
        let total = if pixels.is_finite() && pixels > 0.0 {
            pixels as usize
        } else {
            0
        };
        Self::from_pixels(total, height)
    }

    pub fn from_pixels(total: usize, height: usize) -> Self {
        Self { total, height }
    }

    /// Logical pixel count across all layers
    pub fn total_pixels(&self) -> usize {
        self.total
    }

    /// Rows lit on screen
    pub fn visible_rows(&self) -> usize {
        self.total.min(self.height)
    }

    pub fn top_layer(&self) -> usize {
        if self.total == 0 || self.height == 0 {
            0
        } else {
            (self.total - 1) / self.height
        }
    }

    /// First row (from the bottom) not owned by the top layer
    fn boundary(&self) -> usize {
        match self.total % self.height.max(1) {
            0 => self.height,
            remainder => remainder,
        }
    }

    /// Layer shown at bar row `row` (0 = bottom), if the row is lit
    pub fn layer_at_row(&self, row: usize) -> Option<usize> {
        if row >= self.visible_rows() {
            return None;
        }
        let top = self.top_layer();
        if top == 0 || row < self.boundary() {
            Some(top)
        } else {
            Some(top - 1)
        }
    }

    /// Logical `(layer, pixels)` segments, bottom layer first
    pub fn segments(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let top = self.top_layer();
        let count = if self.total == 0 { 0 } else { top + 1 };
        (0..count).map(move |layer| {
            let pixels = if layer < top {
                self.height
            } else {
                self.total - top * self.height
            };
            (layer, pixels)
        })
    }

    /// Height ratio of the topmost logical pixel within its layer
    pub fn top_pixel_ratio(&self) -> f32 {
        if self.total == 0 || self.height == 0 {
            return 0.0;
        }
        ((self.total - 1) % self.height) as f32 / self.height as f32
    }
}
