//! RGB Pixel Type
//!
//! 8-bit per channel color as written to the LED matrix.

use serde::{Deserialize, Serialize};

/// A single 24-bit color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from float channels, clamping each to 0-255
    pub fn from_f32(r: f32, g: f32, b: f32) -> Self {
        Self {
            r: channel(r),
            g: channel(g),
            b: channel(b),
        }
    }

    /// Multiply every channel by `factor`, saturating at 255
    pub fn scaled(self, factor: f32) -> Self {
        Self::from_f32(
            self.r as f32 * factor,
            self.g as f32 * factor,
            self.b as f32 * factor,
        )
    }

    /// Channel-wise inversion (255 - c)
    pub fn inverted(self) -> Self {
        Self::new(255 - self.r, 255 - self.g, 255 - self.b)
    }

    /// Linear blend from `a` (t = 0) to `b` (t = 1)
    pub fn lerp(a: Rgb, b: Rgb, t: f32) -> Self {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let mix = |x: u8, y: u8| x as f32 + (y as f32 - x as f32) * t;
        Self::from_f32(mix(a.r, b.r), mix(a.g, b.g), mix(a.b, b.b))
    }

    /// HSV to RGB, hue in degrees (wraps), saturation and value in 0-1
    pub fn from_hsv(hue: f32, saturation: f32, value: f32) -> Self {
        let h = hue.rem_euclid(360.0) / 60.0;
        let s = saturation.clamp(0.0, 1.0);
        let v = value.clamp(0.0, 1.0);

        let c = v * s;
        let x = c * (1.0 - ((h % 2.0) - 1.0).abs());
        let m = v - c;

        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };

        Self::from_f32((r + m) * 255.0, (g + m) * 255.0, (b + m) * 255.0)
    }

    pub fn is_black(self) -> bool {
        self == Self::BLACK
    }
}

#[inline]
fn channel(value: f32) -> u8 {
    if value.is_nan() {
        0
    } else {
        value.clamp(0.0, 255.0) as u8
    }
}
