//! Color Themes
//!
//! A theme answers three questions for the renderer:
//! - the color of a pixel at a height ratio within a column (`color_for`)
//! - the color of a pixel in an overflow layer (`overflow_color_for`)
//! - the color of a peak marker given its bar's color (`peak_color_for`)
//!
//! Gradient themes are plain data. A handful of themes (hue wheels, fire)
//! compute their colors directly.

use matrixviz_display::Rgb;
use serde::{Deserialize, Serialize};

use crate::gradient::Gradient;

/// How peak markers are colored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeakColorMode {
    White,
    /// Same color as the bar's top
    Bar,
    /// Channel-inverted bar color
    #[default]
    Contrast,
    /// Theme color at full height for the column
    Peak,
}

impl PeakColorMode {
    pub const ALL: [PeakColorMode; 4] = [
        PeakColorMode::White,
        PeakColorMode::Bar,
        PeakColorMode::Contrast,
        PeakColorMode::Peak,
    ];

    /// Next mode in the cycle white -> bar -> contrast -> peak -> white
    pub fn next(self) -> Self {
        match self {
            PeakColorMode::White => PeakColorMode::Bar,
            PeakColorMode::Bar => PeakColorMode::Contrast,
            PeakColorMode::Contrast => PeakColorMode::Peak,
            PeakColorMode::Peak => PeakColorMode::White,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PeakColorMode::White => "white",
            PeakColorMode::Bar => "bar",
            PeakColorMode::Contrast => "contrast",
            PeakColorMode::Peak => "peak",
        }
    }
}


/// Color source of a theme
#[derive(Debug, Clone, PartialEq)]
pub enum ThemeStyle {
    /// Base gradient over height; overflow layer `n` (1-based) uses
    /// `overflow[n - 1]`, the last entry repeating for higher layers.
    /// An empty overflow list falls back to the default continuation.
    Gradient {
        base: Gradient,
        overflow: Vec<Gradient>,
    },
    /// Hue follows the column, full value at every height
    Rainbow,
    /// Hue follows the column with a height shift; value rises with height
    Spectrum,
    /// Dark red to white heat with flickering overflow
    Fire { base: Gradient },
}

/// Default continuation: red -> orange, orange -> white, then white
fn default_overflow(layer: usize, height_ratio: f32) -> Rgb {
    let h = height_ratio.clamp(0.0, 1.0);
    match layer {
        1 => Rgb::from_f32(255.0, 165.0 * h, 0.0),
        2 => Rgb::from_f32(255.0, 165.0 + 90.0 * h, 255.0 * h),
        _ => Rgb::WHITE,
    }
}

#[inline]
fn ratio(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// A named theme at a given brightness
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    name: &'static str,
    style: ThemeStyle,
    brightness: f32,
}

impl Theme {
    pub fn new(name: &'static str, style: ThemeStyle, brightness: f32) -> Self {
        let brightness = if brightness.is_finite() {
            brightness.max(0.0)
        } else {
            1.0
        };
        Self {
            name,
            style,
            brightness,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn style(&self) -> &ThemeStyle {
        &self.style
    }

    pub fn brightness(&self) -> f32 {
        self.brightness
    }

    pub fn with_brightness(self, brightness: f32) -> Self {
        Self::new(self.name, self.style, brightness)
    }

    fn boost(&self, c: Rgb) -> Rgb {
        if self.brightness == 1.0 {
            c
        } else {
            c.scaled(self.brightness)
        }
    }

    /// Color for a pixel at `height_ratio` (0 = bottom, 1 = top) in the column
    /// at `column_ratio` (0 = left, 1 = right)
    pub fn color_for(&self, height_ratio: f32, column_ratio: f32) -> Rgb {
        let h = ratio(height_ratio);
        let col = ratio(column_ratio);
        let c = match &self.style {
            ThemeStyle::Gradient { base, .. } => base.sample(h),
            ThemeStyle::Fire { base } => base.sample(h),
            ThemeStyle::Rainbow => Rgb::from_hsv(col * 300.0, 1.0, 1.0),
            ThemeStyle::Spectrum => {
                Rgb::from_hsv(col * 270.0 + (h - 0.5) * 90.0, 1.0, 0.3 + 0.7 * h)
            }
        };
        self.boost(c)
    }

    /// Color for a pixel of overflow `layer` (0 = the normal bar)
    ///
    /// `frame` and `bar_ratio` (the bar's full normalized value) let
    /// animated themes vary over time and with loudness.
    pub fn overflow_color_for(
        &self,
        layer: usize,
        height_ratio: f32,
        column_ratio: f32,
        frame: u64,
        bar_ratio: f32,
    ) -> Rgb {
        if layer == 0 {
            return self.color_for(height_ratio, column_ratio);
        }

        let h = ratio(height_ratio);
        let col = ratio(column_ratio);
        let c = match &self.style {
            ThemeStyle::Gradient { overflow, .. } => match overflow.get((layer - 1).min(overflow.len().saturating_sub(1))) {
                Some(g) => g.sample(h),
                None => default_overflow(layer, h),
            },
            ThemeStyle::Rainbow | ThemeStyle::Spectrum => {
                let base = self.color_for(height_ratio, column_ratio);
                let toward_white = (0.3 + 0.2 * layer as f32).min(0.8);
                // already boosted
                return Rgb::lerp(base, self.boost(Rgb::WHITE), toward_white);
            }
            ThemeStyle::Fire { .. } => {
                let heat = if layer == 1 {
                    Rgb::from_f32(255.0, 255.0, 200.0 + 55.0 * h)
                } else {
                    Rgb::from_f32(255.0 - 55.0 * h, 255.0 - 30.0 * h, 255.0)
                };
                let phase = col * 12.0 + frame as f32 * 0.25;
                let loudness = ratio(bar_ratio / 4.0);
                let flicker = 0.85 + 0.15 * (0.5 + 0.5 * phase.sin()) * (1.0 - loudness);
                heat.scaled(flicker + 0.15 * loudness)
            }
        };
        self.boost(c)
    }

    /// Peak marker color. `reference` is the color of the bar under the
    /// marker, `color_for(bar_value, column_ratio)`.
    pub fn peak_color_for(&self, mode: PeakColorMode, reference: Rgb, column_ratio: f32) -> Rgb {
        match mode {
            PeakColorMode::White => Rgb::WHITE,
            PeakColorMode::Bar => reference,
            PeakColorMode::Contrast => reference.inverted(),
            PeakColorMode::Peak => self.color_for(1.0, column_ratio),
        }
    }
}
