//! Bar Renderer
//!
//! Draws one frame of bars onto a [`Canvas`]. Bar `i` of `n` covers columns
//! `i * width / n .. (i + 1) * width / n` and grows upward from the bottom
//! row.
//!
//! # Modes
//!
//! Checked in this order; the first enabled one wins:
//!
//! | mode     | draws |
//! |----------|-------|
//! | debug    | the theme's full palette, ignoring audio |
//! | full     | every pixel, blending base/top colors around the bar height |
//! | overflow | bars taller than the matrix wrap into stacked layers |
//! | standard | bars clamped to the matrix height |
//!
//! Peak markers are overlaid after the bars in every mode except debug,
//! even when bars are switched off. Shadow trails apply to standard and
//! overflow bars.

use std::ops::Range;

use matrixviz_display::{Canvas, Rgb};
use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};
use crate::layers::LayerStack;
use crate::overflow::OverflowStack;
use crate::shadow::ShadowBuffer;
use crate::theme::{PeakColorMode, Theme};

/// Which pixel of an overflowing bar picks the uniform (non-gradient) color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowAnchor {
    /// Color of the topmost logical pixel
    #[default]
    Top,
    /// Color at the base of the top layer
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Debug,
    Full,
    Overflow,
    Standard,
}

impl RenderMode {
    pub fn name(self) -> &'static str {
        match self {
            RenderMode::Debug => "debug",
            RenderMode::Full => "full",
            RenderMode::Overflow => "overflow",
            RenderMode::Standard => "standard",
        }
    }
}

/// Renderer switches
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub bars: bool,
    /// Color each pixel by its own height instead of the bar's height
    pub gradient: bool,
    pub overflow: bool,
    pub overflow_multiplier: f32,
    pub overflow_anchor: OverflowAnchor,
    pub full: bool,
    pub debug: bool,
    pub peaks: bool,
    pub peak_color: PeakColorMode,
    pub shadow: bool,
    pub shadow_decay: f32,
    pub shadow_interval: u32,
    /// Rows over which full mode blends from base to top color
    pub full_fade_radius: usize,
    /// Composite the layer stack instead of the single spectrum
    pub multi_layer: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            bars: true,
            gradient: true,
            overflow: true,
            overflow_multiplier: 1.5,
            overflow_anchor: OverflowAnchor::Top,
            full: false,
            debug: false,
            peaks: false,
            peak_color: PeakColorMode::Contrast,
            shadow: false,
            shadow_decay: 0.4,
            shadow_interval: 3,
            full_fade_radius: 10,
            multi_layer: false,
        }
    }
}

impl RenderOptions {
    pub fn mode(&self) -> RenderMode {
        if self.debug {
            RenderMode::Debug
        } else if self.full {
            RenderMode::Full
        } else if self.overflow {
            RenderMode::Overflow
        } else {
            RenderMode::Standard
        }
    }
}

/// Bars and peaks of one layer for one frame
#[derive(Debug, Clone, Copy)]
pub struct LayerFrame<'a> {
    pub bars: &'a [f32],
    pub peaks: &'a [f32],
}

/// Per-call bar styling (global options or a layer's own flags)
#[derive(Debug, Clone, Copy)]
struct BarStyle {
    gradient: bool,
    overflow: bool,
    multiplier: f32,
    anchor: OverflowAnchor,
}

/// Canvas writer that also feeds the shadow buffer
struct Painter<'a, C: Canvas + ?Sized> {
    canvas: &'a mut C,
    shadow: Option<&'a mut ShadowBuffer>,
}

impl<C: Canvas + ?Sized> Painter<'_, C> {
    #[inline]
    fn put(&mut self, x: usize, y: usize, color: Rgb) {
        self.canvas.set_pixel(x, y, color);
        if let Some(shadow) = self.shadow.as_deref_mut() {
            shadow.stamp(x, y, color);
        }
    }
}

/// Columns covered by bar `index` of `count`
pub fn column_span(index: usize, count: usize, width: usize) -> Range<usize> {
    if count == 0 {
        return 0..0;
    }
    (index * width / count)..((index + 1) * width / count)
}

/// NaN, infinite and negative values draw as zero
#[inline]
fn sanitize(value: f32) -> f32 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

#[derive(Debug, Clone)]
pub struct BarRenderer {
    theme: Option<Theme>,
    options: RenderOptions,
    shadow: Option<ShadowBuffer>,
    frame: u64,
}

impl BarRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            theme: None,
            options,
            shadow: None,
            frame: 0,
        }
    }

    pub fn with_theme(theme: Theme, options: RenderOptions) -> Self {
        Self {
            theme: Some(theme),
            ..Self::new(options)
        }
    }

    pub fn theme(&self) -> Option<&Theme> {
        self.theme.as_ref()
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = Some(theme);
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut RenderOptions {
        &mut self.options
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Draw one frame of `bars` (and optionally `peaks`) onto `canvas`
    pub fn draw<C: Canvas + ?Sized>(
        &mut self,
        canvas: &mut C,
        bars: &[f32],
        peaks: Option<&[f32]>,
    ) -> RenderResult<()> {
        let Self {
            theme,
            options,
            shadow,
            frame,
        } = self;
        let theme = theme.as_ref().ok_or(RenderError::ThemeNotSet)?;

        canvas.clear();
        *frame = frame.wrapping_add(1);

        let mode = options.mode();
        let shadows_on = options.shadow && matches!(mode, RenderMode::Overflow | RenderMode::Standard);
        if !shadows_on {
            *shadow = None;
        }

        match mode {
            RenderMode::Debug => {
                draw_palette(canvas, theme);
                return Ok(());
            }
            RenderMode::Full => draw_full(canvas, theme, bars, options.full_fade_radius),
            RenderMode::Overflow | RenderMode::Standard => {
                let (width, height) = (canvas.width(), canvas.height());
                if shadows_on && !shadow.as_ref().is_some_and(|s| s.matches(width, height)) {
                    *shadow = Some(ShadowBuffer::new(
                        width,
                        height,
                        options.shadow_decay,
                        options.shadow_interval,
                    ));
                }
                if let Some(buffer) = shadow.as_mut() {
                    buffer.set_decay(options.shadow_decay, options.shadow_interval);
                    buffer.begin_frame();
                }

                if options.bars {
                    let style = BarStyle {
                        gradient: options.gradient,
                        overflow: mode == RenderMode::Overflow,
                        multiplier: options.overflow_multiplier,
                        anchor: options.overflow_anchor,
                    };
                    let mut painter = Painter {
                        canvas: &mut *canvas,
                        shadow: shadow.as_mut(),
                    };
                    for (i, &value) in bars.iter().enumerate() {
                        let span = column_span(i, bars.len(), width);
                        let column_ratio = i as f32 / bars.len() as f32;
                        draw_bar(&mut painter, theme, span, sanitize(value), column_ratio, style, *frame);
                    }
                }

                if let Some(buffer) = shadow.as_ref() {
                    buffer.draw_trails(canvas);
                }
            }
        }

        if options.peaks {
            if let Some(peaks) = peaks {
                draw_peaks(canvas, theme, bars, peaks, options.peak_color, 1.0);
            }
        }

        Ok(())
    }

    /// Composite every visible layer back to front. `frames[i]` holds the
    /// data of layer `i`; layers without a frame are skipped.
    pub fn draw_layers<C: Canvas + ?Sized>(
        &mut self,
        canvas: &mut C,
        stack: &LayerStack,
        frames: &[LayerFrame<'_>],
    ) -> RenderResult<()> {
        canvas.clear();
        self.frame = self.frame.wrapping_add(1);
        self.shadow = None;

        let width = canvas.width();
        for (index, layer) in stack.back_to_front() {
            let Some(data) = frames.get(index) else {
                continue;
            };

            if layer.bars {
                let style = BarStyle {
                    gradient: layer.gradient,
                    overflow: layer.overflow,
                    multiplier: self.options.overflow_multiplier,
                    anchor: self.options.overflow_anchor,
                };
                let mut painter = Painter {
                    canvas: &mut *canvas,
                    shadow: None,
                };
                let count = data.bars.len();
                for (i, &value) in data.bars.iter().enumerate() {
                    let span = column_span(i, count, width);
                    let value = sanitize(value) * layer.energy_boost;
                    draw_bar(&mut painter, &layer.theme, span, value, i as f32 / count as f32, style, self.frame);
                }
            }

            if layer.peaks {
                draw_peaks(
                    canvas,
                    &layer.theme,
                    data.bars,
                    data.peaks,
                    self.options.peak_color,
                    layer.energy_boost,
                );
            }
        }

        Ok(())
    }
}

fn draw_bar<C: Canvas + ?Sized>(
    painter: &mut Painter<'_, C>,
    theme: &Theme,
    columns: Range<usize>,
    value: f32,
    column_ratio: f32,
    style: BarStyle,
    frame: u64,
) {
    let height = painter.canvas.height();
    if columns.is_empty() || height == 0 {
        return;
    }
    let hf = height as f32;

    if style.overflow {
        let stack = OverflowStack::new(value, height, style.multiplier);
        let uniform = (!style.gradient).then(|| {
            let ratio = match style.anchor {
                OverflowAnchor::Top => stack.top_pixel_ratio(),
                OverflowAnchor::Bottom => 0.0,
            };
            theme.overflow_color_for(stack.top_layer(), ratio, column_ratio, frame, value)
        });

        for row in 0..stack.visible_rows() {
            let color = match (uniform, stack.layer_at_row(row)) {
                (Some(c), _) => c,
                (None, Some(layer)) => {
                    theme.overflow_color_for(layer, row as f32 / hf, column_ratio, frame, value)
                }
                (None, None) => continue,
            };
            let y = height - 1 - row;
            for x in columns.clone() {
                painter.put(x, y, color);
            }
        }
    } else {
        let clamped = value.clamp(0.0, 1.0);
        let rows = ((clamped * hf) as usize).min(height);
        let uniform = theme.color_for(clamped, column_ratio);

        for row in 0..rows {
            let color = if style.gradient {
                theme.color_for(row as f32 / hf, column_ratio)
            } else {
                uniform
            };
            let y = height - 1 - row;
            for x in columns.clone() {
                painter.put(x, y, color);
            }
        }
    }
}

/// Fill the whole matrix: base color well below each bar's height, top
/// color well above it, blended over `radius` rows either side
fn draw_full<C: Canvas + ?Sized>(canvas: &mut C, theme: &Theme, bars: &[f32], radius: usize) {
    let (width, height) = (canvas.width(), canvas.height());
    if height == 0 {
        return;
    }
    let r = radius as isize;

    for (i, &value) in bars.iter().enumerate() {
        let column_ratio = i as f32 / bars.len() as f32;
        let v = sanitize(value).min(1.0);
        let bar_row = (v * (height - 1) as f32) as isize;
        let top = theme.color_for(1.0, column_ratio);
        let base = theme.color_for(0.0, column_ratio);

        for row in 0..height {
            let j = row as isize;
            let color = if j >= bar_row + r {
                top
            } else if j <= bar_row - r {
                base
            } else {
                let t = (j - (bar_row - r)) as f32 / (2 * r) as f32;
                Rgb::lerp(base, top, t)
            };
            let y = height - 1 - row;
            for x in column_span(i, bars.len(), width) {
                canvas.set_pixel(x, y, color);
            }
        }
    }
}

/// Theme palette test pattern: height ratio down the rows, column ratio across
fn draw_palette<C: Canvas + ?Sized>(canvas: &mut C, theme: &Theme) {
    let (width, height) = (canvas.width(), canvas.height());
    let row_span = height.saturating_sub(1).max(1) as f32;
    for x in 0..width {
        let column_ratio = x as f32 / width as f32;
        for row in 0..height {
            let color = theme.color_for(row as f32 / row_span, column_ratio);
            canvas.set_pixel(x, height - 1 - row, color);
        }
    }
}

/// One marker pixel per column at each peak's height, clamped to the top
/// row. Zero peaks draw nothing.
fn draw_peaks<C: Canvas + ?Sized>(
    canvas: &mut C,
    theme: &Theme,
    bars: &[f32],
    peaks: &[f32],
    mode: PeakColorMode,
    boost: f32,
) {
    let (width, height) = (canvas.width(), canvas.height());
    if height == 0 {
        return;
    }

    for (i, &peak) in peaks.iter().enumerate() {
        let p = sanitize(sanitize(peak) * boost).min(1.0);
        if p <= 0.0 {
            continue;
        }
        let column_ratio = i as f32 / peaks.len() as f32;
        let row = ((p * height as f32) as usize).min(height - 1);
        let bar = sanitize(bars.get(i).copied().unwrap_or(0.0) * boost).min(1.0);
        let reference = theme.color_for(bar, column_ratio);
        let color = theme.peak_color_for(mode, reference, column_ratio);
        let y = height - 1 - row;
        for x in column_span(i, peaks.len(), width) {
            canvas.set_pixel(x, y, color);
        }
    }
}
