//! Settings Tree
//!
//! Every group carries `#[serde(default)]`: a settings file may omit any key
//! and unknown keys are ignored. The DSP and render crates never see these
//! types; the conversions at the bottom hand them plain configs instead.

use matrixviz_dsp::{BinnerConfig, ScalerConfig, ScalingMode, WeightReference};
use matrixviz_render::{OverflowAnchor, PeakColorMode, RenderOptions};
use serde::{Deserialize, Serialize};

/// Capture parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Input device name (case-insensitive substring) or "default"
    pub device: String,
    pub block_size: usize,
    pub fft_size: usize,
    /// Interleaved channel to analyse
    pub channel: usize,
    /// Seconds between frames
    #[serde(alias = "sleep_delay")]
    pub frame_interval: f32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            device: "default".to_string(),
            block_size: 512,
            fft_size: 8192,
            channel: 0,
            frame_interval: 0.005,
        }
    }
}

/// Visible frequency range plus zoom presets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequencySettings {
    pub min_freq: f32,
    pub max_freq: f32,
    /// Use the zoom range instead of `min_freq..max_freq`
    pub zoom_mode: bool,
    pub zoom_min_freq: f32,
    pub zoom_max_freq: f32,
    /// Ranges visited by next/prev zoom, in order
    pub zoom_presets: Vec<[f32; 2]>,
    pub weighting: WeightReference,
    pub layer_weighting: WeightReference,
}

impl Default for FrequencySettings {
    fn default() -> Self {
        Self {
            min_freq: 60.0,
            max_freq: 14_000.0,
            zoom_mode: true,
            zoom_min_freq: 100.0,
            zoom_max_freq: 6300.0,
            zoom_presets: vec![
                [100.0, 6300.0],
                [40.0, 2000.0],
                [200.0, 4000.0],
                [1000.0, 12_000.0],
                [20.0, 20_000.0],
            ],
            weighting: WeightReference::Local,
            layer_weighting: WeightReference::Global,
        }
    }
}

impl FrequencySettings {
    /// Range the main spectrum currently covers
    pub fn active_range(&self) -> (f32, f32) {
        if self.zoom_mode {
            (self.zoom_min_freq, self.zoom_max_freq)
        } else {
            (self.min_freq, self.max_freq)
        }
    }

    /// Move `step` places through the zoom presets (wrapping) and enable zoom.
    /// A range that is not in the list starts from the first preset.
    /// Returns the new range, or `None` when there are no presets.
    pub fn cycle_zoom(&mut self, step: isize) -> Option<(f32, f32)> {
        if self.zoom_presets.is_empty() {
            return None;
        }
        let len = self.zoom_presets.len() as isize;
        let current = self
            .zoom_presets
            .iter()
            .position(|&[lo, hi]| lo == self.zoom_min_freq && hi == self.zoom_max_freq);
        let index = match current {
            Some(i) if self.zoom_mode => (i as isize + step).rem_euclid(len) as usize,
            Some(i) => i,
            None => 0,
        };
        let [lo, hi] = self.zoom_presets[index];
        self.zoom_mode = true;
        self.zoom_min_freq = lo;
        self.zoom_max_freq = hi;
        Some((lo, hi))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverflowSettings {
    pub enabled: bool,
    pub multiplier: f32,
    pub anchor: OverflowAnchor,
}

impl Default for OverflowSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            multiplier: 1.5,
            anchor: OverflowAnchor::Top,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakSettings {
    pub enabled: bool,
    pub fall_speed: f32,
    pub hold_frames: u32,
    pub color_mode: PeakColorMode,
}

impl Default for PeakSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            fall_speed: 0.08,
            hold_frames: 8,
            color_mode: PeakColorMode::Contrast,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorSettings {
    pub theme: String,
    pub brightness: f32,
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self {
            theme: "ocean".to_string(),
            brightness: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensitivitySettings {
    /// Per-index magnitude subtracted before summing a bin
    pub noise_floor: f32,
    pub low_weight: f32,
    pub high_weight: f32,
    /// Frame peaks below this fade out (0 disables)
    pub silence_threshold: f32,
}

impl Default for SensitivitySettings {
    fn default() -> Self {
        Self {
            noise_floor: 0.3,
            low_weight: 0.55,
            high_weight: 10.0,
            silence_threshold: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingSettings {
    pub mode: ScalingMode,
    pub fixed_scale: f32,
    pub window_seconds: f32,
    pub headroom: f32,
    pub attack: f32,
    pub decay: f32,
    pub min_scale: f32,
    pub sensitivity: f32,
}

impl Default for ScalingSettings {
    fn default() -> Self {
        Self {
            mode: ScalingMode::RollingRms,
            fixed_scale: 0.3,
            window_seconds: 3.0,
            headroom: 2.5,
            attack: 0.1,
            decay: 0.06,
            min_scale: 0.05,
            sensitivity: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingSettings {
    pub rise: f32,
    pub fall: f32,
}

impl Default for SmoothingSettings {
    fn default() -> Self {
        Self {
            rise: 0.4,
            fall: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowSettings {
    pub enabled: bool,
    pub decay_amount: f32,
    /// Frames between shadow decay steps
    pub interval: u32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            decay_amount: 0.4,
            interval: 3,
        }
    }
}

/// Visualizer choice, drawing switches and matrix size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub visualizer: String,
    pub width: usize,
    pub height: usize,
    pub bars: bool,
    pub gradient: bool,
    pub full: bool,
    pub debug: bool,
    pub full_fade_radius: usize,
    pub multi_layer: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            visualizer: "bars".to_string(),
            width: 64,
            height: 32,
            bars: true,
            gradient: true,
            full: false,
            debug: false,
            full_fade_radius: 10,
            multi_layer: false,
        }
    }
}

/// One spectrum layer in multi-layer mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerSettings {
    pub name: String,
    pub theme: String,
    pub min_freq: f32,
    pub max_freq: f32,
    pub bars: bool,
    pub gradient: bool,
    pub overflow: bool,
    pub peaks: bool,
    pub visible: bool,
    pub energy_boost: f32,
}

impl Default for LayerSettings {
    fn default() -> Self {
        Self {
            name: "layer".to_string(),
            theme: "ocean".to_string(),
            min_freq: 60.0,
            max_freq: 14_000.0,
            bars: true,
            gradient: true,
            overflow: false,
            peaks: false,
            visible: true,
            energy_boost: 1.0,
        }
    }
}

impl LayerSettings {
    fn band(name: &str, theme: &str, min_freq: f32, max_freq: f32) -> Self {
        Self {
            name: name.to_string(),
            theme: theme.to_string(),
            min_freq,
            max_freq,
            ..Self::default()
        }
    }
}

fn default_layers() -> Vec<LayerSettings> {
    vec![
        LayerSettings::band("bass", "fire", 30.0, 250.0),
        LayerSettings::band("mids", "forest", 250.0, 2000.0),
        LayerSettings::band("highs", "ocean", 2000.0, 12_000.0),
    ]
}

/// Root settings structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub audio: AudioSettings,
    pub frequency: FrequencySettings,
    pub overflow: OverflowSettings,
    pub peak: PeakSettings,
    pub color: ColorSettings,
    pub sensitivity: SensitivitySettings,
    pub scaling: ScalingSettings,
    pub smoothing: SmoothingSettings,
    pub shadow: ShadowSettings,
    pub render: RenderSettings,
    pub layers: Vec<LayerSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            audio: AudioSettings::default(),
            frequency: FrequencySettings::default(),
            overflow: OverflowSettings::default(),
            peak: PeakSettings::default(),
            color: ColorSettings::default(),
            sensitivity: SensitivitySettings::default(),
            scaling: ScalingSettings::default(),
            smoothing: SmoothingSettings::default(),
            shadow: ShadowSettings::default(),
            render: RenderSettings::default(),
            layers: default_layers(),
        }
    }
}

fn check_range(what: &str, min: f32, max: f32) -> Result<(), String> {
    if !(min.is_finite() && max.is_finite() && min > 0.0 && min < max) {
        return Err(format!("{} range must satisfy 0 < min < max, got {}-{}", what, min, max));
    }
    Ok(())
}

fn check_rate(what: &str, rate: f32) -> Result<(), String> {
    if !(0.0..=1.0).contains(&rate) {
        return Err(format!("{} must be within 0-1, got {}", what, rate));
    }
    Ok(())
}

fn check_positive(what: &str, value: f32) -> Result<(), String> {
    if !(value.is_finite() && value > 0.0) {
        return Err(format!("{} must be positive, got {}", what, value));
    }
    Ok(())
}

impl Settings {
    /// Validate settings
    pub fn validate(&self) -> Result<(), String> {
        let audio = &self.audio;
        if audio.block_size == 0 {
            return Err("block_size must be positive".to_string());
        }
        if audio.fft_size < audio.block_size {
            return Err(format!(
                "fft_size ({}) must be at least block_size ({})",
                audio.fft_size, audio.block_size
            ));
        }
        check_positive("frame_interval", audio.frame_interval)?;

        let freq = &self.frequency;
        check_range("Frequency", freq.min_freq, freq.max_freq)?;
        check_range("Zoom", freq.zoom_min_freq, freq.zoom_max_freq)?;
        for &[lo, hi] in &freq.zoom_presets {
            check_range("Zoom preset", lo, hi)?;
        }

        check_positive("overflow multiplier", self.overflow.multiplier)?;
        if !(self.peak.fall_speed >= 0.0) {
            return Err(format!("peak fall_speed must be non-negative, got {}", self.peak.fall_speed));
        }
        check_positive("brightness", self.color.brightness)?;

        check_rate("attack", self.scaling.attack)?;
        check_rate("decay", self.scaling.decay)?;
        check_rate("rise", self.smoothing.rise)?;
        check_rate("fall", self.smoothing.fall)?;
        check_rate("shadow decay_amount", self.shadow.decay_amount)?;
        check_positive("min_scale", self.scaling.min_scale)?;
        check_positive("fixed_scale", self.scaling.fixed_scale)?;
        check_positive("sensitivity", self.scaling.sensitivity)?;

        if self.render.width == 0 || self.render.height == 0 {
            return Err(format!(
                "Matrix size must be positive, got {}x{}",
                self.render.width, self.render.height
            ));
        }

        for layer in &self.layers {
            check_range(&format!("Layer '{}'", layer.name), layer.min_freq, layer.max_freq)?;
            check_positive(&format!("Layer '{}' energy_boost", layer.name), layer.energy_boost)?;
        }
        Ok(())
    }

    /// Bin layout for the main spectrum
    pub fn binner_config(&self, sample_rate: f32, bin_count: usize) -> BinnerConfig {
        let (min_freq, max_freq) = self.frequency.active_range();
        BinnerConfig {
            sample_rate,
            fft_size: self.audio.fft_size,
            min_freq,
            max_freq,
            bin_count,
            low_weight: self.sensitivity.low_weight,
            high_weight: self.sensitivity.high_weight,
            reference: self.frequency.weighting,
        }
    }

    /// Bin layout for one multi-layer band
    pub fn layer_binner_config(
        &self,
        layer: &LayerSettings,
        sample_rate: f32,
        bin_count: usize,
    ) -> BinnerConfig {
        BinnerConfig {
            min_freq: layer.min_freq,
            max_freq: layer.max_freq,
            reference: self.frequency.layer_weighting,
            ..self.binner_config(sample_rate, bin_count)
        }
    }

    pub fn scaler_config(&self) -> ScalerConfig {
        let s = &self.scaling;
        ScalerConfig {
            mode: s.mode,
            fixed_scale: s.fixed_scale,
            window_seconds: s.window_seconds,
            frame_interval: self.audio.frame_interval,
            headroom: s.headroom,
            attack: s.attack,
            decay: s.decay,
            min_scale: s.min_scale,
            sensitivity: s.sensitivity,
            silence_threshold: self.sensitivity.silence_threshold,
            rise: self.smoothing.rise,
            fall: self.smoothing.fall,
            peak_hold_frames: self.peak.hold_frames,
            peak_fall_speed: self.peak.fall_speed,
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            bars: self.render.bars,
            gradient: self.render.gradient,
            overflow: self.overflow.enabled,
            overflow_multiplier: self.overflow.multiplier,
            overflow_anchor: self.overflow.anchor,
            full: self.render.full,
            debug: self.render.debug,
            peaks: self.peak.enabled,
            peak_color: self.peak.color_mode,
            shadow: self.shadow.enabled,
            shadow_decay: self.shadow.decay_amount,
            shadow_interval: self.shadow.interval,
            full_fade_radius: self.render.full_fade_radius,
            multi_layer: self.render.multi_layer,
        }
    }

    /// Frames between Game of Life generations (one second of frames)
    pub fn frames_per_second(&self) -> u32 {
        let fps = (1.0 / self.audio.frame_interval).round();
        if fps.is_finite() && fps >= 1.0 {
            fps as u32
        } else {
            1
        }
    }
}
