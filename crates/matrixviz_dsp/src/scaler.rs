//! Adaptive Scaler
//!
//! Normalizes raw bin magnitudes into display units (1.0 = full matrix
//! height), then smooths them and tracks falling peak markers.
//!
//! # Per-frame flow
//!
//! ```text
//! raw bars ─▶ sanitize ─▶ silence fade ─▶ ÷ divisor ─▶ smoothing ─▶ peaks
//!                                           ▲
//!                  RollingRms / RollingMax / Fixed / Instant
//! ```
//!
//! Normalized values above 1.0 are kept; they are what drives overflow
//! rendering.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Floor for every divisor so normalization never divides by zero
const EPSILON: f32 = 1e-9;

/// Ceiling for a raw bar; its square stays finite in f32
const MAX_RAW: f32 = 1e15;

/// Ceiling for a normalized bar (screen heights)
const MAX_NORMALIZED: f32 = 1e3;

/// How the normalization divisor is chosen each frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingMode {
    /// Headroom times the RMS of recent frame peaks, approached with
    /// asymmetric attack/decay and floored at `min_scale`
    #[default]
    RollingRms,
    /// Largest frame peak in the window
    RollingMax,
    /// Constant `fixed_scale`
    Fixed,
    /// This frame's own peak
    Instant,
}

impl ScalingMode {
    pub fn name(self) -> &'static str {
        match self {
            ScalingMode::RollingRms => "rolling_rms",
            ScalingMode::RollingMax => "rolling_max",
            ScalingMode::Fixed => "fixed",
            ScalingMode::Instant => "instant",
        }
    }
}

/// Scaler parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerConfig {
    pub mode: ScalingMode,
    /// Divisor in `Fixed` mode
    pub fixed_scale: f32,
    /// Length of the rolling energy window in seconds
    pub window_seconds: f32,
    /// Seconds per frame; with `window_seconds` this sets the window length
    pub frame_interval: f32,
    /// RMS multiplier in `RollingRms` mode
    pub headroom: f32,
    /// Rate toward a larger target scale (0-1)
    pub attack: f32,
    /// Rate toward a smaller target scale (0-1)
    pub decay: f32,
    pub min_scale: f32,
    /// Final divisor multiplier; larger values make bars shorter
    pub sensitivity: f32,
    /// Frame peaks below this fade proportionally (0 disables)
    pub silence_threshold: f32,
    /// Smoothing rate while a bar rises (0-1)
    pub rise: f32,
    /// Smoothing rate while a bar falls (0-1)
    pub fall: f32,
    pub peak_hold_frames: u32,
    /// Peak marker fall per frame once the hold expires
    pub peak_fall_speed: f32,
}

impl Default for ScalerConfig {
    fn default() -> Self {
        Self {
            mode: ScalingMode::RollingRms,
            fixed_scale: 0.3,
            window_seconds: 3.0,
            frame_interval: 0.005,
            headroom: 2.5,
            attack: 0.1,
            decay: 0.06,
            min_scale: 0.05,
            sensitivity: 1.0,
            silence_threshold: 0.0,
            rise: 0.4,
            fall: 0.1,
            peak_hold_frames: 8,
            peak_fall_speed: 0.08,
        }
    }
}

impl ScalerConfig {
    /// Number of frames held by the rolling energy window (at least 1)
    pub fn window_len(&self) -> usize {
        if self.frame_interval > 0.0 && self.window_seconds > 0.0 {
            ((self.window_seconds / self.frame_interval).round() as usize).max(1)
        } else {
            1
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let rates = [
            ("attack", self.attack),
            ("decay", self.decay),
            ("rise", self.rise),
            ("fall", self.fall),
        ];
        for (name, rate) in rates {
            if !(0.0..=1.0).contains(&rate) {
                return Err(format!("{} must be within 0-1, got {}", name, rate));
            }
        }
        if !(self.min_scale > 0.0) {
            return Err(format!("min_scale must be positive, got {}", self.min_scale));
        }
        if !(self.fixed_scale > 0.0) {
            return Err(format!("fixed_scale must be positive, got {}", self.fixed_scale));
        }
        if !(self.sensitivity > 0.0) {
            return Err(format!("sensitivity must be positive, got {}", self.sensitivity));
        }
        if !(self.frame_interval > 0.0) {
            return Err(format!(
                "frame_interval must be positive, got {}",
                self.frame_interval
            ));
        }
        Ok(())
    }
}

/// Fixed-capacity window of recent values with an O(1) running sum
#[derive(Debug, Clone)]
pub struct RollingWindow {
    values: Vec<f32>,
    head: usize,
    len: usize,
    sum: f64,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: vec![0.0; capacity.max(1)],
            head: 0,
            len: 0,
            sum: 0.0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Add a value, evicting the oldest once full. Non-finite values are
    /// stored as 0.
    pub fn push(&mut self, value: f32) {
        let value = if value.is_finite() { value } else { 0.0 };
        let mut evicted = 0.0;
        if self.len == self.values.len() {
            evicted = self.values[self.head] as f64;
            self.sum -= evicted;
        } else {
            self.len += 1;
        }
        self.values[self.head] = value;
        self.sum += value as f64;
        self.head = (self.head + 1) % self.values.len();

        // Evicting a dominant value leaves only rounding error in the sum
        if !self.sum.is_finite() || evicted.abs() > self.sum.abs() {
            self.sum = self.iter().map(f64::from).sum();
        }
    }

    pub fn mean(&self) -> f32 {
        if self.len == 0 {
            0.0
        } else {
            let mean = self.sum / self.len as f64;
            if mean.is_finite() {
                mean.max(0.0) as f32
            } else {
                0.0
            }
        }
    }

    pub fn max(&self) -> f32 {
        self.iter().fold(0.0, f32::max)
    }

    /// Stored values, oldest first
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        let cap = self.values.len();
        let start = (self.head + cap - self.len) % cap;
        (0..self.len).map(move |i| self.values[(start + i) % cap])
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
        self.sum = 0.0;
    }
}

/// Mutable per-pipeline scaling state
#[derive(Debug, Clone)]
pub struct ScalingState {
    energy: RollingWindow,
    current_scale: f32,
    bars: Vec<f32>,
    normalized: Vec<f32>,
    smoothed: Vec<f32>,
    peaks: Vec<f32>,
    hold: Vec<u32>,
}

impl ScalingState {
    pub fn new(bin_count: usize, window_len: usize, min_scale: f32) -> Self {
        Self {
            energy: RollingWindow::new(window_len),
            current_scale: min_scale,
            bars: vec![0.0; bin_count],
            normalized: vec![0.0; bin_count],
            smoothed: vec![0.0; bin_count],
            peaks: vec![0.0; bin_count],
            hold: vec![0; bin_count],
        }
    }

    pub fn bin_count(&self) -> usize {
        self.smoothed.len()
    }

    pub fn normalized(&self) -> &[f32] {
        &self.normalized
    }

    pub fn smoothed(&self) -> &[f32] {
        &self.smoothed
    }

    pub fn peaks(&self) -> &[f32] {
        &self.peaks
    }

    /// Clear energy history, smoothing and peaks
    pub fn reset(&mut self, min_scale: f32) {
        self.energy.clear();
        self.current_scale = min_scale;
        self.bars.fill(0.0);
        self.normalized.fill(0.0);
        self.smoothed.fill(0.0);
        self.peaks.fill(0.0);
        self.hold.fill(0);
    }
}

/// Output of one scaler step, borrowed from the scaler state
#[derive(Debug, Clone, Copy)]
pub struct ScaledFrame<'a> {
    /// Bars divided by the frame divisor (may exceed 1.0)
    pub normalized: &'a [f32],
    /// Asymmetrically smoothed bars; this is what gets drawn
    pub smoothed: &'a [f32],
    /// Peak marker heights
    pub peaks: &'a [f32],
    /// Divisor used this frame
    pub divisor: f32,
    /// Largest raw bar this frame
    pub frame_peak: f32,
    /// Whether the silence fade was applied
    pub silence_faded: bool,
}

/// Scaler owning its configuration and state
#[derive(Debug, Clone)]
pub struct AdaptiveScaler {
    config: ScalerConfig,
    state: ScalingState,
}

impl AdaptiveScaler {
    pub fn new(config: ScalerConfig, bin_count: usize) -> Self {
        let state = ScalingState::new(bin_count, config.window_len(), config.min_scale);
        Self { config, state }
    }

    pub fn config(&self) -> &ScalerConfig {
        &self.config
    }

    /// Swap configuration. History is kept unless the window length or mode
    /// changes (the window then holds values of a different kind).
    pub fn set_config(&mut self, config: ScalerConfig) {
        let window_changed = config.window_len() != self.config.window_len();
        let mode_changed = config.mode != self.config.mode;

        if window_changed {
            self.state.energy = RollingWindow::new(config.window_len());
        } else if mode_changed {
            self.state.energy.clear();
        }
        self.state.current_scale = self.state.current_scale.max(config.min_scale);
        self.config = config;
    }

    pub fn state(&self) -> &ScalingState {
        &self.state
    }

    /// Adaptive scale tracked in `RollingRms` mode (never below `min_scale`)
    pub fn current_scale(&self) -> f32 {
        self.state.current_scale
    }

    pub fn reset(&mut self) {
        self.state.reset(self.config.min_scale);
    }

    /// Run one frame. A change in bin count resets the state first.
    pub fn process(&mut self, raw: &[f32]) -> ScaledFrame<'_> {
        if raw.len() != self.state.bin_count() {
            debug!(
                "Scaler bin count changed {} -> {}, resetting",
                self.state.bin_count(),
                raw.len()
            );
            self.state = ScalingState::new(raw.len(), self.config.window_len(), self.config.min_scale);
        }

        let cfg = &self.config;
        let state = &mut self.state;

        for (bar, &v) in state.bars.iter_mut().zip(raw) {
            *bar = if v.is_finite() { v.clamp(0.0, MAX_RAW) } else { 0.0 };
        }
        let frame_peak = state.bars.iter().cloned().fold(0.0, f32::max);

        let silence_faded = cfg.silence_threshold > 0.0 && frame_peak < cfg.silence_threshold;
        if silence_faded {
            let fade = frame_peak / cfg.silence_threshold;
            state.bars.iter_mut().for_each(|b| *b *= fade);
        }

        let divisor = match cfg.mode {
            ScalingMode::RollingRms => {
                state.energy.push(frame_peak * frame_peak);
                let rms = state.energy.mean().sqrt();
                let target = (rms * cfg.headroom).max(cfg.min_scale);
                if target.is_finite() {
                    let rate = if target > state.current_scale {
                        cfg.attack
                    } else {
                        cfg.decay
                    };
                    state.current_scale += (target - state.current_scale) * rate.clamp(0.0, 1.0);
                }
                if !state.current_scale.is_finite() {
                    state.current_scale = cfg.min_scale;
                }
                state.current_scale = state.current_scale.max(cfg.min_scale);
                state.current_scale
            }
            ScalingMode::RollingMax => {
                state.energy.push(frame_peak);
                state.energy.max() + EPSILON
            }
            ScalingMode::Fixed => cfg.fixed_scale,
            ScalingMode::Instant => frame_peak + EPSILON,
        };

        let divisor = divisor * cfg.sensitivity;
        let divisor = if divisor.is_finite() {
            divisor.max(EPSILON)
        } else {
            EPSILON
        };

        for (n, &b) in state.normalized.iter_mut().zip(&state.bars) {
            *n = (b / divisor).min(MAX_NORMALIZED);
        }

        for (s, &n) in state.smoothed.iter_mut().zip(&state.normalized) {
            let rate = if n > *s { cfg.rise } else { cfg.fall };
            *s += (n - *s) * rate;
            if !s.is_finite() {
                *s = n;
            }
        }

        for ((peak, hold), &s) in state
            .peaks
            .iter_mut()
            .zip(state.hold.iter_mut())
            .zip(&state.smoothed)
        {
            if s >= *peak {
                *peak = s;
                *hold = cfg.peak_hold_frames;
            } else if *hold > 0 {
                *hold -= 1;
            } else {
                *peak = (*peak - cfg.peak_fall_speed).max(0.0);
            }
        }

        ScaledFrame {
            normalized: &state.normalized,
            smoothed: &state.smoothed,
            peaks: &state.peaks,
            divisor,
            frame_peak,
            silence_faded,
        }
    }
}
