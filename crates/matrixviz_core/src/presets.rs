//! Genre Presets
//!
//! Named adjustments on top of a settings tree. Applying a preset only
//! touches the groups it cares about, so it can be layered over a loaded
//! settings file.

use tracing::info;

use crate::config::Settings;
use crate::error::{EngineError, EngineResult};

/// Preset names in listing order
pub const PRESET_NAMES: [&str; 5] = ["default", "bluegrass", "edm", "classical", "podcast"];

fn set_range(s: &mut Settings, min_freq: f32, max_freq: f32) {
    s.frequency.min_freq = min_freq;
    s.frequency.max_freq = max_freq;
    s.frequency.zoom_mode = false;
}

fn set_sensitivity(s: &mut Settings, low: f32, high: f32, noise_floor: f32) {
    s.sensitivity.low_weight = low;
    s.sensitivity.high_weight = high;
    s.sensitivity.noise_floor = noise_floor;
}

fn set_smoothing(s: &mut Settings, rise: f32, fall: f32) {
    s.smoothing.rise = rise;
    s.smoothing.fall = fall;
}

fn bluegrass(s: &mut Settings) {
    set_range(s, 80.0, 8000.0);
    s.color.theme = "warm".to_string();
    set_sensitivity(s, 0.6, 8.0, 0.25);
    s.scaling.attack = 0.12;
    s.scaling.decay = 0.05;
}

fn edm(s: &mut Settings) {
    set_range(s, 40.0, 12_000.0);
    s.color.theme = "fire".to_string();
    s.color.brightness = 1.2;
    set_sensitivity(s, 0.8, 6.0, 0.2);
    s.scaling.headroom = 3.0;
    s.scaling.attack = 0.15;
    s.scaling.decay = 0.08;
    s.overflow.enabled = true;
    s.overflow.multiplier = 1.8;
    set_smoothing(s, 0.9, 0.3);
}

fn classical(s: &mut Settings) {
    set_range(s, 60.0, 10_000.0);
    s.color.theme = "ocean".to_string();
    s.color.brightness = 0.9;
    set_sensitivity(s, 0.7, 5.0, 0.15);
    s.scaling.headroom = 2.0;
    s.scaling.attack = 0.08;
    s.scaling.decay = 0.03;
    s.overflow.enabled = false;
    set_smoothing(s, 0.6, 0.15);
}

fn podcast(s: &mut Settings) {
    set_range(s, 100.0, 4000.0);
    s.color.theme = "mono_green".to_string();
    set_sensitivity(s, 0.4, 3.0, 0.35);
    s.scaling.headroom = 2.0;
    s.scaling.attack = 0.1;
    s.scaling.decay = 0.04;
    s.overflow.enabled = false;
    set_smoothing(s, 0.7, 0.2);
}

/// Apply a named preset over `settings`
pub fn apply_preset(settings: &mut Settings, name: &str) -> EngineResult<()> {
    match name.to_ascii_lowercase().as_str() {
        "default" => *settings = Settings::default(),
        "bluegrass" => bluegrass(settings),
        "edm" => edm(settings),
        "classical" => classical(settings),
        "podcast" => podcast(settings),
        _ => {
            return Err(EngineError::UnknownPreset {
                name: name.to_string(),
                available: PRESET_NAMES.join(", "),
            })
        }
    }
    info!("Applied preset '{}'", name);
    Ok(())
}

/// Default settings with a named preset applied
pub fn preset(name: &str) -> EngineResult<Settings> {
    let mut settings = Settings::default();
    apply_preset(&mut settings, name)?;
    Ok(settings)
}
