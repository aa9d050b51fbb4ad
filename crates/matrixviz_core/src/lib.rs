//! Matrixviz Core - Engine
//!
//! This crate ties capture, analysis and drawing together:
//! - Audio input via CPAL, published as the newest fixed-size block
//! - Settings tree with JSON persistence, genre presets and zoom presets
//! - Spectrum pipelines (main spectrum and per-layer bands)
//! - Visualizer registry (bars, Game of Life, blank)
//! - The render loop and its command/event channels
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Input Thread                           │
//! │        (keyboard) ──commands──▶ Engine ◀──events──          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ crossbeam-channel
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Render Loop                            │
//! │  LatestBlock ──▶ SpectrumPipeline ──▶ BarRenderer ──▶ Display│
//! │      ▲              (bins, FFT, scaling)                    │
//! └──────┼──────────────────────────────────────────────────────┘
//!        │ newest block wins
//! ┌──────┴──────────────────────────────────────────────────────┐
//! │                  CPAL Audio Callback                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod audio;
mod config;
mod engine;
mod error;
mod life;
mod message;
mod pipeline;
mod presets;
mod settings;
mod visualizer;

pub use audio::{list_input_devices, AudioCapture, AudioSource, LatestBlock, SyntheticSource};
pub use config::{
    AudioSettings, ColorSettings, FrequencySettings, LayerSettings, OverflowSettings,
    PeakSettings, RenderSettings, ScalingSettings, SensitivitySettings, Settings, ShadowSettings,
    SmoothingSettings,
};
pub use engine::{Engine, BOOST_STEP};
pub use error::{EngineError, EngineResult};
pub use life::{GameOfLife, SEED_DENSITY};
pub use message::{Command, Event};
pub use pipeline::{LayerPipelines, SpectrumPipeline};
pub use presets::{apply_preset, preset, PRESET_NAMES};
pub use visualizer::{Visualizer, VisualizerRegistry, VISUALIZER_NAMES};

// Re-export the registry type callers need to build a VisualizerRegistry
pub use matrixviz_render::ThemeRegistry;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_exports() {
        // Verify public API is accessible
        let settings = Settings::default();
        let engine = Engine::new(settings, VisualizerRegistry::default(), 48_000.0, 64, 32).unwrap();
        assert_eq!(engine.size(), (64, 32));
        assert_eq!(PRESET_NAMES.len(), 5);
    }
}
