//! Engine Error Types

use thiserror::Error;

/// Errors that can occur in the engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("No audio input devices found")]
    NoDevicesFound,

    #[error("Device not found: {name} (available: {available})")]
    DeviceNotFound { name: String, available: String },

    #[error("Failed to build audio stream: {0}")]
    StreamBuildError(String),

    #[error("Failed to play audio stream: {0}")]
    StreamPlayError(String),

    #[error("Stream configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Unknown visualizer '{name}' (available: {available})")]
    UnknownVisualizer { name: String, available: String },

    #[error("Unknown preset '{name}' (available: {available})")]
    UnknownPreset { name: String, available: String },

    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings format error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("DSP error: {0}")]
    Dsp(#[from] matrixviz_dsp::DspError),

    #[error("Render error: {0}")]
    Render(#[from] matrixviz_render::RenderError),

    #[error("Display error: {0}")]
    Display(#[from] matrixviz_display::DisplayError),
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
