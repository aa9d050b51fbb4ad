//! Render Error Types

use thiserror::Error;

/// Errors raised while configuring or running a renderer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Unknown theme '{name}' (available: {available})")]
    UnknownTheme { name: String, available: String },

    #[error("No theme set on the bar renderer")]
    ThemeNotSet,

    #[error("Layer index {index} out of range ({count} layers)")]
    LayerOutOfRange { index: usize, count: usize },
}

/// Result type alias for render operations
pub type RenderResult<T> = Result<T, RenderError>;
