//! Message Types for Thread Communication
//!
//! Commands flow from the input thread -> render loop
//! Events flow from the render loop -> input/UI side

use serde::{Deserialize, Serialize};

/// Commands sent to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    NextTheme,
    PrevTheme,

    ToggleGradient,
    ToggleOverflow,
    ToggleBars,
    ToggleFull,
    ToggleDebug,
    ToggleShadow,
    TogglePeaks,

    /// Cycle peak marker coloring white -> bar -> contrast -> peak
    CyclePeakColor,

    NextZoom,
    PrevZoom,

    /// Switch between the single spectrum and the layer stack
    ToggleLayers,

    /// Select a layer by index (0-based)
    SelectLayer(usize),
    ToggleLayerVisible,
    LayerForward,
    LayerBackward,
    LayerBoostUp,
    LayerBoostDown,

    /// Forget adaptive scaling history
    ResetScaling,

    SaveSettings,

    /// Stop the render loop
    Quit,
}

/// Events sent back from the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Event {
    ThemeChanged { name: String },

    /// A boolean drawing switch changed
    ModeChanged { name: String, enabled: bool },

    PeakColorChanged { mode: String },

    ZoomChanged { min_freq: f32, max_freq: f32 },

    /// Selected layer or one of its properties changed
    LayerChanged {
        index: usize,
        name: String,
        visible: bool,
        z_index: usize,
        energy_boost: f32,
    },

    ScalingReset,

    SettingsSaved { path: String },

    Error { message: String },
}

impl Event {
    /// Create an error event from any error type
    pub fn error<E: std::fmt::Display>(err: E) -> Self {
        Event::Error {
            message: err.to_string(),
        }
    }

    pub(crate) fn mode(name: &str, enabled: bool) -> Self {
        Event::ModeChanged {
            name: name.to_string(),
            enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = Event::ZoomChanged {
            min_freq: 100.0,
            max_freq: 6300.0,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("ZoomChanged"));
        assert!(json.contains("6300"));

        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_error_event() {
        let event = Event::error("stream died");
        assert_eq!(
            event,
            Event::Error {
                message: "stream died".to_string()
            }
        );
    }

    #[test]
    fn test_mode_event() {
        assert_eq!(
            Event::mode("overflow", false),
            Event::ModeChanged {
                name: "overflow".to_string(),
                enabled: false
            }
        );
    }
}
