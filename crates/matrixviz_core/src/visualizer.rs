//! Visualizer Registry
//!
//! The engine drives one visualizer at a time. Capabilities are reached
//! through explicit accessors (`as_bars_mut`) rather than probing.

use matrixviz_display::Canvas;
use matrixviz_render::{BarRenderer, ThemeRegistry};
use tracing::info;

use crate::config::Settings;
use crate::error::{EngineError, EngineResult};
use crate::life::GameOfLife;

/// Registered visualizer names in listing order
pub const VISUALIZER_NAMES: [&str; 3] = ["bars", "life", "blank"];

#[derive(Debug)]
pub enum Visualizer {
    /// Spectrum bars, the only audio-driven visualizer
    Bars(BarRenderer),
    Life(GameOfLife),
    /// Draws nothing
    Blank,
}

impl Visualizer {
    pub fn name(&self) -> &'static str {
        match self {
            Visualizer::Bars(_) => "bars",
            Visualizer::Life(_) => "life",
            Visualizer::Blank => "blank",
        }
    }

    /// Whether frames should only be drawn when fresh audio arrives
    pub fn needs_audio(&self) -> bool {
        matches!(self, Visualizer::Bars(_))
    }

    pub fn as_bars(&self) -> Option<&BarRenderer> {
        match self {
            Visualizer::Bars(renderer) => Some(renderer),
            _ => None,
        }
    }

    pub fn as_bars_mut(&mut self) -> Option<&mut BarRenderer> {
        match self {
            Visualizer::Bars(renderer) => Some(renderer),
            _ => None,
        }
    }

    /// Draw a frame for visualizers that do not consume spectrum data
    pub fn draw_idle<C: Canvas + ?Sized>(&mut self, canvas: &mut C) {
        match self {
            Visualizer::Life(life) => life.draw(canvas),
            Visualizer::Blank => canvas.clear(),
            Visualizer::Bars(_) => {}
        }
    }
}

/// Name -> visualizer constructor
#[derive(Debug, Clone, Default)]
pub struct VisualizerRegistry {
    themes: ThemeRegistry,
}

impl VisualizerRegistry {
    pub fn new(themes: ThemeRegistry) -> Self {
        Self { themes }
    }

    pub fn names(&self) -> &'static [&'static str] {
        &VISUALIZER_NAMES
    }

    pub fn themes(&self) -> &ThemeRegistry {
        &self.themes
    }

    /// Build the named visualizer for a `width` x `height` matrix
    pub fn create(
        &self,
        name: &str,
        settings: &Settings,
        width: usize,
        height: usize,
    ) -> EngineResult<Visualizer> {
        let visualizer = match name.to_ascii_lowercase().as_str() {
            "bars" => {
                let theme = self
                    .themes
                    .create(&settings.color.theme, settings.color.brightness)?;
                Visualizer::Bars(BarRenderer::with_theme(theme, settings.render_options()))
            }
            "life" => Visualizer::Life(GameOfLife::new(
                width,
                height,
                settings.frames_per_second(),
                None,
            )),
            "blank" => Visualizer::Blank,
            _ => {
                return Err(EngineError::UnknownVisualizer {
                    name: name.to_string(),
                    available: VISUALIZER_NAMES.join(", "),
                })
            }
        };
        info!("Visualizer '{}' ready ({}x{})", visualizer.name(), width, height);
        Ok(visualizer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matrixviz_display::FrameBuffer;

    #[test]
    fn test_create_each() {
        let registry = VisualizerRegistry::default();
        let settings = Settings::default();
        for name in registry.names() {
            let v = registry.create(name, &settings, 16, 8).unwrap();
            assert_eq!(v.name(), *name);
        }
    }

    #[test]
    fn test_unknown_visualizer_lists_names() {
        let registry = VisualizerRegistry::default();
        let err = registry
            .create("plasma", &Settings::default(), 16, 8)
            .unwrap_err();
        match err {
            EngineError::UnknownVisualizer { name, available } => {
                assert_eq!(name, "plasma");
                assert_eq!(available, "bars, life, blank");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_unknown_theme_fails_bars() {
        let mut settings = Settings::default();
        settings.color.theme = "neon".to_string();
        let err = VisualizerRegistry::default()
            .create("bars", &settings, 16, 8)
            .unwrap_err();
        assert!(matches!(err, EngineError::Render(_)));
    }

    #[test]
    fn test_capabilities() {
        let registry = VisualizerRegistry::default();
        let settings = Settings::default();
        let mut bars = registry.create("bars", &settings, 16, 8).unwrap();
        assert!(bars.as_bars_mut().is_some());
        assert!(bars.needs_audio());

        let mut blank = registry.create("blank", &settings, 16, 8).unwrap();
        assert!(blank.as_bars_mut().is_none());
        assert!(!blank.needs_audio());
    }

    #[test]
    fn test_blank_clears() {
        let mut fb = FrameBuffer::new(4, 4).unwrap();
        fb.set_pixel(0, 0, matrixviz_display::Rgb::WHITE);
        Visualizer::Blank.draw_idle(&mut fb);
        assert_eq!(fb.lit_pixels(), 0);
    }
}
