//! Matrixviz Render - Bars, Themes and Layers
//!
//! This crate turns normalized bar heights into pixels:
//! - Declarative gradient themes plus a few computed ones (hue wheels, fire)
//! - An explicit theme registry with name lookup and cycling
//! - Standard, overflow, full and debug bar modes with peak markers
//! - Shadow trails behind falling bars
//! - Multi-layer compositing with per-layer themes and z-order
//!
//! Values arrive in display units: 1.0 is the full matrix height.
//! Anything above 1.0 is overflow and only shows in overflow mode.

mod error;
mod gradient;
mod layers;
mod overflow;
mod registry;
mod renderer;
mod shadow;
mod theme;

pub use error::{RenderError, RenderResult};
pub use gradient::{Gradient, GradientStop, Interpolation};
pub use layers::{LayerStack, LayerState, BOOST_RANGE};
pub use overflow::OverflowStack;
pub use registry::{ThemeFactory, ThemeRegistry};
pub use renderer::{
    column_span, BarRenderer, LayerFrame, OverflowAnchor, RenderMode, RenderOptions,
};
pub use shadow::ShadowBuffer;
pub use theme::{PeakColorMode, Theme, ThemeStyle};

// Re-export the pixel types renderers draw with
pub use matrixviz_display::{Canvas, Rgb};

#[cfg(test)]
mod tests {
    use super::*;
    use matrixviz_display::FrameBuffer;

    #[test]
    fn test_crate_exports() {
        let theme = ThemeRegistry::builtin().create("ocean", 1.0).unwrap();
        let mut renderer = BarRenderer::with_theme(theme, RenderOptions::default());
        let mut fb = FrameBuffer::new(16, 8).unwrap();
        renderer.draw(&mut fb, &[0.5; 16], None).unwrap();
        assert!(fb.lit_pixels() > 0);
    }
}
