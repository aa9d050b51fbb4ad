//! Theme Registry
//!
//! Explicit name -> constructor table for every theme the renderer can use.
//! Lookups of unknown names fail with the full list of valid names.

use matrixviz_display::Rgb;
use tracing::debug;

use crate::error::{RenderError, RenderResult};
use crate::gradient::{Gradient, Interpolation};
use crate::theme::{Theme, ThemeStyle};

/// Builds the color source of a theme
pub type ThemeFactory = fn() -> ThemeStyle;

const WHITE: Rgb = Rgb::WHITE;

fn classic() -> ThemeStyle {
    ThemeStyle::Gradient {
        base: Gradient::even(&[Rgb::new(0, 0, 255), Rgb::new(0, 255, 0), Rgb::new(255, 0, 0)]),
        overflow: vec![],
    }
}

fn classic_inverted() -> ThemeStyle {
    ThemeStyle::Gradient {
        base: Gradient::even(&[Rgb::new(255, 0, 0), Rgb::new(0, 255, 0), Rgb::new(0, 0, 255)]),
        overflow: vec![
            Gradient::between(Rgb::new(0, 0, 255), Rgb::new(0, 200, 255)),
            Gradient::between(Rgb::new(0, 200, 255), WHITE),
        ],
    }
}

fn warm() -> ThemeStyle {
    ThemeStyle::Gradient {
        base: Gradient::between(Rgb::new(255, 0, 0), Rgb::new(255, 165, 0)),
        overflow: vec![
            Gradient::between(Rgb::new(255, 165, 0), Rgb::new(255, 255, 0)),
            Gradient::between(Rgb::new(255, 255, 0), WHITE),
        ],
    }
}

fn fire() -> ThemeStyle {
    ThemeStyle::Fire {
        base: Gradient::new(
            &[
                (0.0, Rgb::new(32, 0, 0)),
                (0.4, Rgb::new(255, 40, 0)),
                (0.7, Rgb::new(255, 160, 0)),
                (1.0, Rgb::new(255, 255, 220)),
            ],
            Interpolation::Linear,
        ),
    }
}

fn ocean() -> ThemeStyle {
    ThemeStyle::Gradient {
        base: Gradient::even(&[
            Rgb::new(0, 0, 127),
            Rgb::new(16, 64, 159),
            Rgb::new(64, 127, 191),
            Rgb::new(143, 191, 223),
            WHITE,
        ]),
        overflow: vec![
            Gradient::between(Rgb::new(0, 255, 255), WHITE),
            Gradient::between(Rgb::new(230, 255, 255), WHITE),
        ],
    }
}

fn forest() -> ThemeStyle {
    ThemeStyle::Gradient {
        base: Gradient::even(&[
            Rgb::new(0, 76, 0),
            Rgb::new(32, 121, 0),
            Rgb::new(90, 165, 0),
            Rgb::new(166, 210, 0),
            Rgb::new(255, 255, 0),
        ]),
        overflow: vec![
            Gradient::between(Rgb::new(255, 255, 0), Rgb::new(255, 210, 50)),
            Gradient::between(Rgb::new(255, 210, 50), Rgb::new(255, 255, 200)),
        ],
    }
}

fn purple() -> ThemeStyle {
    ThemeStyle::Gradient {
        base: Gradient::new(
            &[
                (0.0, Rgb::new(102, 0, 153)),
                (0.5, Rgb::new(178, 64, 204)),
                (1.0, WHITE),
            ],
            Interpolation::Smooth,
        ),
        overflow: vec![
            Gradient::between(Rgb::new(255, 105, 180), Rgb::new(255, 180, 220)),
            Gradient::between(Rgb::new(255, 180, 220), WHITE),
        ],
    }
}

fn sunset() -> ThemeStyle {
    ThemeStyle::Gradient {
        base: Gradient::even(&[
            Rgb::new(75, 0, 130),
            Rgb::new(255, 20, 147),
            Rgb::new(255, 140, 0),
            Rgb::new(255, 220, 50),
        ]),
        overflow: vec![
            Gradient::between(Rgb::new(255, 220, 50), Rgb::new(255, 255, 230)),
            Gradient::between(Rgb::new(255, 255, 230), WHITE),
        ],
    }
}

fn mono_green() -> ThemeStyle {
    ThemeStyle::Gradient {
        base: Gradient::between(Rgb::new(0, 40, 0), Rgb::new(0, 255, 0)),
        overflow: vec![
            Gradient::between(Rgb::new(0, 255, 0), Rgb::new(180, 255, 180)),
            Gradient::between(Rgb::new(180, 255, 180), WHITE),
        ],
    }
}

fn rainbow() -> ThemeStyle {
    ThemeStyle::Rainbow
}

fn spectrum() -> ThemeStyle {
    ThemeStyle::Spectrum
}

/// Built-in themes in cycling order
const BUILTIN: [(&str, ThemeFactory); 11] = [
    ("classic", classic),
    ("classic_inverted", classic_inverted),
    ("warm", warm),
    ("fire", fire),
    ("ocean", ocean),
    ("forest", forest),
    ("purple", purple),
    ("sunset", sunset),
    ("rainbow", rainbow),
    ("spectrum", spectrum),
    ("mono_green", mono_green),
];

/// Ordered table of theme constructors
#[derive(Debug, Clone)]
pub struct ThemeRegistry {
    entries: Vec<(&'static str, ThemeFactory)>,
}

impl Default for ThemeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ThemeRegistry {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN.to_vec(),
        }
    }

    /// Add a theme, replacing any existing entry of the same name
    pub fn register(&mut self, name: &'static str, factory: ThemeFactory) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = factory,
            None => self.entries.push((name, factory)),
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(n, _)| *n).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(n, _)| *n == name)
    }

    /// Instantiate `name` at the given brightness
    pub fn create(&self, name: &str, brightness: f32) -> RenderResult<Theme> {
        let (registered, factory) = self
            .position(name)
            .map(|i| self.entries[i])
            .ok_or_else(|| RenderError::UnknownTheme {
                name: name.to_string(),
                available: self.names().join(", "),
            })?;
        debug!("Creating theme '{}' (brightness {:.2})", registered, brightness);
        Ok(Theme::new(registered, factory(), brightness))
    }

    /// Name `step` places away from `current` in registration order,
    /// wrapping at both ends. Unknown names start from the first entry.
    pub fn cycle(&self, current: &str, step: isize) -> Option<&'static str> {
        if self.entries.is_empty() {
            return None;
        }
        let len = self.entries.len() as isize;
        let index = match self.position(current) {
            Some(i) => (i as isize + step).rem_euclid(len),
            None => 0,
        };
        Some(self.entries[index as usize].0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names() {
        let registry = ThemeRegistry::builtin();
        let names = registry.names();
        assert_eq!(names.len(), 11);
        for name in ["classic", "ocean", "fire", "rainbow", "mono_green"] {
            assert!(registry.contains(name), "{}", name);
        }
    }

    #[test]
    fn test_every_builtin_produces_colors() {
        let registry = ThemeRegistry::builtin();
        for name in registry.names() {
            let theme = registry.create(name, 1.0).unwrap();
            assert_eq!(theme.name(), name);
            let top = theme.color_for(1.0, 0.5);
            assert!(!top.is_black(), "{} top is black", name);
            for layer in 0..4 {
                let _ = theme.overflow_color_for(layer, 0.5, 0.5, 3, 2.0);
            }
        }
    }

    #[test]
    fn test_unknown_theme_lists_names() {
        let registry = ThemeRegistry::builtin();
        let err = registry.create("neon", 1.0).unwrap_err();
        match err {
            RenderError::UnknownTheme { name, available } => {
                assert_eq!(name, "neon");
                assert!(available.contains("ocean"));
                assert!(available.contains("sunset"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_cycle_wraps() {
        let registry = ThemeRegistry::builtin();
        assert_eq!(registry.cycle("classic", 1), Some("classic_inverted"));
        assert_eq!(registry.cycle("classic", -1), Some("mono_green"));
        assert_eq!(registry.cycle("mono_green", 1), Some("classic"));
        assert_eq!(registry.cycle("bogus", 1), Some("classic"));
        assert_eq!(ThemeRegistry::empty().cycle("classic", 1), None);
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = ThemeRegistry::empty();
        registry.register("mine", rainbow);
        registry.register("mine", spectrum);
        assert_eq!(registry.names(), vec!["mine"]);
        let theme = registry.create("mine", 1.0).unwrap();
        assert_eq!(theme.style(), &ThemeStyle::Spectrum);
    }

    #[test]
    fn test_classic_gradient_endpoints() {
        let theme = ThemeRegistry::builtin().create("classic", 1.0).unwrap();
        assert_eq!(theme.color_for(0.0, 0.0), Rgb::new(0, 0, 255));
        assert_eq!(theme.color_for(0.5, 0.0), Rgb::new(0, 255, 0));
        assert_eq!(theme.color_for(1.0, 0.0), Rgb::new(255, 0, 0));
    }
}
