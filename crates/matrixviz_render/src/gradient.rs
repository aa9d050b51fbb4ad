//! Gradient Stops
//!
//! A gradient is an ordered list of `(position, color)` stops over 0-1 plus
//! an interpolation curve applied inside each segment. Most themes are
//! nothing more than a base gradient and a list of overflow gradients.

use matrixviz_display::Rgb;

/// Curve applied to the position between two stops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    #[default]
    Linear,
    /// Smoothstep easing
    Smooth,
    /// Hold the lower stop's color for the whole segment
    Step,
}

impl Interpolation {
    #[inline]
    fn apply(self, t: f32) -> f32 {
        match self {
            Interpolation::Linear => t,
            Interpolation::Smooth => t * t * (3.0 - 2.0 * t),
            Interpolation::Step => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub at: f32,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    stops: Vec<GradientStop>,
    interpolation: Interpolation,
}

impl Gradient {
    /// Build from `(position, color)` pairs; stops are sorted by position
    pub fn new(stops: &[(f32, Rgb)], interpolation: Interpolation) -> Self {
        let mut stops: Vec<GradientStop> = stops
            .iter()
            .filter(|(at, _)| at.is_finite())
            .map(|&(at, color)| GradientStop {
                at: at.clamp(0.0, 1.0),
                color,
            })
            .collect();
        stops.sort_by(|a, b| a.at.total_cmp(&b.at));
        Self {
            stops,
            interpolation,
        }
    }

    /// Two-stop linear gradient
    pub fn between(from: Rgb, to: Rgb) -> Self {
        Self::new(&[(0.0, from), (1.0, to)], Interpolation::Linear)
    }

    /// Evenly spaced linear stops
    pub fn even(colors: &[Rgb]) -> Self {
        let last = colors.len().saturating_sub(1).max(1) as f32;
        let stops: Vec<(f32, Rgb)> = colors
            .iter()
            .enumerate()
            .map(|(i, &c)| (i as f32 / last, c))
            .collect();
        Self::new(&stops, Interpolation::Linear)
    }

    pub fn stops(&self) -> &[GradientStop] {
        &self.stops
    }

    /// Color at position `t` (clamped to 0-1, NaN reads as 0)
    pub fn sample(&self, t: f32) -> Rgb {
        let (first, last) = match (self.stops.first(), self.stops.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return Rgb::BLACK,
        };

        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        if t <= first.at {
            return first.color;
        }
        if t >= last.at {
            return last.color;
        }

        for pair in self.stops.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if t < hi.at {
                let span = hi.at - lo.at;
                if span <= 0.0 {
                    return hi.color;
                }
                let local = self.interpolation.apply((t - lo.at) / span);
                return Rgb::lerp(lo.color, hi.color, local);
            }
        }
        last.color
    }
}
