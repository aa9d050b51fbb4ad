//! Hann Window
//!
//! Tapers a block before the FFT to reduce spectral leakage.

/// Hann coefficient for sample `n` of a symmetric window of `size` samples
#[inline]
pub fn hann(n: usize, size: usize) -> f32 {
    if size < 2 {
        return 1.0;
    }
    0.5 * (1.0 - (2.0 * std::f32::consts::PI * n as f32 / (size - 1) as f32).cos())
}

/// Pre-computed Hann window lookup table
#[derive(Debug, Clone)]
pub struct HannWindow {
    coeffs: Vec<f32>,
}

impl HannWindow {
    pub fn new(size: usize) -> Self {
        Self {
            coeffs: (0..size).map(|i| hann(i, size)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    pub fn coeffs(&self) -> &[f32] {
        &self.coeffs
    }

    #[inline]
    pub fn apply(&self, sample: f32, index: usize) -> f32 {
        sample * self.coeffs[index]
    }
}
