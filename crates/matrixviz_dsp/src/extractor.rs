//! Spectral Extractor
//!
//! Turns one block of mono samples into one raw magnitude per frequency bin:
//!
//! 1. Multiply by a Hann window of the block length
//! 2. Zero-pad to the FFT size and run a forward FFT
//! 3. Take the magnitude of the one-sided spectrum (`0..=fft_size/2`)
//! 4. Per bin: mean magnitude over its FFT indices, times the bin weight
//! 5. Subtract the noise floor, clamping at zero
//!
//! All buffers are allocated up front; `extract` does not allocate.

use std::fmt;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::binner::FrequencyBinSet;
use crate::error::{DspError, DspResult};
use crate::window::HannWindow;

pub struct SpectralExtractor {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    window: HannWindow,
    /// FFT input/output (in place)
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    /// One-sided magnitude spectrum of the last block
    magnitudes: Vec<f32>,
    noise_floor: f32,
}

impl fmt::Debug for SpectralExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectralExtractor")
            .field("block_size", &self.block_size())
            .field("fft_size", &self.fft_size)
            .field("noise_floor", &self.noise_floor)
            .finish_non_exhaustive()
    }
}

impl SpectralExtractor {
    /// Create an extractor for blocks of `block_size` samples zero-padded to
    /// `fft_size` points
    pub fn new(block_size: usize, fft_size: usize, noise_floor: f32) -> DspResult<Self> {
        if fft_size < 2 {
            return Err(DspError::InvalidFftSize(fft_size));
        }
        if block_size == 0 || block_size > fft_size {
            return Err(DspError::InvalidBlockSize {
                block: block_size,
                fft: fft_size,
            });
        }

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        let scratch_len = fft.get_inplace_scratch_len();

        Ok(Self {
            fft,
            fft_size,
            window: HannWindow::new(block_size),
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
            magnitudes: vec![0.0; fft_size / 2 + 1],
            noise_floor: sanitize_floor(noise_floor),
        })
    }

    pub fn block_size(&self) -> usize {
        self.window.len()
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn noise_floor(&self) -> f32 {
        self.noise_floor
    }

    pub fn set_noise_floor(&mut self, noise_floor: f32) {
        self.noise_floor = sanitize_floor(noise_floor);
    }

    /// Magnitude spectrum computed by the last `extract` call
    pub fn magnitudes(&self) -> &[f32] {
        &self.magnitudes
    }

    /// Extract one value per bin into `out`
    ///
    /// Non-finite samples are treated as silence.
    pub fn extract(
        &mut self,
        samples: &[f32],
        bins: &FrequencyBinSet,
        out: &mut [f32],
    ) -> DspResult<()> {
        if samples.len() != self.block_size() {
            return Err(DspError::BufferSizeMismatch {
                expected: self.block_size(),
                got: samples.len(),
            });
        }
        if bins.fft_size() != self.fft_size {
            return Err(DspError::FftSizeMismatch {
                bins: bins.fft_size(),
                fft: self.fft_size,
            });
        }
        if out.len() != bins.len() {
            return Err(DspError::BufferSizeMismatch {
                expected: bins.len(),
                got: out.len(),
            });
        }

        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = match samples.get(i) {
                Some(&s) if s.is_finite() => self.window.apply(s, i),
                _ => 0.0,
            };
            *slot = Complex::new(sample, 0.0);
        }

        self.fft
            .process_with_scratch(&mut self.buffer, &mut self.scratch);

        for (mag, c) in self.magnitudes.iter_mut().zip(&self.buffer) {
            *mag = c.norm();
        }

        for ((value, range), weight) in out.iter_mut().zip(bins.ranges()).zip(bins.weights()) {
            let bar = if range.is_empty() {
                0.0
            } else {
                let sum: f32 = self.magnitudes[range.clone()].iter().sum();
                sum / range.len() as f32 * weight
            };
            *value = (bar - self.noise_floor).max(0.0);
        }

        Ok(())
    }

    /// Convenience wrapper returning a freshly allocated vector
    pub fn extract_to_vec(&mut self, samples: &[f32], bins: &FrequencyBinSet) -> DspResult<Vec<f32>> {
        let mut out = vec![0.0; bins.len()];
        self.extract(samples, bins, &mut out)?;
        Ok(out)
    }
}

fn sanitize_floor(noise_floor: f32) -> f32 {
    if noise_floor.is_finite() {
        noise_floor.max(0.0)
    } else {
        0.0
    }
}
