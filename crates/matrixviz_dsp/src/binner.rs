//! Logarithmic Frequency Binner
//!
//! Partitions a frequency range into log-spaced bins and maps each bin to
//! the FFT indices whose center frequency falls inside it. Each bin also
//! gets a perceptual weight that boosts higher bands, whose raw magnitudes
//! are naturally smaller.
//!
//! The bin set is built once at startup (and again only when the range is
//! reconfigured, e.g. a zoom preset change); per-frame extraction only
//! reads it.
//!
//! # Bin membership
//!
//! FFT index `k` has frequency `k * sample_rate / fft_size` for
//! `k = 0..=fft_size/2`. It belongs to bin `i` when
//! `edge[i] <= freq < edge[i + 1]`, so a frequency sitting exactly on a
//! shared edge belongs to the upper bin. Indices outside `[min, max)` belong
//! to no bin.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{DspError, DspResult};

/// Lower bound of the fixed weighting reference range
pub const GLOBAL_WEIGHT_MIN_HZ: f32 = 20.0;
/// Upper bound of the fixed weighting reference range
pub const GLOBAL_WEIGHT_MAX_HZ: f32 = 20_000.0;

/// Exponent of the perceptual weight curve
const WEIGHT_EXPONENT: f32 = 1.5;

/// Frequency range used to place each bin on the weight curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightReference {
    /// The bin set's own `min_freq..max_freq`
    #[default]
    Local,
    /// A fixed 20 Hz - 20 kHz range. Bin sets covering only a slice of the
    /// spectrum are weighted the same as that slice would be in a full-range set.
    Global,
}

impl WeightReference {
    fn range(self, min_freq: f32, max_freq: f32) -> (f32, f32) {
        match self {
            WeightReference::Local => (min_freq, max_freq),
            WeightReference::Global => (GLOBAL_WEIGHT_MIN_HZ, GLOBAL_WEIGHT_MAX_HZ),
        }
    }
}

/// Parameters for building a [`FrequencyBinSet`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinnerConfig {
    pub sample_rate: f32,
    pub fft_size: usize,
    pub min_freq: f32,
    pub max_freq: f32,
    pub bin_count: usize,
    /// Weight applied at the bottom of the reference range
    pub low_weight: f32,
    /// Weight applied at the top of the reference range
    pub high_weight: f32,
    #[serde(default)]
    pub reference: WeightReference,
}

impl Default for BinnerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            fft_size: 8192,
            min_freq: 60.0,
            max_freq: 14_000.0,
            bin_count: 64,
            low_weight: 0.55,
            high_weight: 10.0,
            reference: WeightReference::Local,
        }
    }
}

impl BinnerConfig {
    pub fn validate(&self) -> DspResult<()> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(DspError::InvalidSampleRate(self.sample_rate));
        }
        if self.fft_size < 2 {
            return Err(DspError::InvalidFftSize(self.fft_size));
        }
        if !(self.min_freq.is_finite()
            && self.max_freq.is_finite()
            && self.min_freq > 0.0
            && self.min_freq < self.max_freq)
        {
            return Err(DspError::InvalidFrequencyRange {
                min: self.min_freq,
                max: self.max_freq,
            });
        }
        if self.bin_count == 0 {
            return Err(DspError::NoBins);
        }
        Ok(())
    }

    /// Frequency resolution of one FFT index in Hz
    pub fn resolution(&self) -> f32 {
        self.sample_rate / self.fft_size as f32
    }

    /// Number of FFT indices whose frequency lies in `[min_freq, max_freq)`
    pub fn resolvable_indices(&self) -> usize {
        let lookup = IndexLookup::new(self.sample_rate, self.fft_size);
        let start = lookup.first_at_or_above(self.min_freq as f64, 0);
        lookup.first_at_or_above(self.max_freq as f64, start) - start
    }
}

/// Perceptual weight for a bin at `norm_pos` (0 = bottom, 1 = top of the
/// reference range)
pub fn perceptual_weight(norm_pos: f32, low_weight: f32, high_weight: f32) -> f32 {
    let pos = if norm_pos.is_finite() {
        norm_pos.clamp(0.0, 1.0)
    } else {
        0.0
    };
    low_weight + (high_weight - low_weight) * pos.powf(WEIGHT_EXPONENT)
}

/// Helper for mapping frequencies onto FFT indices
struct IndexLookup {
    hz_per_index: f64,
    /// Highest usable index (Nyquist)
    last: usize,
}

impl IndexLookup {
    fn new(sample_rate: f32, fft_size: usize) -> Self {
        Self {
            hz_per_index: sample_rate as f64 / fft_size as f64,
            last: fft_size / 2,
        }
    }

    #[inline]
    fn frequency(&self, k: usize) -> f64 {
        k as f64 * self.hz_per_index
    }

    /// First index at or after `from` whose frequency is >= `freq`,
    /// or `last + 1` when there is none
    fn first_at_or_above(&self, freq: f64, from: usize) -> usize {
        let mut k = from;
        while k <= self.last && self.frequency(k) < freq {
            k += 1;
        }
        k
    }
}

/// Log-spaced frequency bins with their FFT index ranges and weights
#[derive(Debug, Clone)]
pub struct FrequencyBinSet {
    /// `bin_count + 1` ascending edges in Hz
    edges: Vec<f64>,
    /// Contiguous FFT index range per bin (may be empty)
    ranges: Vec<Range<usize>>,
    weights: Vec<f32>,
    sample_rate: f32,
    fft_size: usize,
}

impl FrequencyBinSet {
    /// Build the bin set. Logs a single warning when some bins contain no
    /// FFT index (resolution too coarse for that many bins).
    pub fn build(config: &BinnerConfig) -> DspResult<Self> {
        config.validate()?;

        let n = config.bin_count;
        let log_min = (config.min_freq as f64).ln();
        let log_max = (config.max_freq as f64).ln();
        let step = (log_max - log_min) / n as f64;

        let mut edges: Vec<f64> = (0..=n)
            .map(|i| snap_hz((log_min + step * i as f64).exp()))
            .collect();
        edges[0] = config.min_freq as f64;
        edges[n] = config.max_freq as f64;

        let lookup = IndexLookup::new(config.sample_rate, config.fft_size);
        let mut ranges = Vec::with_capacity(n);
        let mut start = lookup.first_at_or_above(edges[0], 0);
        for upper in &edges[1..] {
            let end = lookup.first_at_or_above(*upper, start);
            ranges.push(start..end);
            start = end;
        }

        let (ref_min, ref_max) = config.reference.range(config.min_freq, config.max_freq);
        let span = (ref_max as f64 / ref_min as f64).ln();
        let weights = edges
            .windows(2)
            .map(|pair| {
                let center = (pair[0] + pair[1]) / 2.0;
                let norm_pos = if span > 0.0 {
                    ((center / ref_min as f64).ln() / span) as f32
                } else {
                    0.0
                };
                perceptual_weight(norm_pos, config.low_weight, config.high_weight)
            })
            .collect();

        let set = Self {
            edges,
            ranges,
            weights,
            sample_rate: config.sample_rate,
            fft_size: config.fft_size,
        };

        let empty = set.empty_count();
        if empty > 0 {
            warn!(
                "{} of {} frequency bins are empty ({:.1}-{:.1}Hz at {:.2}Hz resolution); \
                 they will always read zero",
                empty,
                n,
                config.min_freq,
                config.max_freq,
                config.resolution()
            );
        }
        debug!(
            "Built {} log bins {:.1}-{:.1}Hz ({:?} weighting)",
            n, config.min_freq, config.max_freq, config.reference
        );

        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn ranges(&self) -> &[Range<usize>] {
        &self.ranges
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Whether bin `i` contains no FFT index
    pub fn is_bin_empty(&self, i: usize) -> bool {
        self.ranges.get(i).map_or(true, |r| r.is_empty())
    }

    pub fn empty_count(&self) -> usize {
        self.ranges.iter().filter(|r| r.is_empty()).count()
    }

    /// Arithmetic center of bin `i` in Hz
    pub fn center(&self, i: usize) -> Option<f64> {
        Some((self.edges.get(i)? + self.edges.get(i + 1)?) / 2.0)
    }

    /// Bin that owns FFT index `k`, if any
    pub fn bin_of_index(&self, k: usize) -> Option<usize> {
        self.ranges.iter().position(|r| r.contains(&k))
    }
}

/// Snap to a micro-hertz grid so edges that land on an FFT index frequency
/// compare exactly
#[inline]
fn snap_hz(hz: f64) -> f64 {
    (hz * 1e6).round() / 1e6
}
