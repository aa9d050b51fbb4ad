//! Matrixviz DSP - Digital Signal Processing Module
//!
//! This crate turns blocks of audio samples into bar heights:
//! - Log-spaced frequency bins with perceptual weighting
//! - Windowed, zero-padded FFT magnitude extraction per bin
//! - Adaptive normalization, asymmetric smoothing and peak tracking
//!
//! # Architecture
//!
//! ```text
//! samples ──▶ SpectralExtractor ──raw bars──▶ AdaptiveScaler ──▶ smoothed + peaks
//!                    ▲
//!             FrequencyBinSet (built once per frequency range)
//! ```
//!
//! Nothing in the per-frame path allocates; all buffers are sized when the
//! extractor, bin set and scaler are constructed.

mod binner;
mod error;
mod extractor;
mod scaler;
mod window;

pub use binner::{
    perceptual_weight, BinnerConfig, FrequencyBinSet, WeightReference, GLOBAL_WEIGHT_MAX_HZ,
    GLOBAL_WEIGHT_MIN_HZ,
};
pub use error::{DspError, DspResult};
pub use extractor::SpectralExtractor;
pub use scaler::{
    AdaptiveScaler, RollingWindow, ScaledFrame, ScalerConfig, ScalingMode, ScalingState,
};
pub use window::{hann, HannWindow};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_exports() {
        // Verify all public types are accessible
        let bins = FrequencyBinSet::build(&BinnerConfig::default()).unwrap();
        let mut extractor = SpectralExtractor::new(512, 8192, 0.3).unwrap();
        let mut scaler = AdaptiveScaler::new(ScalerConfig::default(), bins.len());

        let raw = extractor.extract_to_vec(&[0.0; 512], &bins).unwrap();
        let frame = scaler.process(&raw);
        assert_eq!(frame.smoothed.len(), 64);
    }
}
