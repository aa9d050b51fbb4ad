//! DSP Error Types

use thiserror::Error;

/// Errors that can occur during DSP operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DspError {
    #[error("Sample rate must be positive, got {0}")]
    InvalidSampleRate(f32),

    #[error("FFT size must be at least 2, got {0}")]
    InvalidFftSize(usize),

    #[error("Invalid frequency range: {min}Hz - {max}Hz (need 0 < min < max)")]
    InvalidFrequencyRange { min: f32, max: f32 },

    #[error("Bin count must be at least 1")]
    NoBins,

    #[error("Block size {block} must be between 1 and the FFT size {fft}")]
    InvalidBlockSize { block: usize, fft: usize },

    #[error("Buffer size mismatch: expected {expected}, got {got}")]
    BufferSizeMismatch { expected: usize, got: usize },

    #[error("Bin set was built for FFT size {bins}, extractor uses {fft}")]
    FftSizeMismatch { bins: usize, fft: usize },
}

/// Result type alias for DSP operations
pub type DspResult<T> = Result<T, DspError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DspError::InvalidFrequencyRange {
            min: 8000.0,
            max: 100.0,
        };
        assert!(err.to_string().contains("8000"));

        let err = DspError::BufferSizeMismatch {
            expected: 512,
            got: 256,
        };
        assert!(err.to_string().contains("512"));
        assert!(err.to_string().contains("256"));
    }
}
