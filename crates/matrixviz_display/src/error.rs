//! Display Error Types

use thiserror::Error;

/// Errors from display surfaces
#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("Invalid matrix dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Terminal I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for display operations
pub type DisplayResult<T> = Result<T, DisplayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DisplayError::InvalidDimensions {
            width: 0,
            height: 32,
        };
        assert!(err.to_string().contains("0x32"));
    }

    #[test]
    fn test_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        let err: DisplayError = io.into();
        assert!(matches!(err, DisplayError::Io(_)));
    }
}
