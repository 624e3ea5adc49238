//! Error types for recon_fusion.

use recon_map::MapError;
use thiserror::Error;

/// Errors that can occur while configuring or running reconstruction passes.
#[derive(Error, Debug)]
pub enum FusionError {
    /// Invalid configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// A depth image does not match the classification image size.
    #[error("{image} depth image is {got:?}, expected {expected:?}")]
    ImageSizeMismatch {
        /// Which image was wrong.
        image: &'static str,
        /// Classification image size.
        expected: (u32, u32),
        /// Offending image size.
        got: (u32, u32),
    },

    /// A pixel buffer does not match the stated image size.
    #[error("pixel buffer holds {got} pixels, expected {expected}")]
    PixelBufferLength {
        /// `width * height`.
        expected: usize,
        /// Buffer length.
        got: usize,
    },

    /// Frame index 0 is reserved for blocks that were never integrated.
    #[error("frame index {0} is reserved; passes start at 1")]
    InvalidFrameIndex(u64),

    /// Error from the block store.
    #[error("map error: {0}")]
    Map(#[from] MapError),

    /// I/O error while reading or writing configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed configuration file.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for recon_fusion operations.
pub type Result<T> = std::result::Result<T, FusionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FusionError::InvalidFrameIndex(0);
        assert_eq!(err.to_string(), "frame index 0 is reserved; passes start at 1");

        let err: FusionError = MapError::BlockNotFound { x: 0, y: 1, z: 2 }.into();
        assert_eq!(err.to_string(), "map error: block not found at (0, 1, 2)");
    }
}
