//! Error types for recon_map.

use recon_core::CoreError;
use thiserror::Error;

/// Errors that can occur while building or reading the block store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MapError {
    /// Invalid grid configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// No block is stored under the given key.
    #[error("block not found at ({x}, {y}, {z})")]
    BlockNotFound {
        /// X coordinate.
        x: i32,
        /// Y coordinate.
        y: i32,
        /// Z coordinate.
        z: i32,
    },

    /// A handle outlived the block it referred to.
    #[error("stale block handle (slot {index}, generation {generation})")]
    StaleHandle {
        /// Arena slot of the handle.
        index: u32,
        /// Generation recorded in the handle.
        generation: u32,
    },

    /// Error from recon_core.
    #[error("{0}")]
    Core(#[from] CoreError),
}

/// Result type for recon_map operations.
pub type Result<T> = std::result::Result<T, MapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MapError::BlockNotFound { x: 1, y: -2, z: 3 };
        assert_eq!(err.to_string(), "block not found at (1, -2, 3)");

        let err: MapError = CoreError::ZeroResolution.into();
        assert_eq!(err.to_string(), "resolution has a zero-length axis");
    }
}
