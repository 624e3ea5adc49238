//! Error types for recon_core operations.
//!
//! A plain enum with a hand-written `Display` so the crate stays no_std.

use core::fmt;

/// Error types that can occur during recon_core operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreError {
    /// A voxel index does not fit the block resolution.
    VoxelIndexOutOfBounds {
        /// The offending index.
        index: [i32; 3],
        /// The block resolution it was checked against.
        resolution: [u32; 3],
    },
    /// A resolution with a zero-length axis was supplied.
    ZeroResolution,
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::VoxelIndexOutOfBounds { index, resolution } => {
                write!(
                    f,
                    "voxel index {:?} is outside resolution {:?}",
                    index, resolution
                )
            }
            CoreError::ZeroResolution => write!(f, "resolution has a zero-length axis"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CoreError {}
