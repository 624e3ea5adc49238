//! # recon_core
//!
//! Pure math for incremental voxel-block TSDF reconstruction.
//!
//! ## Features
//!
//! - **no_std compatible**: no allocation anywhere in the crate
//! - **Pure functions**: no storage, no cameras, just coordinates and fold rules
//!
//! ## Feature Flags
//!
//! - `std` (default): implements `std::error::Error` for [`CoreError`]
//!
//! ## Modules
//!
//! - [`types`]: Core data types (Point3, BlockKey, VoxelIndex, Resolution)
//! - [`transform`]: Rigid transform with uniform scale
//! - [`coords`]: World / block-grid / voxel-index conversions
//! - [`hash`]: FNV-1a hashing of block keys
//! - [`voxel`]: Voxel record and running-mean fold rule
//! - [`tsdf`]: TSDF sampling and RGBA depth codec
//! - [`error`]: Error types
//!
//! ## Usage
//!
//! ```
//! use recon_core::prelude::*;
//!
//! let grid = Transform::new(Point3::ZERO, 0.5);
//! let key = world_to_block_key(&grid, Point3::new(0.3, 0.0, -0.1));
//! assert_eq!(key, BlockKey::new(1, 0, 0));
//!
//! let params = TsdfParams::default();
//! let mut voxel = Voxel::EMPTY;
//! if let Some(sample) = params.sample(1.0, 1.1).value() {
//!     voxel.fold(sample, VoxelClass::Live, params.threshold, 1);
//! }
//! assert!(voxel.is_active());
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]

#[cfg(feature = "std")]
extern crate std;

pub mod coords;
pub mod error;
pub mod hash;
pub mod transform;
pub mod tsdf;
pub mod types;
pub mod voxel;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::coords::{
        block_key_to_world_center, block_transform, local_voxel_index_to_world, neighborhood,
        voxel_corner_to_local, world_to_block_key, world_to_local_voxel_index,
    };
    pub use crate::error::CoreError;
    pub use crate::hash::{fnv1a_64, BuildFnvHasher, FnvHasher};
    pub use crate::transform::Transform;
    pub use crate::tsdf::{decode_depth, encode_depth, TsdfParams, TsdfSample};
    pub use crate::types::{BlockKey, Point3, Resolution, VoxelIndex};
    pub use crate::voxel::{Voxel, VoxelClass};
}

pub use coords::{
    block_key_to_world_center, block_transform, local_voxel_index_to_world, neighborhood,
    voxel_corner_to_local, world_to_block_key, world_to_local_voxel_index,
};
pub use error::CoreError;
pub use hash::{fnv1a_64, BuildFnvHasher, FnvHasher};
pub use transform::Transform;
pub use tsdf::{
    decode_depth, encode_depth, TsdfParams, TsdfSample, DEFAULT_DEPTH_FACTOR,
    DEPTH_DECODE_WEIGHTS,
};
pub use types::{BlockKey, Point3, Resolution, VoxelIndex};
pub use voxel::{Voxel, VoxelClass};

/// Result alias for recon_core operations.
pub type Result<T> = core::result::Result<T, CoreError>;
