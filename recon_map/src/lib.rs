//! recon_map - voxel block storage and meshing.
//!
//! # Core Types
//!
//! - [`GridConfig`]: block resolution, side length and generation radius
//! - [`VoxelBlock`]: dense cube of voxels with active-count bookkeeping
//! - [`BlockStore`]: hash-indexed arena of blocks with lazy neighbourhood
//!   creation and eviction of empty blocks
//! - [`BlockMesh`] / [`extract_block_mesh`]: per-block cube meshes with
//!   intra-block face culling
//!
//! # Example
//!
//! ```
//! use recon_map::{BlockStore, GridConfig, MeshPalette, extract_block_mesh};
//! use recon_core::{Point3, VoxelClass};
//!
//! let mut store = BlockStore::new(GridConfig::default()).unwrap();
//! let handle = store.get_or_create(Point3::new(0.1, 0.2, 0.3));
//! assert_eq!(store.len(), 27);
//!
//! let block = store.get_mut(handle).unwrap();
//! block.fuse(1, |_, _, voxel| Some(voxel.fold(0.0, VoxelClass::Live, 0.5, 1)));
//! let mesh = extract_block_mesh(block, &MeshPalette::default());
//! assert!(!mesh.is_empty());
//!
//! store.remove_empty_blocks();
//! assert_eq!(store.len(), 1);
//! ```
//!
//! # Crate Features
//!
//! - `rayon`: parallel mesh extraction over a whole store

pub mod block;
pub mod config;
pub mod error;
pub mod mesh;
pub mod store;

pub use block::{BlockFactory, FuseSummary, VoxelBlock, ZeroedBlockFactory};
pub use config::GridConfig;
pub use error::{MapError, Result};
#[cfg(feature = "rayon")]
pub use mesh::par_extract_meshes;
pub use mesh::{
    extract_block_mesh, BlockMesh, Color, Face, MeshCache, MeshConsumer, MeshPalette, MeshStats,
};
pub use store::{BlockHandle, BlockStore};
