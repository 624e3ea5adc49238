//! Grid configuration types.

use recon_core::{Point3, Resolution, Transform};

use crate::error::{MapError, Result};

/// Block grid parameters (immutable once a store is built).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConfig {
    /// Voxels per axis in every block.
    pub resolution: Resolution,
    /// World-space side length of a block.
    pub block_size: f32,
    /// Chebyshev radius of blocks pre-allocated around a newly referenced block.
    pub generation_radius: u32,
    /// World position of the centre of block `(0, 0, 0)`.
    pub origin: Point3,
    /// Grid X, Y, Z axes in world space.
    pub axes: [Point3; 3],
}

impl GridConfig {
    /// Create a new axis-aligned grid configuration centred on the world origin.
    ///
    /// # Arguments
    /// * `resolution` - Voxels per axis per block
    /// * `block_size` - World units per block side
    /// * `generation_radius` - Neighbourhood radius for lazy creation
    #[inline]
    pub const fn new(resolution: Resolution, block_size: f32, generation_radius: u32) -> Self {
        Self {
            resolution,
            block_size,
            generation_radius,
            origin: Point3::ZERO,
            axes: [Point3::X, Point3::Y, Point3::Z],
        }
    }

    /// Move the grid origin.
    pub fn with_origin(mut self, origin: Point3) -> Self {
        self.origin = origin;
        self
    }

    /// Rotate the grid by `angle` radians about `axis`.
    pub fn with_rotation(mut self, axis: Point3, angle: f32) -> Self {
        self.axes = Transform::IDENTITY.with_rotation(axis, angle).axes;
        self
    }

    /// World pose of the block grid: scale is the block side length.
    #[inline]
    pub fn grid_transform(&self) -> Transform {
        Transform {
            position: self.origin,
            axes: self.axes,
            scale: self.block_size,
        }
    }

    /// World-space side length of one voxel along X.
    #[inline]
    pub fn voxel_size(&self) -> f32 {
        self.block_size / self.resolution.x as f32
    }

    /// Number of blocks pre-allocated by one creation burst.
    #[inline]
    pub fn blocks_per_burst(&self) -> usize {
        let side = 2 * self.generation_radius as usize + 1;
        side * side * side
    }

    /// Check the configuration for values no store can work with.
    pub fn validate(&self) -> Result<()> {
        self.resolution.validate()?;
        if !(self.block_size.is_finite() && self.block_size > 0.0) {
            return Err(MapError::InvalidConfig {
                message: format!("block_size must be positive, got {}", self.block_size),
            });
        }
        if !self.origin.is_finite() {
            return Err(MapError::InvalidConfig {
                message: "grid origin must be finite".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self::new(Resolution::cubic(8), 1.0, 1)
    }
}
