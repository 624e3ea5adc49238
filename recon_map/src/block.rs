//! Dense voxel blocks and the factory that produces them.

use recon_core::{
    coords, BlockKey, CoreError, Point3, Resolution, Transform, Voxel, VoxelIndex,
};

/// Outcome of one [`VoxelBlock::fuse`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FuseSummary {
    /// Voxels that received a sample.
    pub folded: u32,
    /// Net change in the block's active count.
    pub active_delta: i32,
}

/// Fixed-resolution cube of voxels plus its bookkeeping.
///
/// Voxels are stored x-fastest. `active_count` always equals the number of
/// voxels whose class is not Empty, as long as voxels are only changed
/// through [`VoxelBlock::fuse`].
#[derive(Debug, Clone)]
pub struct VoxelBlock {
    key: BlockKey,
    transform: Transform,
    resolution: Resolution,
    voxels: Box<[Voxel]>,
    active_count: u32,
    last_update_frame: u64,
}

impl VoxelBlock {
    /// Create a block with every voxel zeroed.
    pub fn new(key: BlockKey, transform: Transform, resolution: Resolution) -> Self {
        Self {
            key,
            transform,
            resolution,
            voxels: vec![Voxel::EMPTY; resolution.voxel_count()].into_boxed_slice(),
            active_count: 0,
            last_update_frame: 0,
        }
    }

    /// Grid key of this block.
    #[inline]
    pub fn key(&self) -> BlockKey {
        self.key
    }

    /// World pose; scale equals the block side length.
    #[inline]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Voxels per axis.
    #[inline]
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Number of voxels whose class is not Empty.
    #[inline]
    pub fn active_count(&self) -> u32 {
        self.active_count
    }

    /// Frame index of the last integration (0 = never).
    #[inline]
    pub fn last_update_frame(&self) -> u64 {
        self.last_update_frame
    }

    /// True when no voxel is active; such a block is eligible for eviction.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.active_count == 0
    }

    /// All voxels in storage order.
    #[inline]
    pub fn voxels(&self) -> &[Voxel] {
        &self.voxels
    }

    /// Voxel at an index, failing on a resolution mismatch.
    pub fn voxel(&self, index: VoxelIndex) -> Result<&Voxel, CoreError> {
        if !self.resolution.contains(index) {
            return Err(self.out_of_bounds(index));
        }
        Ok(&self.voxels[self.resolution.flat_index(index)])
    }

    /// Voxel at a signed index, or `None` if it lies outside the block.
    #[inline]
    pub fn voxel_signed(&self, index: [i32; 3]) -> Option<&Voxel> {
        let idx = self.resolution.checked_index(index)?;
        self.voxels.get(self.resolution.flat_index(idx))
    }

    /// Voxel containing a world point, if the point lies in this block.
    pub fn voxel_at_world(&self, world: Point3) -> Option<&Voxel> {
        self.voxel_signed(self.world_to_voxel_index(world))
    }

    /// Unchecked voxel index of a world point (see
    /// [`coords::world_to_local_voxel_index`]).
    #[inline]
    pub fn world_to_voxel_index(&self, world: Point3) -> [i32; 3] {
        coords::world_to_local_voxel_index(&self.transform, self.resolution, world)
    }

    /// World-space centre of a voxel.
    #[inline]
    pub fn voxel_center(&self, index: VoxelIndex) -> Point3 {
        coords::local_voxel_index_to_world(&self.transform, self.resolution, index)
    }

    /// Whether this block still has to be integrated for `frame`.
    #[inline]
    pub fn needs_integration(&self, frame: u64) -> bool {
        self.last_update_frame != frame
    }

    /// Run `update` on every voxel and fold the returned deltas into the
    /// active count, then stamp the block with `frame`.
    ///
    /// `update` receives the voxel index, its world centre and the voxel, and
    /// returns `None` when it left the voxel alone or `Some(delta)` after a
    /// fold.
    pub fn fuse<F>(&mut self, frame: u64, mut update: F) -> FuseSummary
    where
        F: FnMut(VoxelIndex, Point3, &mut Voxel) -> Option<i32>,
    {
        let mut summary = FuseSummary::default();
        for (flat, voxel) in self.voxels.iter_mut().enumerate() {
            let index = self.resolution.from_flat_index(flat);
            let center =
                coords::local_voxel_index_to_world(&self.transform, self.resolution, index);
            if let Some(delta) = update(index, center, voxel) {
                summary.folded += 1;
                summary.active_delta += delta;
            }
        }
        self.active_count = self.active_count.saturating_add_signed(summary.active_delta);
        self.last_update_frame = frame;
        summary
    }

    /// Count active voxels by scanning the block.
    pub fn recount_active(&self) -> u32 {
        self.voxels.iter().filter(|v| v.is_active()).count() as u32
    }

    fn out_of_bounds(&self, index: VoxelIndex) -> CoreError {
        CoreError::VoxelIndexOutOfBounds {
            index: [index.x as i32, index.y as i32, index.z as i32],
            resolution: self.resolution.as_array(),
        }
    }
}

/// Produces fresh blocks for the store.
pub trait BlockFactory {
    /// Build the block for `key` with the given pose and resolution.
    fn create(&self, key: BlockKey, transform: Transform, resolution: Resolution) -> VoxelBlock;
}

/// Factory producing fully zeroed blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroedBlockFactory;

impl BlockFactory for ZeroedBlockFactory {
    #[inline]
    fn create(&self, key: BlockKey, transform: Transform, resolution: Resolution) -> VoxelBlock {
        VoxelBlock::new(key, transform, resolution)
    }
}
