//! Coordinate mathematics for the block grid.
//!
//! Three spaces are involved:
//! - world space;
//! - block-grid space, where block `k` is centred on the integer point `k`
//!   and spans `[k - 0.5, k + 0.5)` on each axis;
//! - local voxel-index space of one block, `0..resolution` per axis.

use crate::transform::Transform;
use crate::types::{BlockKey, Point3, Resolution, VoxelIndex};

/// Key of the block containing a world point.
///
/// The point is mapped into the grid frame and each axis rounded to the
/// nearest integer (`floor(x + 0.5)`, so ties go to the upper block).
///
/// # Example
/// ```
/// use recon_core::coords::world_to_block_key;
/// use recon_core::{BlockKey, Point3, Transform};
///
/// let grid = Transform::new(Point3::ZERO, 2.0);
/// assert_eq!(world_to_block_key(&grid, Point3::new(2.9, -1.2, 0.0)), BlockKey::new(1, -1, 0));
/// ```
#[inline]
pub fn world_to_block_key(grid: &Transform, world: Point3) -> BlockKey {
    let local = grid.inverse_transform_point(world);
    BlockKey::new(round_to_i32(local.x), round_to_i32(local.y), round_to_i32(local.z))
}

/// World-space centre of a block.
#[inline]
pub fn block_key_to_world_center(grid: &Transform, key: BlockKey) -> Point3 {
    grid.transform_point(key.as_point())
}

/// World pose of the block with the given key.
///
/// The block frame is centred on the block, shares the grid orientation,
/// and its scale equals the block side length.
#[inline]
pub fn block_transform(grid: &Transform, key: BlockKey) -> Transform {
    grid.child(key.as_point(), 1.0)
}

/// Voxel index of a world point inside a block.
///
/// Result is truncated toward zero, not rounded, and not range checked:
/// anything outside `0..resolution` means the point is outside the block.
/// Use [`Resolution::checked_index`] to validate.
#[inline]
pub fn world_to_local_voxel_index(
    block: &Transform,
    resolution: Resolution,
    world: Point3,
) -> [i32; 3] {
    let local = block.inverse_transform_point(world) + Point3::splat(0.5);
    [
        (local.x * resolution.x as f32) as i32,
        (local.y * resolution.y as f32) as i32,
        (local.z * resolution.z as f32) as i32,
    ]
}

/// World-space centre of a voxel.
#[inline]
pub fn local_voxel_index_to_world(
    block: &Transform,
    resolution: Resolution,
    index: VoxelIndex,
) -> Point3 {
    let local = voxel_corner_to_local(
        resolution,
        index.x as f32 + 0.5,
        index.y as f32 + 0.5,
        index.z as f32 + 0.5,
    );
    block.transform_point(local)
}

/// Block-local position of a fractional voxel coordinate.
///
/// Integer inputs address voxel corners; the block spans `[-0.5, 0.5]`.
#[inline]
pub fn voxel_corner_to_local(resolution: Resolution, cx: f32, cy: f32, cz: f32) -> Point3 {
    Point3::new(
        cx / resolution.x as f32 - 0.5,
        cy / resolution.y as f32 - 0.5,
        cz / resolution.z as f32 - 0.5,
    )
}

/// All keys within Chebyshev distance `radius` of `center`, including it.
///
/// Yields `(2 * radius + 1)^3` keys, x fastest.
pub fn neighborhood(center: BlockKey, radius: u32) -> impl Iterator<Item = BlockKey> {
    let r = radius as i32;
    (-r..=r).flat_map(move |dz| {
        (-r..=r).flat_map(move |dy| (-r..=r).map(move |dx| center.offset(dx, dy, dz)))
    })
}

#[inline]
fn round_to_i32(v: f32) -> i32 {
    libm::floorf(v + 0.5) as i32
}
