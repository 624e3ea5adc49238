//! Core types for voxel-block reconstruction.
//!
//! Provides the world-space vector type, integer block keys, voxel indices
//! and block resolutions used throughout the workspace.

use core::ops::{Add, Div, Mul, Neg, Sub};

use crate::error::CoreError;

/// A 3D point (or vector) in world or local space.
///
/// Provides arithmetic operations and conversions to/from arrays.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point3 {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
    /// Z coordinate.
    pub z: f32,
}

impl Point3 {
    /// The zero vector.
    pub const ZERO: Self = Self::splat(0.0);
    /// Unit vector along +X.
    pub const X: Self = Self::new(1.0, 0.0, 0.0);
    /// Unit vector along +Y.
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);
    /// Unit vector along +Z.
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    /// Create a new Point3.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Create a Point3 with all components set to the same value.
    #[inline]
    pub const fn splat(v: f32) -> Self {
        Self { x: v, y: v, z: v }
    }

    /// Convert to an array.
    #[inline]
    pub const fn as_array(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Dot product with another point (treating both as vectors).
    #[inline]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product with another point (treating both as vectors).
    #[inline]
    pub fn cross(self, other: Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Component-wise product.
    #[inline]
    pub fn mul_elem(self, other: Self) -> Self {
        Self::new(self.x * other.x, self.y * other.y, self.z * other.z)
    }

    /// Squared length of the vector.
    #[inline]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Length (magnitude) of the vector.
    #[inline]
    pub fn length(self) -> f32 {
        libm::sqrtf(self.length_squared())
    }

    /// Normalize the vector to unit length.
    /// Returns a zero vector if the length is zero.
    #[inline]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == 0.0 {
            Self::ZERO
        } else {
            self / len
        }
    }

    /// Cosine of the angle between two vectors.
    ///
    /// Returns `0.0` when either vector has zero length.
    #[inline]
    pub fn cos_angle_to(self, other: Self) -> f32 {
        let denom = self.length() * other.length();
        if denom == 0.0 {
            return 0.0;
        }
        (self.dot(other) / denom).clamp(-1.0, 1.0)
    }

    /// Component-wise minimum.
    #[inline]
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    /// Component-wise maximum.
    #[inline]
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    /// Check that every component is finite.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<[f32; 3]> for Point3 {
    #[inline]
    fn from(arr: [f32; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }
}

impl From<Point3> for [f32; 3] {
    #[inline]
    fn from(p: Point3) -> Self {
        p.as_array()
    }
}

impl Add for Point3 {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Point3 {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul<f32> for Point3 {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f32) -> Self {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl Mul<Point3> for f32 {
    type Output = Point3;

    #[inline]
    fn mul(self, point: Point3) -> Point3 {
        point * self
    }
}

impl Div<f32> for Point3 {
    type Output = Self;

    #[inline]
    fn div(self, scalar: f32) -> Self {
        Self::new(self.x / scalar, self.y / scalar, self.z / scalar)
    }
}

impl Neg for Point3 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// Integer key of a voxel block in the tiling of world space.
///
/// Signed so that blocks on the negative side of the grid origin are
/// addressable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct BlockKey {
    /// X coordinate in block-grid space.
    pub x: i32,
    /// Y coordinate in block-grid space.
    pub y: i32,
    /// Z coordinate in block-grid space.
    pub z: i32,
}

impl BlockKey {
    /// Create a new BlockKey.
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Convert to an array.
    #[inline]
    pub const fn as_array(&self) -> [i32; 3] {
        [self.x, self.y, self.z]
    }

    /// The key displaced by the given offsets.
    #[inline]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Chebyshev (max-axis) distance to another key.
    #[inline]
    pub fn chebyshev_distance(self, other: Self) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        let dz = self.z.abs_diff(other.z);
        dx.max(dy).max(dz)
    }

    /// The key as a floating point grid-space position.
    #[inline]
    pub fn as_point(self) -> Point3 {
        Point3::new(self.x as f32, self.y as f32, self.z as f32)
    }
}

impl From<[i32; 3]> for BlockKey {
    #[inline]
    fn from(arr: [i32; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }
}

impl From<BlockKey> for [i32; 3] {
    #[inline]
    fn from(k: BlockKey) -> Self {
        k.as_array()
    }
}

/// Voxel index within a block (unsigned, `0..resolution` per axis).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VoxelIndex {
    /// X index within the block.
    pub x: u32,
    /// Y index within the block.
    pub y: u32,
    /// Z index within the block.
    pub z: u32,
}

impl VoxelIndex {
    /// Create a new VoxelIndex.
    #[inline]
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Convert to an array.
    #[inline]
    pub const fn as_array(&self) -> [u32; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[u32; 3]> for VoxelIndex {
    #[inline]
    fn from(arr: [u32; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }
}

/// Per-axis voxel resolution of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    /// Voxels along X.
    pub x: u32,
    /// Voxels along Y.
    pub y: u32,
    /// Voxels along Z.
    pub z: u32,
}

impl Resolution {
    /// Create a new Resolution.
    #[inline]
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Create a Resolution from `[x, y, z]`.
    #[inline]
    pub const fn from_array(arr: [u32; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }

    /// Same number of voxels along every axis.
    #[inline]
    pub const fn cubic(n: u32) -> Self {
        Self::new(n, n, n)
    }

    /// Convert to an array.
    #[inline]
    pub const fn as_array(&self) -> [u32; 3] {
        [self.x, self.y, self.z]
    }

    /// Total number of voxels (`x * y * z`).
    #[inline]
    pub const fn voxel_count(&self) -> usize {
        (self.x as usize) * (self.y as usize) * (self.z as usize)
    }

    /// True if any axis has zero voxels.
    #[inline]
    pub const fn is_degenerate(&self) -> bool {
        self.x == 0 || self.y == 0 || self.z == 0
    }

    /// Check whether an index lies inside this resolution.
    #[inline]
    pub const fn contains(&self, index: VoxelIndex) -> bool {
        index.x < self.x && index.y < self.y && index.z < self.z
    }

    /// Convert a signed index into a `VoxelIndex` if it lies inside.
    #[inline]
    pub fn checked_index(&self, index: [i32; 3]) -> Option<VoxelIndex> {
        let [x, y, z] = index;
        if x < 0 || y < 0 || z < 0 {
            return None;
        }
        let idx = VoxelIndex::new(x as u32, y as u32, z as u32);
        self.contains(idx).then_some(idx)
    }

    /// Like [`Resolution::checked_index`], but reports the mismatch.
    #[inline]
    pub fn try_index(&self, index: [i32; 3]) -> Result<VoxelIndex, CoreError> {
        self.checked_index(index)
            .ok_or(CoreError::VoxelIndexOutOfBounds {
                index,
                resolution: self.as_array(),
            })
    }

    /// Reject resolutions with a zero-length axis.
    #[inline]
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.is_degenerate() {
            Err(CoreError::ZeroResolution)
        } else {
            Ok(())
        }
    }

    /// Flat storage index (x fastest): `x + y * rx + z * rx * ry`.
    #[inline]
    pub const fn flat_index(&self, index: VoxelIndex) -> usize {
        index.x as usize
            + index.y as usize * self.x as usize
            + index.z as usize * self.x as usize * self.y as usize
    }

    /// Inverse of [`Resolution::flat_index`].
    #[inline]
    pub const fn from_flat_index(&self, flat: usize) -> VoxelIndex {
        let rx = self.x as usize;
        let ry = self.y as usize;
        VoxelIndex::new(
            (flat % rx) as u32,
            ((flat / rx) % ry) as u32,
            (flat / (rx * ry)) as u32,
        )
    }

    /// Iterate every voxel index in storage order.
    pub fn indices(self) -> impl Iterator<Item = VoxelIndex> {
        (0..self.voxel_count()).map(move |i| self.from_flat_index(i))
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::cubic(8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_ops() {
        let a = Point3::new(1.0, 2.0, 3.0);
        let b = Point3::new(4.0, 5.0, 6.0);
        assert_eq!(a + b, Point3::new(5.0, 7.0, 9.0));
        assert_eq!(b - a, Point3::splat(3.0));
        assert_eq!(a * 2.0, Point3::new(2.0, 4.0, 6.0));
        assert!((a.dot(b) - 32.0).abs() < 1e-6);
        assert_eq!(Point3::X.cross(Point3::Y), Point3::Z);
    }

    #[test]
    fn test_cos_angle() {
        assert!((Point3::X.cos_angle_to(Point3::X * 5.0) - 1.0).abs() < 1e-6);
        assert!(Point3::X.cos_angle_to(Point3::Y).abs() < 1e-6);
        assert_eq!(Point3::ZERO.cos_angle_to(Point3::X), 0.0);
    }

    #[test]
    fn test_chebyshev_distance() {
        let a = BlockKey::new(0, 0, 0);
        assert_eq!(a.chebyshev_distance(BlockKey::new(1, -3, 2)), 3);
        assert_eq!(a.chebyshev_distance(a), 0);
    }

    #[test]
    fn test_flat_index_roundtrip() {
        let res = Resolution::new(3, 4, 5);
        assert_eq!(res.voxel_count(), 60);
        for (i, idx) in res.indices().enumerate() {
            assert_eq!(res.flat_index(idx), i);
            assert!(res.contains(idx));
        }
    }

    #[test]
    fn test_checked_index() {
        let res = Resolution::cubic(8);
        assert_eq!(res.checked_index([0, 7, 3]), Some(VoxelIndex::new(0, 7, 3)));
        assert_eq!(res.checked_index([-1, 0, 0]), None);
        assert_eq!(res.checked_index([8, 0, 0]), None);
        assert!(matches!(
            res.try_index([0, 0, 9]),
            Err(CoreError::VoxelIndexOutOfBounds { .. })
        ));
        assert_eq!(Resolution::new(4, 0, 4).validate(), Err(CoreError::ZeroResolution));
    }
}
