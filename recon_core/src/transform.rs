//! Rigid transform with uniform scale.
//!
//! Used for both the block-grid frame (scale = block side length) and the
//! pose of each individual block.

use crate::types::Point3;

/// Position, orthonormal orientation and uniform scale.
///
/// `axes` are the local X, Y and Z axes expressed in world space.
/// A local point `p` maps to `position + (axes · p) * scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Origin of the local frame in world space.
    pub position: Point3,
    /// Local X, Y, Z axes in world space (orthonormal).
    pub axes: [Point3; 3],
    /// Uniform scale applied to local coordinates.
    pub scale: f32,
}

impl Transform {
    /// Identity transform.
    pub const IDENTITY: Self = Self {
        position: Point3::ZERO,
        axes: [Point3::X, Point3::Y, Point3::Z],
        scale: 1.0,
    };

    /// Axis-aligned transform with the given origin and scale.
    #[inline]
    pub const fn new(position: Point3, scale: f32) -> Self {
        Self {
            position,
            axes: [Point3::X, Point3::Y, Point3::Z],
            scale,
        }
    }

    /// Replace the orientation with a rotation of `angle` radians about `axis`.
    pub fn with_rotation(mut self, axis: Point3, angle: f32) -> Self {
        let k = axis.normalize();
        let (s, c) = (libm::sinf(angle), libm::cosf(angle));
        // Rodrigues' formula applied to each basis vector.
        let rotate = |v: Point3| v * c + k.cross(v) * s + k * (k.dot(v) * (1.0 - c));
        self.axes = [rotate(Point3::X), rotate(Point3::Y), rotate(Point3::Z)];
        self
    }

    /// Local forward axis (+Z) in world space.
    #[inline]
    pub fn forward(&self) -> Point3 {
        self.axes[2]
    }

    /// Rotate a direction from local to world space. Scale is not applied.
    #[inline]
    pub fn transform_direction(&self, dir: Point3) -> Point3 {
        self.axes[0] * dir.x + self.axes[1] * dir.y + self.axes[2] * dir.z
    }

    /// Rotate a direction from world to local space.
    #[inline]
    pub fn inverse_transform_direction(&self, dir: Point3) -> Point3 {
        Point3::new(
            dir.dot(self.axes[0]),
            dir.dot(self.axes[1]),
            dir.dot(self.axes[2]),
        )
    }

    /// Map a local point to world space.
    #[inline]
    pub fn transform_point(&self, local: Point3) -> Point3 {
        self.position + self.transform_direction(local) * self.scale
    }

    /// Map a world point to local space.
    #[inline]
    pub fn inverse_transform_point(&self, world: Point3) -> Point3 {
        self.inverse_transform_direction(world - self.position) / self.scale
    }

    /// Child frame located at `local_position` in this frame, with its scale
    /// multiplied by `local_scale` and the same orientation.
    #[inline]
    pub fn child(&self, local_position: Point3, local_scale: f32) -> Self {
        Self {
            position: self.transform_point(local_position),
            axes: self.axes,
            scale: self.scale * local_scale,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Point3, b: Point3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn test_point_roundtrip() {
        let t = Transform::new(Point3::new(1.0, -2.0, 0.5), 0.25)
            .with_rotation(Point3::new(0.3, 1.0, -0.2), 0.7);
        let p = Point3::new(3.0, 0.1, -4.0);
        assert!(approx(t.transform_point(t.inverse_transform_point(p)), p));
        assert!(approx(t.inverse_transform_point(t.transform_point(p)), p));
    }

    #[test]
    fn test_rotation_quarter_turn() {
        let t = Transform::IDENTITY.with_rotation(Point3::Y, core::f32::consts::FRAC_PI_2);
        // +Z rotated a quarter turn about +Y lands on +X.
        assert!(approx(t.forward(), Point3::X));
    }

    #[test]
    fn test_child_frame() {
        let grid = Transform::new(Point3::new(10.0, 0.0, 0.0), 2.0);
        let block = grid.child(Point3::new(1.0, 0.0, -1.0), 1.0);
        assert!(approx(block.position, Point3::new(12.0, 0.0, -2.0)));
        assert_eq!(block.scale, 2.0);
    }
}
