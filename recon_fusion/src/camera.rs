//! Camera poses and the pinhole camera model.
//!
//! Camera space: +X right, +Y up, +Z forward. Screen space: pixels with the
//! origin at the top-left corner, +Y down, and `z` the distance along the
//! forward axis.

use recon_core::Point3;

/// Camera pose in 3D space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Camera position in world coordinates.
    pub position: Point3,
    /// Forward direction (normalized).
    pub forward: Point3,
    /// Up direction (normalized).
    pub up: Point3,
    /// Right direction (computed from forward x up).
    pub right: Point3,
}

impl Pose {
    /// Create a new pose from position and look-at target.
    pub fn look_at(position: Point3, target: Point3, up: Point3) -> Self {
        let forward = (target - position).normalize();
        let right = forward.cross(up).normalize();
        let up = right.cross(forward).normalize();

        Self {
            position,
            forward,
            up,
            right,
        }
    }

    /// Create a pose looking down -Z from the given position.
    pub fn looking_forward(position: Point3) -> Self {
        Self::look_at(position, position - Point3::Z, Point3::Y)
    }

    /// Transform a direction from camera space to world space.
    #[inline]
    pub fn transform_direction(&self, dir: Point3) -> Point3 {
        self.right * dir.x + self.up * dir.y + self.forward * dir.z
    }

    /// Transform a direction from world space to camera space.
    #[inline]
    pub fn inverse_transform_direction(&self, dir: Point3) -> Point3 {
        Point3::new(dir.dot(self.right), dir.dot(self.up), dir.dot(self.forward))
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::looking_forward(Point3::Z)
    }
}

/// Projection provider used by the integrator.
pub trait CameraModel {
    /// Project a world point to screen space, or `None` if it is not in
    /// front of the camera.
    fn world_to_screen(&self, world: Point3) -> Option<Point3>;

    /// Lift a screen point (pixel x, pixel y, forward distance) to world space.
    fn screen_to_world(&self, screen: Point3) -> Point3;

    /// Camera centre in world space.
    fn position(&self) -> Point3;

    /// Unit viewing direction in world space.
    fn forward(&self) -> Point3;
}

/// Pinhole intrinsics in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intrinsics {
    /// Focal length along X.
    pub fx: f32,
    /// Focal length along Y.
    pub fy: f32,
    /// Principal point X.
    pub cx: f32,
    /// Principal point Y.
    pub cy: f32,
}

impl Intrinsics {
    /// Square-pixel intrinsics from a horizontal field of view, with the
    /// principal point at the image centre.
    pub fn from_fov(width: u32, height: u32, fov_h: f32) -> Self {
        let f = width as f32 / 2.0 / (fov_h / 2.0).tan();
        Self {
            fx: f,
            fy: f,
            cx: width as f32 / 2.0,
            cy: height as f32 / 2.0,
        }
    }
}

/// A posed pinhole camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinholeCamera {
    /// Extrinsics.
    pub pose: Pose,
    /// Intrinsics.
    pub intrinsics: Intrinsics,
}

impl PinholeCamera {
    /// Create a camera from pose and intrinsics.
    pub fn new(pose: Pose, intrinsics: Intrinsics) -> Self {
        Self { pose, intrinsics }
    }
}

impl CameraModel for PinholeCamera {
    fn world_to_screen(&self, world: Point3) -> Option<Point3> {
        let cam = self.pose.inverse_transform_direction(world - self.pose.position);
        if cam.z <= 0.0 {
            return None;
        }
        let k = &self.intrinsics;
        Some(Point3::new(
            k.cx + k.fx * cam.x / cam.z,
            k.cy - k.fy * cam.y / cam.z,
            cam.z,
        ))
    }

    fn screen_to_world(&self, screen: Point3) -> Point3 {
        let k = &self.intrinsics;
        let cam = Point3::new(
            (screen.x - k.cx) / k.fx * screen.z,
            -(screen.y - k.cy) / k.fy * screen.z,
            screen.z,
        );
        self.pose.position + self.pose.transform_direction(cam)
    }

    #[inline]
    fn position(&self) -> Point3 {
        self.pose.position
    }

    #[inline]
    fn forward(&self) -> Point3 {
        self.pose.forward
    }
}
