//! Projective relations between voxels, pixels and measured depth.

use recon_core::Point3;

use crate::camera::CameraModel;
use crate::image::PixelCoord;

/// Distance of a world point from the camera along the viewing direction:
/// `|camera -> point| * cos(angle to forward)`.
#[inline]
pub fn distance_to_image_plane<C: CameraModel + ?Sized>(camera: &C, world: Point3) -> f32 {
    let ray = world - camera.position();
    ray.length() * ray.cos_angle_to(camera.forward())
}

/// Pixel a world point falls on, or `None` if it is behind the camera or
/// outside a `width` x `height` image.
///
/// The normalised camera-to-point ray is stretched by `1 / cos(angle)` onto
/// the unit-distance plane before projecting.
pub fn project_voxel<C: CameraModel + ?Sized>(
    camera: &C,
    world: Point3,
    width: u32,
    height: u32,
) -> Option<PixelCoord> {
    let ray = world - camera.position();
    let cos = ray.cos_angle_to(camera.forward());
    if cos <= 0.0 {
        return None;
    }
    let on_plane = camera.position() + ray.normalize() / cos;
    let screen = camera.world_to_screen(on_plane)?;

    let (px, py) = (screen.x.floor(), screen.y.floor());
    if px < 0.0 || py < 0.0 || px >= width as f32 || py >= height as f32 {
        return None;
    }
    Some(PixelCoord::new(px as u32, py as u32))
}

/// World point seen through the centre of `pixel` at measured image-plane
/// distance `measured`.
pub fn back_project<C: CameraModel + ?Sized>(
    camera: &C,
    pixel: PixelCoord,
    measured: f32,
) -> Point3 {
    let origin = camera.position();
    let screen = Point3::new(pixel.x as f32 + 0.5, pixel.y as f32 + 0.5, 1.0);
    let ray = (camera.screen_to_world(screen) - origin).normalize();
    let cos = ray.cos_angle_to(camera.forward());
    origin + ray * (measured / cos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{CameraModel, Intrinsics, PinholeCamera, Pose};

    fn camera() -> PinholeCamera {
        let pose = Pose::look_at(Point3::new(1.0, 2.0, 5.0), Point3::new(1.0, 0.0, 0.0), Point3::Y);
        PinholeCamera::new(pose, Intrinsics::from_fov(80, 60, 70.0_f32.to_radians()))
    }

    #[test]
    fn test_back_project_then_project() {
        let cam = camera();
        for (x, y) in [(0, 0), (40, 30), (79, 59), (13, 47)] {
            let pixel = PixelCoord::new(x, y);
            let world = back_project(&cam, pixel, 2.5);
            assert!((distance_to_image_plane(&cam, world) - 2.5).abs() < 1e-4);
            assert_eq!(project_voxel(&cam, world, 80, 60), Some(pixel));
        }
    }

    #[test]
    fn test_principal_pixel() {
        let cam = camera();
        let target = cam.pose.position + cam.pose.forward * 3.0;
        let screen = cam.world_to_screen(target).unwrap();
        assert!((screen.x - 40.0).abs() < 1e-3 && (screen.y - 30.0).abs() < 1e-3);
        // Nudge into the centre of pixel (40, 30).
        let nudged = target + cam.pose.right * 0.01 - cam.pose.up * 0.01;
        assert_eq!(project_voxel(&cam, nudged, 80, 60), Some(PixelCoord::new(40, 30)));
        assert!((distance_to_image_plane(&cam, target) - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_out_of_view() {
        let cam = camera();
        let behind = cam.pose.position - cam.pose.forward;
        assert_eq!(project_voxel(&cam, behind, 80, 60), None);
        let far_side = cam.pose.position + cam.pose.forward + cam.pose.right * 10.0;
        assert_eq!(project_voxel(&cam, far_side, 80, 60), None);
    }
}
