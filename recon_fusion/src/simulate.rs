//! Synthetic sensor frames rendered from signed distance functions.
//!
//! Two scenes are sphere traced through the same camera: the live scene
//! (what the sensor sees now) and the reference scene (what was there
//! before). Pixels where both surfaces agree are classified Empty; elsewhere
//! the nearer surface decides the class.

use std::f32::consts::PI;

use rand::Rng;
use recon_core::{Point3, VoxelClass};

use crate::camera::CameraModel;
use crate::error::Result;
use crate::image::{ClassificationImage, EncodedDepthImage, Image, PixelCoord, SensorFrame};

/// Renders [`SensorFrame`]s from a pair of signed distance functions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthSceneSimulator {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Near limit of the trace.
    pub min_depth: f32,
    /// Far limit of the trace.
    pub max_depth: f32,
    /// Depth difference below which live and reference agree.
    pub agreement: f32,
    /// Relative depth noise standard deviation.
    pub noise_sigma: f32,
    /// Multiplier used when encoding depth.
    pub depth_factor: f32,
}

impl DepthSceneSimulator {
    /// Create a noiseless simulator.
    pub fn new(width: u32, height: u32, depth_factor: f32) -> Self {
        Self {
            width,
            height,
            min_depth: 0.05,
            max_depth: 20.0,
            agreement: 0.01,
            noise_sigma: 0.0,
            depth_factor,
        }
    }

    /// Set the trace range.
    pub fn with_depth_range(mut self, min: f32, max: f32) -> Self {
        self.min_depth = min;
        self.max_depth = max;
        self
    }

    /// Set the agreement tolerance.
    pub fn with_agreement(mut self, agreement: f32) -> Self {
        self.agreement = agreement;
        self
    }

    /// Set the relative noise level.
    pub fn with_noise(mut self, sigma: f32) -> Self {
        self.noise_sigma = sigma;
        self
    }

    /// Render live and reference depth and their classification.
    pub fn render<C, L, S, R>(
        &self,
        camera: &C,
        live_sdf: L,
        reference_sdf: S,
        rng: &mut R,
    ) -> Result<SensorFrame>
    where
        C: CameraModel + ?Sized,
        L: Fn(Point3) -> f32,
        S: Fn(Point3) -> f32,
        R: Rng + ?Sized,
    {
        let count = (self.width * self.height) as usize;
        let mut live = vec![0.0; count];
        let mut reference = vec![0.0; count];
        let mut classes: ClassificationImage = Image::new(self.width, self.height);

        for y in 0..self.height {
            for x in 0..self.width {
                let i = (y * self.width + x) as usize;
                let dir = self.pixel_to_ray(camera, x, y);
                let live_hit = self
                    .trace_depth(camera, dir, &live_sdf)
                    .map(|d| self.add_noise(d, rng));
                let reference_hit = self.trace_depth(camera, dir, &reference_sdf);

                live[i] = live_hit.unwrap_or(0.0);
                reference[i] = reference_hit.unwrap_or(0.0);
                classes.set(PixelCoord::new(x, y), self.classify(live_hit, reference_hit));
            }
        }

        log::debug!(
            "Rendered {}x{} frame: {} live, {} reference pixels",
            self.width,
            self.height,
            classes.count(VoxelClass::Live),
            classes.count(VoxelClass::Reference)
        );

        SensorFrame::new(
            EncodedDepthImage::from_depths(self.width, self.height, &live, self.depth_factor)?,
            EncodedDepthImage::from_depths(self.width, self.height, &reference, self.depth_factor)?,
            classes,
        )
    }

    /// Class of a pixel from the image-plane depth of each surface.
    pub fn classify(&self, live: Option<f32>, reference: Option<f32>) -> VoxelClass {
        match (live, reference) {
            (None, None) => VoxelClass::Empty,
            (Some(_), None) => VoxelClass::Live,
            (None, Some(_)) => VoxelClass::Reference,
            (Some(l), Some(r)) if (l - r).abs() <= self.agreement => VoxelClass::Empty,
            (Some(l), Some(r)) if l < r => VoxelClass::Live,
            _ => VoxelClass::Reference,
        }
    }

    /// Unit world-space ray through the centre of pixel `(x, y)`.
    fn pixel_to_ray<C: CameraModel + ?Sized>(&self, camera: &C, x: u32, y: u32) -> Point3 {
        let on_plane = camera.screen_to_world(Point3::new(x as f32 + 0.5, y as f32 + 0.5, 1.0));
        (on_plane - camera.position()).normalize()
    }

    /// Image-plane distance of the first surface along `dir`.
    fn trace_depth<C, F>(&self, camera: &C, dir: Point3, sdf: &F) -> Option<f32>
    where
        C: CameraModel + ?Sized,
        F: Fn(Point3) -> f32,
    {
        let t = self.sphere_trace(camera.position(), dir, sdf)?;
        Some(t * dir.dot(camera.forward()))
    }

    fn sphere_trace<F>(&self, origin: Point3, direction: Point3, sdf: &F) -> Option<f32>
    where
        F: Fn(Point3) -> f32,
    {
        let mut t = self.min_depth;
        let max_steps = 256;
        let hit_threshold = 1e-4;

        for _ in 0..max_steps {
            if t > self.max_depth {
                return None;
            }
            let dist = sdf(origin + direction * t);
            if !dist.is_finite() {
                return None;
            }
            if dist.abs() < hit_threshold {
                return Some(t);
            }
            t += dist.max(hit_threshold);
        }
        None
    }

    /// Box-Muller gaussian noise proportional to depth.
    fn add_noise<R: Rng + ?Sized>(&self, depth: f32, rng: &mut R) -> f32 {
        if self.noise_sigma <= 0.0 {
            return depth;
        }
        let u1: f32 = rng.gen::<f32>().max(1e-10);
        let u2: f32 = rng.gen();
        let n = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
        (depth + n * self.noise_sigma * depth).max(0.0)
    }
}

/// Signed distance to the plane `dot(p, normal) = offset` (unit normal).
pub fn plane_sdf(normal: Point3, offset: f32) -> impl Fn(Point3) -> f32 {
    let normal = normal.normalize();
    move |p| p.dot(normal) - offset
}

/// Signed distance to a sphere.
pub fn sphere_sdf(center: Point3, radius: f32) -> impl Fn(Point3) -> f32 {
    move |p| (p - center).length() - radius
}

/// Signed distance to an axis-aligned box.
pub fn box_sdf(center: Point3, half_extents: Point3) -> impl Fn(Point3) -> f32 {
    move |p| {
        let d = p - center;
        let q = Point3::new(
            d.x.abs() - half_extents.x,
            d.y.abs() - half_extents.y,
            d.z.abs() - half_extents.z,
        );
        let outside = q.max(Point3::ZERO).length();
        let inside = q.x.max(q.y).max(q.z).min(0.0);
        outside + inside
    }
}

/// Union of two signed distance functions.
pub fn union_sdf<A, B>(a: A, b: B) -> impl Fn(Point3) -> f32
where
    A: Fn(Point3) -> f32,
    B: Fn(Point3) -> f32,
{
    move |p| a(p).min(b(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{Intrinsics, PinholeCamera, Pose};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use recon_core::DEFAULT_DEPTH_FACTOR;

    fn camera() -> PinholeCamera {
        let pose = Pose::look_at(Point3::new(0.0, 0.0, 3.0), Point3::ZERO, Point3::Y);
        PinholeCamera::new(pose, Intrinsics::from_fov(16, 16, 60.0_f32.to_radians()))
    }

    #[test]
    fn test_classify_table() {
        let sim = DepthSceneSimulator::new(1, 1, DEFAULT_DEPTH_FACTOR);
        assert_eq!(sim.classify(None, None), VoxelClass::Empty);
        assert_eq!(sim.classify(Some(1.0), None), VoxelClass::Live);
        assert_eq!(sim.classify(None, Some(1.0)), VoxelClass::Reference);
        assert_eq!(sim.classify(Some(1.0), Some(1.005)), VoxelClass::Empty);
        assert_eq!(sim.classify(Some(1.0), Some(2.0)), VoxelClass::Live);
        assert_eq!(sim.classify(Some(2.0), Some(1.0)), VoxelClass::Reference);
    }

    #[test]
    fn test_plane_depth_is_image_plane_distance() {
        let sim = DepthSceneSimulator::new(16, 16, DEFAULT_DEPTH_FACTOR);
        let mut rng = StdRng::seed_from_u64(1);
        let frame = sim
            .render(&camera(), plane_sdf(Point3::Z, 0.0), |_| f32::INFINITY, &mut rng)
            .unwrap();

        assert_eq!(frame.classification.count(VoxelClass::Live), 256);
        // A fronto-parallel plane has the same image-plane depth everywhere.
        for coord in [PixelCoord::new(0, 0), PixelCoord::new(8, 8), PixelCoord::new(15, 3)] {
            let depth = frame.live.depth_at(coord, DEFAULT_DEPTH_FACTOR).unwrap();
            assert!((depth - 3.0).abs() < 1e-2, "depth {}", depth);
        }
    }

    #[test]
    fn test_identical_scenes_are_empty() {
        let sim = DepthSceneSimulator::new(16, 16, DEFAULT_DEPTH_FACTOR);
        let mut rng = StdRng::seed_from_u64(1);
        let sdf = sphere_sdf(Point3::ZERO, 1.0);
        let frame = sim.render(&camera(), &sdf, &sdf, &mut rng).unwrap();
        assert_eq!(frame.classification.count(VoxelClass::Empty), 256);
    }

    #[test]
    fn test_added_object_is_live() {
        let sim = DepthSceneSimulator::new(16, 16, DEFAULT_DEPTH_FACTOR);
        let mut rng = StdRng::seed_from_u64(1);
        let wall = plane_sdf(Point3::Z, -1.0);
        let with_box = union_sdf(&wall, box_sdf(Point3::ZERO, Point3::splat(0.3)));
        let frame = sim.render(&camera(), with_box, &wall, &mut rng).unwrap();

        let live = frame.classification.count(VoxelClass::Live);
        assert!(live > 0);
        assert_eq!(frame.classification.count(VoxelClass::Reference), 0);
        assert_eq!(frame.classification.class_at(PixelCoord::new(8, 8)), VoxelClass::Live);
        assert_eq!(frame.classification.class_at(PixelCoord::new(0, 0)), VoxelClass::Empty);
    }
}
