//! Projective TSDF integration of a whole block.

use recon_core::{Point3, TsdfParams, VoxelClass};
use recon_map::{FuseSummary, VoxelBlock};

use crate::camera::CameraModel;
use crate::image::{PixelCoord, SensorFrame};
use crate::projection::{distance_to_image_plane, project_voxel};

/// What the sensor says about one voxel centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// Pixel the voxel projects to.
    pub pixel: PixelCoord,
    /// Class at that pixel (never Empty).
    pub class: VoxelClass,
    /// Image-plane distance of the voxel centre.
    pub dist_exact: f32,
    /// Decoded depth at the pixel.
    pub dist_measured: f32,
    /// TSDF sample to fold in.
    pub sample: f32,
}

/// Result of [`Integrator::integrate_block`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockIntegration {
    /// The block was already integrated for this frame.
    Skipped,
    /// Every voxel was visited.
    Integrated(FuseSummary),
}

/// TSDF update protocol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Integrator {
    params: TsdfParams,
    depth_factor: f32,
}

impl Integrator {
    /// Create an integrator.
    pub fn new(params: TsdfParams, depth_factor: f32) -> Self {
        Self {
            params,
            depth_factor,
        }
    }

    /// TSDF parameters.
    #[inline]
    pub fn params(&self) -> &TsdfParams {
        &self.params
    }

    /// Multiplier applied to decoded depth.
    #[inline]
    pub fn depth_factor(&self) -> f32 {
        self.depth_factor
    }

    /// Observe one world point.
    ///
    /// Returns `None` when the point projects outside the image or behind
    /// the camera, when its pixel is Empty, or when it lies beyond the
    /// truncation band behind the measured surface.
    pub fn observe<C: CameraModel + ?Sized>(
        &self,
        camera: &C,
        frame: &SensorFrame,
        world: Point3,
    ) -> Option<Observation> {
        let (width, height) = frame.dimensions();
        let pixel = project_voxel(camera, world, width, height)?;

        let class = frame.classification.class_at(pixel);
        if class.is_empty() {
            return None;
        }

        let dist_exact = distance_to_image_plane(camera, world);
        let dist_measured = frame.measured_depth(class, pixel, self.depth_factor)?;
        let sample = self.params.sample(dist_exact, dist_measured).value()?;

        Some(Observation {
            pixel,
            class,
            dist_exact,
            dist_measured,
            sample,
        })
    }

    /// Fold one observation of every voxel into `block`, once per frame.
    pub fn integrate_block<C: CameraModel + ?Sized>(
        &self,
        block: &mut VoxelBlock,
        camera: &C,
        frame: &SensorFrame,
        frame_index: u64,
    ) -> BlockIntegration {
        if !block.needs_integration(frame_index) {
            return BlockIntegration::Skipped;
        }

        let threshold = self.params.threshold;
        let summary = block.fuse(frame_index, |_, center, voxel| {
            let obs = self.observe(camera, frame, center)?;
            Some(voxel.fold(obs.sample, obs.class, threshold, frame_index))
        });
        BlockIntegration::Integrated(summary)
    }
}
