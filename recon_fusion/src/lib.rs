//! recon_fusion - Monte Carlo TSDF fusion of live and reference depth.
//!
//! Each pass draws random pixels that the classification image marks as
//! changed, back-projects them into the block map, and integrates every
//! touched block against the live or reference depth image, according to
//! the class of the pixel each voxel projects to.
//!
//! # Core Types
//!
//! - [`PinholeCamera`] / [`CameraModel`]: projection used by integration
//! - [`SensorFrame`]: live depth, reference depth and classification
//! - [`MonteCarloSampler`]: bounded rejection sampling of non-Empty pixels
//! - [`Integrator`]: per-block projective TSDF update, once per frame
//! - [`Reconstructor`]: owns the [`recon_map::BlockStore`] and runs passes
//! - [`DepthSceneSimulator`]: synthetic frames from signed distance functions
//!
//! # Example
//!
//! ```
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use recon_core::Point3;
//! use recon_fusion::prelude::*;
//! use recon_fusion::simulate::plane_sdf;
//!
//! let config = FusionConfig::default().with_samples(100, 10);
//! let camera = PinholeCamera::new(
//!     Pose::look_at(Point3::new(0.0, 0.0, 3.0), Point3::ZERO, Point3::Y),
//!     Intrinsics::from_fov(32, 32, 1.0),
//! );
//! let mut rng = StdRng::seed_from_u64(7);
//! let frame = DepthSceneSimulator::new(32, 32, config.depth_factor)
//!     .render(&camera, plane_sdf(Point3::Z, 0.0), |_| f32::INFINITY, &mut rng)
//!     .unwrap();
//!
//! let mut recon = Reconstructor::new(config).unwrap();
//! let report = recon.reconstruct_next(&camera, &frame, &mut rng).unwrap();
//! assert_eq!(report.samples_accepted, 100);
//! assert!(recon.store().total_active_voxels() > 0);
//! ```
//!
//! # Crate Features
//!
//! - `rayon`: forwards to `recon_map/rayon`

#![warn(missing_docs)]

pub mod camera;
pub mod config;
pub mod error;
pub mod image;
pub mod integrator;
pub mod projection;
pub mod reconstruct;
pub mod sampler;
pub mod simulate;

/// Commonly used types.
pub mod prelude {
    pub use crate::camera::{CameraModel, Intrinsics, PinholeCamera, Pose};
    pub use crate::config::{FusionConfig, ReconstructionMode};
    pub use crate::error::{FusionError, Result};
    pub use crate::image::{
        ClassificationImage, EncodedDepthImage, Image, PixelCoord, SensorFrame,
    };
    pub use crate::integrator::{BlockIntegration, Integrator, Observation};
    pub use crate::reconstruct::{PassContext, PassReport, Reconstructor};
    pub use crate::sampler::{MonteCarloSampler, SampleOutcome};
    pub use crate::simulate::DepthSceneSimulator;
}

pub use camera::{CameraModel, Intrinsics, PinholeCamera, Pose};
pub use config::{FusionConfig, ReconstructionMode};
pub use error::{FusionError, Result};
pub use image::{ClassificationImage, EncodedDepthImage, Image, PixelCoord, SensorFrame};
pub use integrator::{BlockIntegration, Integrator, Observation};
pub use projection::{back_project, distance_to_image_plane, project_voxel};
pub use reconstruct::{PassContext, PassReport, Reconstructor};
pub use sampler::{MonteCarloSampler, SampleOutcome, DEFAULT_MAX_ATTEMPTS};
pub use simulate::DepthSceneSimulator;
