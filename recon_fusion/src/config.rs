//! Reconstruction configuration.
//!
//! Loaded from and saved to JSON; any field missing from a file takes its
//! default value.

use std::fs;
use std::path::Path;

use recon_core::{Point3, Resolution, TsdfParams, DEFAULT_DEPTH_FACTOR};
use recon_map::{Color, GridConfig, MeshPalette};
use serde::{Deserialize, Serialize};

use crate::error::{FusionError, Result};
use crate::sampler::DEFAULT_MAX_ATTEMPTS;

/// How passes are driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconstructionMode {
    /// One large pass on demand.
    #[default]
    Batch,
    /// A small pass every frame.
    Continuous,
}

/// Configuration for a [`crate::Reconstructor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Voxels per axis in each block.
    pub resolution: [u32; 3],
    /// World-space side length of a block.
    pub block_size: f32,
    /// Chebyshev radius of blocks created around a newly referenced block.
    pub generation_radius: u32,
    /// World position of the centre of block `(0, 0, 0)`.
    pub grid_origin: [f32; 3],
    /// TSDF saturation value.
    pub tsdf_max: f32,
    /// TSDF slope around the surface.
    pub tsdf_slope: f32,
    /// Half-width of the surface band.
    pub tsdf_threshold: f32,
    /// Multiplier from decoded depth to world units.
    pub depth_factor: f32,
    /// Samples per pass in batch mode.
    pub batch_samples: usize,
    /// Samples per pass in continuous mode.
    pub continuous_samples: usize,
    /// Active mode.
    pub mode: ReconstructionMode,
    /// Draws per sample before it is dropped.
    pub max_attempts: u32,
    /// Evict empty blocks every N passes; 0 leaves eviction to the caller.
    pub eviction_interval: u32,
    /// Mesh colour of Live voxels.
    pub live_color: Color,
    /// Mesh colour of Reference voxels.
    pub reference_color: Color,
}

impl Default for FusionConfig {
    fn default() -> Self {
        let palette = MeshPalette::default();
        Self {
            resolution: [8, 8, 8],
            block_size: 1.0,
            generation_radius: 1,
            grid_origin: [0.0; 3],
            tsdf_max: 1.0,
            tsdf_slope: 2.0,
            tsdf_threshold: 0.5,
            depth_factor: DEFAULT_DEPTH_FACTOR,
            batch_samples: 5000,
            continuous_samples: 200,
            mode: ReconstructionMode::Batch,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            eviction_interval: 1,
            live_color: palette.live,
            reference_color: palette.reference,
        }
    }
}

impl FusionConfig {
    /// Set the block resolution.
    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution.as_array();
        self
    }

    /// Set the block side length.
    pub fn with_block_size(mut self, block_size: f32) -> Self {
        self.block_size = block_size;
        self
    }

    /// Set the generation radius.
    pub fn with_generation_radius(mut self, radius: u32) -> Self {
        self.generation_radius = radius;
        self
    }

    /// Set the grid origin.
    pub fn with_grid_origin(mut self, origin: Point3) -> Self {
        self.grid_origin = origin.as_array();
        self
    }

    /// Set the TSDF parameters.
    pub fn with_tsdf(mut self, params: TsdfParams) -> Self {
        self.tsdf_max = params.max;
        self.tsdf_slope = params.slope;
        self.tsdf_threshold = params.threshold;
        self
    }

    /// Set the depth factor.
    pub fn with_depth_factor(mut self, depth_factor: f32) -> Self {
        self.depth_factor = depth_factor;
        self
    }

    /// Set the per-pass sample counts for batch and continuous mode.
    pub fn with_samples(mut self, batch: usize, continuous: usize) -> Self {
        self.batch_samples = batch;
        self.continuous_samples = continuous;
        self
    }

    /// Set the mode.
    pub fn with_mode(mut self, mode: ReconstructionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the sampler draw cap.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the eviction cadence.
    pub fn with_eviction_interval(mut self, interval: u32) -> Self {
        self.eviction_interval = interval;
        self
    }

    /// Set the mesh colours.
    pub fn with_palette(mut self, palette: MeshPalette) -> Self {
        self.live_color = palette.live;
        self.reference_color = palette.reference;
        self
    }

    /// Samples drawn per pass in the active mode.
    #[inline]
    pub fn samples_per_pass(&self) -> usize {
        match self.mode {
            ReconstructionMode::Batch => self.batch_samples,
            ReconstructionMode::Continuous => self.continuous_samples,
        }
    }

    /// Block grid part of the configuration.
    pub fn grid_config(&self) -> GridConfig {
        GridConfig::new(
            Resolution::from_array(self.resolution),
            self.block_size,
            self.generation_radius,
        )
        .with_origin(Point3::from(self.grid_origin))
    }

    /// TSDF part of the configuration.
    #[inline]
    pub fn tsdf_params(&self) -> TsdfParams {
        TsdfParams::new(self.tsdf_max, self.tsdf_slope, self.tsdf_threshold)
    }

    /// Mesh colours.
    #[inline]
    pub fn palette(&self) -> MeshPalette {
        MeshPalette {
            live: self.live_color,
            reference: self.reference_color,
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.grid_config().validate()?;
        let positive = [
            ("tsdf_max", self.tsdf_max),
            ("tsdf_slope", self.tsdf_slope),
            ("tsdf_threshold", self.tsdf_threshold),
            ("depth_factor", self.depth_factor),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(FusionError::InvalidConfig {
                    message: format!("{} must be positive, got {}", name, value),
                });
            }
        }
        if self.max_attempts == 0 {
            return Err(FusionError::InvalidConfig {
                message: "max_attempts must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = Self::from_json(&fs::read_to_string(path)?)?;
        log::info!("Loaded reconstruction config from {}", path.display());
        Ok(config)
    }

    /// Write the configuration as JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
