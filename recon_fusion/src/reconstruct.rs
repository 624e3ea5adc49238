//! Reconstruction passes.
//!
//! A pass samples pixels, back-projects them, integrates the owning blocks
//! once each, hands rebuilt meshes to the consumer and, on the configured
//! cadence, evicts blocks that no longer hold any surface.

use std::time::Duration;

use instant::Instant;
use rand::Rng;
use recon_core::BlockKey;
use recon_map::{
    extract_block_mesh, BlockFactory, BlockStore, MeshCache, MeshConsumer, MeshPalette,
    ZeroedBlockFactory,
};

use crate::camera::CameraModel;
use crate::config::{FusionConfig, ReconstructionMode};
use crate::error::{FusionError, Result};
use crate::image::SensorFrame;
use crate::integrator::{BlockIntegration, Integrator};
use crate::projection::back_project;
use crate::sampler::{MonteCarloSampler, SampleOutcome};

/// Inputs of one pass.
#[derive(Debug)]
pub struct PassContext<'a, C: ?Sized> {
    /// Camera that captured `frame`.
    pub camera: &'a C,
    /// Depth and classification images.
    pub frame: &'a SensorFrame,
    /// Index of this pass; must be non-zero.
    pub frame_index: u64,
}

impl<'a, C: CameraModel + ?Sized> PassContext<'a, C> {
    /// Bundle the inputs of a pass.
    pub fn new(camera: &'a C, frame: &'a SensorFrame, frame_index: u64) -> Self {
        Self {
            camera,
            frame,
            frame_index,
        }
    }
}

/// What a pass did.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PassReport {
    /// Frame index of the pass.
    pub frame_index: u64,
    /// Samples requested.
    pub samples_requested: usize,
    /// Samples that found a non-Empty pixel.
    pub samples_accepted: usize,
    /// Samples that hit the draw cap.
    pub samples_dropped: usize,
    /// Pixel draws over all samples.
    pub total_attempts: u64,
    /// Blocks integrated this pass.
    pub blocks_integrated: usize,
    /// Samples whose block was already integrated this pass.
    pub blocks_skipped: usize,
    /// Blocks allocated by lazy creation.
    pub blocks_created: usize,
    /// Blocks evicted at the end of the pass.
    pub blocks_evicted: usize,
    /// Voxels that received a sample.
    pub voxels_folded: u64,
    /// Net change in active voxels.
    pub active_delta: i64,
    /// Wall-clock duration.
    pub duration: Duration,
}

/// Owns the block store and drives passes over it.
pub struct Reconstructor<C = MeshCache, F = ZeroedBlockFactory> {
    config: FusionConfig,
    store: BlockStore<F>,
    integrator: Integrator,
    sampler: MonteCarloSampler,
    palette: MeshPalette,
    consumer: C,
    next_frame: u64,
    passes: u64,
}

impl Reconstructor<MeshCache, ZeroedBlockFactory> {
    /// Create a reconstructor that keeps meshes in a [`MeshCache`].
    pub fn new(config: FusionConfig) -> Result<Self> {
        Self::with_parts(config, ZeroedBlockFactory, MeshCache::new())
    }
}

impl<C: MeshConsumer, F: BlockFactory> Reconstructor<C, F> {
    /// Create a reconstructor with a custom block factory and mesh consumer.
    pub fn with_parts(config: FusionConfig, factory: F, consumer: C) -> Result<Self> {
        config.validate()?;
        let store = BlockStore::with_factory(config.grid_config(), factory)?;
        Ok(Self {
            integrator: Integrator::new(config.tsdf_params(), config.depth_factor),
            sampler: MonteCarloSampler::new(config.max_attempts),
            palette: config.palette(),
            config,
            store,
            consumer,
            next_frame: 1,
            passes: 0,
        })
    }

    /// Active configuration.
    #[inline]
    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Block store (read-only; blocks are only mutated by passes).
    #[inline]
    pub fn store(&self) -> &BlockStore<F> {
        &self.store
    }

    /// Mesh consumer.
    #[inline]
    pub fn consumer(&self) -> &C {
        &self.consumer
    }

    /// Mutable mesh consumer.
    #[inline]
    pub fn consumer_mut(&mut self) -> &mut C {
        &mut self.consumer
    }

    /// Switch between batch and continuous mode.
    pub fn set_mode(&mut self, mode: ReconstructionMode) {
        self.config.mode = mode;
    }

    /// Number of completed passes.
    #[inline]
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Reserve the next frame index (starting at 1).
    pub fn next_frame(&mut self) -> u64 {
        let frame = self.next_frame;
        self.next_frame += 1;
        frame
    }

    /// Run a pass with the next frame index.
    pub fn reconstruct_next<Cam, R>(
        &mut self,
        camera: &Cam,
        frame: &SensorFrame,
        rng: &mut R,
    ) -> Result<PassReport>
    where
        Cam: CameraModel + ?Sized,
        R: Rng + ?Sized,
    {
        let frame_index = self.next_frame();
        self.reconstruct(&PassContext::new(camera, frame, frame_index), rng)
    }

    /// Run one pass.
    pub fn reconstruct<Cam, R>(
        &mut self,
        ctx: &PassContext<'_, Cam>,
        rng: &mut R,
    ) -> Result<PassReport>
    where
        Cam: CameraModel + ?Sized,
        R: Rng + ?Sized,
    {
        if ctx.frame_index == 0 {
            return Err(FusionError::InvalidFrameIndex(ctx.frame_index));
        }
        ctx.frame.validate()?;

        let start = Instant::now();
        let mut report = PassReport {
            frame_index: ctx.frame_index,
            samples_requested: self.config.samples_per_pass(),
            ..PassReport::default()
        };

        for _ in 0..report.samples_requested {
            let outcome = self.sampler.draw(&ctx.frame.classification, rng);
            report.total_attempts += outcome.attempts() as u64;
            let (pixel, class) = match outcome {
                SampleOutcome::Accepted { pixel, class, .. } => (pixel, class),
                SampleOutcome::Dropped { .. } => {
                    report.samples_dropped += 1;
                    continue;
                }
            };
            report.samples_accepted += 1;

            let measured = match ctx.frame.measured_depth(class, pixel, self.config.depth_factor)
            {
                Some(depth) => depth,
                None => continue,
            };
            let world = back_project(ctx.camera, pixel, measured);
            if !world.is_finite() {
                continue;
            }

            let before = self.store.len();
            let handle = self.store.get_or_create(world);
            report.blocks_created += self.store.len() - before;

            let block = self.store.get_mut(handle)?;
            match self
                .integrator
                .integrate_block(block, ctx.camera, ctx.frame, ctx.frame_index)
            {
                BlockIntegration::Skipped => report.blocks_skipped += 1,
                BlockIntegration::Integrated(summary) => {
                    report.blocks_integrated += 1;
                    report.voxels_folded += summary.folded as u64;
                    report.active_delta += summary.active_delta as i64;
                    self.consumer
                        .on_block_mesh(extract_block_mesh(block, &self.palette));
                }
            }
        }

        if report.samples_requested > 0 && report.samples_accepted == 0 {
            log::warn!(
                "Frame {}: all {} samples dropped, classification image has no surface",
                ctx.frame_index,
                report.samples_requested
            );
        }
        log::info!(
            "Frame {}: {} samples found a surface",
            ctx.frame_index,
            report.samples_accepted
        );

        self.passes += 1;
        let interval = self.config.eviction_interval as u64;
        if interval > 0 && self.passes % interval == 0 {
            report.blocks_evicted = self.evict_empty_blocks().len();
        }
        self.next_frame = self.next_frame.max(ctx.frame_index + 1);

        report.duration = start.elapsed();
        log::info!(
            "Frame {}: reconstruction took {} ms ({} blocks stored)",
            ctx.frame_index,
            report.duration.as_millis(),
            self.store.len()
        );
        Ok(report)
    }

    /// Evict every block without active voxels and notify the consumer.
    pub fn evict_empty_blocks(&mut self) -> Vec<BlockKey> {
        let removed = self.store.remove_empty_blocks();
        for &key in &removed {
            self.consumer.on_block_evicted(key);
        }
        removed
    }
}
