//! End-to-end reconstruction passes over simulated scenes.

use std::collections::HashMap;

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use recon_core::{BlockKey, Point3, Voxel, VoxelClass};
use recon_fusion::prelude::*;
use recon_fusion::simulate::{plane_sdf, sphere_sdf, union_sdf};
use recon_map::{BlockMesh, MeshCache, MeshConsumer, ZeroedBlockFactory};

const W: u32 = 32;
const H: u32 = 32;

// ============================================================================
// Helpers
// ============================================================================

fn camera() -> PinholeCamera {
    PinholeCamera::new(
        Pose::look_at(Point3::new(0.0, 0.0, 3.0), Point3::ZERO, Point3::Y),
        Intrinsics::from_fov(W, H, 60.0_f32.to_radians()),
    )
}

fn config() -> FusionConfig {
    FusionConfig::default()
        .with_block_size(0.5)
        .with_samples(300, 30)
        .with_eviction_interval(0)
}

/// Live plane at z = 0, nothing in the reference.
fn plane_frame() -> SensorFrame {
    let mut rng = StdRng::seed_from_u64(0);
    DepthSceneSimulator::new(W, H, 1000.0)
        .render(&camera(), plane_sdf(Point3::Z, 0.0), |_| f32::INFINITY, &mut rng)
        .unwrap()
}

fn empty_frame() -> SensorFrame {
    let classes: ClassificationImage = Image::new(W, H);
    SensorFrame::new(Image::new(W, H), Image::new(W, H), classes).unwrap()
}

fn snapshot(recon: &Reconstructor) -> HashMap<BlockKey, Vec<Voxel>> {
    recon
        .store()
        .blocks()
        .map(|b| (b.key(), b.voxels().to_vec()))
        .collect()
}

/// Records every mesh event.
#[derive(Default)]
struct EventLog {
    meshes: Vec<BlockKey>,
    evicted: Vec<BlockKey>,
}

impl MeshConsumer for EventLog {
    fn on_block_mesh(&mut self, mesh: BlockMesh) {
        self.meshes.push(mesh.key);
    }

    fn on_block_evicted(&mut self, key: BlockKey) {
        self.evicted.push(key);
    }
}

// ============================================================================
// Surface placement
// ============================================================================

#[test]
fn plane_yields_live_voxels_straddling_surface() {
    let mut recon = Reconstructor::new(config()).unwrap();
    let mut rng = StdRng::seed_from_u64(1);
    let report = recon.reconstruct_next(&camera(), &plane_frame(), &mut rng).unwrap();

    assert_eq!(report.samples_accepted, 300);
    assert_eq!(report.samples_dropped, 0);

    let mut active = 0;
    let (mut above, mut below) = (false, false);
    for block in recon.store().blocks() {
        for index in block.resolution().indices() {
            let voxel = block.voxel(index).unwrap();
            if !voxel.is_active() {
                continue;
            }
            active += 1;
            let z = block.voxel_center(index).z;
            assert_eq!(voxel.class, VoxelClass::Live);
            assert!(z.abs() < 0.25 + 1e-3, "active voxel at z = {}", z);
            above |= z > 0.0;
            below |= z < 0.0;
        }
    }
    assert!(active > 0);
    assert!(above && below);
    assert_eq!(active, recon.store().total_active_voxels());
}

#[test]
fn removed_object_yields_reference_voxels() {
    let wall = plane_sdf(Point3::Z, -1.0);
    let sphere = sphere_sdf(Point3::ZERO, 0.5);
    let mut rng = StdRng::seed_from_u64(4);
    let frame = DepthSceneSimulator::new(W, H, 1000.0)
        .render(&camera(), &wall, union_sdf(&wall, &sphere), &mut rng)
        .unwrap();
    assert_eq!(frame.classification.count(VoxelClass::Live), 0);
    assert!(frame.classification.count(VoxelClass::Reference) > 0);

    let mut recon = Reconstructor::new(config()).unwrap();
    recon.reconstruct_next(&camera(), &frame, &mut rng).unwrap();

    let mut active = 0;
    for block in recon.store().blocks() {
        for index in block.resolution().indices() {
            let voxel = block.voxel(index).unwrap();
            if voxel.is_active() {
                active += 1;
                assert_eq!(voxel.class, VoxelClass::Reference);
                assert!(block.voxel_center(index).length() < 1.0);
            }
        }
    }
    assert!(active > 0);
}

// ============================================================================
// Sampling
// ============================================================================

#[test]
fn all_empty_image_drops_every_sample() {
    let mut recon = Reconstructor::new(config().with_samples(4, 1)).unwrap();
    let mut rng = StdRng::seed_from_u64(2);
    let report = recon.reconstruct_next(&camera(), &empty_frame(), &mut rng).unwrap();

    assert_eq!(report.samples_dropped, 4);
    assert_eq!(report.samples_accepted, 0);
    assert_eq!(report.total_attempts, 4 * 1000);
    assert_eq!(report.blocks_integrated, 0);
    assert!(recon.store().is_empty());
}

#[test]
fn continuous_mode_uses_small_pass() {
    let mut recon = Reconstructor::new(config()).unwrap();
    recon.set_mode(ReconstructionMode::Continuous);
    let mut rng = StdRng::seed_from_u64(3);
    let report = recon.reconstruct_next(&camera(), &plane_frame(), &mut rng).unwrap();
    assert_eq!(report.samples_requested, 30);
}

// ============================================================================
// Per-frame guard
// ============================================================================

#[test]
fn same_frame_index_does_not_refold_blocks() {
    let frame = plane_frame();
    let cam = camera();
    let mut recon = Reconstructor::new(config()).unwrap();
    let mut rng = StdRng::seed_from_u64(5);

    recon.reconstruct(&PassContext::new(&cam, &frame, 5), &mut rng).unwrap();
    let integrated: HashMap<_, _> = snapshot(&recon)
        .into_iter()
        .filter(|(key, _)| recon.store().block(*key).unwrap().last_update_frame() == 5)
        .collect();
    assert!(!integrated.is_empty());

    let report = recon.reconstruct(&PassContext::new(&cam, &frame, 5), &mut rng).unwrap();
    assert!(report.blocks_skipped > 0);
    for (key, voxels) in &integrated {
        assert_eq!(recon.store().block(*key).unwrap().voxels(), voxels.as_slice());
    }
}

#[test]
fn repeated_frames_accumulate_updates() {
    let frame = plane_frame();
    let mut recon = Reconstructor::new(config().with_samples(2000, 0)).unwrap();
    let mut rng = StdRng::seed_from_u64(6);
    for _ in 0..3 {
        recon.reconstruct_next(&camera(), &frame, &mut rng).unwrap();
    }
    let max_updates = recon
        .store()
        .blocks()
        .flat_map(|b| b.voxels().iter())
        .map(|v| v.updates)
        .max()
        .unwrap();
    assert!(max_updates <= 3);
    assert!(max_updates >= 2);
}

// ============================================================================
// Eviction
// ============================================================================

#[test]
fn eviction_runs_on_configured_cadence() {
    let frame = plane_frame();
    let mut recon = Reconstructor::with_parts(
        config().with_eviction_interval(3),
        ZeroedBlockFactory,
        EventLog::default(),
    )
    .unwrap();
    let mut rng = StdRng::seed_from_u64(7);

    let mut evicted = Vec::new();
    for _ in 0..3 {
        let report = recon.reconstruct_next(&camera(), &frame, &mut rng).unwrap();
        evicted.push(report.blocks_evicted);
    }
    assert_eq!(evicted[0], 0);
    assert_eq!(evicted[1], 0);
    assert!(evicted[2] > 0);
    assert_eq!(recon.consumer().evicted.len(), evicted[2]);
    assert!(recon.store().blocks().all(|b| b.active_count() > 0));
    assert!(!recon.consumer().meshes.is_empty());
}

#[test]
fn manual_eviction_with_interval_zero() {
    let mut recon = Reconstructor::new(config()).unwrap();
    let mut rng = StdRng::seed_from_u64(8);
    let report = recon.reconstruct_next(&camera(), &plane_frame(), &mut rng).unwrap();
    assert_eq!(report.blocks_evicted, 0);

    let stored = recon.store().len();
    let removed = recon.evict_empty_blocks();
    assert!(!removed.is_empty());
    assert_eq!(recon.store().len(), stored - removed.len());
    assert!(recon.evict_empty_blocks().is_empty());

    let cache: &MeshCache = recon.consumer();
    for key in &removed {
        assert!(cache.get(*key).is_none());
    }
}

// ============================================================================
// Input validation
// ============================================================================

#[test]
fn frame_zero_is_rejected() {
    let mut recon = Reconstructor::new(config()).unwrap();
    let mut rng = StdRng::seed_from_u64(9);
    let err = recon
        .reconstruct(&PassContext::new(&camera(), &plane_frame(), 0), &mut rng)
        .unwrap_err();
    assert!(matches!(err, FusionError::InvalidFrameIndex(0)));
    assert!(recon.store().is_empty());
}

#[test]
fn mismatched_images_are_rejected() {
    let mut frame = plane_frame();
    frame.reference = Image::new(W / 2, H);
    let mut recon = Reconstructor::new(config()).unwrap();
    let mut rng = StdRng::seed_from_u64(10);
    let err = recon.reconstruct_next(&camera(), &frame, &mut rng).unwrap_err();
    assert!(matches!(
        err,
        FusionError::ImageSizeMismatch { image: "reference", .. }
    ));
}

#[test]
fn config_from_json_drives_reconstructor() {
    let config = FusionConfig::from_json(
        r#"{ "block_size": 0.5, "batch_samples": 50, "eviction_interval": 0 }"#,
    )
    .unwrap();
    let mut recon = Reconstructor::new(config).unwrap();
    let mut rng = StdRng::seed_from_u64(11);
    let report = recon.reconstruct_next(&camera(), &plane_frame(), &mut rng).unwrap();
    assert_eq!(report.samples_requested, 50);
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn active_counts_match_voxels(seed in any::<u64>(), passes in 1usize..4) {
        let frame = plane_frame();
        let mut recon = Reconstructor::new(config().with_samples(100, 0)).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut delta = 0i64;
        for _ in 0..passes {
            delta += recon.reconstruct_next(&camera(), &frame, &mut rng).unwrap().active_delta;
        }
        for block in recon.store().blocks() {
            prop_assert_eq!(block.active_count(), block.recount_active());
        }
        prop_assert_eq!(delta, recon.store().total_active_voxels() as i64);
    }
}
