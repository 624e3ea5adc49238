//! Example: reconstructing scene changes from simulated sensor frames.
//!
//! The reference scene is a back wall with a sphere in front of it. In the
//! live scene the sphere is gone and a box has appeared. A camera orbits the
//! scene; the first frame runs a batch pass, later frames run small
//! continuous passes.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=info cargo run -p recon_fusion --example synthetic_scene
//! ```

use rand::rngs::StdRng;
use rand::SeedableRng;

use recon_core::{Point3, Resolution};
use recon_fusion::prelude::*;
use recon_fusion::simulate::{box_sdf, plane_sdf, sphere_sdf, union_sdf};

const WIDTH: u32 = 96;
const HEIGHT: u32 = 72;
const FRAMES: usize = 12;

fn main() -> Result<()> {
    env_logger::init();

    let config = FusionConfig::default()
        .with_resolution(Resolution::cubic(8))
        .with_block_size(0.5)
        .with_samples(4000, 300)
        .with_eviction_interval(4);
    println!("Config:\n{}", config.to_json()?);

    let wall = plane_sdf(Point3::Z, -1.0);
    let reference = union_sdf(&wall, sphere_sdf(Point3::new(-0.6, 0.0, 0.0), 0.4));
    let live = union_sdf(&wall, box_sdf(Point3::new(0.6, -0.1, 0.0), Point3::splat(0.3)));

    let simulator = DepthSceneSimulator::new(WIDTH, HEIGHT, config.depth_factor).with_noise(0.001);
    let intrinsics = Intrinsics::from_fov(WIDTH, HEIGHT, 70.0_f32.to_radians());
    let mut recon = Reconstructor::new(config)?;
    let mut rng = StdRng::seed_from_u64(2024);

    for i in 0..FRAMES {
        let angle = (i as f32 / FRAMES as f32 - 0.5) * 1.2;
        let eye = Point3::new(3.0 * angle.sin(), 0.4, 3.0 * angle.cos());
        let camera = PinholeCamera::new(Pose::look_at(eye, Point3::ZERO, Point3::Y), intrinsics);

        let frame = simulator.render(&camera, &live, &reference, &mut rng)?;
        if i == 1 {
            recon.set_mode(ReconstructionMode::Continuous);
        }
        let report = recon.reconstruct_next(&camera, &frame, &mut rng)?;

        println!(
            "frame {:>2}: {:>4}/{:<4} samples, {:>3} blocks integrated, {:>3} created, {:>3} evicted, active {:+}",
            report.frame_index,
            report.samples_accepted,
            report.samples_requested,
            report.blocks_integrated,
            report.blocks_created,
            report.blocks_evicted,
            report.active_delta,
        );
    }

    let evicted = recon.evict_empty_blocks();
    let stats = recon.consumer().stats();
    println!();
    println!("Blocks stored:   {}", recon.store().len());
    println!("Final eviction:  {}", evicted.len());
    println!("Active voxels:   {}", recon.store().total_active_voxels());
    println!("Meshes:          {}", stats.mesh_count);
    println!("Triangles:       {}", stats.triangle_count);
    Ok(())
}
