//! Sequence Blending Demonstration
//!
//! Plans the reference command lists on the gantry cell, with and without
//! blending, and prints a summary of each resulting trajectory.
//!
//! Usage: `cargo run --example blend_sequence [config.toml]`
//! Set `RUST_LOG=seqblend_planner=debug` to follow each run's planning and
//! blending steps.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use seqblend_core::{MotionSequence, PlanningScene, Trajectory};
use seqblend_planner::scenarios::{complex_sequence, complex_sequence_with_gripper, gantry_cell};
use seqblend_planner::{CommandListManager, ReferencePlanner, SequenceConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => SequenceConfig::from_toml_str(&std::fs::read_to_string(path)?)?,
        None => SequenceConfig::default(),
    };
    println!("=== Sequence Blending Demonstration ===\n");
    println!("Transition: {:?}", config.blend.transition);
    println!("Start state policy: {:?}", config.start_state_policy);

    let manager = CommandListManager::new(ReferencePlanner::new(config.planner.clone())?, config)?;
    let scene = PlanningScene::new(Arc::new(gantry_cell()));

    // === PTP / CIRC / LIN loop ===
    let blended = complex_sequence();
    let mut unblended = blended.clone();
    unblended.set_all_blend_radii_to_zero();

    println!("\n=== PTP -> CIRC -> LIN ===\n");
    let sharp = solve(&manager, &scene, &unblended)?;
    let smooth = solve(&manager, &scene, &blended)?;
    let saved = sharp[0].duration() - smooth[0].duration();
    println!("Blending saves {saved:.3} s ({:.1}%)", 100.0 * saved / sharp[0].duration());

    // === Gripper and arm interleaved ===
    println!("\n=== Pick sequence with gripper ===\n");
    solve(&manager, &scene, &complex_sequence_with_gripper())?;

    // === Repetition ===
    println!("\n=== Loop repeated 5 times ===\n");
    let mut repeated = blended.repeated(5);
    for pass in 0..4 {
        repeated.set_blend_radius(pass * blended.len() + blended.len() - 1, 0.1);
    }
    let looped = solve(&manager, &scene, &repeated)?;
    println!(
        "Single pass: {:.3} s, five passes: {:.3} s",
        smooth[0].duration(),
        looped[0].duration()
    );

    Ok(())
}

fn solve(
    manager: &CommandListManager<ReferencePlanner>,
    scene: &PlanningScene,
    sequence: &MotionSequence,
) -> Result<Vec<Trajectory>, Box<dyn std::error::Error>> {
    let trajectories = manager.solve(scene, sequence)?;
    for (i, trajectory) in trajectories.iter().enumerate() {
        let end = &trajectory.last().positions;
        println!(
            "Run {i} [{}]: {} waypoints, {:.3} s, ends at {:?}",
            trajectory.group(),
            trajectory.len(),
            trajectory.duration(),
            end.as_slice()
        );
    }
    Ok(trajectories)
}
