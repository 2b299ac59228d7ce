//! Seed-reproducible synthetic uncertainty data.
//!
//! Stands in for the offline NeRF preprocessing pass: a smooth directional
//! lobe plus bounded noise, so heatmaps show recognizable structure while
//! every run with the same seed produces identical tables.

use nerfview_core::table::{CellStats, UncertaintyTable};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Full-sphere statistics table over the given angular step.
pub fn synthetic_table(seed: u64, step_deg: i32, lobe_phase: f64) -> UncertaintyTable {
    let mut rng = StdRng::seed_from_u64(seed);
    let range: Vec<i32> = (-180..=180).step_by(step_deg as usize).collect();
    UncertaintyTable::from_fn(&range, &range, |theta, phi| {
        let t = f64::from(theta).to_radians();
        let p = f64::from(phi).to_radians() + lobe_phase;
        let lobe = 0.5 + 0.4 * (t.sin() * p.cos());
        let jitter = rng.gen_range(0.0..0.1);
        CellStats {
            mean: lobe + jitter,
            std_dev: 0.05 + 0.2 * (t.cos() * p.sin()).abs() + jitter / 2.0,
            maximum: lobe + 0.3 + jitter,
        }
    })
}

/// Training viewpoints scattered over the sphere, in raw degrees as the
/// capture pipeline records them (arbitrary range, near-pole entries
/// included).
pub fn synthetic_training_angles(seed: u64, count: usize) -> Vec<(f64, f64)> {
    let mut rng = StdRng::seed_from_u64(seed ^ 0x5eed);
    (0..count)
        .map(|_| {
            (
                rng.gen_range(-90.0..=90.0),
                rng.gen_range(0.0..360.0),
            )
        })
        .collect()
}
