use std::time::Instant;

use crate::simulation::engine::SimulationEngine;
use crate::simulation::forces::{BarnesHutGravity, ForceField, PairwiseGravity};
use crate::simulation::params::G;
use crate::simulation::scenario::SimulationPreset;
use crate::simulation::states::{Body, BodyId, BodySpec, NVec3};

/// Deterministic cloud of `n` active bodies, no rand needed
fn make_cloud(n: usize) -> Vec<Body> {
    let mut bodies = Vec::with_capacity(n);

    for i in 0..n {
        let i_f = i as f64;
        let position = NVec3::new(
            (i_f * 0.37).sin() * 5000.0,
            (i_f * 0.13).cos() * 5000.0,
            (i_f * 0.07).sin() * 5000.0,
        );
        let spec = BodySpec::new(format!("cloud {i}"), position, NVec3::zeros(), 1.0e22, 5515.0);

        // mass and density above are positive, construction cannot fail
        if let Ok(mut b) = Body::new(BodyId(i as u64), spec) {
            b.being_created = false;
            bodies.push(b);
        }
    }

    bodies
}

/// Time one acceleration pass of the direct sum against Barnes–Hut
pub fn bench_gravity() {
    let ns = [200, 400, 800, 1600, 3200, 6400];

    for n in ns {
        let bodies = make_cloud(n);
        let mut out = vec![NVec3::zeros(); n];

        let direct = PairwiseGravity;
        let bh = BarnesHutGravity { theta: 0.7 };

        // Warm up
        direct.accelerations(&bodies, G, &mut out);
        bh.accelerations(&bodies, G, &mut out);

        let t0 = Instant::now();
        direct.accelerations(&bodies, G, &mut out);
        let dt_direct = t0.elapsed().as_secs_f64();

        let t1 = Instant::now();
        bh.accelerations(&bodies, G, &mut out);
        let dt_bh = t1.elapsed().as_secs_f64();

        println!("N = {n:5}, direct = {:8.6} s, BH = {:8.6} s", dt_direct, dt_bh);
    }
}

/// Average wall time of a full engine tick on each preset
pub fn bench_tick() {
    let presets = [
        SimulationPreset::SolarSystem,
        SimulationPreset::BinaryStars,
        SimulationPreset::GalaxyCollision,
    ];
    let steps = 200;

    for preset in presets {
        let mut engine = SimulationEngine::with_preset(preset);

        // Warm up
        engine.tick(1.0 / 60.0);

        let t0 = Instant::now();
        for _ in 0..steps {
            engine.tick(1.0 / 60.0);
        }
        let ms = t0.elapsed().as_secs_f64() * 1000.0 / steps as f64;

        println!(
            "{:>16}: {:3} bodies, {:5} grid vertices, {:8.4} ms/tick",
            preset.to_string(),
            engine.body_count(),
            engine.grid().vertex_count(),
            ms
        );
    }
}
