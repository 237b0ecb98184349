//! Fixed-step integration for the engine's bodies
//!
//! Semi-implicit Euler with the reference divisors:
//! - kick:  v += a * time_scale / ACCELERATION_DAMPING
//! - drift: x += v * time_scale / TIME_SCALE
//!
//! The velocity is updated first and the new velocity moves the body, which
//! keeps orbits from spiralling the way explicit Euler does. Trails are
//! sampled here as well since they depend on the freshly integrated position.

use crate::simulation::params::{ACCELERATION_DAMPING, TIME_SCALE, UNIT_SCALE};
use crate::simulation::states::{Body, TrailPoint, MAX_TRAIL_POINTS, TRAIL_UPDATE_INTERVAL};

/// Advance every mobile body by one step.
///
/// `time_scale` scales both the kick and the drift, `1.0` reproduces the
/// reference motion. `delta_time` is wall time in seconds and only drives
/// trail sampling.
pub fn symplectic_euler(bodies: &mut [Body], time_scale: f64, delta_time: f64) {
    for b in bodies.iter_mut().filter(|b| b.is_mobile()) {
        // Kick
        b.velocity += b.acceleration * (time_scale / ACCELERATION_DAMPING);
        // Drift with the updated velocity
        b.position += b.velocity * (time_scale / TIME_SCALE);

        if b.show_trail {
            update_trail(b, delta_time);
        }
    }
}

/// Age existing samples, push a new one once the interval has elapsed and
/// evict the oldest beyond `MAX_TRAIL_POINTS`
pub fn update_trail(b: &mut Body, delta_time: f64) {
    let dt = delta_time.max(0.0);

    for p in b.trail.iter_mut() {
        p.age += dt;
    }

    b.trail_timer += dt;
    if b.trail_timer >= TRAIL_UPDATE_INTERVAL {
        b.trail_timer = 0.0;
        b.trail.push_back(TrailPoint {
            position: b.position,
            age: 0.0,
        });
    }

    while b.trail.len() > MAX_TRAIL_POINTS {
        b.trail.pop_front();
    }
}

/// Tangential speed (display units) for a circular orbit of radius
/// `separation` around a fixed `central_mass` under this integrator.
///
/// Per step the body moves `v / TIME_SCALE` and its velocity turns by
/// `a / ACCELERATION_DAMPING`, so the usual `v^2 = a r` becomes
/// `v^2 = a r TIME_SCALE / ACCELERATION_DAMPING` with `a` in m/s^2.
pub fn circular_speed(central_mass: f64, separation: f64, g: f64) -> f64 {
    if separation <= 0.0 {
        return 0.0;
    }
    let r_m = separation * UNIT_SCALE;
    let a = g * central_mass / (r_m * r_m);
    (a * separation * TIME_SCALE / ACCELERATION_DAMPING).sqrt()
}
