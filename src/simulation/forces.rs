//! Gravitational acceleration for the engine's bodies
//!
//! Defines the [`ForceField`] seam, the direct all-pairs Newtonian sum used
//! by default, and a Barnes–Hut variant for large body counts.

use serde::{Deserialize, Serialize};

use crate::simulation::barnes_hut::Octree;
use crate::simulation::params::{MIN_SEPARATION, UNIT_SCALE};
use crate::simulation::states::{Body, NVec3};

/// Source of per-body accelerations for one tick
///
/// Implementations overwrite `out[i]` with the net acceleration on
/// `bodies[i]`. Fixed, destroyed and being-created bodies receive zero.
/// Destroyed and being-created bodies exert nothing either.
pub trait ForceField {
    fn accelerations(&self, bodies: &[Body], g: f64, out: &mut [NVec3]);
}

/// Which [`ForceField`] the engine evaluates each tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForceModel {
    Direct,
    BarnesHut { theta: f64 },
}

impl ForceModel {
    pub fn field(&self) -> Box<dyn ForceField> {
        match *self {
            ForceModel::Direct => Box::new(PairwiseGravity),
            ForceModel::BarnesHut { theta } => Box::new(BarnesHutGravity { theta }),
        }
    }
}

/// Run `field` over `bodies` and store the result in each body's
/// `acceleration` scratch field
pub fn apply(field: &dyn ForceField, bodies: &mut [Body], g: f64) {
    let mut out = vec![NVec3::zeros(); bodies.len()];
    field.accelerations(bodies, g, &mut out);
    for (b, a) in bodies.iter_mut().zip(out) {
        b.acceleration = a;
    }
}

/// Direct O(n^2) Newtonian gravity, no softening
///
/// Separations are converted from display units to meters before the
/// inverse-square law is applied. Coincident pairs are skipped.
pub struct PairwiseGravity;

impl ForceField for PairwiseGravity {
    fn accelerations(&self, bodies: &[Body], g: f64, out: &mut [NVec3]) {
        for a in out.iter_mut() {
            *a = NVec3::zeros();
        }

        let n = bodies.len();
        for i in 0..n {
            let bi = &bodies[i];
            if !bi.is_active() {
                continue;
            }

            for j in (i + 1)..n {
                let bj = &bodies[j];
                if !bj.is_active() {
                    continue;
                }

                // d points from i to j: i is pulled along +d, j along -d
                let d = bj.position - bi.position;
                let r = d.norm();
                if r < MIN_SEPARATION {
                    continue;
                }
                let dir = d / r;

                let r_m = r * UNIT_SCALE;
                let force = g * bi.mass() * bj.mass() / (r_m * r_m);

                if !bi.fixed {
                    out[i] += (force / bi.mass()) * dir;
                }
                if !bj.fixed {
                    out[j] -= (force / bj.mass()) * dir;
                }
            }
        }
    }
}

/// Newtonian gravity evaluated through a Barnes–Hut octree
///
/// `theta` is the opening angle: a node whose size over distance falls
/// below it is treated as a single mass at its center of mass. `theta = 0`
/// always descends to the leaves and reproduces the direct sum up to
/// floating-point summation order.
pub struct BarnesHutGravity {
    pub theta: f64,
}

impl ForceField for BarnesHutGravity {
    fn accelerations(&self, bodies: &[Body], g: f64, out: &mut [NVec3]) {
        for a in out.iter_mut() {
            *a = NVec3::zeros();
        }

        let Some(tree) = Octree::build(bodies) else {
            return;
        };
        for (i, b) in bodies.iter().enumerate() {
            if b.is_mobile() {
                out[i] = tree.acceleration_on(i, bodies, g, self.theta);
            }
        }
    }
}
