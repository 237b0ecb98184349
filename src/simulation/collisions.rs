//! Pairwise collision detection and response
//!
//! Runs between force accumulation and integration. Detection is a plain
//! sphere overlap test; the response depends on [`CollisionMode`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::simulation::params::COLLISION_DAMPING;
use crate::simulation::states::{Body, BodyId};

/// Outcome of testing two bodies against each other
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionType {
    None,
    Elastic,
    Inelastic,
    Merge,
}

/// How detected collisions are answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionMode {
    /// Multiply the first body's velocity of every overlapping ordered pair by
    /// `COLLISION_DAMPING`. Not momentum conserving.
    #[default]
    SoftBounce,
    /// The heavier body absorbs the lighter one, conserving mass and momentum
    Merge,
}

/// Result of one collision pass
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CollisionReport {
    pub bounces: usize,
    /// (survivor, absorbed) per merge, in resolution order
    pub merges: Vec<(BodyId, BodyId)>,
}

pub struct CollisionResolver {
    pub mode: CollisionMode,
}

impl CollisionResolver {
    pub fn new(mode: CollisionMode) -> Self {
        Self { mode }
    }

    /// Overlap test: centers closer than the sum of radii
    pub fn detect(a: &Body, b: &Body) -> bool {
        let distance = (b.position - a.position).norm();
        distance < a.radius() + b.radius()
    }

    /// Classify a pair under this resolver's mode
    pub fn classify(&self, a: &Body, b: &Body) -> CollisionType {
        if !Self::detect(a, b) {
            return CollisionType::None;
        }
        match self.mode {
            CollisionMode::SoftBounce => CollisionType::Inelastic,
            CollisionMode::Merge => CollisionType::Merge,
        }
    }

    /// Detect and answer every collision among the active bodies.
    ///
    /// Absorbed bodies are flagged `destroyed` but stay in the slice; the
    /// caller removes them.
    pub fn resolve(&self, bodies: &mut [Body]) -> CollisionReport {
        match self.mode {
            CollisionMode::SoftBounce => self.soft_bounce(bodies),
            CollisionMode::Merge => self.merge(bodies),
        }
    }

    fn soft_bounce(&self, bodies: &mut [Body]) -> CollisionReport {
        let mut report = CollisionReport::default();
        let n = bodies.len();

        // ordered pairs: only bodies[i] is damped, (j, i) handles the other side
        for i in 0..n {
            for j in 0..n {
                if i == j || !bodies[i].is_active() || !bodies[j].is_active() {
                    continue;
                }
                if self.classify(&bodies[i], &bodies[j]) != CollisionType::None {
                    bodies[i].velocity *= COLLISION_DAMPING;
                    report.bounces += 1;
                }
            }
        }

        report
    }

    fn merge(&self, bodies: &mut [Body]) -> CollisionReport {
        let mut report = CollisionReport::default();
        let n = bodies.len();

        for i in 0..n {
            for j in (i + 1)..n {
                if !bodies[i].is_active() || !bodies[j].is_active() {
                    continue;
                }
                if self.classify(&bodies[i], &bodies[j]) != CollisionType::Merge {
                    continue;
                }

                // heavier survives, the earlier body on a tie
                let (keep, gone) = if bodies[j].mass() > bodies[i].mass() { (j, i) } else { (i, j) };
                let (survivor, absorbed) = pair_mut(bodies, keep, gone);
                absorb(survivor, absorbed);
                if !absorbed.destroyed {
                    continue;
                }

                debug!(survivor = %survivor.id(), absorbed = %absorbed.id(), mass = survivor.mass(), "bodies merged");
                report.merges.push((survivor.id(), absorbed.id()));
            }
        }

        report
    }
}

/// Fold `absorbed` into `survivor`: masses add, velocity becomes the
/// mass-weighted average, radius follows from the new mass
fn absorb(survivor: &mut Body, absorbed: &mut Body) {
    let total = survivor.mass() + absorbed.mass();
    let momentum = survivor.momentum() + absorbed.momentum();

    if survivor.set_mass(total).is_err() {
        return;
    }
    // a fixed survivor stays put
    if !survivor.fixed {
        survivor.velocity = momentum / total;
    }
    absorbed.destroyed = true;
}

/// Two distinct mutable borrows into one slice
fn pair_mut(bodies: &mut [Body], a: usize, b: usize) -> (&mut Body, &mut Body) {
    debug_assert!(a != b);
    if a < b {
        let (left, right) = bodies.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = bodies.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}
