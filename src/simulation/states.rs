//! Core state types for the simulation.
//!
//! Defines the body record owned by the engine:
//! - `BodyId`   stable handle, never reused
//! - `BodySpec` everything needed to create a body
//! - `Body`     physical + visual state, radius derived from mass and density
//! - `TrailPoint` one sample of a body's position history

use std::collections::VecDeque;
use std::f64::consts::PI;
use std::fmt;

use nalgebra::Vector3;
use thiserror::Error;

use crate::simulation::params::{LIGHT_SPEED, SIZE_RATIO, UNIT_SCALE};

pub type NVec3 = Vector3<f64>;

/// RGBA color, components in `[0, 1]`
pub type Rgba = [f32; 4];

/// Maximum number of samples kept in a trail
pub const MAX_TRAIL_POINTS: usize = 1000;

/// Wall time between two trail samples (seconds)
pub const TRAIL_UPDATE_INTERVAL: f64 = 0.1;

/// Reasons a body cannot be created or modified
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BodyError {
    #[error("mass must be positive, got {0}")]
    NonPositiveMass(f64),

    #[error("density must be positive, got {0}")]
    NonPositiveDensity(f64),

    #[error("{0} contains a non-finite component")]
    NonFinite(&'static str),
}

/// Stable external handle for a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u64);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One position sample of a trail
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailPoint {
    pub position: NVec3,
    pub age: f64, // seconds since the sample was taken
}

/// Creation parameters for a body
#[derive(Debug, Clone)]
pub struct BodySpec {
    pub name: String,
    pub position: NVec3,
    pub velocity: NVec3,
    pub mass: f64,    // kg
    pub density: f64, // kg/m^3
    pub color: Rgba,
    pub fixed: bool,
    pub glowing: bool,
    pub trail: bool,
}

impl BodySpec {
    /// A white, free-moving body with a trail
    pub fn new(name: impl Into<String>, position: NVec3, velocity: NVec3, mass: f64, density: f64) -> Self {
        Self {
            name: name.into(),
            position,
            velocity,
            mass,
            density,
            color: [1.0, 1.0, 1.0, 1.0],
            fixed: false,
            glowing: false,
            trail: true,
        }
    }

    pub fn with_color(mut self, color: Rgba) -> Self {
        self.color = color;
        self
    }

    pub fn glowing(mut self) -> Self {
        self.glowing = true;
        self
    }

    pub fn fixed(mut self) -> Self {
        self.fixed = true;
        self
    }

    pub fn without_trail(mut self) -> Self {
        self.trail = false;
        self
    }
}

/// Radius in display units of a sphere with the given mass and density
///
/// `cbrt(3m / (4 pi rho)) / SIZE_RATIO`
pub fn radius_from(mass: f64, density: f64) -> f64 {
    ((3.0 * mass) / (4.0 * PI * density)).cbrt() / SIZE_RATIO
}

/// A single simulated mass
///
/// `mass`, `density` and `radius` are private so the radius can never drift
/// from the value derived from the other two.
#[derive(Debug, Clone)]
pub struct Body {
    id: BodyId,
    pub name: String,
    pub position: NVec3,     // display units
    pub velocity: NVec3,     // display units per step
    pub acceleration: NVec3, // scratch, rewritten every tick
    mass: f64,
    density: f64,
    radius: f64,
    pub color: Rgba,
    pub fixed: bool,
    pub destroyed: bool,
    pub glowing: bool,
    pub show_trail: bool,
    pub being_created: bool,
    pub(crate) trail: VecDeque<TrailPoint>,
    pub(crate) trail_timer: f64,
}

impl Body {
    /// Validate `spec` and build a body in the being-created state
    pub fn new(id: BodyId, spec: BodySpec) -> Result<Self, BodyError> {
        check_mass(spec.mass)?;
        check_density(spec.density)?;
        if !finite(&spec.position) {
            return Err(BodyError::NonFinite("position"));
        }
        if !finite(&spec.velocity) {
            return Err(BodyError::NonFinite("velocity"));
        }

        Ok(Self {
            id,
            name: spec.name,
            position: spec.position,
            velocity: spec.velocity,
            acceleration: NVec3::zeros(),
            mass: spec.mass,
            density: spec.density,
            radius: radius_from(spec.mass, spec.density),
            color: spec.color,
            fixed: spec.fixed,
            destroyed: false,
            glowing: spec.glowing,
            show_trail: spec.trail,
            being_created: true,
            trail: VecDeque::new(),
            trail_timer: 0.0,
        })
    }

    pub fn id(&self) -> BodyId {
        self.id
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub(crate) fn set_mass(&mut self, mass: f64) -> Result<(), BodyError> {
        check_mass(mass)?;
        self.mass = mass;
        self.update_radius();
        Ok(())
    }

    pub(crate) fn set_density(&mut self, density: f64) -> Result<(), BodyError> {
        check_density(density)?;
        self.density = density;
        self.update_radius();
        Ok(())
    }

    fn update_radius(&mut self) {
        self.radius = radius_from(self.mass, self.density);
    }

    /// Trail samples, oldest first
    pub fn trail(&self) -> impl Iterator<Item = &TrailPoint> {
        self.trail.iter()
    }

    pub fn trail_len(&self) -> usize {
        self.trail.len()
    }

    pub fn clear_trail(&mut self) {
        self.trail.clear();
        self.trail_timer = 0.0;
    }

    /// Takes part in forces, collisions and the grid
    pub fn is_active(&self) -> bool {
        !self.destroyed && !self.being_created
    }

    /// Moved by the integrator
    pub fn is_mobile(&self) -> bool {
        self.is_active() && !self.fixed
    }

    pub fn momentum(&self) -> NVec3 {
        self.velocity * self.mass
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.norm_squared()
    }

    /// `2GM / c^2` in meters
    pub fn schwarzschild_radius(&self, g: f64) -> f64 {
        2.0 * g * self.mass / (LIGHT_SPEED * LIGHT_SPEED)
    }

    /// Newtonian field strength of this body at `point` (m/s^2, pointing at the body)
    pub fn gravitational_field(&self, point: &NVec3, g: f64) -> NVec3 {
        let d = self.position - point;
        let r = d.norm();
        if r < f64::EPSILON {
            return NVec3::zeros();
        }
        let r_m = r * UNIT_SCALE;
        (g * self.mass / (r_m * r_m)) * (d / r)
    }
}

fn check_mass(mass: f64) -> Result<(), BodyError> {
    if mass.is_finite() && mass > 0.0 {
        Ok(())
    } else {
        Err(BodyError::NonPositiveMass(mass))
    }
}

fn check_density(density: f64) -> Result<(), BodyError> {
    if density.is_finite() && density > 0.0 {
        Ok(())
    } else {
        Err(BodyError::NonPositiveDensity(density))
    }
}

fn finite(v: &NVec3) -> bool {
    v.iter().all(|c| c.is_finite())
}
