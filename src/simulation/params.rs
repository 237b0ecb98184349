//! Physical constants and runtime simulation settings
//!
//! `SimulationConfig` holds the knobs the UI can turn between ticks:
//! - time scale and gravitational constant,
//! - collision toggle and response mode,
//! - pause flag,
//! - which force model evaluates gravity

use serde::{Deserialize, Serialize};

use crate::simulation::collisions::CollisionMode;
use crate::simulation::forces::ForceModel;

/// Gravitational constant (m^3 kg^-1 s^-2)
pub const G: f64 = 6.6743e-11;

/// Speed of light (m/s)
pub const LIGHT_SPEED: f64 = 299_792_458.0;

/// Meters per display unit
pub const UNIT_SCALE: f64 = 1000.0;

/// Divisor applied to velocity when advancing position
pub const TIME_SCALE: f64 = 94.0;

/// Divisor applied to acceleration when advancing velocity
pub const ACCELERATION_DAMPING: f64 = 96.0;

/// Physical radius (m) -> display radius
pub const SIZE_RATIO: f64 = 30000.0;

/// Factor applied to a body's velocity while it overlaps another body
pub const COLLISION_DAMPING: f64 = -0.2;

/// Separations (display units) below this are treated as coincident
pub const MIN_SEPARATION: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub time_scale: f64, // multiplier on both integration divisors, 1.0 = reference speed
    pub gravitational_constant: f64,
    pub enable_collisions: bool,
    #[serde(skip)]
    pub is_paused: bool,
    pub collision_mode: CollisionMode,
    pub force_model: ForceModel,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            gravitational_constant: G,
            enable_collisions: true,
            is_paused: false,
            collision_mode: CollisionMode::SoftBounce,
            force_model: ForceModel::Direct,
        }
    }
}
