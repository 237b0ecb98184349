//! Configuration types for loading and saving simulation scenarios as YAML.
//!
//! One shape serves three purposes: custom scenario files, save files, and
//! the snapshot the engine produces of itself. A scenario consists of:
//!
//! - [`SimulationConfig`] – runtime parameters (time scale, G, collisions, force model)
//! - [`GridConfig`]       – size and resolution of the spacetime grid
//! - [`BodyConfig`]       – one record per body
//! - [`ScenarioConfig`]   – top-level wrapper
//!
//! # YAML format
//!
//! ```yaml
//! parameters:
//!   time_scale: 1.0
//!   gravitational_constant: 6.6743e-11
//!   enable_collisions: true
//!   collision_mode: soft_bounce   # or merge
//!   force_model: direct           # or !barnes_hut { theta: 0.7 }
//!
//! grid:
//!   size: 30000.0
//!   divisions: 30
//!   height: 0.0
//!
//! bodies:
//!   - name: Sun
//!     position: [0.0, 0.0, 0.0]
//!     velocity: [0.0, 0.0, 0.0]
//!     mass: 1.989e25
//!     density: 1414.0
//!     color: [1.0, 0.929, 0.176, 1.0]
//!     glowing: true
//!   - name: Earth
//!     position: [5000.0, 650.0, 0.0]
//!     velocity: [0.0, 0.0, -500.0]
//!     mass: 5.97219e23
//!     density: 5515.0
//! ```
//!
//! `parameters`, `grid` and every body field except position, velocity and
//! mass are optional.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::simulation::grid::GridConfig;
use crate::simulation::params::SimulationConfig;
use crate::simulation::states::{Body, BodyError, BodySpec, NVec3, Rgba};

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to access scenario file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed scenario: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("body {index} ({name}) is invalid: {source}")]
    InvalidBody {
        index: usize,
        name: String,
        #[source]
        source: BodyError,
    },
}

fn default_density() -> f64 {
    3344.0
}

fn default_color() -> Rgba {
    [1.0, 1.0, 1.0, 1.0]
}

fn default_true() -> bool {
    true
}

fn default_name() -> String {
    "Body".to_string()
}

/// Persisted record of a single body
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BodyConfig {
    #[serde(default = "default_name")]
    pub name: String,
    pub position: [f64; 3], // display units
    pub velocity: [f64; 3], // display units per step
    pub mass: f64,          // kg
    #[serde(default = "default_density")]
    pub density: f64,       // kg/m^3
    #[serde(default = "default_color")]
    pub color: Rgba,
    #[serde(default)]
    pub fixed: bool,
    #[serde(default)]
    pub glowing: bool,
    #[serde(default = "default_true")]
    pub trail: bool,
}

impl BodyConfig {
    pub fn to_spec(&self) -> BodySpec {
        BodySpec {
            name: self.name.clone(),
            position: NVec3::from(self.position),
            velocity: NVec3::from(self.velocity),
            mass: self.mass,
            density: self.density,
            color: self.color,
            fixed: self.fixed,
            glowing: self.glowing,
            trail: self.trail,
        }
    }
}

impl From<&Body> for BodyConfig {
    fn from(b: &Body) -> Self {
        Self {
            name: b.name.clone(),
            position: b.position.into(),
            velocity: b.velocity.into(),
            mass: b.mass(),
            density: b.density(),
            color: b.color,
            fixed: b.fixed,
            glowing: b.glowing,
            trail: b.show_trail,
        }
    }
}

impl From<&BodySpec> for BodyConfig {
    fn from(s: &BodySpec) -> Self {
        Self {
            name: s.name.clone(),
            position: s.position.into(),
            velocity: s.velocity.into(),
            mass: s.mass,
            density: s.density,
            color: s.color,
            fixed: s.fixed,
            glowing: s.glowing,
            trail: s.trail,
        }
    }
}

/// Top-level scenario / save file
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub parameters: SimulationConfig,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub bodies: Vec<BodyConfig>,
}

impl ScenarioConfig {
    pub fn from_yaml_str(source: &str) -> Result<Self, ScenarioError> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn to_yaml_string(&self) -> Result<String, ScenarioError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_yaml::from_reader(reader)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ScenarioError> {
        let writer = BufWriter::new(File::create(path)?);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    pub fn body_specs(&self) -> Vec<BodySpec> {
        self.bodies.iter().map(BodyConfig::to_spec).collect()
    }
}
