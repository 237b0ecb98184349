pub mod simulation;
pub mod configuration;
#[cfg(feature = "viewer")]
pub mod visualization;
pub mod benchmark;

pub use simulation::states::{Body, BodyError, BodyId, BodySpec, NVec3, TrailPoint};
pub use simulation::params::SimulationConfig;
pub use simulation::engine::{RenderResources, SimulationEngine};
pub use simulation::forces::{BarnesHutGravity, ForceField, ForceModel, PairwiseGravity};
pub use simulation::collisions::{CollisionMode, CollisionResolver, CollisionType};
pub use simulation::grid::{GridConfig, SpacetimeGrid};
pub use simulation::scenario::{Preset, SimulationPreset};

pub use configuration::config::{BodyConfig, ScenarioConfig, ScenarioError};

#[cfg(feature = "viewer")]
pub use visualization::vis3d::run_3d;

pub use benchmark::benchmark::{bench_gravity, bench_tick};
