//! Simulation engine: owns the bodies and the grid and drives each tick
//!
//! A tick runs, in order:
//! 1. nothing at all while paused,
//! 2. mesh generation for bodies still being created,
//! 3. force accumulation ([`ForceField`](crate::simulation::forces::ForceField)),
//! 4. collision detection and response,
//! 5. integration and trail sampling,
//! 6. grid deformation.
//!
//! Bodies are addressed from the outside by [`BodyId`] only; indices into
//! the collection shift whenever a body is removed.

use std::path::Path;

use tracing::{debug, info, trace, warn};

use crate::configuration::config::{BodyConfig, ScenarioConfig, ScenarioError};
use crate::simulation::collisions::CollisionResolver;
use crate::simulation::forces;
use crate::simulation::grid::{GridConfig, SpacetimeGrid};
use crate::simulation::integrator;
use crate::simulation::params::{SimulationConfig, ACCELERATION_DAMPING, MIN_SEPARATION, TIME_SCALE, UNIT_SCALE};
use crate::simulation::scenario::{Preset, SimulationPreset};
use crate::simulation::states::{Body, BodyError, BodyId, BodySpec, NVec3};

/// Per-body render resources, owned by the renderer and keyed by id
///
/// The engine tells the renderer when a body needs a (new) mesh and when
/// it is gone; it never holds graphics handles itself.
pub trait RenderResources {
    fn build_mesh(&mut self, id: BodyId, radius: f64);
    fn release(&mut self, id: BodyId);
}

type Renderer = Box<dyn RenderResources + Send + Sync>;

pub struct SimulationEngine {
    pub config: SimulationConfig,
    bodies: Vec<Body>,
    grid: SpacetimeGrid,
    next_id: u64,
    ticks: u64,
    renderer: Option<Renderer>,
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::new(SimulationConfig::default(), GridConfig::default())
    }
}

impl SimulationEngine {
    pub fn new(config: SimulationConfig, grid: GridConfig) -> Self {
        Self {
            config,
            bodies: Vec::new(),
            grid: SpacetimeGrid::new(grid),
            next_id: 0,
            ticks: 0,
            renderer: None,
        }
    }

    /// Engine with default settings, loaded with `preset`
    pub fn with_preset(preset: SimulationPreset) -> Self {
        let mut engine = Self::default();
        engine.load_preset(preset);
        engine
    }

    pub fn attach_renderer(&mut self, mut renderer: Renderer) {
        for b in self.bodies.iter().filter(|b| !b.being_created) {
            renderer.build_mesh(b.id(), b.radius());
        }
        self.renderer = Some(renderer);
    }

    pub fn detach_renderer(&mut self) -> Option<Renderer> {
        self.renderer.take()
    }

    // queries ==============================================================================

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id() == id)
    }

    /// Mutable access for position, velocity and visual flags. Mass and
    /// density go through [`set_body_mass`](Self::set_body_mass) and
    /// [`set_body_density`](Self::set_body_density) so the mesh follows the radius.
    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.iter_mut().find(|b| b.id() == id)
    }

    pub fn grid(&self) -> &SpacetimeGrid {
        &self.grid
    }

    /// Displaced grid vertices for the renderer's vertex buffer
    pub fn grid_vertices(&self) -> Vec<[f32; 3]> {
        self.grid.flat_vertices()
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Bodies whose center lies within `radius` of `center`, boundary included
    pub fn bodies_in_radius(&self, center: &NVec3, radius: f64) -> Vec<&Body> {
        self.bodies
            .iter()
            .filter(|b| !b.destroyed && (b.position - center).norm() <= radius)
            .collect()
    }

    /// Mass-weighted mean position of the active bodies, origin if there are none
    pub fn center_of_mass(&self) -> NVec3 {
        let mut total = 0.0;
        let mut com = NVec3::zeros();
        for b in self.bodies.iter().filter(|b| b.is_active()) {
            total += b.mass();
            com += b.position * b.mass();
        }
        if total > 0.0 { com / total } else { NVec3::zeros() }
    }

    pub fn total_momentum(&self) -> NVec3 {
        self.bodies
            .iter()
            .filter(|b| b.is_active())
            .map(Body::momentum)
            .sum()
    }

    /// Kinetic plus pairwise gravitational potential energy of the active bodies
    ///
    /// Both terms are in the integrator's own units: `½·m·|v|²` with display
    /// velocities, and `-G·mi·mj·TIME_SCALE / (ACCELERATION_DAMPING·UNIT_SCALE²·r)`
    /// with display separations. This is the quantity the kick/drift step
    /// conserves, so changes over a run measure integration error.
    pub fn total_energy(&self) -> f64 {
        let active: Vec<&Body> = self.bodies.iter().filter(|b| b.is_active()).collect();
        let g = self.config.gravitational_constant * TIME_SCALE / (ACCELERATION_DAMPING * UNIT_SCALE * UNIT_SCALE);

        let kinetic: f64 = active.iter().map(|b| b.kinetic_energy()).sum();

        let mut potential = 0.0;
        for (i, bi) in active.iter().enumerate() {
            for bj in &active[i + 1..] {
                let r = (bj.position - bi.position).norm();
                if r < MIN_SEPARATION {
                    continue;
                }
                potential -= g * bi.mass() * bj.mass() / r;
            }
        }

        kinetic + potential
    }

    // mutation =============================================================================

    /// Validate and append a body; it joins the physics on the next tick
    pub fn add_body(&mut self, spec: BodySpec) -> Result<BodyId, BodyError> {
        let id = BodyId(self.next_id);
        let name = spec.name.clone();
        let body = Body::new(id, spec).inspect_err(|e| warn!(%name, error = %e, "rejected body"))?;

        self.next_id += 1;
        self.bodies.push(body);
        debug!(%id, %name, "body added");
        Ok(id)
    }

    /// Remove a body; its id is never handed out again. `false` if unknown.
    pub fn remove_body(&mut self, id: BodyId) -> bool {
        let Some(idx) = self.bodies.iter().position(|b| b.id() == id) else {
            return false;
        };
        let body = self.bodies.remove(idx);
        if let Some(r) = self.renderer.as_mut() {
            r.release(id);
        }
        self.grid.update(&self.bodies, self.config.gravitational_constant);
        debug!(%id, name = %body.name, "body removed");
        true
    }

    /// Change a body's mass; the radius and mesh follow. `Ok(false)` if the id is unknown.
    pub fn set_body_mass(&mut self, id: BodyId, mass: f64) -> Result<bool, BodyError> {
        self.reshape(id, |b| b.set_mass(mass))
    }

    /// Change a body's density; the radius and mesh follow. `Ok(false)` if the id is unknown.
    pub fn set_body_density(&mut self, id: BodyId, density: f64) -> Result<bool, BodyError> {
        self.reshape(id, |b| b.set_density(density))
    }

    fn reshape(&mut self, id: BodyId, edit: impl FnOnce(&mut Body) -> Result<(), BodyError>) -> Result<bool, BodyError> {
        let Some(body) = self.bodies.iter_mut().find(|b| b.id() == id) else {
            return Ok(false);
        };
        edit(body)?;

        // pending bodies get their mesh when they are finalized
        if !body.being_created {
            if let Some(r) = self.renderer.as_mut() {
                r.build_mesh(id, body.radius());
            }
        }
        debug!(%id, mass = body.mass(), radius = body.radius(), "body reshaped");
        Ok(true)
    }

    pub fn clear_bodies(&mut self) {
        if let Some(r) = self.renderer.as_mut() {
            for b in &self.bodies {
                r.release(b.id());
            }
        }
        self.bodies.clear();
        self.grid.update(&self.bodies, self.config.gravitational_constant);
        debug!("bodies cleared");
    }

    /// Generate meshes for bodies in the being-created state and let them
    /// join the physics
    pub fn finalize_pending(&mut self) {
        for b in self.bodies.iter_mut().filter(|b| b.being_created && !b.destroyed) {
            b.being_created = false;
            if let Some(r) = self.renderer.as_mut() {
                r.build_mesh(b.id(), b.radius());
            }
        }
    }

    /// Replace the whole collection with a named configuration
    pub fn load_preset(&mut self, preset: SimulationPreset) {
        let Preset { bodies, grid } = Preset::build(preset);
        // preset specs are constructed valid
        if let Err(e) = self.replace_bodies(bodies, grid) {
            warn!(%preset, error = %e, "preset failed to load");
            return;
        }
        info!(%preset, bodies = self.bodies.len(), "preset loaded");
    }

    /// Replace the collection and parameters with a parsed scenario.
    ///
    /// Every record is validated first; on error the engine is unchanged.
    pub fn load_custom_preset(&mut self, scenario: &ScenarioConfig) -> Result<(), ScenarioError> {
        self.replace_bodies(scenario.body_specs(), scenario.grid.clone())?;

        let paused = self.config.is_paused;
        self.config = scenario.parameters.clone();
        self.config.is_paused = paused;

        info!(bodies = self.bodies.len(), "custom scenario loaded");
        Ok(())
    }

    /// Current parameters, grid and live bodies as a save record
    pub fn snapshot(&self) -> ScenarioConfig {
        ScenarioConfig {
            parameters: self.config.clone(),
            grid: self.grid.config().clone(),
            bodies: self
                .bodies
                .iter()
                .filter(|b| !b.destroyed)
                .map(BodyConfig::from)
                .collect(),
        }
    }

    pub fn save_state(&self, path: impl AsRef<Path>) -> Result<(), ScenarioError> {
        let path = path.as_ref();
        self.snapshot().save(path)?;
        info!(path = %path.display(), bodies = self.bodies.len(), "state saved");
        Ok(())
    }

    pub fn load_state(&mut self, path: impl AsRef<Path>) -> Result<(), ScenarioError> {
        let scenario = ScenarioConfig::load(path)?;
        self.load_custom_preset(&scenario)
    }

    /// Validate all specs, then swap them in and rebuild the grid.
    fn replace_bodies(&mut self, specs: Vec<BodySpec>, grid: GridConfig) -> Result<(), ScenarioError> {
        let mut fresh = Vec::with_capacity(specs.len());
        for (index, spec) in specs.into_iter().enumerate() {
            let name = spec.name.clone();
            let id = BodyId(self.next_id + index as u64);
            let body = Body::new(id, spec).map_err(|source| ScenarioError::InvalidBody { index, name, source })?;
            fresh.push(body);
        }

        self.clear_bodies();
        self.next_id += fresh.len() as u64;
        self.bodies = fresh;
        self.finalize_pending();

        self.grid = SpacetimeGrid::new(grid);
        self.grid.update(&self.bodies, self.config.gravitational_constant);
        Ok(())
    }

    // tick =================================================================================

    /// Advance the simulation by one step. No-op while paused.
    ///
    /// `delta_time` is the wall time since the last frame in seconds; it
    /// only drives trail sampling.
    pub fn tick(&mut self, delta_time: f64) {
        if self.config.is_paused {
            return;
        }

        self.finalize_pending();

        // Split &mut self into disjoint field borrows
        let SimulationEngine {
            config,
            bodies,
            grid,
            renderer,
            ..
        } = self;
        let g = config.gravitational_constant;

        let field = config.force_model.field();
        forces::apply(field.as_ref(), bodies, g);

        if config.enable_collisions {
            let report = CollisionResolver::new(config.collision_mode).resolve(bodies);
            if report.bounces > 0 {
                trace!(bounces = report.bounces, "soft collisions");
            }
            if !report.merges.is_empty() {
                bodies.retain(|b| !b.destroyed);
                if let Some(r) = renderer.as_mut() {
                    for (survivor, absorbed) in &report.merges {
                        r.release(*absorbed);
                        if let Some(b) = bodies.iter().find(|b| b.id() == *survivor) {
                            r.build_mesh(*survivor, b.radius());
                        }
                    }
                }
            }
        }

        integrator::symplectic_euler(bodies, config.time_scale, delta_time);

        grid.update(bodies, g);

        self.ticks += 1;
        trace!(tick = self.ticks, bodies = self.bodies.len(), "tick complete");
    }
}
