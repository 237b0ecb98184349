//! Stylized "gravity well" grid
//!
//! A horizontal lattice of line segments whose vertices are pushed
//! vertically according to the masses around them. The displacement per
//! body is `2 * sqrt(rs * (d - rs))` (doubled again on accumulation), with
//! `rs = 2GM / c^2` and `d` the vertex-to-body distance in meters. This is a
//! visual proxy only, not a solved metric.

use serde::{Deserialize, Serialize};

use crate::simulation::params::UNIT_SCALE;
use crate::simulation::states::{Body, NVec3};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub size: f64,        // edge length of the square lattice, display units
    pub divisions: usize, // cells per edge
    pub height: f64,      // rest height of the plane
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: 20000.0,
            divisions: 25,
            height: 0.0,
        }
    }
}

/// Line-list lattice with per-vertex vertical displacement
#[derive(Debug, Clone)]
pub struct SpacetimeGrid {
    config: GridConfig,
    rest: Vec<NVec3>,  // immutable lattice positions, consecutive pairs form segments
    heights: Vec<f64>, // current displaced height per vertex
    max_rest_height: f64,
}

impl SpacetimeGrid {
    pub fn new(config: GridConfig) -> Self {
        let rest = lattice(&config);
        let max_rest_height = rest
            .iter()
            .map(|v| v.y)
            .fold(f64::NEG_INFINITY, f64::max);
        let max_rest_height = if max_rest_height.is_finite() { max_rest_height } else { config.height };
        let heights = rest.iter().map(|v| v.y).collect();

        Self {
            config,
            rest,
            heights,
            max_rest_height,
        }
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn vertex_count(&self) -> usize {
        self.rest.len()
    }

    pub fn half_size(&self) -> f64 {
        0.5 * self.config.size
    }

    /// Recompute every vertex height from the current bodies.
    ///
    /// Bodies being created or destroyed are ignored. After accumulation the
    /// whole sheet is lowered by `|com_y - max_rest_height|` so the wells sit
    /// near the system's center of mass.
    pub fn update(&mut self, bodies: &[Body], g: f64) {
        let sources: Vec<(NVec3, f64)> = bodies
            .iter()
            .filter(|b| b.is_active())
            .map(|b| (b.position, b.schwarzschild_radius(g)))
            .collect();

        let vertical_shift = center_of_mass_height(bodies) - self.max_rest_height;

        for (v, h) in self.rest.iter().zip(self.heights.iter_mut()) {
            let mut displacement = 0.0;
            for (position, rs) in &sources {
                displacement += 2.0 * well_depth(v, position, *rs);
            }
            *h = displacement - vertical_shift.abs();
        }
    }

    /// Displaced vertices, pairs form line segments
    pub fn vertices(&self) -> impl Iterator<Item = NVec3> + '_ {
        self.rest
            .iter()
            .zip(&self.heights)
            .map(|(v, h)| NVec3::new(v.x, *h, v.z))
    }

    /// Displaced vertices as `f32` triples for a vertex buffer
    pub fn flat_vertices(&self) -> Vec<[f32; 3]> {
        self.vertices()
            .map(|v| [v.x as f32, v.y as f32, v.z as f32])
            .collect()
    }

    pub fn heights(&self) -> &[f64] {
        &self.heights
    }

    /// Inside the cube spanned by the lattice, centered on the rest plane
    pub fn contains(&self, p: &NVec3) -> bool {
        let half = self.half_size();
        p.x.abs() <= half && p.z.abs() <= half && (p.y - self.config.height).abs() <= half
    }
}

/// One body's contribution `2 * sqrt(rs * (d - rs))`, zero inside `rs` or
/// when the result is not finite
fn well_depth(vertex: &NVec3, position: &NVec3, rs: f64) -> f64 {
    let distance = (position - vertex).norm() * UNIT_SCALE;
    let depth = 2.0 * (rs * (distance - rs).max(0.0)).sqrt();
    if depth.is_finite() { depth } else { 0.0 }
}

/// Mass-weighted mean height of the active bodies, zero without mass
pub fn center_of_mass_height(bodies: &[Body]) -> f64 {
    let (weighted, total) = bodies
        .iter()
        .filter(|b| b.is_active())
        .fold((0.0, 0.0), |(w, t), b| (w + b.mass() * b.position.y, t + b.mass()));
    if total > 0.0 { weighted / total } else { 0.0 }
}

/// Segments along x for every z row, then along z for every x column
fn lattice(config: &GridConfig) -> Vec<NVec3> {
    let divisions = config.divisions.max(1);
    let step = config.size / divisions as f64;
    let half = config.size / 2.0;
    let y = config.height;

    let mut vertices = Vec::with_capacity(4 * (divisions + 1) * divisions);

    for row in 0..=divisions {
        let z = -half + row as f64 * step;
        for col in 0..divisions {
            let x_start = -half + col as f64 * step;
            vertices.push(NVec3::new(x_start, y, z));
            vertices.push(NVec3::new(x_start + step, y, z));
        }
    }

    for col in 0..=divisions {
        let x = -half + col as f64 * step;
        for row in 0..divisions {
            let z_start = -half + row as f64 * step;
            vertices.push(NVec3::new(x, y, z_start));
            vertices.push(NVec3::new(x, y, z_start + step));
        }
    }

    vertices
}
