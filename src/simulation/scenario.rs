//! Named initial configurations
//!
//! Each preset produces the body specs plus a grid large enough to contain
//! the configuration. Moons and ring bodies are launched at the circular
//! speed of the integrator (see [`circular_speed`]) relative to their
//! parent, so they start on closed orbits.

use std::fmt;

use crate::simulation::grid::GridConfig;
use crate::simulation::integrator::circular_speed;
use crate::simulation::params::G;
use crate::simulation::states::{BodySpec, NVec3, Rgba};

const EARTH_MASS: f64 = 5.97219e23;
const SUN_MASS: f64 = 1.989e25;
const ROCKY_DENSITY: f64 = 5515.0;
const STAR_DENSITY: f64 = 1414.0;

const WHITE: Rgba = [1.0, 1.0, 1.0, 1.0];
const SUN_YELLOW: Rgba = [1.0, 0.929, 0.176, 1.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationPreset {
    Empty,
    SolarSystem,
    BinaryStars,
    GalaxyCollision,
}

impl fmt::Display for SimulationPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SimulationPreset::Empty => "empty",
            SimulationPreset::SolarSystem => "solar system",
            SimulationPreset::BinaryStars => "binary stars",
            SimulationPreset::GalaxyCollision => "galaxy collision",
        };
        f.write_str(name)
    }
}

/// Bodies and grid for one preset
#[derive(Debug, Clone)]
pub struct Preset {
    pub bodies: Vec<BodySpec>,
    pub grid: GridConfig,
}

impl Preset {
    pub fn build(preset: SimulationPreset) -> Self {
        match preset {
            SimulationPreset::Empty => Preset {
                bodies: Vec::new(),
                grid: GridConfig::default(),
            },
            SimulationPreset::SolarSystem => solar_system(),
            SimulationPreset::BinaryStars => binary_stars(),
            SimulationPreset::GalaxyCollision => galaxy_collision(),
        }
    }
}

/// Place a satellite at `offset` from `parent`, orbiting around `axis`
fn satellite(parent: &BodySpec, name: &str, offset: NVec3, axis: NVec3, mass: f64) -> BodySpec {
    let tangent = axis.cross(&offset).normalize();
    let speed = circular_speed(parent.mass, offset.norm(), G);
    BodySpec::new(name, parent.position + offset, parent.velocity + tangent * speed, mass, ROCKY_DENSITY)
        .with_color(WHITE)
}

/// Sun with four planet groups: Mars, Earth + Moon, Jupiter + 3 moons,
/// Neptune + 3 moons
fn solar_system() -> Preset {
    let up = NVec3::y();
    let moon_mass = EARTH_MASS * 1e-2;
    let giant_mass = EARTH_MASS * 10f64.sqrt();

    let sun = BodySpec::new("Sun", NVec3::zeros(), NVec3::zeros(), SUN_MASS, STAR_DENSITY)
        .with_color(SUN_YELLOW)
        .glowing();

    let mars = BodySpec::new("Mars", NVec3::new(-3000.0, 650.0, 0.0), NVec3::new(0.0, 0.0, 500.0), EARTH_MASS, ROCKY_DENSITY)
        .with_color([1.0, 0.25, 0.56, 1.0]);

    let earth = BodySpec::new("Earth", NVec3::new(5000.0, 650.0, 0.0), NVec3::new(0.0, 0.0, -500.0), EARTH_MASS, ROCKY_DENSITY)
        .with_color([0.0, 1.0, 1.0, 1.0]);
    let moon = satellite(&earth, "Moon", NVec3::new(250.0, 0.0, 0.0), up, moon_mass);

    let jupiter = BodySpec::new("Jupiter", NVec3::new(0.0, 500.0, 9000.0), NVec3::new(-500.0, 50.0, 0.0), giant_mass, ROCKY_DENSITY)
        .with_color([1.0, 0.5, 0.15, 1.0]);
    let io = satellite(&jupiter, "Io", NVec3::new(0.0, 0.0, 400.0), up, moon_mass);
    let europa = satellite(&jupiter, "Europa", NVec3::new(0.0, 0.0, -500.0), up, moon_mass);
    let ganymede = satellite(&jupiter, "Ganymede", NVec3::new(0.0, 0.0, 700.0), up, moon_mass);

    let neptune = BodySpec::new("Neptune", NVec3::new(0.0, -500.0, -10500.0), NVec3::new(-350.0, 50.0, 0.0), giant_mass, ROCKY_DENSITY)
        .with_color([0.35, 0.85, 0.99, 1.0]);
    let triton = satellite(&neptune, "Triton", NVec3::new(350.0, 0.0, 0.0), up, moon_mass);
    let nereid = satellite(&neptune, "Nereid", NVec3::new(-350.0, 0.0, 0.0), up, moon_mass);
    let proteus = satellite(&neptune, "Proteus", NVec3::new(0.0, 0.0, -550.0), up, moon_mass);

    Preset {
        bodies: vec![sun, mars, earth, moon, jupiter, io, europa, ganymede, neptune, triton, nereid, proteus],
        grid: GridConfig {
            size: 30000.0,
            divisions: 30,
            height: 0.0,
        },
    }
}

/// Two equal stars on a mutual circular orbit plus a circumbinary planet
fn binary_stars() -> Preset {
    let star_mass = 1.0e25;
    let separation = 3000.0;

    // each star circles the barycenter at half the separation
    let speed = circular_speed(star_mass, separation, G) * 0.5f64.sqrt();

    let a = BodySpec::new("Star A", NVec3::new(-0.5 * separation, 0.0, 0.0), NVec3::new(0.0, 0.0, speed), star_mass, STAR_DENSITY)
        .with_color([1.0, 0.6, 0.3, 1.0])
        .glowing();
    let b = BodySpec::new("Star B", NVec3::new(0.5 * separation, 0.0, 0.0), NVec3::new(0.0, 0.0, -speed), star_mass, STAR_DENSITY)
        .with_color([0.5, 0.7, 1.0, 1.0])
        .glowing();

    let planet_distance = 7000.0;
    let planet_speed = circular_speed(2.0 * star_mass, planet_distance, G);
    let planet = BodySpec::new("Planet", NVec3::new(planet_distance, 0.0, 0.0), NVec3::new(0.0, 0.0, -planet_speed), EARTH_MASS, ROCKY_DENSITY)
        .with_color([0.3, 1.0, 0.5, 1.0]);

    Preset {
        bodies: vec![a, b, planet],
        grid: GridConfig {
            size: 20000.0,
            divisions: 25,
            height: 0.0,
        },
    }
}

/// Two cores with rings of light bodies, heading towards each other
fn galaxy_collision() -> Preset {
    let core_mass = 5.0e24;
    let star_mass = 1.0e21;
    let rings = [800.0, 1300.0, 1800.0];
    let per_ring = 8;

    let galaxies = [
        ("Alpha", NVec3::new(-6000.0, 0.0, -1500.0), NVec3::new(120.0, 0.0, 0.0), NVec3::y(), [0.6, 0.8, 1.0, 1.0]),
        ("Beta", NVec3::new(6000.0, 400.0, 1500.0), NVec3::new(-120.0, 0.0, 0.0), NVec3::new(0.0, 1.0, 0.4).normalize(), [1.0, 0.7, 0.6, 1.0]),
    ];

    let mut bodies = Vec::new();
    for (name, position, velocity, axis, color) in galaxies {
        let core = BodySpec::new(format!("{name} core"), position, velocity, core_mass, STAR_DENSITY)
            .with_color(SUN_YELLOW)
            .glowing()
            .without_trail();

        // any vector off the axis gives a basis for the ring plane
        let u = axis.cross(&NVec3::x()).normalize();
        let w = axis.cross(&u);

        for (ring_idx, radius) in rings.iter().enumerate() {
            for k in 0..per_ring {
                let phase = ring_idx as f64 * 0.5;
                let angle = phase + k as f64 * std::f64::consts::TAU / per_ring as f64;
                let offset = (u * angle.cos() + w * angle.sin()) * *radius;
                let star_name = format!("{name} {}-{}", ring_idx + 1, k + 1);
                let star = satellite(&core, &star_name, offset, axis, star_mass).with_color(color);
                bodies.push(star);
            }
        }
        bodies.push(core);
    }

    Preset {
        bodies,
        grid: GridConfig {
            size: 30000.0,
            divisions: 30,
            height: 0.0,
        },
    }
}
