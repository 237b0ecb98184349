pub mod states;
pub mod params;
pub mod engine;
pub mod forces;
pub mod collisions;
pub mod integrator;
pub mod grid;
pub mod scenario;
pub mod barnes_hut;
