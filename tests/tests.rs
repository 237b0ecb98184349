use gravwell::simulation::barnes_hut::Octree;
use gravwell::simulation::integrator::circular_speed;
use gravwell::simulation::params::{COLLISION_DAMPING, G};
use gravwell::simulation::states::{radius_from, MAX_TRAIL_POINTS};
use gravwell::{
    BarnesHutGravity, Body, BodyError, BodyId, BodySpec, CollisionMode, CollisionResolver, CollisionType,
    ForceField, GridConfig, NVec3, PairwiseGravity, SimulationConfig, SimulationEngine, SpacetimeGrid,
};

const EARTH_MASS: f64 = 5.97219e23;
const ROCKY: f64 = 5515.0;

/// Active body, skipping the being-created state the engine would clear
pub fn body(id: u64, position: NVec3, velocity: NVec3, mass: f64) -> Body {
    let spec = BodySpec::new(format!("b{id}"), position, velocity, mass, ROCKY);
    let mut b = Body::new(BodyId(id), spec).expect("valid test body");
    b.being_created = false;
    b
}

/// Two bodies at rest separated along the x-axis
pub fn two_bodies(dist: f64, m1: f64, m2: f64) -> Vec<Body> {
    vec![
        body(0, NVec3::new(-dist / 2.0, 0.0, 0.0), NVec3::zeros(), m1),
        body(1, NVec3::new(dist / 2.0, 0.0, 0.0), NVec3::zeros(), m2),
    ]
}

/// Deterministic spread of `n` bodies with varied masses
pub fn cloud(n: usize) -> Vec<Body> {
    (0..n)
        .map(|i| {
            let f = i as f64;
            let p = NVec3::new((f * 0.37).sin() * 4000.0, (f * 0.13).cos() * 4000.0, (f * 0.71).sin() * 4000.0);
            body(i as u64, p, NVec3::zeros(), EARTH_MASS * (1.0 + (i % 5) as f64))
        })
        .collect()
}

/// Empty engine with the given parameters
pub fn engine_with(config: SimulationConfig) -> SimulationEngine {
    SimulationEngine::new(config, GridConfig::default())
}

fn accelerations(field: &dyn ForceField, bodies: &[Body]) -> Vec<NVec3> {
    let mut out = vec![NVec3::zeros(); bodies.len()];
    field.accelerations(bodies, G, &mut out);
    out
}

// ==================================================================================
// Body tests
// ==================================================================================

#[test]
fn radius_scales_with_cube_root_of_mass() {
    let r1 = radius_from(EARTH_MASS, ROCKY);
    let r8 = radius_from(8.0 * EARTH_MASS, ROCKY);

    assert!(((r8 / r1) - 2.0).abs() < 1e-12, "Radius ratio for 8x mass: {}", r8 / r1);

    let r2 = radius_from(2.0 * EARTH_MASS, ROCKY);
    assert!(r1 > 0.0, "Radius not positive");
    assert!(((r2 / r1) - 2f64.cbrt()).abs() < 1e-12, "Radius ratio for 2x mass: {}", r2 / r1);
}

#[test]
fn set_mass_recomputes_radius() {
    let mut engine = engine_with(SimulationConfig::default());
    let id = engine
        .add_body(BodySpec::new("x", NVec3::zeros(), NVec3::zeros(), EARTH_MASS, ROCKY))
        .expect("valid body");

    assert!(engine.set_body_mass(id, 27.0 * EARTH_MASS) == Ok(true), "Mass change refused");

    let expected = 3.0 * radius_from(EARTH_MASS, ROCKY);
    let radius = engine.body(id).map(Body::radius).unwrap_or(0.0);
    assert!((radius - expected).abs() < 1e-9 * expected, "Radius not updated: {radius}");

    assert!(engine.set_body_density(id, 8.0 * ROCKY) == Ok(true), "Density change refused");
    let radius = engine.body(id).map(Body::radius).unwrap_or(0.0);
    assert!((radius - 0.5 * expected).abs() < 1e-9 * expected, "Radius ignores density: {radius}");

    assert!(engine.set_body_mass(BodyId(999), 1.0) == Ok(false), "Unknown id accepted");
}

#[test]
fn invalid_bodies_are_rejected() {
    let zero_mass = BodySpec::new("zero", NVec3::zeros(), NVec3::zeros(), 0.0, ROCKY);
    let bad_density = BodySpec::new("neg", NVec3::zeros(), NVec3::zeros(), 1.0, -3.0);
    let nan_position = BodySpec::new("nan", NVec3::new(f64::NAN, 0.0, 0.0), NVec3::zeros(), 1.0, ROCKY);

    assert!(matches!(Body::new(BodyId(0), zero_mass), Err(BodyError::NonPositiveMass(_))));
    assert!(matches!(Body::new(BodyId(1), bad_density), Err(BodyError::NonPositiveDensity(_))));
    assert!(matches!(Body::new(BodyId(2), nan_position), Err(BodyError::NonFinite(_))));

    let mut engine = engine_with(SimulationConfig::default());
    let id = engine
        .add_body(BodySpec::new("x", NVec3::zeros(), NVec3::zeros(), 1.0, ROCKY))
        .expect("valid body");
    assert!(engine.set_body_mass(id, -1.0).is_err(), "Negative mass accepted");
    assert!(engine.set_body_density(id, 0.0).is_err(), "Zero density accepted");
    assert!(engine.body(id).map(Body::mass) == Some(1.0), "Failed change altered the mass");
}

#[test]
fn field_matches_pairwise_acceleration() {
    let bodies = two_bodies(1500.0, EARTH_MASS, 7.0 * EARTH_MASS);
    let acc = accelerations(&PairwiseGravity, &bodies);

    let field = bodies[1].gravitational_field(&bodies[0].position, G);
    assert!((field - acc[0]).norm() < 1e-12 * acc[0].norm(), "Field {:?} vs {:?}", field, acc[0]);

    let at_center = bodies[1].gravitational_field(&bodies[1].position, G);
    assert!(at_center.norm() == 0.0, "Field at the body's own center");
}

// ==================================================================================
// Gravity tests
// ==================================================================================

#[test]
fn gravity_newton_third_law() {
    let bodies = two_bodies(1000.0, 2.0 * EARTH_MASS, 3.0 * EARTH_MASS);
    let acc = accelerations(&PairwiseGravity, &bodies);

    let net = acc[0] * bodies[0].mass() + acc[1] * bodies[1].mass();
    let scale = acc[0].norm() * bodies[0].mass();

    assert!(net.norm() < 1e-12 * scale, "Net force not zero: {:?}", net);
}

#[test]
fn gravity_points_toward_other_body() {
    let bodies = two_bodies(2000.0, EARTH_MASS, EARTH_MASS);
    let acc = accelerations(&PairwiseGravity, &bodies);

    let dx = bodies[1].position - bodies[0].position;
    assert!(acc[0].dot(&dx) > 0.0, "Body 0 not attracted to body 1: {:?}", acc[0]);
    assert!(acc[1].dot(&dx) < 0.0, "Body 1 not attracted to body 0: {:?}", acc[1]);
}

#[test]
fn gravity_inverse_square_law() {
    let near = accelerations(&PairwiseGravity, &two_bodies(1000.0, EARTH_MASS, EARTH_MASS));
    let far = accelerations(&PairwiseGravity, &two_bodies(2000.0, EARTH_MASS, EARTH_MASS));

    let ratio = near[0].norm() / far[0].norm();
    assert!((ratio - 4.0).abs() < 1e-9, "Expected ratio 4, got {}", ratio);
}

#[test]
fn gravity_uses_meters() {
    // 1000 display units = 1e6 m
    let bodies = two_bodies(1000.0, 1.0, EARTH_MASS);
    let acc = accelerations(&PairwiseGravity, &bodies);

    let expected = G * EARTH_MASS / 1.0e12;
    assert!((acc[0].norm() - expected).abs() < 1e-9 * expected, "Acceleration {} vs {}", acc[0].norm(), expected);
}

#[test]
fn coincident_bodies_exert_nothing() {
    let bodies = two_bodies(0.0, EARTH_MASS, EARTH_MASS);
    let acc = accelerations(&PairwiseGravity, &bodies);

    assert!(acc.iter().all(|a| a.norm() == 0.0), "Coincident pair produced {:?}", acc);
}

#[test]
fn fixed_body_receives_no_acceleration() {
    let mut bodies = two_bodies(1000.0, EARTH_MASS, EARTH_MASS);
    bodies[0].fixed = true;
    let acc = accelerations(&PairwiseGravity, &bodies);

    assert!(acc[0].norm() == 0.0, "Fixed body accelerated: {:?}", acc[0]);
    assert!(acc[1].norm() > 0.0, "Fixed body exerted no pull");
}

#[test]
fn pending_and_destroyed_bodies_are_ignored() {
    let mut bodies = cloud(3);
    bodies[1].being_created = true;
    bodies[2].destroyed = true;
    let acc = accelerations(&PairwiseGravity, &bodies);

    assert!(acc.iter().all(|a| a.norm() == 0.0), "Inactive bodies took part: {:?}", acc);
}

#[test]
fn barnes_hut_theta_zero_matches_direct() {
    let bodies = cloud(64);
    let direct = accelerations(&PairwiseGravity, &bodies);
    let bh = accelerations(&BarnesHutGravity { theta: 0.0 }, &bodies);

    for (i, (d, b)) in direct.iter().zip(&bh).enumerate() {
        let err = (d - b).norm() / d.norm();
        assert!(err < 1e-9, "Body {i}: relative error {err}");
    }
}

#[test]
fn barnes_hut_approximation_is_close() {
    let bodies = cloud(200);
    let direct = accelerations(&PairwiseGravity, &bodies);
    let bh = accelerations(&BarnesHutGravity { theta: 0.5 }, &bodies);

    let err: f64 = direct.iter().zip(&bh).map(|(d, b)| (d - b).norm()).sum();
    let total: f64 = direct.iter().map(|d| d.norm()).sum();
    assert!(err / total < 0.02, "Barnes-Hut error too large: {}", err / total);
}

#[test]
fn octree_skips_inactive_bodies() {
    let mut bodies = cloud(4);
    for b in &mut bodies {
        b.destroyed = true;
    }
    assert!(Octree::build(&bodies).is_none(), "Tree built without active bodies");
}

// ==================================================================================
// Integration tests
// ==================================================================================

#[test]
fn momentum_conserved_without_collisions() {
    let mut engine = engine_with(SimulationConfig {
        enable_collisions: false,
        ..Default::default()
    });
    engine
        .add_body(BodySpec::new("a", NVec3::new(-2000.0, 0.0, 0.0), NVec3::new(0.0, 0.0, 40.0), 1.0e24, ROCKY))
        .expect("valid body");
    engine
        .add_body(BodySpec::new("b", NVec3::new(2000.0, 0.0, 0.0), NVec3::new(0.0, 0.0, -10.0), 4.0e24, ROCKY))
        .expect("valid body");

    let p0 = engine.total_momentum();
    let scale = engine.bodies()[0].momentum().norm();
    for _ in 0..200 {
        engine.tick(1.0 / 60.0);
    }
    let p1 = engine.total_momentum();

    assert!((p1 - p0).norm() < 1e-9 * scale, "Momentum drifted: {:?} -> {:?}", p0, p1);
}

#[test]
fn circular_orbit_stays_in_band() {
    let central = 1.989e25;
    let r = 5000.0;
    let mut engine = engine_with(SimulationConfig::default());
    engine
        .add_body(BodySpec::new("star", NVec3::zeros(), NVec3::zeros(), central, 1414.0).fixed())
        .expect("valid body");
    let planet = engine
        .add_body(BodySpec::new(
            "planet",
            NVec3::new(r, 0.0, 0.0),
            NVec3::new(0.0, 0.0, circular_speed(central, r, G)),
            1.0e20,
            ROCKY,
        ))
        .expect("valid body");

    for step in 0..1000 {
        engine.tick(1.0 / 60.0);
        let d = engine.body(planet).map(|b| b.position.norm()).unwrap_or(0.0);
        assert!(d > 0.9 * r && d < 1.1 * r, "Step {step}: radius {d} left the band");
    }

    let star = engine.bodies()[0].position;
    assert!(star.norm() == 0.0, "Fixed star moved to {:?}", star);
}

#[test]
fn energy_conserved_on_eccentric_orbit() {
    let central = 1.989e25;
    let r = 5000.0;
    let mut engine = engine_with(SimulationConfig::default());
    engine
        .add_body(BodySpec::new("star", NVec3::zeros(), NVec3::zeros(), central, 1414.0).fixed())
        .expect("valid body");
    engine
        .add_body(BodySpec::new(
            "planet",
            NVec3::new(r, 0.0, 0.0),
            NVec3::new(0.0, 0.0, 0.8 * circular_speed(central, r, G)),
            1.0e20,
            ROCKY,
        ))
        .expect("valid body");

    // bodies join on the first tick
    engine.tick(1.0 / 60.0);
    let e0 = engine.total_energy();
    assert!(e0 < 0.0, "Bound orbit with energy {e0}");

    let mut worst: f64 = 0.0;
    for _ in 0..2000 {
        engine.tick(1.0 / 60.0);
        worst = worst.max(((engine.total_energy() - e0) / e0).abs());
    }
    assert!(worst < 1e-2, "Energy drifted by {worst}");
}

#[test]
fn energy_of_two_bodies_at_rest() {
    let mut engine = engine_with(SimulationConfig {
        enable_collisions: false,
        is_paused: true,
        ..Default::default()
    });
    engine
        .add_body(BodySpec::new("a", NVec3::zeros(), NVec3::zeros(), EARTH_MASS, ROCKY))
        .expect("valid body");
    engine
        .add_body(BodySpec::new("b", NVec3::new(2000.0, 0.0, 0.0), NVec3::zeros(), EARTH_MASS, ROCKY))
        .expect("valid body");
    assert!(engine.total_energy() == 0.0, "Pending bodies counted");

    engine.finalize_pending();
    let expected = -G * EARTH_MASS * EARTH_MASS * 94.0 / (96.0 * 1.0e6 * 2000.0);
    let e = engine.total_energy();
    assert!((e - expected).abs() < 1e-12 * expected.abs(), "Energy {e} vs {expected}");
}

#[test]
fn time_scale_stretches_the_step() {
    let mut slow = engine_with(SimulationConfig {
        gravitational_constant: 0.0,
        ..Default::default()
    });
    let mut fast = engine_with(SimulationConfig {
        gravitational_constant: 0.0,
        time_scale: 2.0,
        ..Default::default()
    });
    for e in [&mut slow, &mut fast] {
        e.add_body(BodySpec::new("x", NVec3::zeros(), NVec3::new(94.0, 0.0, 0.0), 1.0, ROCKY))
            .expect("valid body");
        e.tick(1.0 / 60.0);
    }

    let xs = slow.bodies()[0].position.x;
    let xf = fast.bodies()[0].position.x;
    assert!((xs - 1.0).abs() < 1e-12, "Unit step moved {xs}");
    assert!((xf - 2.0).abs() < 1e-12, "Doubled step moved {xf}");
}

#[test]
fn trail_samples_on_interval() {
    let mut engine = engine_with(SimulationConfig {
        gravitational_constant: 0.0,
        ..Default::default()
    });
    let id = engine
        .add_body(BodySpec::new("x", NVec3::zeros(), NVec3::new(10.0, 0.0, 0.0), 1.0, ROCKY))
        .expect("valid body");

    engine.tick(0.04);
    engine.tick(0.04);
    assert!(engine.body(id).map(Body::trail_len) == Some(0), "Sampled before the interval");

    engine.tick(0.04);
    assert!(engine.body(id).map(Body::trail_len) == Some(1), "No sample after the interval");
}

#[test]
fn trail_is_capped() {
    let mut engine = engine_with(SimulationConfig {
        gravitational_constant: 0.0,
        ..Default::default()
    });
    let id = engine
        .add_body(BodySpec::new("x", NVec3::zeros(), NVec3::new(10.0, 0.0, 0.0), 1.0, ROCKY))
        .expect("valid body");

    for _ in 0..(MAX_TRAIL_POINTS + 100) {
        engine.tick(0.25);
    }

    let b = engine.body(id).expect("body present");
    assert!(b.trail_len() == MAX_TRAIL_POINTS, "Trail length {}", b.trail_len());
    let newest = b.trail().last().map(|t| t.position);
    assert!(newest == Some(b.position), "Newest sample is not the current position");
}

// ==================================================================================
// Collision tests
// ==================================================================================

#[test]
fn collision_detection_edge() {
    let a = body(0, NVec3::zeros(), NVec3::zeros(), EARTH_MASS);
    let r = 2.0 * a.radius();
    let eps = 1e-6 * r;

    let apart = body(1, NVec3::new(r + eps, 0.0, 0.0), NVec3::zeros(), EARTH_MASS);
    let touching = body(2, NVec3::new(r - eps, 0.0, 0.0), NVec3::zeros(), EARTH_MASS);

    let resolver = CollisionResolver::new(CollisionMode::SoftBounce);
    assert!(resolver.classify(&a, &apart) == CollisionType::None, "Separated pair classified as hit");
    assert!(resolver.classify(&a, &touching) == CollisionType::Inelastic, "Overlap missed");

    let merger = CollisionResolver::new(CollisionMode::Merge);
    assert!(merger.classify(&a, &touching) == CollisionType::Merge);
}

#[test]
fn soft_bounce_damps_both_bodies() {
    let mut engine = engine_with(SimulationConfig {
        gravitational_constant: 0.0,
        ..Default::default()
    });
    engine
        .add_body(BodySpec::new("a", NVec3::zeros(), NVec3::new(5.0, 0.0, 0.0), EARTH_MASS, ROCKY))
        .expect("valid body");
    engine
        .add_body(BodySpec::new("b", NVec3::new(1.0, 0.0, 0.0), NVec3::new(-5.0, 0.0, 0.0), EARTH_MASS, ROCKY))
        .expect("valid body");

    engine.tick(1.0 / 60.0);

    let v = [engine.bodies()[0].velocity.x, engine.bodies()[1].velocity.x];
    assert!((v[0] - 5.0 * COLLISION_DAMPING).abs() < 1e-12, "Body a velocity {}", v[0]);
    assert!((v[1] + 5.0 * COLLISION_DAMPING).abs() < 1e-12, "Body b velocity {}", v[1]);
    assert!(engine.body_count() == 2, "Soft bounce removed a body");
}

#[test]
fn merge_conserves_mass_and_momentum() {
    let mut engine = engine_with(SimulationConfig {
        gravitational_constant: 0.0,
        collision_mode: CollisionMode::Merge,
        ..Default::default()
    });
    let heavy = engine
        .add_body(BodySpec::new("heavy", NVec3::zeros(), NVec3::new(1.0, 0.0, 0.0), 3.0 * EARTH_MASS, ROCKY))
        .expect("valid body");
    let light = engine
        .add_body(BodySpec::new("light", NVec3::new(1.0, 0.0, 0.0), NVec3::new(0.0, 0.0, 8.0), EARTH_MASS, ROCKY))
        .expect("valid body");

    let mass0 = 4.0 * EARTH_MASS;
    let p0 = engine.total_momentum();
    let r0 = engine.body(heavy).map(Body::radius).unwrap_or(0.0);

    engine.tick(1.0 / 60.0);

    assert!(engine.body_count() == 1, "Absorbed body still present");
    assert!(engine.body(light).is_none(), "Lighter body survived");

    let survivor = engine.body(heavy).expect("heavier body survives");
    assert!((survivor.mass() - mass0).abs() < 1e-9 * mass0, "Mass {}", survivor.mass());
    assert!(survivor.radius() > r0, "Radius not recomputed");
    let p1 = engine.total_momentum();
    assert!((p1 - p0).norm() < 1e-9 * p0.norm(), "Momentum {:?} -> {:?}", p0, p1);
}

// ==================================================================================
// Grid tests
// ==================================================================================

#[test]
fn grid_vertex_count() {
    let grid = SpacetimeGrid::new(GridConfig {
        size: 1000.0,
        divisions: 10,
        height: 0.0,
    });
    assert!(grid.vertex_count() == 4 * 11 * 10, "Vertex count {}", grid.vertex_count());
}

#[test]
fn grid_stays_finite_with_body_on_a_vertex() {
    let mut engine = engine_with(SimulationConfig::default());
    let half = engine.grid().half_size();
    engine
        .add_body(BodySpec::new("corner", NVec3::new(-half, 0.0, -half), NVec3::zeros(), 1.989e25, 1414.0).fixed())
        .expect("valid body");

    engine.tick(1.0 / 60.0);

    assert!(engine.grid().heights().iter().all(|h| h.is_finite()), "Non-finite grid height");
    assert!(engine.grid_vertices().iter().flatten().all(|c| c.is_finite()));
}

#[test]
fn grid_vertex_height_follows_well_formula() {
    let mass = 1.989e25;
    let position = NVec3::new(1200.0, 3000.0, -700.0);
    let lifted = [body(0, position, NVec3::zeros(), mass)];

    let mut grid = SpacetimeGrid::new(GridConfig::default());
    grid.update(&lifted, G);

    let rs = lifted[0].schwarzschild_radius(G);
    for (v, h) in grid.vertices().zip(grid.heights()).step_by(97) {
        let rest = NVec3::new(v.x, 0.0, v.z);
        let d = (position - rest).norm() * 1000.0;
        let expected = 2.0 * 2.0 * (rs * (d - rs)).sqrt() - position.y.abs();
        assert!((h - expected).abs() < 1e-9 * expected.abs().max(1.0), "Vertex {:?}: {h} vs {expected}", v);
    }
}

#[test]
fn grid_is_flat_without_bodies() {
    let mut grid = SpacetimeGrid::new(GridConfig::default());
    grid.update(&[], G);

    assert!(grid.heights().iter().all(|h| *h == 0.0), "Empty grid deformed");
}

#[test]
fn heavier_body_deforms_more() {
    let light = [body(0, NVec3::zeros(), NVec3::zeros(), EARTH_MASS)];
    let heavy = [body(0, NVec3::zeros(), NVec3::zeros(), 100.0 * EARTH_MASS)];

    let mut a = SpacetimeGrid::new(GridConfig::default());
    let mut b = SpacetimeGrid::new(GridConfig::default());
    a.update(&light, G);
    b.update(&heavy, G);

    let sum_a: f64 = a.heights().iter().sum();
    let sum_b: f64 = b.heights().iter().sum();
    assert!(sum_b > sum_a, "Displacement {sum_b} not above {sum_a}");
}
