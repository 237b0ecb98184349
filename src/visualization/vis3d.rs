use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bevy::math::primitives::Sphere;
use bevy::prelude::*;
use tracing::info;

use crate::simulation::collisions::CollisionMode;
use crate::simulation::engine::{RenderResources, SimulationEngine};
use crate::simulation::scenario::SimulationPreset;
use crate::simulation::states::{BodyId, NVec3, Rgba};

/// Simulation display units → Bevy world units
const VIEW_SCALE: f32 = 0.01;

/// Smallest sphere drawn, in world units
const MIN_VIEW_RADIUS: f32 = 0.5;

const CAMERA_HEIGHT: f32 = 220.0;
const CAMERA_DISTANCE: f32 = 300.0;

const MIN_TIME_SCALE: f64 = 1.0 / 64.0;
const MAX_TIME_SCALE: f64 = 64.0;

/// Sphere entity for one body
#[derive(Component)]
struct BodyTag(BodyId);

#[derive(Resource)]
struct EngineResource(SimulationEngine);

enum MeshRequest {
    Build(BodyId, f64),
    Release(BodyId),
}

/// Engine-side handle: records mesh requests for the ECS to carry out
#[derive(Clone, Default)]
struct MeshQueue(Arc<Mutex<Vec<MeshRequest>>>);

impl MeshQueue {
    fn push(&self, request: MeshRequest) {
        if let Ok(mut queue) = self.0.lock() {
            queue.push(request);
        }
    }

    fn drain(&self) -> Vec<MeshRequest> {
        match self.0.lock() {
            Ok(mut queue) => std::mem::take(&mut *queue),
            Err(_) => Vec::new(),
        }
    }
}

impl RenderResources for MeshQueue {
    fn build_mesh(&mut self, id: BodyId, radius: f64) {
        self.push(MeshRequest::Build(id, radius));
    }

    fn release(&mut self, id: BodyId) {
        self.push(MeshRequest::Release(id));
    }
}

/// ECS-side handle to the same queue
#[derive(Resource)]
struct PendingMeshes(MeshQueue);

/// Open a window and run `engine` until it is closed
pub fn run_3d(mut engine: SimulationEngine) {
    info!(bodies = engine.body_count(), "starting 3D viewer");

    let queue = MeshQueue::default();
    engine.attach_renderer(Box::new(queue.clone()));

    App::new()
        .insert_resource(EngineResource(engine))
        .insert_resource(PendingMeshes(queue))
        .insert_resource(AmbientLight {
            color: Color::WHITE,
            brightness: 150.0,
        })
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "gravwell".into(),
                ..Default::default()
            }),
            ..Default::default()
        }))
        .add_systems(Startup, setup_3d)
        .add_systems(
            Update,
            (
                keyboard_controls,
                physics_step_3d,
                apply_mesh_requests,
                sync_transforms_3d,
                draw_grid,
                draw_trails,
            )
                .chain(),
        )
        .run();
}

fn to_view(p: &NVec3) -> Vec3 {
    Vec3::new(p.x as f32, p.y as f32, p.z as f32) * VIEW_SCALE
}

fn to_color(c: Rgba) -> Color {
    Color::srgba(c[0], c[1], c[2], c[3])
}

/// Startup system: camera and a light at the origin
fn setup_3d(mut commands: Commands) {
    commands.spawn(Camera3dBundle {
        camera: Camera {
            clear_color: ClearColorConfig::Custom(Color::srgb(0.0, 0.0, 0.0)),
            ..Default::default()
        },
        transform: Transform::from_xyz(0.0, CAMERA_HEIGHT, CAMERA_DISTANCE).looking_at(Vec3::ZERO, Vec3::Y),
        ..Default::default()
    });

    commands.spawn(PointLightBundle {
        point_light: PointLight {
            intensity: 1.0e9,
            range: 2000.0,
            shadows_enabled: false,
            ..Default::default()
        },
        transform: Transform::from_xyz(0.0, 0.0, 0.0),
        ..Default::default()
    });
}

fn physics_step_3d(mut engine: ResMut<EngineResource>, time: Res<Time>) {
    engine.0.tick(time.delta_seconds() as f64);
}

/// Spawn or despawn spheres for the requests the engine queued this frame
fn apply_mesh_requests(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    pending: Res<PendingMeshes>,
    engine: Res<EngineResource>,
    spheres: Query<(Entity, &BodyTag)>,
) {
    let requests = pending.0.drain();
    if requests.is_empty() {
        return;
    }

    // last request per body wins
    let mut latest: HashMap<BodyId, Option<f64>> = HashMap::new();
    for request in requests {
        match request {
            MeshRequest::Build(id, radius) => latest.insert(id, Some(radius)),
            MeshRequest::Release(id) => latest.insert(id, None),
        };
    }

    for (entity, BodyTag(id)) in &spheres {
        if latest.contains_key(id) {
            commands.entity(entity).despawn();
        }
    }

    for (id, radius) in latest {
        let (Some(radius), Some(body)) = (radius, engine.0.body(id)) else {
            continue;
        };
        let view_radius = (radius as f32 * VIEW_SCALE).max(MIN_VIEW_RADIUS);

        commands.spawn((
            PbrBundle {
                mesh: meshes.add(Sphere::new(view_radius).mesh()),
                material: materials.add(StandardMaterial {
                    base_color: to_color(body.color),
                    unlit: body.glowing,
                    ..Default::default()
                }),
                transform: Transform::from_translation(to_view(&body.position)),
                ..Default::default()
            },
            BodyTag(id),
        ));
    }
}

fn sync_transforms_3d(engine: Res<EngineResource>, mut query: Query<(&BodyTag, &mut Transform)>) {
    let positions: HashMap<BodyId, Vec3> = engine
        .0
        .bodies()
        .iter()
        .map(|b| (b.id(), to_view(&b.position)))
        .collect();

    for (BodyTag(id), mut transform) in &mut query {
        if let Some(p) = positions.get(id) {
            transform.translation = *p;
        }
    }
}

fn draw_grid(engine: Res<EngineResource>, mut gizmos: Gizmos) {
    let color = Color::srgba(0.5, 0.5, 0.5, 0.35);
    let vertices: Vec<Vec3> = engine.0.grid().vertices().map(|v| to_view(&v)).collect();

    for segment in vertices.chunks_exact(2) {
        gizmos.line(segment[0], segment[1], color);
    }
}

fn draw_trails(engine: Res<EngineResource>, mut gizmos: Gizmos) {
    for b in engine.0.bodies().iter().filter(|b| b.show_trail && b.trail_len() > 1) {
        let [r, g, bl, _] = b.color;
        gizmos.linestrip(b.trail().map(|t| to_view(&t.position)), Color::srgba(r, g, bl, 0.5));
    }
}

// =========================================================================================
// Keyboard
// =========================================================================================

fn keyboard_controls(keys: Res<ButtonInput<KeyCode>>, mut engine: ResMut<EngineResource>) {
    let engine = &mut engine.0;

    if keys.just_pressed(KeyCode::KeyP) {
        engine.config.is_paused = !engine.config.is_paused;
        info!(paused = engine.config.is_paused, "pause toggled");
    }

    if keys.just_pressed(KeyCode::KeyC) {
        engine.config.enable_collisions = !engine.config.enable_collisions;
        info!(enabled = engine.config.enable_collisions, "collisions toggled");
    }

    if keys.just_pressed(KeyCode::KeyM) {
        engine.config.collision_mode = match engine.config.collision_mode {
            CollisionMode::SoftBounce => CollisionMode::Merge,
            CollisionMode::Merge => CollisionMode::SoftBounce,
        };
        info!(mode = ?engine.config.collision_mode, "collision mode changed");
    }

    let presets = [
        (KeyCode::Digit1, SimulationPreset::SolarSystem),
        (KeyCode::Digit2, SimulationPreset::BinaryStars),
        (KeyCode::Digit3, SimulationPreset::GalaxyCollision),
    ];
    for (key, preset) in presets {
        if keys.just_pressed(key) {
            engine.load_preset(preset);
        }
    }

    if keys.just_pressed(KeyCode::Backspace) {
        engine.clear_bodies();
    }

    if keys.just_pressed(KeyCode::ArrowUp) {
        engine.config.time_scale = (engine.config.time_scale * 2.0).min(MAX_TIME_SCALE);
        info!(time_scale = engine.config.time_scale, "time scale");
    }
    if keys.just_pressed(KeyCode::ArrowDown) {
        engine.config.time_scale = (engine.config.time_scale * 0.5).max(MIN_TIME_SCALE);
        info!(time_scale = engine.config.time_scale, "time scale");
    }
}
