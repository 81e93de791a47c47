pub mod asset;
pub mod renderer;
pub mod scene;
pub mod settings;
pub mod time;

use asset::MeshData;
use glam::{Quat, Vec2, Vec3};
use scene::{
    CullingPolicy, FrameInput, InteractivePanel, MoveFlags, Picker, Scene, SceneError, Transform,
};
use settings::SceneSettings;
use std::time::Duration;
use time::{FrameClock, Instant};

const DEMO_FRAMES: usize = 120;
const DEMO_DELTA: f32 = 1.0 / 60.0;

pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}

fn build_demo_scene(settings: &SceneSettings) -> Result<(Scene, InteractivePanel), SceneError> {
    let mut scene = Scene::with_settings(settings);
    scene.camera_mut().resize(1280.0, 720.0);
    scene.camera_mut().translation = Vec3::new(0.0, 1.5, 6.0);
    scene.camera_mut().update(true);

    let cube = scene.add_mesh(MeshData::cube());
    let plane = scene.add_mesh(MeshData::plane());

    let table = scene
        .spawn()
        .with_name("table")
        .with_transform(Transform::from_translation(Vec3::new(0.0, 0.5, 0.0)))
        .spawn()?;
    scene
        .spawn()
        .with_name("box")
        .with_mesh(cube)
        .with_transform(
            Transform::from_translation(Vec3::new(-2.0, 0.5, 0.0)).with_scale(Vec3::splat(0.5)),
        )
        .pickable(CullingPolicy::FrontOnly)
        .child_of(table)
        .spawn()?;

    let panel = scene
        .spawn()
        .with_name("panel")
        .with_mesh(plane)
        .with_transform(
            Transform::from_translation(Vec3::new(0.0, 1.5, 0.0))
                .with_rotation(Quat::from_rotation_x(std::f32::consts::FRAC_PI_2))
                .with_scale(Vec3::new(1.6, 1.0, 0.9)),
        )
        .pickable(CullingPolicy::None)
        .spawn()?;

    Ok((scene, InteractivePanel::new(panel, 1600.0, 900.0)))
}

/// Headless frame loop: walks the camera toward the panel and reports what
/// the center of the screen points at.
pub fn run() -> Result<(), SceneError> {
    init_logging();

    log::info!("Starting xr-scene headless demo");

    let settings = SceneSettings::load();
    let (mut scene, panel) = build_demo_scene(&settings)?;
    let picker = Picker::default();
    let mut clock = FrameClock::new();
    let start = Instant::now();

    for frame in 0..DEMO_FRAMES {
        let delta_time = clock.tick_at(start + Duration::from_secs_f32(frame as f32 * DEMO_DELTA));
        let input = FrameInput {
            move_flags: if frame < DEMO_FRAMES / 2 {
                MoveFlags::FORWARD
            } else {
                MoveFlags::empty()
            },
            look_delta: Vec2::ZERO,
            delta_time,
        };
        scene.update(&input);
    }

    let camera = scene.camera();
    log::info!(
        "Camera settled at {:?} after {:.2}s",
        camera.translation,
        clock.elapsed()
    );

    let center = camera.viewport() * 0.5;
    match picker.pick_screen(&scene, center.x, center.y) {
        Some(result) => log::info!(
            "Screen center hits {:?} ({:?}) at distance {:.3}",
            scene.name(result.entity),
            result.hit.position,
            result.hit.distance
        ),
        None => log::info!("Screen center hits nothing"),
    }

    if let Some(point) = panel.surface_point_from_screen(&scene, &picker, center.x, center.y) {
        log::info!("Panel pixel under screen center: {:?}", point);
    }

    for split in scene.shadow().splits() {
        log::debug!(
            "Shadow split [{:.3}, {:.3}] light-space extent {:?}",
            split.z_near,
            split.z_far,
            split.light_space_bounds.extent()
        );
    }

    log::info!("Demo complete");
    Ok(())
}
