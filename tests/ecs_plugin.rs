//! Drives the controller plugin in a headless app. Bodies are spawned with their
//! [`GlobalTransform`] already set, so no transform propagation is needed.

use std::time::Duration;

use bevy_app::prelude::*;
use bevy_ecs::prelude::*;
use bevy_math::prelude::*;
use bevy_solar_cam::{
    controller::{component::CameraMode, inputs::CameraInput},
    prelude::*,
    registry::{BodyId, BodyIndex},
};
use bevy_time::prelude::*;
use bevy_transform::prelude::*;
use bevy_window::RequestRedraw;

const EARTH: Vec3 = Vec3::new(1500.0, 0.0, 0.0);
const ABOVE: Vec3 = Vec3::new(0.0, 2000.0, 2000.0);

fn app() -> (App, Entity) {
    let mut app = App::new();
    app.add_plugins(SolarCamControllerPlugin)
        .init_resource::<Time>();

    let world = app.world_mut();
    world.spawn((
        CelestialBody::star("Sun", 70.0),
        Transform::default(),
        GlobalTransform::default(),
    ));
    world.spawn((
        CelestialBody::new("Earth", 0.64),
        Transform::from_translation(EARTH),
        GlobalTransform::from_translation(EARTH),
    ));
    let view = Transform::from_translation(ABOVE);
    let camera = world
        .spawn((SolarCam::default(), view.looking_at(Vec3::ZERO, Vec3::Y)))
        .id();

    app.update();
    (app, camera)
}

fn step(app: &mut App, millis: u64) {
    app.world_mut()
        .resource_mut::<Time>()
        .advance_by(Duration::from_millis(millis));
    app.update();
}

fn solar_cam(app: &App, camera: Entity) -> &SolarCam {
    app.world().get::<SolarCam>(camera).unwrap()
}

fn translation(app: &App, camera: Entity) -> Vec3 {
    app.world().get::<Transform>(camera).unwrap().translation
}

#[test]
fn bodies_are_indexed() {
    let (app, _) = app();
    let index = app.world().resource::<BodyIndex>();
    assert_eq!(index.len(), 2);
    assert!(index.contains_key(&BodyId::new("EARTH")));
}

#[test]
fn camera_starts_where_it_was_placed() {
    let (app, camera) = app();
    let cam = solar_cam(&app, camera);
    assert_eq!(cam.mode(), CameraMode::Overview);
    assert!(translation(&app, camera).abs_diff_eq(ABOVE, 0.5));
}

#[test]
fn focus_request_moves_the_camera() {
    let (mut app, camera) = app();
    app.world_mut()
        .send_event(CameraInput::FocusRequest("Earth".into()));
    step(&mut app, 100);
    assert!(solar_cam(&app, camera).is_transitioning());
    assert!(!app.world().resource::<Events<RequestRedraw>>().is_empty());

    for _ in 0..12 {
        step(&mut app, 100);
    }
    let cam = solar_cam(&app, camera);
    assert!(!cam.is_transitioning());
    assert_eq!(cam.mode(), CameraMode::Focus);

    let (min, max) = cam.settings.focus_zoom.distance_range(0.64);
    let distance = translation(&app, camera).distance(EARTH);
    assert!(distance >= min && distance <= max, "{distance}");

    let transform = app.world().get::<Transform>(camera).unwrap();
    let to_earth = (EARTH - transform.translation).normalize();
    assert!(transform.forward().dot(to_earth) > 0.999);
    let global = app.world().get::<GlobalTransform>(camera).unwrap();
    assert!(global.translation().abs_diff_eq(transform.translation, 1e-3));
}

#[test]
fn focus_follows_a_moving_body() {
    let (mut app, camera) = app();
    app.world_mut()
        .send_event(CameraInput::FocusRequest("earth".into()));
    for _ in 0..12 {
        step(&mut app, 100);
    }
    let before = translation(&app, camera) - EARTH;

    let moved = EARTH + Vec3::new(0.0, 0.0, 40.0);
    let earth = app.world().resource::<BodyIndex>()[&BodyId::new("earth")];
    let placed = (
        Transform::from_translation(moved),
        GlobalTransform::from_translation(moved),
    );
    app.world_mut().entity_mut(earth).insert(placed);
    step(&mut app, 16);

    let after = translation(&app, camera) - moved;
    assert!(after.abs_diff_eq(before, 1e-2));
}

#[test]
fn unknown_focus_request_is_ignored() {
    let (mut app, camera) = app();
    let start = translation(&app, camera);
    app.world_mut()
        .send_event(CameraInput::FocusRequest("pluto".into()));
    step(&mut app, 100);
    let cam = solar_cam(&app, camera);
    assert_eq!(cam.mode(), CameraMode::Overview);
    assert!(!cam.is_transitioning());
    assert!(translation(&app, camera).abs_diff_eq(start, 1e-2));
}

#[test]
fn zoom_events_move_the_overview_camera() {
    let (mut app, camera) = app();
    let start = translation(&app, camera).length();
    app.world_mut().send_event(CameraInput::ZoomStep(-3));
    step(&mut app, 16);
    assert!(translation(&app, camera).length() < start);
}
