//! The camera controller: mode state, orbit and zoom math, transitions, and the systems that drive
//! them.

use bevy_app::prelude::*;
use bevy_ecs::prelude::*;
use bevy_transform::TransformSystem;
use bevy_window::RequestRedraw;

use crate::registry::{BodyIndex, CelestialBody};

pub mod component;
pub mod inputs;
pub mod orbit;
pub mod transition;
pub mod zoom;

/// Adds [`component::SolarCam`] functionality to the app.
pub struct SolarCamControllerPlugin;

/// The systems that move every [`component::SolarCam`]. Runs in [`PostUpdate`], after transforms
/// propagate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, SystemSet)]
pub struct SolarCamSystems;

impl Plugin for SolarCamControllerPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<inputs::CameraInput>()
            .add_event::<RequestRedraw>()
            .init_resource::<BodyIndex>()
            .add_systems(
                PostUpdate,
                (
                    BodyIndex::index_new_bodies,
                    component::SolarCam::update_cameras,
                )
                    .chain()
                    .in_set(SolarCamSystems)
                    .after(TransformSystem::TransformPropagate),
            )
            .register_type::<component::SolarCam>()
            .register_type::<CelestialBody>()
            .register_type::<crate::selection::Selectable>();
    }
}
