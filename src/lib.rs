//! A camera controller for solar system viewers.
//!
//! The camera has two modes. In the **overview** it orbits a fixed anchor, usually the star, at
//! system scale. In **focus** mode it orbits and zooms around a single body, following it as it
//! moves. Clicking a body, or sending a [`CameraInput::FocusRequest`], animates the camera to that
//! body; [`CameraInput::ReturnToOverview`] animates it back.
//!
//! ## Getting Started
//!
//! 1. Add [`DefaultSolarCamPlugins`] to your app.
//! 2. Add [`SolarCam`] to your camera entity.
//! 3. Add [`CelestialBody`] to each body, and [`Selectable`] to anything that should be
//!    clickable. Colliders may be children of the body they belong to.
//!
//! ## Driving the camera
//!
//! Everything the controller reacts to arrives as a [`CameraInput`] event. The bundled
//! [`SolarCamInputPlugin`] maps mouse, keyboard and touch to these events. Leave it out to supply
//! your own bindings.
//!
//! The controller state machine does not depend on the ECS. [`SolarCam::update`] can be driven by
//! hand with any [`SceneRegistry`] and [`BodyPicker`], which is how most of the tests work.
//!
//! [`CameraInput`]: controller::inputs::CameraInput
//! [`CameraInput::FocusRequest`]: controller::inputs::CameraInput::FocusRequest
//! [`CameraInput::ReturnToOverview`]: controller::inputs::CameraInput::ReturnToOverview
//! [`SolarCamInputPlugin`]: controller::inputs::SolarCamInputPlugin
//! [`SolarCam`]: controller::component::SolarCam
//! [`SolarCam::update`]: controller::component::SolarCam::update
//! [`CelestialBody`]: registry::CelestialBody
//! [`SceneRegistry`]: registry::SceneRegistry
//! [`Selectable`]: selection::Selectable
//! [`BodyPicker`]: selection::BodyPicker

pub mod controller;
pub mod extensions;
pub mod registry;
pub mod selection;

/// Common imports.
pub mod prelude {
    pub use crate::{
        controller::{
            component::{CameraError, CameraMode, OverviewAnchor, SolarCam, SolarCamSettings},
            inputs::{CameraInput, PointerOverUi, SolarCamInputPlugin},
            orbit::OrbitSettings,
            transition::{CameraPose, TransitionEasing, TransitionSettings},
            zoom::{DistanceBoost, FocusZoomSettings, OverviewZoomSettings},
            SolarCamControllerPlugin, SolarCamSystems,
        },
        registry::{BodyId, BodyRegistry, CelestialBody, SceneRegistry, VisualScale},
        selection::{Selectable, SelectionLayers, SelectionSettings},
        DefaultSolarCamPlugins,
    };

    #[cfg(feature = "extension_focus_indicator")]
    pub use crate::extensions::focus_indicator::{FocusIndicator, FocusIndicatorPlugin};
}

use bevy_app::{PluginGroup, PluginGroupBuilder};

/// Adds the camera controller, the default input mapping, and any enabled extensions.
pub struct DefaultSolarCamPlugins;

impl PluginGroup for DefaultSolarCamPlugins {
    #[allow(clippy::let_and_return)]
    fn build(self) -> PluginGroupBuilder {
        let group = PluginGroupBuilder::start::<Self>()
            .add(controller::SolarCamControllerPlugin)
            .add(controller::inputs::SolarCamInputPlugin);

        #[cfg(feature = "extension_focus_indicator")]
        let group = group.add(extensions::focus_indicator::FocusIndicatorPlugin);

        group
    }
}
