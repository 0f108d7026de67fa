//! A `bevy_solar_cam` extension that draws a ring around the focused body. Bodies are often a few
//! pixels wide at focus distance, so this makes it obvious what the camera is orbiting.

use bevy_app::prelude::*;
use bevy_color::Color;
use bevy_ecs::prelude::*;
use bevy_gizmos::prelude::*;
use bevy_math::prelude::*;
use bevy_reflect::prelude::*;
use bevy_transform::prelude::*;

use crate::{
    controller::{
        component::{CameraMode, SolarCam},
        SolarCamSystems,
    },
    registry::{BodyLookup, SceneRegistry},
};

/// See the [module](self) docs.
pub struct FocusIndicatorPlugin;

impl Plugin for FocusIndicatorPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(PostUpdate, draw_focus_ring.after(SolarCamSystems))
            .register_type::<FocusIndicator>();
    }
}

/// Optional. Configures whether or not a [`SolarCam`] should show a ring around the focused body.
/// The ring is drawn if this component is not present.
#[derive(Debug, Clone, Component, Reflect)]
pub struct FocusIndicator {
    /// Should the indicator be visible on this camera?
    pub enabled: bool,
    /// Ring color.
    pub color: Color,
    /// Ring radius, in body radii.
    pub scale: f32,
}

impl Default for FocusIndicator {
    fn default() -> Self {
        Self {
            enabled: true,
            color: Color::WHITE,
            scale: 1.3,
        }
    }
}

impl FocusIndicator {
    /// The ring around a body of `body_radius` at `body_position`, facing a camera at
    /// `camera_position`. Returns `None` if the camera is inside the body's center.
    pub fn ring(
        &self,
        body_position: Vec3,
        body_radius: f32,
        camera_position: Vec3,
    ) -> Option<(Isometry3d, f32)> {
        let facing = Dir3::new(camera_position - body_position).ok()?;
        let rotation = Quat::from_rotation_arc(Vec3::Z, *facing);
        let radius = body_radius * self.scale;
        (radius.is_finite() && radius > 0.0)
            .then(|| (Isometry3d::new(body_position, rotation), radius))
    }
}

/// Use gizmos to draw a ring around the focused body, once the camera has arrived.
pub fn draw_focus_ring(
    cameras: Query<(&SolarCam, &GlobalTransform, Option<&FocusIndicator>)>,
    bodies: BodyLookup,
    mut gizmos: Gizmos,
) {
    let default_indicator = FocusIndicator::default();
    for (solar_cam, cam_transform, indicator) in &cameras {
        let indicator = indicator.unwrap_or(&default_indicator);
        if !indicator.enabled
            || solar_cam.mode() != CameraMode::Focus
            || solar_cam.is_transitioning()
        {
            continue;
        }
        let Some(body) = solar_cam.focus_target().and_then(|id| bodies.lookup(id)) else {
            continue;
        };
        let Some((isometry, radius)) =
            indicator.ring(body.position, body.radius, cam_transform.translation())
        else {
            continue;
        };
        gizmos.circle(isometry, radius, indicator.color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_faces_the_camera() {
        let indicator = FocusIndicator::default();
        let (isometry, radius) = indicator
            .ring(Vec3::new(10.0, 0.0, 0.0), 2.0, Vec3::new(10.0, 0.0, 5.0))
            .unwrap();
        assert!((radius - 2.6).abs() < 1e-5);
        let normal = isometry.rotation * Vec3::Z;
        assert!(normal.abs_diff_eq(Vec3::Z, 1e-5));
        assert!(Vec3::from(isometry.translation).abs_diff_eq(Vec3::new(10.0, 0.0, 0.0), 1e-5));

        let (isometry, _) = indicator.ring(Vec3::ZERO, 1.0, Vec3::X * 3.0).unwrap();
        assert!((isometry.rotation * Vec3::Z).abs_diff_eq(Vec3::X, 1e-5));
    }

    #[test]
    fn no_ring_from_inside() {
        let indicator = FocusIndicator::default();
        assert!(indicator.ring(Vec3::ONE, 1.0, Vec3::ONE).is_none());
        assert!(indicator.ring(Vec3::ZERO, 0.0, Vec3::X).is_none());
    }
}
