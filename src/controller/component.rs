//! The primary [`Component`] of the controller, [`SolarCam`].

use std::{f32::consts::FRAC_PI_4, time::Duration};

use bevy_ecs::prelude::*;
use bevy_log::prelude::*;
use bevy_math::prelude::*;
use bevy_reflect::prelude::*;
use bevy_render::prelude::*;
use bevy_time::prelude::*;
use bevy_transform::prelude::*;
use bevy_window::RequestRedraw;
use thiserror::Error;

use super::{
    inputs::CameraInput,
    orbit::{OrbitSettings, OrbitState},
    transition::{CameraPose, TransitionAnimator, TransitionSettings},
    zoom::{FocusZoom, FocusZoomSettings, OverviewZoom, OverviewZoomSettings},
};
use crate::{
    registry::{BodyId, BodyLookup, BodyView, SceneRegistry},
    selection::{
        resolve_frame_selection, BodyPicker, SelectionQueries, SelectionSettings, WorldPicker,
    },
};

/// Which target the camera orbits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Reflect)]
pub enum CameraMode {
    /// Orbit a fixed anchor and look at the whole system.
    #[default]
    Overview,
    /// Orbit and zoom relative to a single body.
    Focus,
}

/// Why a camera request was dropped. None of these are fatal; the camera state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    /// Focus mode has no target.
    #[error("no body is focused")]
    MissingFocusTarget,
    /// The body is not in the scene.
    #[error("body `{0}` is not in the scene")]
    UnknownBody(BodyId),
    /// The overview anchor is a body that is not in the scene.
    #[error("overview anchor `{0}` is not in the scene")]
    MissingOverviewAnchor(BodyId),
}

/// The point the overview camera orbits.
#[derive(Debug, Clone, PartialEq, Reflect)]
pub enum OverviewAnchor {
    /// A fixed point in world space.
    Point(Vec3),
    /// Follow a body, usually the system's star.
    Body(BodyId),
}

impl Default for OverviewAnchor {
    fn default() -> Self {
        Self::Point(Vec3::ZERO)
    }
}

/// All tunables of a [`SolarCam`].
#[derive(Debug, Clone, Reflect)]
pub struct SolarCamSettings {
    /// Orbit behavior while focused on a body.
    pub focus_orbit: OrbitSettings,
    /// Orbit behavior in the overview.
    pub overview_orbit: OrbitSettings,
    /// Zoom behavior while focused on a body.
    pub focus_zoom: FocusZoomSettings,
    /// Zoom behavior in the overview.
    pub overview_zoom: OverviewZoomSettings,
    /// How the camera moves between targets.
    pub transition: TransitionSettings,
    /// Pointer selection.
    pub selection: SelectionSettings,
    /// What the overview orbits.
    pub overview_anchor: OverviewAnchor,
    /// Vertical field of view while focused, in radians.
    pub focus_fov: f32,
    /// Vertical field of view in the overview, in radians.
    pub overview_fov: f32,
}

impl Default for SolarCamSettings {
    fn default() -> Self {
        Self {
            focus_orbit: OrbitSettings::focus(),
            overview_orbit: OrbitSettings::overview(),
            focus_zoom: Default::default(),
            overview_zoom: Default::default(),
            transition: Default::default(),
            selection: Default::default(),
            overview_anchor: Default::default(),
            focus_fov: FRAC_PI_4,
            overview_fov: 50f32.to_radians(),
        }
    }
}

/// Orbit and zoom state of focus mode.
#[derive(Debug, Clone, Default, PartialEq, Reflect)]
pub struct FocusState {
    /// The focused body. Kept while in the overview, so focusing it again is stable.
    pub target: Option<BodyId>,
    /// Orbit around the body.
    pub orbit: OrbitState,
    /// Zoom relative to the body's size.
    pub zoom: FocusZoom,
}

/// Orbit and zoom state of overview mode.
#[derive(Debug, Clone, Default, PartialEq, Reflect)]
pub struct OverviewState {
    /// Orbit around the overview anchor.
    pub orbit: OrbitState,
    /// Zoom over the system-wide range.
    pub zoom: OverviewZoom,
}

/// The state a running transition commits when it completes or is cancelled.
#[derive(Debug, Clone, PartialEq)]
enum PendingSwitch {
    Focus(FocusState),
    Overview(OverviewState),
}

impl PendingSwitch {
    fn mode(&self) -> CameraMode {
        match self {
            Self::Focus(_) => CameraMode::Focus,
            Self::Overview(_) => CameraMode::Overview,
        }
    }
}

/// Everything [`SolarCam::update_cameras`] reads and writes on a camera entity.
type CameraQuery = (
    &'static mut SolarCam,
    Option<&'static Camera>,
    &'static mut Transform,
    &'static mut GlobalTransform,
    Option<&'static mut Projection>,
);

/// What an orbit or zoom request acts on.
enum Target {
    Focus(BodyView),
    Overview(Vec3),
}

/// A two-mode camera controller for looking at a solar system.
///
/// In [`CameraMode::Overview`] the camera orbits a fixed anchor. In [`CameraMode::Focus`] it orbits
/// and zooms around one body, following it as it moves. Switching modes or targets animates the
/// camera from where it is to where it should be.
///
/// # Moving the Camera
///
/// With [`SolarCamControllerPlugin`](crate::controller::SolarCamControllerPlugin), send
/// [`CameraInput`] events; they are applied once per frame. Without an app, call
/// [`SolarCam::update`] every frame with that frame's inputs, or use the individual request methods
/// followed by [`SolarCam::advance`].
///
/// Any orbit, zoom, or focus request made while a transition is running snaps that transition to
/// its end first, so two requests never blend.
#[derive(Debug, Clone, Default, Reflect, Component)]
pub struct SolarCam {
    /// Tunables. Safe to change at any time.
    pub settings: SolarCamSettings,
    mode: CameraMode,
    focus: FocusState,
    overview: OverviewState,
    #[reflect(ignore)]
    transition: TransitionAnimator<PendingSwitch>,
    pose: Option<CameraPose>,
}

impl SolarCam {
    /// Create a new camera controller.
    pub fn new(settings: SolarCamSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    /// The current mode. During a transition this is the mode being left.
    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    /// The focused body, while in focus mode.
    pub fn focus_target(&self) -> Option<&BodyId> {
        match self.mode {
            CameraMode::Focus => self.focus.target.as_ref(),
            CameraMode::Overview => None,
        }
    }

    /// Focus mode orbit and zoom.
    pub fn focus_state(&self) -> &FocusState {
        &self.focus
    }

    /// Overview mode orbit and zoom.
    pub fn overview_state(&self) -> &OverviewState {
        &self.overview
    }

    /// The pose computed on the last [`SolarCam::advance`].
    pub fn camera_pose(&self) -> Option<CameraPose> {
        self.pose
    }

    /// Is the camera moving between targets?
    pub fn is_transitioning(&self) -> bool {
        self.transition.is_running()
    }

    /// Eased progress of the running transition.
    pub fn transition_progress(&self) -> Option<f32> {
        self.transition.progress()
    }

    /// The mode, and the body when focusing, that the running transition moves to.
    pub fn transition_destination(&self) -> Option<(CameraMode, Option<&BodyId>)> {
        self.transition.payload().map(|pending| match pending {
            PendingSwitch::Focus(state) => (CameraMode::Focus, state.target.as_ref()),
            PendingSwitch::Overview(_) => (CameraMode::Overview, None),
        })
    }

    /// Give the controller the camera's current pose, if it has none yet. Orbit angles are derived
    /// from this pose the first time each mode is used, and the first transition starts from it.
    pub fn seed_pose(&mut self, pose: CameraPose) {
        if self.pose.is_none() {
            self.pose = Some(pose);
        }
    }

    /// Snap a running transition to its end, committing its target and mode. Returns `false` if
    /// nothing was running.
    pub fn cancel_transition(&mut self) -> bool {
        match self.transition.cancel() {
            Some(pending) => {
                self.commit(pending);
                true
            }
            None => false,
        }
    }

    /// Reset a mode's orbit and zoom to their defaults.
    pub fn reset_view(
        &mut self,
        mode: CameraMode,
        scene: &impl SceneRegistry,
    ) -> Result<(), CameraError> {
        match mode {
            CameraMode::Overview => {
                self.cancel_transition();
                reset_overview(&mut self.overview, &self.settings);
            }
            CameraMode::Focus => {
                let body = lookup_focus(self.snapped_focus(), scene)?;
                self.cancel_transition();
                reset_focus(&mut self.focus, &body, &self.settings);
            }
        }
        Ok(())
    }

    /// Orbit the current target by one step in `direction`. A zero direction does nothing.
    pub fn request_orbit_step(
        &mut self,
        direction: Vec2,
        scene: &impl SceneRegistry,
    ) -> Result<(), CameraError> {
        if direction == Vec2::ZERO || !direction.is_finite() {
            return Ok(());
        }
        let direction = direction.clamp_length_max(1.0);
        let target = self.snapped_target(scene)?;
        self.cancel_transition();

        let settings = &self.settings;
        let (orbit, orbit_settings) = match target {
            Target::Focus(body) => {
                ensure_focus_initialized(&mut self.focus, &body, self.pose.as_ref(), settings);
                (&mut self.focus.orbit, &settings.focus_orbit)
            }
            Target::Overview(anchor) => {
                ensure_overview_initialized(
                    &mut self.overview,
                    anchor,
                    self.pose.as_ref(),
                    settings,
                );
                (&mut self.overview.orbit, &settings.overview_orbit)
            }
        };
        let degrees = orbit_settings.step_degrees(orbit.radius());
        orbit.rotate(
            direction.x * degrees,
            direction.y * degrees,
            orbit_settings.max_pitch,
        );
        Ok(())
    }

    /// Zoom by `delta` steps. Positive moves away from the target. Zero does nothing.
    pub fn request_zoom_step(
        &mut self,
        delta: i32,
        scene: &impl SceneRegistry,
    ) -> Result<(), CameraError> {
        if delta == 0 {
            return Ok(());
        }
        let target = self.snapped_target(scene)?;
        self.cancel_transition();

        let settings = &self.settings;
        match target {
            Target::Focus(body) => {
                ensure_focus_initialized(&mut self.focus, &body, self.pose.as_ref(), settings);
                let state = &mut self.focus;
                let increment = settings.focus_zoom.step_increment(&body);
                state.zoom.step(delta, increment);
                let distance = state.zoom.distance(&settings.focus_zoom, body.radius);
                state.orbit.set_radius(distance);
            }
            Target::Overview(anchor) => {
                ensure_overview_initialized(
                    &mut self.overview,
                    anchor,
                    self.pose.as_ref(),
                    settings,
                );
                let state = &mut self.overview;
                let distance = state.zoom.distance(&settings.overview_zoom);
                let increment = settings.overview_zoom.step_increment(distance);
                state.zoom.step(delta, increment);
                let distance = state.zoom.distance(&settings.overview_zoom);
                state.orbit.set_radius(distance);
            }
        }
        Ok(())
    }

    /// Start moving the camera to focus on `id`.
    ///
    /// The first time any body is focused, the orbit angles are taken from the current view, so the
    /// camera doesn't swing around. After that the focus orbit angles are kept. Zoom always resets
    /// to the default distance for the body's size.
    pub fn focus_on(&mut self, id: &BodyId, scene: &impl SceneRegistry) -> Result<(), CameraError> {
        let body = scene
            .lookup(id)
            .ok_or_else(|| CameraError::UnknownBody(id.clone()))?;
        self.cancel_transition();

        let mut next = self.focus.clone();
        next.target = Some(id.clone());
        ensure_focus_initialized(&mut next, &body, self.pose.as_ref(), &self.settings);
        next.zoom = self.settings.focus_zoom.default_zoom();
        let distance = next.zoom.distance(&self.settings.focus_zoom, body.radius);
        next.orbit.set_radius(distance);

        debug!("Focusing `{id}`");
        self.begin(PendingSwitch::Focus(next));
        Ok(())
    }

    /// Start moving the camera back to the overview, where it was last left.
    pub fn return_to_overview(&mut self, scene: &impl SceneRegistry) -> Result<(), CameraError> {
        let anchor = self.overview_anchor_position(scene)?;
        self.cancel_transition();

        let mut next = self.overview.clone();
        ensure_overview_initialized(&mut next, anchor, self.pose.as_ref(), &self.settings);

        debug!("Returning to overview");
        self.begin(PendingSwitch::Overview(next));
        Ok(())
    }

    /// Where the overview anchor currently is.
    pub fn overview_anchor_position(
        &self,
        scene: &impl SceneRegistry,
    ) -> Result<Vec3, CameraError> {
        match &self.settings.overview_anchor {
            OverviewAnchor::Point(point) => Ok(*point),
            OverviewAnchor::Body(id) => scene
                .current_world_position(id)
                .ok_or_else(|| CameraError::MissingOverviewAnchor(id.clone())),
        }
    }

    /// Apply one frame of inputs in order, then advance by `dt`. Returns the new pose.
    ///
    /// Requests that cannot be applied are logged and dropped. Of all pointer presses in the frame
    /// that select a body, only the last one triggers a focus request.
    pub fn update(
        &mut self,
        inputs: &[CameraInput],
        dt: Duration,
        scene: &impl SceneRegistry,
        picker: &impl BodyPicker,
    ) -> Option<CameraPose> {
        let selected = resolve_frame_selection(inputs, picker, &self.settings.selection);
        for (index, input) in inputs.iter().enumerate() {
            let result = match input {
                CameraInput::OrbitStep(direction) => self.request_orbit_step(*direction, scene),
                CameraInput::ZoomStep(delta) => self.request_zoom_step(*delta, scene),
                CameraInput::FocusRequest(id) => self.focus_on(id, scene),
                CameraInput::ReturnToOverview => self.return_to_overview(scene),
                CameraInput::PointerDown { .. } => match &selected {
                    Some((selected_index, id)) if *selected_index == index => {
                        self.focus_on(id, scene)
                    }
                    _ => Ok(()),
                },
            };
            if let Err(error) = result {
                warn!("Ignoring {input:?}: {error}");
            }
        }
        self.advance(dt, scene)
    }

    /// Advance a running transition by `dt` and recompute the camera pose.
    pub fn advance(&mut self, dt: Duration, scene: &impl SceneRegistry) -> Option<CameraPose> {
        self.transition.advance(dt);
        if let Some(pending) = self.transition.finish_if_complete() {
            self.commit(pending);
        }

        let pending = self.transition.payload();
        let end = pending.map(|pending| self.pending_pose(pending, scene));
        match end {
            Some(Ok(end)) => {
                self.pose = self.transition.blend(&end);
                return self.pose;
            }
            Some(Err(error)) => {
                // Keep the mode and target that are still valid.
                warn!("Lost transition target, staying put: {error}");
                self.transition.cancel();
            }
            None => (),
        }

        match self.rest_pose(scene) {
            Ok(pose) => self.pose = Some(pose),
            Err(error) => warn!("Camera target unavailable: {error}"),
        }
        self.pose
    }

    fn begin(&mut self, pending: PendingSwitch) {
        match self.pose {
            Some(start) => {
                let settings = &self.settings.transition;
                self.transition.start(start, settings, pending);
            }
            // Nothing on screen yet, so there is nothing to animate from.
            None => self.commit(pending),
        }
    }

    fn commit(&mut self, pending: PendingSwitch) {
        self.mode = pending.mode();
        match pending {
            PendingSwitch::Focus(state) => self.focus = state,
            PendingSwitch::Overview(state) => self.overview = state,
        }
    }

    /// The mode in effect once a running transition is snapped.
    fn snapped_mode(&self) -> CameraMode {
        let pending = self.transition.payload();
        pending.map_or(self.mode, PendingSwitch::mode)
    }

    /// The focus state in effect once a running transition is snapped.
    fn snapped_focus(&self) -> &FocusState {
        match self.transition.payload() {
            Some(PendingSwitch::Focus(state)) => state,
            _ => &self.focus,
        }
    }

    fn snapped_target(&self, scene: &impl SceneRegistry) -> Result<Target, CameraError> {
        match self.snapped_mode() {
            CameraMode::Focus => lookup_focus(self.snapped_focus(), scene).map(Target::Focus),
            CameraMode::Overview => self.overview_anchor_position(scene).map(Target::Overview),
        }
    }

    fn pending_pose(
        &self,
        pending: &PendingSwitch,
        scene: &impl SceneRegistry,
    ) -> Result<CameraPose, CameraError> {
        match pending {
            PendingSwitch::Focus(state) => focus_pose(state, scene, &self.settings),
            PendingSwitch::Overview(state) => {
                let anchor = self.overview_anchor_position(scene)?;
                Ok(overview_pose(state, anchor, &self.settings))
            }
        }
    }

    fn rest_pose(&mut self, scene: &impl SceneRegistry) -> Result<CameraPose, CameraError> {
        match self.mode {
            CameraMode::Focus => {
                let body = lookup_focus(&self.focus, scene)?;
                ensure_focus_initialized(
                    &mut self.focus,
                    &body,
                    self.pose.as_ref(),
                    &self.settings,
                );
                focus_pose(&self.focus, scene, &self.settings)
            }
            CameraMode::Overview => {
                let anchor = self.overview_anchor_position(scene)?;
                ensure_overview_initialized(
                    &mut self.overview,
                    anchor,
                    self.pose.as_ref(),
                    &self.settings,
                );
                Ok(overview_pose(&self.overview, anchor, &self.settings))
            }
        }
    }

    /// Apply this frame's [`CameraInput`] events to every [`SolarCam`] and move the cameras. Called
    /// once per frame, after transforms have propagated, so body positions are current.
    ///
    /// Cameras are expected to be root entities; their [`GlobalTransform`] is written directly so
    /// the new pose is rendered this frame.
    pub fn update_cameras(
        mut cameras: Query<CameraQuery>,
        mut events: EventReader<CameraInput>,
        bodies: BodyLookup,
        selection: SelectionQueries,
        time: Res<Time>,
        mut redraw: EventWriter<RequestRedraw>,
    ) {
        let inputs = events.read().cloned().collect::<Vec<_>>();
        for (mut controller, camera, mut transform, mut global_transform, projection) in
            &mut cameras
        {
            if controller.pose.is_none() {
                let fov = match projection.as_deref() {
                    Some(Projection::Perspective(perspective)) => perspective.fov,
                    _ => controller.settings.overview_fov,
                };
                let zoom = &controller.settings.overview_zoom;
                let focus_distance = zoom.default_zoom().distance(zoom);
                let seed = CameraPose::from_transform(&transform, fov, focus_distance);
                controller.seed_pose(seed);
            }

            let previous = controller.pose;
            let picker = WorldPicker::new(
                &selection,
                camera.map(|camera| (camera, global_transform.as_ref())),
            );
            let Some(pose) = controller.update(&inputs, time.delta(), &bodies, &picker) else {
                continue;
            };

            if previous != Some(pose) || controller.is_transitioning() {
                redraw.write(RequestRedraw);
            }

            let mut next = pose.transform();
            next.scale = transform.scale;
            transform.set_if_neq(next);
            global_transform.set_if_neq(GlobalTransform::from(next));

            if let Some(mut projection) = projection {
                if let Projection::Perspective(perspective) = projection.as_mut() {
                    if perspective.fov != pose.fov {
                        perspective.fov = pose.fov;
                    }
                }
            }
        }
    }
}

fn lookup_focus(state: &FocusState, scene: &impl SceneRegistry) -> Result<BodyView, CameraError> {
    let Some(id) = &state.target else {
        return Err(CameraError::MissingFocusTarget);
    };
    scene
        .lookup(id)
        .ok_or_else(|| CameraError::UnknownBody(id.clone()))
}

fn focus_pose(
    state: &FocusState,
    scene: &impl SceneRegistry,
    settings: &SolarCamSettings,
) -> Result<CameraPose, CameraError> {
    let body = lookup_focus(state, scene)?;
    Ok(CameraPose::new(
        body.position + state.orbit.offset(),
        body.position,
        settings.focus_fov,
    ))
}

fn overview_pose(state: &OverviewState, anchor: Vec3, settings: &SolarCamSettings) -> CameraPose {
    CameraPose::new(anchor + state.orbit.offset(), anchor, settings.overview_fov)
}

fn reset_orbit(orbit: &mut OrbitState, settings: &OrbitSettings) {
    let (yaw, pitch) = (settings.default_yaw, settings.default_pitch);
    orbit.reset(yaw, pitch, settings.max_pitch);
}

fn reset_focus(state: &mut FocusState, body: &BodyView, settings: &SolarCamSettings) {
    reset_orbit(&mut state.orbit, &settings.focus_orbit);
    state.zoom = settings.focus_zoom.default_zoom();
    let distance = state.zoom.distance(&settings.focus_zoom, body.radius);
    state.orbit.set_radius(distance);
}

fn reset_overview(state: &mut OverviewState, settings: &SolarCamSettings) {
    reset_orbit(&mut state.orbit, &settings.overview_orbit);
    state.zoom = settings.overview_zoom.default_zoom();
    let distance = state.zoom.distance(&settings.overview_zoom);
    state.orbit.set_radius(distance);
}

/// Derive the focus orbit from the current view if it has never been set.
fn ensure_focus_initialized(
    state: &mut FocusState,
    body: &BodyView,
    view: Option<&CameraPose>,
    settings: &SolarCamSettings,
) {
    if state.orbit.is_initialized() {
        return;
    }
    match view {
        Some(view) => {
            let max_pitch = settings.focus_orbit.max_pitch;
            let (target, eye) = (body.position, view.position);
            state.orbit.derive_from_view(target, eye, max_pitch);
            let distance = state.zoom.distance(&settings.focus_zoom, body.radius);
            state.orbit.set_radius(distance);
        }
        None => reset_focus(state, body, settings),
    }
}

/// Derive the overview orbit and zoom from the current view if they have never been set.
fn ensure_overview_initialized(
    state: &mut OverviewState,
    anchor: Vec3,
    view: Option<&CameraPose>,
    settings: &SolarCamSettings,
) {
    if state.orbit.is_initialized() {
        return;
    }
    match view {
        Some(view) => {
            let max_pitch = settings.overview_orbit.max_pitch;
            let distance = state.orbit.derive_from_view(anchor, view.position, max_pitch);
            state.zoom = if distance > 0.0 {
                OverviewZoom::from_distance(&settings.overview_zoom, distance)
            } else {
                settings.overview_zoom.default_zoom()
            };
            let distance = state.zoom.distance(&settings.overview_zoom);
            state.orbit.set_radius(distance);
        }
        None => reset_overview(state, settings),
    }
}
