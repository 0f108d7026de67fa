//! Smoothly moves the camera between two poses when the focus target or mode changes.
//!
//! The animator only knows about poses and progress. What the camera switches *to* is carried as
//! an opaque payload that is handed back when the transition completes or is cancelled, so the
//! owner can commit it.

use std::time::Duration;

use bevy_math::{
    curve::{easing::EaseFunction, Curve},
    prelude::*,
};
use bevy_reflect::prelude::*;
use bevy_transform::prelude::*;

/// Where the camera is and what it looks at. This is what gets handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct CameraPose {
    /// Camera position in world space.
    pub position: Vec3,
    /// Point the camera looks at.
    pub look_target: Vec3,
    /// Vertical field of view, in radians.
    pub fov: f32,
}

impl CameraPose {
    /// A pose at `position` looking at `look_target`.
    pub fn new(position: Vec3, look_target: Vec3, fov: f32) -> Self {
        Self {
            position,
            look_target,
            fov,
        }
    }

    /// The pose described by a camera transform. The look target is placed `focus_distance` in
    /// front of the camera.
    pub fn from_transform(transform: &Transform, fov: f32, focus_distance: f32) -> Self {
        Self {
            position: transform.translation,
            look_target: transform.translation + transform.forward() * focus_distance,
            fov,
        }
    }

    /// Viewing direction, if the position and look target are distinct.
    pub fn forward(&self) -> Option<Dir3> {
        Dir3::new(self.look_target - self.position).ok()
    }

    /// A transform at this pose, with `Y` up.
    pub fn transform(&self) -> Transform {
        let transform = Transform::from_translation(self.position);
        transform.looking_at(self.look_target, Vec3::Y)
    }

    /// Linear blend between two poses.
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            position: self.position.lerp(other.position, t),
            look_target: self.look_target.lerp(other.look_target, t),
            fov: self.fov + (other.fov - self.fov) * t,
        }
    }
}

/// The easing curve applied to transition progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Reflect)]
pub enum TransitionEasing {
    /// Constant speed.
    Linear,
    /// Gentle acceleration and deceleration.
    QuadraticInOut,
    /// Stronger acceleration and deceleration.
    #[default]
    CubicInOut,
    /// Sinusoidal acceleration and deceleration.
    SineInOut,
}

impl TransitionEasing {
    fn function(self) -> EaseFunction {
        match self {
            Self::Linear => EaseFunction::Linear,
            Self::QuadraticInOut => EaseFunction::QuadraticInOut,
            Self::CubicInOut => EaseFunction::CubicInOut,
            Self::SineInOut => EaseFunction::SineInOut,
        }
    }

    /// Eased progress for a linear progress `t`, clamped to `[0, 1]`.
    pub fn ease(self, t: f32) -> f32 {
        if t.is_nan() {
            return 0.0;
        }
        let eased = self.function().sample_clamped(t.clamp(0.0, 1.0));
        eased.clamp(0.0, 1.0)
    }
}

/// Stores settings for camera transitions.
#[derive(Debug, Clone, Reflect)]
pub struct TransitionSettings {
    /// The duration of a transition. Zero switches instantly.
    pub duration: Duration,
    /// The curve used to ease the camera between poses.
    pub easing: TransitionEasing,
}

impl Default for TransitionSettings {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(1000),
            easing: TransitionEasing::default(),
        }
    }
}

#[derive(Debug, Clone)]
struct ActiveTransition<P> {
    start: CameraPose,
    elapsed: Duration,
    duration: Duration,
    easing: TransitionEasing,
    payload: P,
}

impl<P> ActiveTransition<P> {
    fn linear_progress(&self) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let t = self.elapsed.as_secs_f32() / self.duration.as_secs_f32();
        t.clamp(0.0, 1.0)
    }
}

/// Interpolates the camera from a start pose toward an end pose supplied every frame.
///
/// Progress starts at zero, never decreases, and the transition completes at one. At most one
/// transition runs at a time.
#[derive(Debug, Clone)]
pub struct TransitionAnimator<P> {
    active: Option<ActiveTransition<P>>,
}

impl<P> Default for TransitionAnimator<P> {
    fn default() -> Self {
        Self { active: None }
    }
}

impl<P> TransitionAnimator<P> {
    /// Start a transition from `start`. Returns the payload of a transition that was still running,
    /// which is replaced without being committed.
    pub fn start(
        &mut self,
        start: CameraPose,
        settings: &TransitionSettings,
        payload: P,
    ) -> Option<P> {
        self.active
            .replace(ActiveTransition {
                start,
                elapsed: Duration::ZERO,
                duration: settings.duration,
                easing: settings.easing,
                payload,
            })
            .map(|previous| previous.payload)
    }

    /// Is a transition running?
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Eased progress of the running transition.
    pub fn progress(&self) -> Option<f32> {
        self.active
            .as_ref()
            .map(|active| active.easing.ease(active.linear_progress()))
    }

    /// What the running transition switches to.
    pub fn payload(&self) -> Option<&P> {
        self.active.as_ref().map(|active| &active.payload)
    }

    /// Advance the running transition by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        if let Some(active) = &mut self.active {
            active.elapsed = active.elapsed.saturating_add(dt);
        }
    }

    /// The interpolated pose between the start pose and `end`.
    pub fn blend(&self, end: &CameraPose) -> Option<CameraPose> {
        let active = self.active.as_ref()?;
        let t = active.easing.ease(active.linear_progress());
        Some(active.start.lerp(end, t))
    }

    /// Ends the running transition if it reached full progress, returning its payload.
    pub fn finish_if_complete(&mut self) -> Option<P> {
        if self.active.as_ref()?.linear_progress() < 1.0 {
            return None;
        }
        self.active.take().map(|active| active.payload)
    }

    /// Stop the running transition immediately, returning its payload. Does nothing if no
    /// transition is running.
    pub fn cancel(&mut self) -> Option<P> {
        self.active.take().map(|active| active.payload)
    }
}
