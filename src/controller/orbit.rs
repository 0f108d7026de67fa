//! Orbit angles around a target, and the camera offset they produce.

use bevy_math::{prelude::*, EulerRot};
use bevy_reflect::Reflect;

use super::zoom::DistanceBoost;

/// Directions shorter than this are treated as degenerate when deriving angles from a view.
const DIRECTION_EPSILON: f32 = 1e-6;

/// Pitch limit never reaches the poles, where yaw becomes undefined.
const PITCH_LIMIT: f32 = 89.9;

/// Orbit settings for one camera mode.
#[derive(Debug, Clone, Reflect)]
pub struct OrbitSettings {
    /// Arc length, in scene units, that a single orbit step travels at the orbit radius.
    pub step_size: f32,
    /// Upper bound on a single step, in degrees. Keeps steps sane when the radius gets tiny.
    pub step_max_degrees: f32,
    /// Orbit radius used for step scaling, as a fraction of the camera distance.
    pub radius_factor: f32,
    /// Upper bound on the radius used for step scaling.
    pub max_offset: f32,
    /// Pitch is clamped to `[-max_pitch, max_pitch]` degrees.
    pub max_pitch: f32,
    /// Yaw used when the orbit is reset, in degrees.
    pub default_yaw: f32,
    /// Pitch used when the orbit is reset, in degrees.
    pub default_pitch: f32,
    /// Grows the step size once the camera is far away.
    pub boost: DistanceBoost,
}

impl OrbitSettings {
    /// Defaults for orbiting a single body.
    pub fn focus() -> Self {
        Self {
            step_size: 1.0,
            step_max_degrees: 4.0,
            radius_factor: 1.0,
            max_offset: 5_000.0,
            max_pitch: 80.0,
            default_yaw: 0.0,
            default_pitch: 15.0,
            boost: DistanceBoost::NONE,
        }
    }

    /// Defaults for orbiting the whole system.
    pub fn overview() -> Self {
        Self {
            step_size: 40.0,
            step_max_degrees: 3.0,
            radius_factor: 1.0,
            max_offset: 20_000.0,
            max_pitch: 85.0,
            default_yaw: 0.0,
            default_pitch: 35.0,
            boost: DistanceBoost {
                threshold: 1_500.0,
                max_multiplier: 3.0,
            },
        }
    }

    /// The pitch limit actually enforced.
    pub fn pitch_limit(&self) -> f32 {
        pitch_limit(self.max_pitch)
    }

    /// Radius used to convert the linear step into an angle. Never negative.
    pub fn lever_radius(&self, camera_distance: f32) -> f32 {
        if !camera_distance.is_finite() {
            return 0.0;
        }
        let radius = (camera_distance * self.radius_factor).min(self.max_offset);
        if radius.is_finite() {
            radius.max(0.0)
        } else {
            0.0
        }
    }

    /// Angle, in degrees, of one orbit step when the camera is `camera_distance` from its target.
    pub fn step_degrees(&self, camera_distance: f32) -> f32 {
        let radius = self.lever_radius(camera_distance);
        if radius <= 0.0 {
            return 0.0;
        }
        let step = self.step_size * self.boost.multiplier(camera_distance);
        let degrees = (step / radius).to_degrees();
        degrees.min(self.step_max_degrees).max(0.0)
    }
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self::focus()
    }
}

/// Wraps yaw into `(-360, 360)` with a truncating modulo, so the sign is preserved and repeated
/// steps never grow without bound.
pub fn wrap_yaw(yaw: f32) -> f32 {
    let wrapped = yaw % 360.0;
    if wrapped.is_finite() {
        wrapped
    } else {
        0.0
    }
}

/// Rotation that carries the back vector (`+Z`) to the camera offset direction. Positive pitch
/// lifts the camera above the target's horizontal plane.
pub fn orbit_rotation(yaw_degrees: f32, pitch_degrees: f32) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        yaw_degrees.to_radians(),
        -pitch_degrees.to_radians(),
        0.0,
    )
}

/// Yaw, pitch and radius of a camera orbiting a target.
///
/// `offset` is only ever recomputed from the other three, and is the vector from the target to
/// the camera.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct OrbitState {
    yaw: f32,
    pitch: f32,
    radius: f32,
    offset: Vec3,
    initialized: bool,
}

impl Default for OrbitState {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            radius: 0.0,
            offset: Vec3::ZERO,
            initialized: false,
        }
    }
}

impl OrbitState {
    /// Yaw in degrees, within `(-360, 360)`.
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Pitch in degrees.
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Distance from the target.
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Vector from the target to the camera.
    pub fn offset(&self) -> Vec3 {
        self.offset
    }

    /// Has this orbit been reset, derived from a view, or stepped?
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Set explicit angles.
    pub fn reset(&mut self, yaw: f32, pitch: f32, max_pitch: f32) {
        self.yaw = wrap_yaw(yaw);
        self.pitch = clamp_pitch(pitch, max_pitch);
        self.initialized = true;
        self.recompute_offset();
    }

    /// Derive the angles from a camera looking at `target` from `camera_position`. Falls back to
    /// zero yaw and pitch when the two points coincide. Returns the distance between them.
    pub fn derive_from_view(&mut self, target: Vec3, camera_position: Vec3, max_pitch: f32) -> f32 {
        let direction = camera_position - target;
        let distance = direction.length();
        if !distance.is_finite() || distance <= DIRECTION_EPSILON {
            self.reset(0.0, 0.0, max_pitch);
            return 0.0;
        }
        let direction = direction / distance;
        let yaw = direction.x.atan2(direction.z).to_degrees();
        let pitch = direction.y.clamp(-1.0, 1.0).asin().to_degrees();
        self.reset(yaw, pitch, max_pitch);
        distance
    }

    /// Rotate by the given number of degrees. Yaw wraps, pitch is clamped.
    pub fn rotate(&mut self, yaw_delta: f32, pitch_delta: f32, max_pitch: f32) {
        let yaw_delta = if yaw_delta.is_finite() {
            yaw_delta
        } else {
            0.0
        };
        let pitch_delta = if pitch_delta.is_finite() {
            pitch_delta
        } else {
            0.0
        };
        self.reset(self.yaw + yaw_delta, self.pitch + pitch_delta, max_pitch);
    }

    /// Set the distance from the target. Negative and non-finite values become zero.
    pub fn set_radius(&mut self, radius: f32) {
        self.radius = if radius.is_finite() {
            radius.max(0.0)
        } else {
            0.0
        };
        self.recompute_offset();
    }

    fn recompute_offset(&mut self) {
        self.offset = orbit_rotation(self.yaw, self.pitch) * Vec3::Z * self.radius;
    }
}

fn pitch_limit(max_pitch: f32) -> f32 {
    if max_pitch.is_nan() {
        0.0
    } else {
        max_pitch.clamp(0.0, PITCH_LIMIT)
    }
}

fn clamp_pitch(pitch: f32, max_pitch: f32) -> f32 {
    let limit = pitch_limit(max_pitch);
    if pitch.is_nan() {
        0.0
    } else {
        pitch.clamp(-limit, limit)
    }
}
