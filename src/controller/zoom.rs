//! Provides the per-mode zoom state, [`FocusZoom`] and [`OverviewZoom`], and their settings.
//!
//! Both modes store zoom as a normalized value in `[0, 1]` which is mapped through a distance
//! range. `0.0` is the closest the camera may get, `1.0` the farthest. A positive zoom step moves
//! the camera away.

use bevy_reflect::Reflect;

use crate::registry::BodyView;

/// The smallest distance range allowed when mapping normalized zoom to a distance. Prevents a
/// division by zero when computing the per-step increment.
const MIN_RANGE: f32 = 1e-3;

/// Clamp to `[0, 1]`, mapping NaN to `0.0`.
pub fn clamp_normalized(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// A multiplier that grows with camera distance. It stays at `1.0` until `threshold`, ramps
/// linearly up to `max_multiplier` at twice the threshold, then holds.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct DistanceBoost {
    /// Distance at which the multiplier starts to grow.
    pub threshold: f32,
    /// Multiplier reached at `2 * threshold` and beyond.
    pub max_multiplier: f32,
}

impl DistanceBoost {
    /// A boost that never changes anything.
    pub const NONE: Self = Self {
        threshold: f32::MAX,
        max_multiplier: 1.0,
    };

    /// The multiplier at the given camera distance.
    pub fn multiplier(&self, distance: f32) -> f32 {
        let disabled = self.threshold.is_nan() || self.threshold <= 0.0;
        if disabled || !distance.is_finite() || distance <= self.threshold {
            return 1.0;
        }
        let t = ((distance - self.threshold) / self.threshold).clamp(0.0, 1.0);
        1.0 + (self.max_multiplier - 1.0) * t
    }
}

/// Zoom settings used while focused on a body. Distances scale with the body's radius, so small
/// bodies can be inspected from closer.
#[derive(Debug, Clone, Reflect)]
pub struct FocusZoomSettings {
    /// Closest distance to the body's center, in body radii.
    pub min_radius_factor: f32,
    /// Farthest distance from the body's center, in body radii.
    pub max_radius_factor: f32,
    /// Distance in scene units covered by one zoom step.
    pub step_size: f32,
    /// Extra multiplier on the step for stars, which are much larger than anything orbiting them.
    pub star_step_multiplier: f32,
    /// Zoom applied every time a body is focused.
    pub default_normalized: f32,
}

impl Default for FocusZoomSettings {
    fn default() -> Self {
        Self {
            min_radius_factor: 1.5,
            max_radius_factor: 40.0,
            step_size: 1.0,
            star_step_multiplier: 25.0,
            default_normalized: 0.15,
        }
    }
}

impl FocusZoomSettings {
    /// The `(min, max)` distance range for a body of the given radius.
    pub fn distance_range(&self, body_radius: f32) -> (f32, f32) {
        let radius = if body_radius.is_finite() {
            body_radius.max(f32::EPSILON)
        } else {
            f32::EPSILON
        };
        let min = radius * self.min_radius_factor.max(0.0);
        let max = (radius * self.max_radius_factor).max(min + MIN_RANGE);
        (min, max)
    }

    /// Normalized zoom change for a single step toward or away from `body`.
    pub fn step_increment(&self, body: &BodyView) -> f32 {
        let (min, max) = self.distance_range(body.radius);
        let increment = self.step_size / (max - min);
        if body.is_star {
            increment * self.star_step_multiplier
        } else {
            increment
        }
    }

    /// A fresh [`FocusZoom`] at the default distance.
    pub fn default_zoom(&self) -> FocusZoom {
        FocusZoom::new(self.default_normalized)
    }
}

/// Zoom state used while focused on a body.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct FocusZoom {
    normalized: f32,
}

impl Default for FocusZoom {
    fn default() -> Self {
        FocusZoomSettings::default().default_zoom()
    }
}

impl FocusZoom {
    /// Create a zoom state. The value is clamped to `[0, 1]`.
    pub fn new(normalized: f32) -> Self {
        Self {
            normalized: clamp_normalized(normalized),
        }
    }

    /// The current normalized zoom.
    pub fn normalized(&self) -> f32 {
        self.normalized
    }

    /// Apply `delta` steps of `increment` each.
    pub fn step(&mut self, delta: i32, increment: f32) {
        if !increment.is_finite() {
            return;
        }
        self.normalized = clamp_normalized(self.normalized + delta as f32 * increment);
    }

    /// The camera distance from the body's center.
    pub fn distance(&self, settings: &FocusZoomSettings, body_radius: f32) -> f32 {
        let (min, max) = settings.distance_range(body_radius);
        min + (max - min) * self.normalized
    }
}

/// Zoom settings used in overview mode, over a fixed, system-wide distance range.
#[derive(Debug, Clone, Reflect)]
pub struct OverviewZoomSettings {
    /// Closest distance to the overview anchor.
    pub min_distance: f32,
    /// Farthest distance from the overview anchor.
    pub max_distance: f32,
    /// Distance in scene units covered by one zoom step, before `speed` is applied.
    pub step_size: f32,
    /// Zooms faster when far from the anchor.
    pub speed: DistanceBoost,
    /// Zoom used when the overview is reset.
    pub default_normalized: f32,
}

impl Default for OverviewZoomSettings {
    fn default() -> Self {
        Self {
            min_distance: 150.0,
            max_distance: 6000.0,
            step_size: 150.0,
            speed: DistanceBoost {
                threshold: 2000.0,
                max_multiplier: 2.5,
            },
            default_normalized: 0.5,
        }
    }
}

impl OverviewZoomSettings {
    /// The `(min, max)` distance range, guarded against an empty or inverted range.
    pub fn distance_range(&self) -> (f32, f32) {
        let min = self.min_distance.max(0.0);
        (min, self.max_distance.max(min + MIN_RANGE))
    }

    /// Normalized zoom change for a single step when the camera is `distance` from the anchor.
    pub fn step_increment(&self, distance: f32) -> f32 {
        let (min, max) = self.distance_range();
        self.step_size / (max - min) * self.speed.multiplier(distance)
    }

    /// A fresh [`OverviewZoom`] at the default distance.
    pub fn default_zoom(&self) -> OverviewZoom {
        OverviewZoom::new(self.default_normalized)
    }
}

/// Zoom state used in overview mode.
///
/// Besides the clamped reading, this tracks the net number of steps applied since the last reset.
/// That count is unbounded; stepping past a limit still counts, but never moves the camera.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct OverviewZoom {
    normalized: f32,
    accumulated: i64,
}

impl Default for OverviewZoom {
    fn default() -> Self {
        OverviewZoomSettings::default().default_zoom()
    }
}

impl OverviewZoom {
    /// Create a zoom state. The value is clamped to `[0, 1]`.
    pub fn new(normalized: f32) -> Self {
        Self {
            normalized: clamp_normalized(normalized),
            accumulated: 0,
        }
    }

    /// The zoom that places the camera `distance` away from the anchor.
    pub fn from_distance(settings: &OverviewZoomSettings, distance: f32) -> Self {
        let (min, max) = settings.distance_range();
        Self::new((distance - min) / (max - min))
    }

    /// The current normalized zoom.
    pub fn normalized(&self) -> f32 {
        self.normalized
    }

    /// Net steps applied since this state was created.
    pub fn accumulated(&self) -> i64 {
        self.accumulated
    }

    /// Apply `delta` steps of `increment` each.
    pub fn step(&mut self, delta: i32, increment: f32) {
        if !increment.is_finite() {
            return;
        }
        self.accumulated = self.accumulated.saturating_add(delta as i64);
        self.normalized = clamp_normalized(self.normalized + delta as f32 * increment);
    }

    /// The camera distance from the overview anchor.
    pub fn distance(&self, settings: &OverviewZoomSettings) -> f32 {
        let (min, max) = settings.distance_range();
        min + (max - min) * self.normalized
    }
}

#[cfg(test)]
mod tests {
    use bevy_math::Vec3;

    use super::*;

    #[test]
    fn boost_ramps_then_holds() {
        let boost = DistanceBoost {
            threshold: 100.0,
            max_multiplier: 3.0,
        };
        assert_eq!(boost.multiplier(50.0), 1.0);
        assert_eq!(boost.multiplier(100.0), 1.0);
        assert!((boost.multiplier(150.0) - 2.0).abs() < 1e-6);
        assert!((boost.multiplier(200.0) - 3.0).abs() < 1e-6);
        assert!((boost.multiplier(10_000.0) - 3.0).abs() < 1e-6);
        assert_eq!(boost.multiplier(f32::NAN), 1.0);
        assert_eq!(DistanceBoost::NONE.multiplier(1e30), 1.0);

        for threshold in [0.0, -5.0, f32::NAN] {
            let boost = DistanceBoost { threshold, ..boost };
            assert_eq!(boost.multiplier(1e6), 1.0);
        }
    }

    #[test]
    fn focus_range_scales_with_radius() {
        let settings = FocusZoomSettings::default();
        let (moon_min, moon_max) = settings.distance_range(0.2);
        let (sun_min, sun_max) = settings.distance_range(70.0);
        assert!(moon_min < sun_min);
        assert!(moon_max < sun_max);
        assert!((moon_min - 0.3).abs() < 1e-6);

        let (min, max) = settings.distance_range(0.0);
        assert!(max > min);
        let (min, max) = settings.distance_range(f32::NAN);
        assert!(min.is_finite() && max > min);
    }

    #[test]
    fn stars_step_faster() {
        let settings = FocusZoomSettings::default();
        let planet = BodyView {
            position: Vec3::ZERO,
            radius: 70.0,
            is_star: false,
        };
        let star = BodyView {
            is_star: true,
            ..planet
        };
        let ratio = settings.step_increment(&star) / settings.step_increment(&planet);
        assert!((ratio - settings.star_step_multiplier).abs() < 1e-3);
    }

    #[test]
    fn focus_zoom_is_clamped() {
        let mut zoom = FocusZoom::new(0.9);
        zoom.step(5, 0.1);
        assert_eq!(zoom.normalized(), 1.0);
        zoom.step(-100, 0.1);
        assert_eq!(zoom.normalized(), 0.0);
        zoom.step(1, f32::INFINITY);
        assert_eq!(zoom.normalized(), 0.0);
        assert_eq!(FocusZoom::new(f32::NAN).normalized(), 0.0);
        assert_eq!(FocusZoom::new(7.0).normalized(), 1.0);
    }

    #[test]
    fn overview_zoom_accumulates_past_limits() {
        let mut zoom = OverviewZoom::new(0.95);
        zoom.step(3, 0.1);
        assert_eq!(zoom.normalized(), 1.0);
        assert_eq!(zoom.accumulated(), 3);
        zoom.step(-1, 0.1);
        assert!((zoom.normalized() - 0.9).abs() < 1e-6);
        assert_eq!(zoom.accumulated(), 2);
    }

    #[test]
    fn overview_distance_round_trips() {
        let settings = OverviewZoomSettings::default();
        let zoom = OverviewZoom::from_distance(&settings, 1000.0);
        assert!((zoom.distance(&settings) - 1000.0).abs() < 1e-2);
        assert_eq!(OverviewZoom::from_distance(&settings, 1e9).normalized(), 1.0);
        assert_eq!(OverviewZoom::from_distance(&settings, 0.0).normalized(), 0.0);
    }
}
