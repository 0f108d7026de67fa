//! The set of bodies a [`SolarCam`](crate::controller::component::SolarCam) can look at.
//!
//! Body positions are owned by whatever propagates the simulation. The camera only ever reads them
//! through the [`SceneRegistry`] trait, either from a plain [`BodyRegistry`] or, inside an app,
//! from the [`BodyLookup`] system param which reads [`CelestialBody`] entities.

use std::fmt;

use bevy_derive::Deref;
use bevy_ecs::{prelude::*, system::SystemParam};
use bevy_log::prelude::*;
use bevy_math::prelude::*;
use bevy_platform::collections::HashMap;
use bevy_reflect::prelude::*;
use bevy_transform::prelude::*;

use crate::controller::component::SolarCam;

/// Case-insensitive identifier of a body, e.g. `"earth"`.
///
/// The identifier is lower-cased on construction, so
/// `BodyId::new("Earth") == BodyId::new("EARTH")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect)]
pub struct BodyId(String);

impl BodyId {
    /// Create a new identifier, normalizing its case.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_lowercase())
    }

    /// The normalized identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BodyId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for BodyId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Marks an entity as a body that can be focused. The body's world position is the translation of
/// its [`GlobalTransform`].
#[derive(Debug, Clone, Component, Reflect)]
#[require(Transform)]
pub struct CelestialBody {
    /// Unique identifier of the body.
    pub id: BodyId,
    /// Radius in scene units. Must be positive.
    pub radius: f32,
    /// Stars get coarser zoom steps, so the Sun doesn't need many more clicks than a moon.
    pub is_star: bool,
}

impl CelestialBody {
    /// A planet, moon, or any other non-star body.
    pub fn new(id: impl Into<BodyId>, radius: f32) -> Self {
        Self {
            id: id.into(),
            radius,
            is_star: false,
        }
    }

    /// A star.
    pub fn star(id: impl Into<BodyId>, radius: f32) -> Self {
        Self {
            is_star: true,
            ..Self::new(id, radius)
        }
    }
}

/// A read-only snapshot of a body at the time it was looked up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyView {
    /// Current world position.
    pub position: Vec3,
    /// Radius in scene units.
    pub radius: f32,
    /// See [`CelestialBody::is_star`].
    pub is_star: bool,
}

/// Read access to the bodies in the scene.
pub trait SceneRegistry {
    /// Find a body by identifier. Lookups are case-insensitive because [`BodyId`] is.
    fn lookup(&self, id: &BodyId) -> Option<BodyView>;

    /// The body's current world position, if it is registered.
    fn current_world_position(&self, id: &BodyId) -> Option<Vec3> {
        self.lookup(id).map(|body| body.position)
    }

    /// The body's radius, if it is registered.
    fn radius(&self, id: &BodyId) -> Option<f32> {
        self.lookup(id).map(|body| body.radius)
    }

    /// Is the body a star? Unregistered bodies are not.
    fn is_star(&self, id: &BodyId) -> bool {
        self.lookup(id).is_some_and(|body| body.is_star)
    }
}

/// A [`SceneRegistry`] that owns its bodies. Useful outside of an ECS world, and in tests.
#[derive(Debug, Clone, Default)]
pub struct BodyRegistry {
    bodies: HashMap<BodyId, BodyView>,
}

impl BodyRegistry {
    /// Register a body at the given position, replacing any body with the same identifier.
    pub fn insert(&mut self, body: CelestialBody, position: Vec3) -> &mut Self {
        self.bodies.insert(
            body.id,
            BodyView {
                position,
                radius: body.radius,
                is_star: body.is_star,
            },
        );
        self
    }

    /// Builder form of [`BodyRegistry::insert`].
    pub fn with(mut self, body: CelestialBody, position: Vec3) -> Self {
        self.insert(body, position);
        self
    }

    /// Move a registered body. Returns `false` if the body is unknown.
    pub fn set_position(&mut self, id: &BodyId, position: Vec3) -> bool {
        match self.bodies.get_mut(id) {
            Some(body) => {
                body.position = position;
                true
            }
            None => false,
        }
    }

    /// Number of registered bodies.
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Does the registry contain no bodies?
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

impl SceneRegistry for BodyRegistry {
    fn lookup(&self, id: &BodyId) -> Option<BodyView> {
        self.bodies.get(id).copied()
    }
}

/// Maps each [`BodyId`] to the entity carrying its [`CelestialBody`]. Maintained by
/// [`BodyIndex::index_new_bodies`]; bodies are never removed during a session.
#[derive(Debug, Default, Resource, Deref)]
pub struct BodyIndex(HashMap<BodyId, Entity>);

impl BodyIndex {
    /// Add newly spawned bodies to the index.
    pub fn index_new_bodies(
        mut index: ResMut<Self>,
        added: Query<(Entity, &CelestialBody), Added<CelestialBody>>,
    ) {
        for (entity, body) in &added {
            if body.radius <= 0.0 || !body.radius.is_finite() {
                warn!("Body `{}` has invalid radius {}", body.id, body.radius);
            }
            if let Some(previous) = index.0.insert(body.id.clone(), entity) {
                if previous != entity {
                    warn!(
                        "Body id `{}` is used by {previous} and {entity}; keeping {entity}",
                        body.id
                    );
                }
            }
        }
    }
}

/// A [`SceneRegistry`] over the [`CelestialBody`] entities in the world.
#[derive(SystemParam)]
pub struct BodyLookup<'w, 's> {
    index: Res<'w, BodyIndex>,
    bodies: Query<'w, 's, (&'static CelestialBody, &'static GlobalTransform), Without<SolarCam>>,
}

impl SceneRegistry for BodyLookup<'_, '_> {
    fn lookup(&self, id: &BodyId) -> Option<BodyView> {
        let entity = self.index.get(id)?;
        let (body, transform) = self.bodies.get(*entity).ok()?;
        Some(BodyView {
            position: transform.translation(),
            radius: body.radius,
            is_star: body.is_star,
        })
    }
}

/// Converts dataset radii, given in kilometers, into scene units.
///
/// Scenes are built with artistic compression, so the conversion has a global multiplier on top
/// of the kilometers-per-unit scale, and individual objects may rescale further.
#[derive(Debug, Clone, Copy, Reflect)]
pub struct VisualScale {
    /// Kilometers represented by one scene unit.
    pub km_per_unit: f64,
    /// Applied to every radius after unit conversion.
    pub radius_multiplier: f64,
}

impl Default for VisualScale {
    fn default() -> Self {
        Self {
            km_per_unit: 10_000.0,
            radius_multiplier: 1.0,
        }
    }
}

impl VisualScale {
    /// Radius in scene units for a body with the given mean radius in km. Returns `None` if the
    /// result would not be a positive, finite radius.
    pub fn scene_radius(&self, radius_km: f64, object_multiplier: Option<f64>) -> Option<f32> {
        let multiplier = self.radius_multiplier * object_multiplier.unwrap_or(1.0);
        let radius = radius_km / self.km_per_unit * multiplier;
        (radius.is_finite() && radius > 0.0).then_some(radius as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_case_insensitive() {
        assert_eq!(BodyId::new("Earth"), BodyId::new("EARTH"));
        assert_eq!(BodyId::from(" earth "), "earth".into());
        assert_eq!(BodyId::new("Earth").to_string(), "earth");
    }

    #[test]
    fn lookup_and_move() {
        let mut registry = BodyRegistry::default()
            .with(CelestialBody::star("Sun", 70.0), Vec3::ZERO)
            .with(CelestialBody::new("Earth", 0.6), Vec3::new(1500.0, 0.0, 0.0));

        let earth = registry.lookup(&"EARTH".into()).unwrap();
        assert_eq!(earth.position, Vec3::new(1500.0, 0.0, 0.0));
        assert!(!earth.is_star);
        assert!(registry.is_star(&"sun".into()));
        assert!(!registry.is_star(&"pluto".into()));
        assert_eq!(registry.radius(&"pluto".into()), None);

        assert!(registry.set_position(&"earth".into(), Vec3::Z));
        assert!(!registry.set_position(&"pluto".into(), Vec3::Z));
        assert_eq!(registry.current_world_position(&"Earth".into()), Some(Vec3::Z));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn visual_scale() {
        let scale = VisualScale::default();
        let earth = scale.scene_radius(6_371.0, None).unwrap();
        assert!((earth - 0.6371).abs() < 1e-6);
        let big_earth = scale.scene_radius(6_371.0, Some(10.0)).unwrap();
        assert!((big_earth - 6.371).abs() < 1e-5);
        assert_eq!(scale.scene_radius(0.0, None), None);
        let broken = VisualScale {
            km_per_unit: 0.0,
            ..Default::default()
        };
        assert_eq!(broken.scene_radius(6_371.0, None), None);
    }
}
