//! Turns pointer presses into focus requests.
//!
//! A press casts a sphere from the camera through the pointer. The nearest [`Selectable`] collider
//! it touches is resolved to the [`CelestialBody`] that owns it, walking up the [`ChildOf`]
//! hierarchy, and that body becomes the new focus target.

use bevy_ecs::{prelude::*, system::SystemParam};
use bevy_log::prelude::*;
use bevy_math::{
    bounding::{BoundingSphere, RayCast3d},
    prelude::*,
};
use bevy_picking::pointer::PointerId;
use bevy_platform::collections::HashSet;
use bevy_reflect::prelude::*;
use bevy_render::prelude::*;
use bevy_transform::prelude::*;

use crate::{
    controller::{component::SolarCam, inputs::CameraInput},
    registry::{BodyId, CelestialBody},
};

/// Guards against cycles when walking up a malformed hierarchy.
const MAX_HIERARCHY_DEPTH: usize = 64;

/// A bitmask of selection layers. A collider can be hit when its layers intersect the layers the
/// cast is looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub struct SelectionLayers(pub u32);

impl SelectionLayers {
    /// The layer colliders are on unless told otherwise.
    pub const DEFAULT: Self = Self(1);
    /// Every layer.
    pub const ALL: Self = Self(u32::MAX);
    /// No layer.
    pub const NONE: Self = Self(0);

    /// Do the two masks share a layer?
    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for SelectionLayers {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A spherical collider that pointer selection can hit. Place it on a body, or on any descendant
/// of one, e.g. an oversized pick proxy around a tiny moon.
#[derive(Debug, Clone, Component, Reflect)]
pub struct Selectable {
    /// Collider radius in local units, scaled by the entity's largest global scale axis.
    pub radius: f32,
    /// Layers this collider belongs to.
    pub layers: SelectionLayers,
    /// Trigger-only geometry never blocks or receives a selection.
    pub is_trigger: bool,
}

impl Selectable {
    /// A collider on the default layer.
    pub fn sphere(radius: f32) -> Self {
        Self {
            radius,
            layers: SelectionLayers::DEFAULT,
            is_trigger: false,
        }
    }
}

/// Pointer selection settings.
#[derive(Debug, Clone, Reflect)]
pub struct SelectionSettings {
    /// Should pointer presses select bodies at all?
    pub enabled: bool,
    /// Ignore presses while the pointer is over UI.
    pub ignore_over_ui: bool,
    /// Focus the camera on the selected body.
    pub focus_on_select: bool,
    /// Radius of the cast sphere. Makes small bodies easier to hit.
    pub cast_radius: f32,
    /// Farthest distance from the camera a hit may be.
    pub max_distance: f32,
    /// Only colliders on these layers can be hit.
    pub layers: SelectionLayers,
}

impl Default for SelectionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ignore_over_ui: true,
            focus_on_select: true,
            cast_radius: 0.5,
            max_distance: 100_000.0,
            layers: SelectionLayers::ALL,
        }
    }
}

/// The closest collider struck by a cast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CastHit {
    /// The collider entity.
    pub entity: Entity,
    /// Distance along the ray to the hit.
    pub distance: f32,
}

/// Casts a sphere of `settings.cast_radius` along `ray` and returns the nearest collider hit.
///
/// Sweeping a sphere against a sphere is the same as casting a ray against a sphere with both radii
/// added together, which is what this does.
pub fn sphere_cast<'a>(
    ray: Ray3d,
    colliders: impl IntoIterator<Item = (Entity, Vec3, &'a Selectable)>,
    settings: &SelectionSettings,
) -> Option<CastHit> {
    let cast = RayCast3d::from_ray(ray, settings.max_distance.max(0.0));
    let cast_radius = settings.cast_radius.max(0.0);
    colliders
        .into_iter()
        .filter(|(_, _, collider)| !collider.is_trigger)
        .filter(|(_, _, collider)| collider.layers.intersects(settings.layers))
        .filter_map(|(entity, center, collider)| {
            let radius = collider.radius.max(0.0) + cast_radius;
            let sphere = BoundingSphere::new(center, radius);
            let distance = cast.sphere_intersection_at(&sphere)?;
            Some(CastHit { entity, distance })
        })
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

/// Walks from `entity` up through its parents until an entity that is a body is found.
pub fn owning_body(
    entity: Entity,
    parent_of: impl Fn(Entity) -> Option<Entity>,
    body_of: impl Fn(Entity) -> Option<BodyId>,
) -> Option<BodyId> {
    let mut current = entity;
    for _ in 0..MAX_HIERARCHY_DEPTH {
        if let Some(id) = body_of(current) {
            return Some(id);
        }
        current = parent_of(current)?;
    }
    None
}

/// What a pick under the pointer found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickOutcome {
    /// A collider owned by this body.
    Body(BodyId),
    /// A collider that does not belong to any body.
    Unowned(Entity),
    /// Nothing.
    Miss,
}

/// Resolves a screen position into whatever body is under it.
pub trait BodyPicker {
    /// Pick at `screen_position`, in logical viewport pixels.
    fn pick(&self, screen_position: Vec2, settings: &SelectionSettings) -> PickOutcome;
}

/// A picker that never hits anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPicker;

impl BodyPicker for NoPicker {
    fn pick(&self, _: Vec2, _: &SelectionSettings) -> PickOutcome {
        PickOutcome::Miss
    }
}

/// What happened to a single pointer press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// Selection is turned off.
    Disabled,
    /// The pointer was over UI.
    OverUi,
    /// This pointer already pressed earlier in the frame.
    Duplicate,
    /// A body was selected.
    Selected(BodyId),
    /// Something was hit, but it is not part of a body.
    Unowned(Entity),
    /// Nothing was hit.
    Miss,
}

/// Evaluate one pointer press.
pub fn resolve_press(
    position: Vec2,
    over_ui: bool,
    picker: &impl BodyPicker,
    settings: &SelectionSettings,
) -> SelectionOutcome {
    if !settings.enabled {
        return SelectionOutcome::Disabled;
    }
    if over_ui && settings.ignore_over_ui {
        return SelectionOutcome::OverUi;
    }
    match picker.pick(position, settings) {
        PickOutcome::Body(id) => SelectionOutcome::Selected(id),
        PickOutcome::Unowned(entity) => SelectionOutcome::Unowned(entity),
        PickOutcome::Miss => SelectionOutcome::Miss,
    }
}

/// Evaluates every pointer press in a frame's inputs and picks the one that should trigger a focus
/// request, as `(index into inputs, body)`.
///
/// Each pointer id is considered once per frame. When several presses select a body, the last one
/// wins.
pub fn resolve_frame_selection(
    inputs: &[CameraInput],
    picker: &impl BodyPicker,
    settings: &SelectionSettings,
) -> Option<(usize, BodyId)> {
    let mut seen = HashSet::<PointerId>::default();
    let mut selected = None;
    for (index, input) in inputs.iter().enumerate() {
        let CameraInput::PointerDown {
            position,
            pointer,
            over_ui,
        } = input
        else {
            continue;
        };
        let outcome = if seen.insert(*pointer) {
            resolve_press(*position, *over_ui, picker, settings)
        } else {
            SelectionOutcome::Duplicate
        };
        match outcome {
            SelectionOutcome::Selected(id) => {
                info!("Selected body `{id}` with {pointer:?}");
                if settings.focus_on_select {
                    selected = Some((index, id));
                }
            }
            SelectionOutcome::Unowned(entity) => {
                info!("Selection hit {entity}, which is not part of any body");
            }
            SelectionOutcome::Miss => debug!("Selection at {position} hit nothing"),
            SelectionOutcome::OverUi | SelectionOutcome::Duplicate | SelectionOutcome::Disabled => {
                debug!("Ignored press from {pointer:?}: {outcome:?}");
            }
        }
    }
    selected
}

/// The queries needed to pick bodies in the world.
#[derive(SystemParam)]
pub struct SelectionQueries<'w, 's> {
    colliders: Query<
        'w,
        's,
        (Entity, &'static Selectable, &'static GlobalTransform),
        Without<SolarCam>,
    >,
    parents: Query<'w, 's, &'static ChildOf>,
    bodies: Query<'w, 's, &'static CelestialBody>,
}

/// A [`BodyPicker`] that casts from a camera against the [`Selectable`] entities in the world.
pub struct WorldPicker<'a, 'w, 's> {
    queries: &'a SelectionQueries<'w, 's>,
    camera: Option<(&'a Camera, &'a GlobalTransform)>,
}

impl<'a, 'w, 's> WorldPicker<'a, 'w, 's> {
    /// Pick through `camera`. Without a camera, every pick misses.
    pub fn new(
        queries: &'a SelectionQueries<'w, 's>,
        camera: Option<(&'a Camera, &'a GlobalTransform)>,
    ) -> Self {
        Self { queries, camera }
    }
}

impl BodyPicker for WorldPicker<'_, '_, '_> {
    fn pick(&self, screen_position: Vec2, settings: &SelectionSettings) -> PickOutcome {
        let Some((camera, camera_transform)) = self.camera else {
            debug!("No render camera to pick with");
            return PickOutcome::Miss;
        };
        let ray = match camera.viewport_to_world(camera_transform, screen_position) {
            Ok(ray) => ray,
            Err(error) => {
                debug!("Cannot pick at {screen_position}: {error:?}");
                return PickOutcome::Miss;
            }
        };
        let colliders = self
            .queries
            .colliders
            .iter()
            .map(|(entity, collider, transform)| {
                let (scale, _, center) = transform.to_scale_rotation_translation();
                let scaled = Selectable {
                    radius: collider.radius * scale.abs().max_element(),
                    ..collider.clone()
                };
                (entity, center, scaled)
            })
            .collect::<Vec<_>>();
        let candidates = colliders
            .iter()
            .map(|(entity, center, collider)| (*entity, *center, collider));
        let Some(hit) = sphere_cast(ray, candidates, settings) else {
            return PickOutcome::Miss;
        };
        let parent_of = |entity| self.queries.parents.get(entity).ok().map(ChildOf::parent);
        let body_of = |entity| {
            let body = self.queries.bodies.get(entity).ok()?;
            Some(body.id.clone())
        };
        let owner = owning_body(hit.entity, parent_of, body_of);
        owner.map_or(PickOutcome::Unowned(hit.entity), PickOutcome::Body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ray_down_z() -> Ray3d {
        Ray3d::new(Vec3::new(0.0, 0.0, 100.0), Dir3::NEG_Z)
    }

    fn entity(index: u32) -> Entity {
        Entity::from_raw(index)
    }

    #[test]
    fn nearest_collider_wins() {
        let near = Selectable::sphere(1.0);
        let far = Selectable::sphere(5.0);
        let colliders = [
            (entity(1), Vec3::new(0.0, 0.0, -50.0), &far),
            (entity(2), Vec3::new(0.0, 0.0, 20.0), &near),
        ];
        let settings = SelectionSettings::default();
        let hit = sphere_cast(ray_down_z(), colliders, &settings).unwrap();
        assert_eq!(hit.entity, entity(2));
        assert!((hit.distance - (80.0 - 1.5)).abs() < 1e-3);
    }

    #[test]
    fn cast_radius_widens_the_ray() {
        let small = Selectable::sphere(0.1);
        let colliders = [(entity(1), Vec3::new(2.0, 0.0, 0.0), &small)];
        let thin = SelectionSettings {
            cast_radius: 0.0,
            ..Default::default()
        };
        assert_eq!(sphere_cast(ray_down_z(), colliders, &thin), None);
        let wide = SelectionSettings {
            cast_radius: 2.5,
            ..Default::default()
        };
        assert!(sphere_cast(ray_down_z(), colliders, &wide).is_some());
    }

    #[test]
    fn triggers_layers_and_range_are_respected() {
        let trigger = Selectable {
            is_trigger: true,
            ..Selectable::sphere(5.0)
        };
        let other_layer = Selectable {
            layers: SelectionLayers(0b10),
            ..Selectable::sphere(5.0)
        };
        let settings = SelectionSettings {
            layers: SelectionLayers::DEFAULT,
            ..Default::default()
        };
        for collider in [&trigger, &other_layer] {
            let colliders = [(entity(1), Vec3::ZERO, collider)];
            assert_eq!(sphere_cast(ray_down_z(), colliders, &settings), None);
        }

        let body = Selectable::sphere(1.0);
        let short = SelectionSettings {
            max_distance: 10.0,
            ..Default::default()
        };
        assert_eq!(
            sphere_cast(ray_down_z(), [(entity(1), Vec3::ZERO, &body)], &short),
            None
        );
    }

    #[test]
    fn walks_up_to_owning_body() {
        // 3 -> 2 -> 1, where 1 is the body.
        let parent_of = |e: Entity| match e.index() {
            3 => Some(entity(2)),
            2 => Some(entity(1)),
            _ => None,
        };
        let body_of = |e: Entity| (e.index() == 1).then(|| BodyId::new("Earth"));
        assert_eq!(owning_body(entity(3), parent_of, body_of), Some("earth".into()));
        assert_eq!(owning_body(entity(7), parent_of, body_of), None);

        let cyclic = |e: Entity| Some(e);
        assert_eq!(owning_body(entity(3), cyclic, |_| None), None);
    }

    struct FixedPicker(PickOutcome);

    impl BodyPicker for FixedPicker {
        fn pick(&self, _: Vec2, _: &SelectionSettings) -> PickOutcome {
            self.0.clone()
        }
    }

    fn press(pointer: PointerId, over_ui: bool) -> CameraInput {
        CameraInput::PointerDown {
            position: Vec2::new(400.0, 300.0),
            pointer,
            over_ui,
        }
    }

    #[test]
    fn ui_and_disabled_presses_are_ignored() {
        let picker = FixedPicker(PickOutcome::Body("earth".into()));
        let settings = SelectionSettings::default();
        assert_eq!(
            resolve_press(Vec2::ZERO, true, &picker, &settings),
            SelectionOutcome::OverUi
        );
        let through_ui = SelectionSettings {
            ignore_over_ui: false,
            ..Default::default()
        };
        assert_eq!(
            resolve_press(Vec2::ZERO, true, &picker, &through_ui),
            SelectionOutcome::Selected("earth".into())
        );
        let disabled = SelectionSettings {
            enabled: false,
            ..Default::default()
        };
        assert_eq!(
            resolve_press(Vec2::ZERO, false, &picker, &disabled),
            SelectionOutcome::Disabled
        );
    }

    #[test]
    fn last_resolving_press_wins() {
        let picker = FixedPicker(PickOutcome::Body("mars".into()));
        let inputs = [
            press(PointerId::Touch(1), false),
            CameraInput::ZoomStep(1),
            press(PointerId::Touch(2), false),
            press(PointerId::Touch(1), false),
            press(PointerId::Touch(3), true),
        ];
        let selected = resolve_frame_selection(&inputs, &picker, &SelectionSettings::default());
        assert_eq!(selected, Some((2, "mars".into())));
    }

    #[test]
    fn misses_and_unowned_hits_select_nothing() {
        let inputs = [press(PointerId::Mouse, false)];
        let settings = SelectionSettings::default();
        assert_eq!(resolve_frame_selection(&inputs, &NoPicker, &settings), None);
        let unowned = FixedPicker(PickOutcome::Unowned(entity(4)));
        assert_eq!(resolve_frame_selection(&inputs, &unowned, &settings), None);

        let no_focus = SelectionSettings {
            focus_on_select: false,
            ..Default::default()
        };
        let hit = FixedPicker(PickOutcome::Body("earth".into()));
        assert_eq!(resolve_frame_selection(&inputs, &hit, &no_focus), None);
    }
}
