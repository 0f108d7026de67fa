//! Camera input events, and a default mapping from mouse, keyboard, and touch devices to them.
//!
//! The controller never polls devices. Everything it reacts to arrives as a [`CameraInput`] event,
//! so apps can drive the camera from their own bindings, UI buttons, or scripts, and leave
//! [`SolarCamInputPlugin`] out entirely.

use bevy_app::prelude::*;
use bevy_ecs::prelude::*;
use bevy_input::{
    mouse::{AccumulatedMouseMotion, MouseWheel},
    prelude::*,
    touch::Touches,
    InputSystem,
};
use bevy_math::prelude::*;
use bevy_picking::pointer::PointerId;
use bevy_reflect::prelude::*;
use bevy_window::{PrimaryWindow, Window};

use crate::registry::BodyId;

/// A discrete request to the camera controller.
#[derive(Debug, Clone, PartialEq, Event)]
pub enum CameraInput {
    /// Orbit around the current target. `x` turns yaw, `y` turns pitch. Expected to be roughly
    /// unit length; longer vectors are shortened to unit length.
    OrbitStep(Vec2),
    /// Zoom by this many steps. Positive moves away from the target.
    ZoomStep(i32),
    /// A pointer was pressed at `position`, in logical viewport pixels.
    PointerDown {
        /// Where the pointer was pressed.
        position: Vec2,
        /// Which pointer was pressed.
        pointer: PointerId,
        /// Was the pointer over UI when pressed?
        over_ui: bool,
    },
    /// Transition to focus on a body.
    FocusRequest(BodyId),
    /// Transition back to the system overview.
    ReturnToOverview,
}

/// Set by the app's UI layer while the pointer hovers UI, so clicks on UI don't select bodies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Resource, Reflect)]
pub struct PointerOverUi(pub bool);

/// Tunes the default device mapping.
#[derive(Debug, Clone, Resource, Reflect)]
pub struct InputSettings {
    /// Mouse motion, in logical pixels per frame, below which a right-drag doesn't orbit.
    pub drag_deadzone: f32,
    /// Map arrow keys, WASD, `=`/`-`, Escape and Home.
    pub keyboard: bool,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            drag_deadzone: 0.5,
            keyboard: true,
        }
    }
}

/// Maps mouse, keyboard, and touch input to [`CameraInput`] events.
pub struct SolarCamInputPlugin;

impl Plugin for SolarCamInputPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<CameraInput>()
            .init_resource::<InputSettings>()
            .init_resource::<PointerOverUi>()
            .add_systems(
                PreUpdate,
                (keyboard_inputs, mouse_inputs, touch_inputs).after(InputSystem),
            )
            .register_type::<InputSettings>()
            .register_type::<PointerOverUi>();
    }
}

/// Arrow keys and WASD orbit, `=`/`-` zoom, Escape or Home return to the overview.
pub fn keyboard_inputs(
    keys: Res<ButtonInput<KeyCode>>,
    settings: Res<InputSettings>,
    mut inputs: EventWriter<CameraInput>,
) {
    if !settings.keyboard {
        return;
    }
    let axis = |negative: [KeyCode; 2], positive: [KeyCode; 2]| {
        let pressed = |codes: [KeyCode; 2]| codes.iter().any(|code| keys.pressed(*code));
        pressed(positive) as i32 as f32 - pressed(negative) as i32 as f32
    };
    let direction = Vec2::new(
        axis(
            [KeyCode::ArrowLeft, KeyCode::KeyA],
            [KeyCode::ArrowRight, KeyCode::KeyD],
        ),
        axis(
            [KeyCode::ArrowDown, KeyCode::KeyS],
            [KeyCode::ArrowUp, KeyCode::KeyW],
        ),
    );
    if direction != Vec2::ZERO {
        inputs.write(CameraInput::OrbitStep(direction.normalize()));
    }

    if keys.any_just_pressed([KeyCode::Equal, KeyCode::NumpadAdd]) {
        inputs.write(CameraInput::ZoomStep(-1));
    }
    if keys.any_just_pressed([KeyCode::Minus, KeyCode::NumpadSubtract]) {
        inputs.write(CameraInput::ZoomStep(1));
    }
    if keys.any_just_pressed([KeyCode::Escape, KeyCode::Home]) {
        inputs.write(CameraInput::ReturnToOverview);
    }
}

/// Right-drag orbits, the wheel zooms, and a left click selects.
pub fn mouse_inputs(
    buttons: Res<ButtonInput<MouseButton>>,
    motion: Res<AccumulatedMouseMotion>,
    mut wheel: EventReader<MouseWheel>,
    windows: Query<&Window, With<PrimaryWindow>>,
    over_ui: Res<PointerOverUi>,
    settings: Res<InputSettings>,
    mut inputs: EventWriter<CameraInput>,
) {
    if buttons.pressed(MouseButton::Right) && motion.delta.length() > settings.drag_deadzone {
        // Dragging right should swing the camera left around the target, like grabbing the scene.
        let drag = Vec2::new(-motion.delta.x, motion.delta.y);
        inputs.write(CameraInput::OrbitStep(drag.normalize()));
    }

    for event in wheel.read() {
        if event.y > 0.0 {
            inputs.write(CameraInput::ZoomStep(-1));
        } else if event.y < 0.0 {
            inputs.write(CameraInput::ZoomStep(1));
        }
    }

    if buttons.just_pressed(MouseButton::Left) {
        let Some(position) = windows
            .single()
            .ok()
            .and_then(|window| window.cursor_position())
        else {
            return;
        };
        inputs.write(CameraInput::PointerDown {
            position,
            pointer: PointerId::Mouse,
            over_ui: over_ui.0,
        });
    }
}

/// Every new touch is a pointer press.
pub fn touch_inputs(
    touches: Res<Touches>,
    over_ui: Res<PointerOverUi>,
    mut inputs: EventWriter<CameraInput>,
) {
    for touch in touches.iter_just_pressed() {
        inputs.write(CameraInput::PointerDown {
            position: touch.position(),
            pointer: PointerId::Touch(touch.id()),
            over_ui: over_ui.0,
        });
    }
}
