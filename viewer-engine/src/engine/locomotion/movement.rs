use bevy::prelude::*;

use crate::engine::scene::rig::ViewerRig;

/// Walking speed, metres per second.
pub const MOVE_SPEED: f32 = 1.8;

/// Per-axis deadzone below which stick input is treated as zero.
pub const STICK_DEADZONE: f32 = 0.15;

/// Delta-time clamp so a stalled frame (tab switch, long GC pause on
/// the asset thread) cannot teleport the rig.
pub const MAX_FRAME_DELTA: f32 = 0.05;

/// Move the rig from thumbstick input, with a keyboard fallback for
/// desktop use.
pub fn rig_locomotion(
    time: Res<Time>,
    gamepads: Query<&Gamepad>,
    keyboard: Res<ButtonInput<KeyCode>>,
    cameras: Query<&GlobalTransform, With<Camera3d>>,
    mut rigs: Query<&mut Transform, With<ViewerRig>>,
) {
    let dt = time.delta_secs().min(MAX_FRAME_DELTA);
    let Ok(camera) = cameras.single() else {
        return;
    };
    let Ok(mut rig) = rigs.single_mut() else {
        return;
    };

    let mut input = thumbstick_input(&gamepads);
    if input == Vec2::ZERO {
        input = keyboard_input(&keyboard);
    }
    if input == Vec2::ZERO {
        return;
    }

    let Some(forward) = horizontal_forward(camera) else {
        return;
    };
    let right = forward.cross(Vec3::Y).normalize();

    // Ground-plane displacement only; grounding handles height.
    rig.translation += (right * input.x + forward * input.y) * (MOVE_SPEED * dt);
}

/// Read the first input source offering usable axes. Some devices
/// report the thumbstick on the left pair, some on the right; the
/// pair with the larger combined magnitude is the intended stick.
fn thumbstick_input(gamepads: &Query<&Gamepad>) -> Vec2 {
    let Some(gamepad) = gamepads.iter().next() else {
        return Vec2::ZERO;
    };
    let left = Vec2::new(
        gamepad.get(GamepadAxis::LeftStickX).unwrap_or(0.0),
        gamepad.get(GamepadAxis::LeftStickY).unwrap_or(0.0),
    );
    let right = Vec2::new(
        gamepad.get(GamepadAxis::RightStickX).unwrap_or(0.0),
        gamepad.get(GamepadAxis::RightStickY).unwrap_or(0.0),
    );
    apply_deadzone(pick_axis_pair(left, right), STICK_DEADZONE)
}

fn keyboard_input(keyboard: &ButtonInput<KeyCode>) -> Vec2 {
    let mut input = Vec2::ZERO;
    if keyboard.pressed(KeyCode::KeyW) {
        input.y += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyS) {
        input.y -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyD) {
        input.x += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyA) {
        input.x -= 1.0;
    }
    input.normalize_or_zero()
}

/// Pick whichever candidate axis pair carries the larger combined
/// magnitude.
pub(crate) fn pick_axis_pair(primary: Vec2, secondary: Vec2) -> Vec2 {
    let primary_magnitude = primary.x.abs() + primary.y.abs();
    let secondary_magnitude = secondary.x.abs() + secondary.y.abs();
    if secondary_magnitude > primary_magnitude {
        secondary
    } else {
        primary
    }
}

pub(crate) fn apply_deadzone(input: Vec2, deadzone: f32) -> Vec2 {
    Vec2::new(
        if input.x.abs() > deadzone { input.x } else { 0.0 },
        if input.y.abs() > deadzone { input.y } else { 0.0 },
    )
}

/// Camera view direction flattened into the ground plane. `None` when
/// the camera looks straight up or down.
pub(crate) fn horizontal_forward(camera: &GlobalTransform) -> Option<Vec3> {
    let forward = camera.forward();
    let flat = Vec3::new(forward.x, 0.0, forward.z);
    (flat.length_squared() > 1e-6).then(|| flat.normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn larger_magnitude_pair_wins() {
        let left = Vec2::new(0.1, 0.0);
        let right = Vec2::new(0.0, 0.9);
        assert_eq!(pick_axis_pair(left, right), right);
        assert_eq!(pick_axis_pair(right, left), right);
    }

    #[test]
    fn equal_pairs_prefer_the_primary() {
        let pair = Vec2::new(0.5, 0.5);
        assert_eq!(pick_axis_pair(pair, pair), pair);
    }

    #[test]
    fn deadzone_zeroes_each_axis_independently() {
        let input = Vec2::new(0.1, 0.6);
        assert_eq!(apply_deadzone(input, 0.15), Vec2::new(0.0, 0.6));
        assert_eq!(apply_deadzone(Vec2::new(0.05, 0.1), 0.15), Vec2::ZERO);
    }

    #[test]
    fn forward_is_flattened_and_normalized() {
        // Looking down negative Z, pitched 45 degrees towards the floor.
        let transform = Transform::from_rotation(Quat::from_rotation_x(-FRAC_PI_2 * 0.5));
        let forward = horizontal_forward(&GlobalTransform::from(transform)).unwrap();
        assert!((forward - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn straight_down_view_yields_no_forward() {
        let transform = Transform::from_rotation(Quat::from_rotation_x(-FRAC_PI_2));
        assert!(horizontal_forward(&GlobalTransform::from(transform)).is_none());
    }
}
