//! Keyboard bindings for camera navigation.

use ember_renderer::InputState;
use std::collections::HashSet;
use winit::keyboard::KeyCode;

pub const TOGGLE_MOVEMENT: KeyCode = KeyCode::Space;
pub const RESET: KeyCode = KeyCode::KeyR;
pub const TOGGLE_UI: KeyCode = KeyCode::F1;

/// Refresh the level-triggered movement fields from the keys held down.
pub fn apply_held(input: &mut InputState, held: &HashSet<KeyCode>) {
    input.forward = held.contains(&KeyCode::KeyW);
    input.backward = held.contains(&KeyCode::KeyS);
    input.left = held.contains(&KeyCode::KeyA);
    input.right = held.contains(&KeyCode::KeyD);
    input.up = held.contains(&KeyCode::KeyE);
    input.down = held.contains(&KeyCode::KeyQ);
    input.sprint = held.contains(&KeyCode::ShiftLeft);
}

/// Record a key going down (auto-repeat excluded). Edge-triggered actions
/// stay set until [`InputState::end_frame`].
pub fn apply_press(input: &mut InputState, key: KeyCode) {
    match key {
        TOGGLE_MOVEMENT => input.toggle_movement = true,
        RESET => input.reset = true,
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_math::Vec2;

    #[test]
    fn test_held_keys_map_to_movement() {
        let held: HashSet<_> = [KeyCode::KeyW, KeyCode::KeyQ, KeyCode::ShiftLeft].into_iter().collect();
        let mut input = InputState::default();
        apply_held(&mut input, &held);
        assert!(input.forward && input.down && input.sprint);
        assert!(!input.backward && !input.up);
        assert!(input.has_movement());
        assert!(!input.toggle_movement && !input.reset);

        apply_held(&mut input, &HashSet::new());
        assert!(!input.has_movement());
    }

    #[test]
    fn test_presses_last_one_frame() {
        let mut input = InputState::default();
        apply_press(&mut input, TOGGLE_MOVEMENT);
        apply_press(&mut input, RESET);
        apply_press(&mut input, KeyCode::KeyW);
        input.mouse_delta += Vec2::new(4.0, -1.0);
        assert!(input.toggle_movement && input.reset);
        assert!(!input.forward);

        input.end_frame();
        assert!(!input.toggle_movement && !input.reset);
        assert_eq!(input.mouse_delta, Vec2::ZERO);
    }
}
