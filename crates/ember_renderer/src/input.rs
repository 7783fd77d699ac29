//! Per-frame input snapshot consumed by the camera and the scheduler.

use ember_math::Vec2;

/// Navigation input gathered by the windowing layer for one frame.
///
/// Movement fields are level-triggered (held keys). `toggle_movement` and
/// `reset` are edge-triggered: true only on the frame the key went down.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub sprint: bool,
    pub toggle_movement: bool,
    pub reset: bool,
    /// Cursor motion in pixels since the previous frame.
    pub mouse_delta: Vec2,
}

impl InputState {
    pub fn has_movement(&self) -> bool {
        self.forward || self.backward || self.left || self.right || self.up || self.down
    }

    /// Clear per-frame data once the frame has consumed it.
    pub fn end_frame(&mut self) {
        self.toggle_movement = false;
        self.reset = false;
        self.mouse_delta = Vec2::ZERO;
    }
}
