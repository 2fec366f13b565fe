use serde::{Deserialize, Serialize};

use super::model::INPUT_THRESHOLD;

/// Normalized two-axis reading of a stick or d-pad.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Axis2 {
    pub x: f32,
    pub y: f32,
}
impl Axis2 {
    pub fn new(x: f32, y: f32) -> Axis2 {
        Axis2 { x, y }
    }
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

pub fn pressed(reading: f32) -> bool {
    reading > INPUT_THRESHOLD
}

/// One tick of controller readings. Controller 1 drives, controller 2 runs the arm,
/// extension and claw.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct InputFrame {
    pub left_stick_1: Axis2,
    pub right_stick_1: Axis2,
    pub left_bumper_1: f32,
    pub right_bumper_1: f32,
    pub dpad_1: Axis2,
    pub left_stick_2: Axis2,
    pub right_stick_2: Axis2,
    pub x_button_2: f32,
    pub a_button_2: f32,
    pub left_trigger_2: f32,
    pub right_trigger_2: f32,
}
impl InputFrame {
    pub fn idle() -> InputFrame {
        InputFrame::default()
    }
    pub fn close_claw(&self) -> bool {
        pressed(self.a_button_2)
    }
    pub fn open_claw(&self) -> bool {
        pressed(self.x_button_2)
    }
}
