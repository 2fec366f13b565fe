use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::{ArmConfig, DrivetrainConfig, ExtensionConfig};
use super::input::{pressed, InputFrame};
use super::match_state::CameraView;
use super::model::{Seconds, INPUT_THRESHOLD};

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t.clamp(0.0, 1.0)
}

/// Planar chassis motion. `position` is `[x, z]` on the field, `heading` is yaw in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drivetrain {
    config: DrivetrainConfig,
    speed: f32,
    rotation_speed: f32,
    speed_scalar: f32,
    can_shift: bool,
    position: [f32; 2],
    heading: f32,
}

impl Drivetrain {
    pub fn new(config: DrivetrainConfig) -> Drivetrain {
        Drivetrain {
            config,
            speed: 0.0,
            rotation_speed: 0.0,
            speed_scalar: config.initial_speed_scalar,
            can_shift: true,
            position: [0.0, 0.0],
            heading: 0.0,
        }
    }
    pub fn speed(&self) -> f32 {
        self.speed
    }
    pub fn rotation_speed(&self) -> f32 {
        self.rotation_speed
    }
    pub fn speed_scalar(&self) -> f32 {
        self.speed_scalar
    }
    pub fn position(&self) -> [f32; 2] {
        self.position
    }
    pub fn heading(&self) -> f32 {
        self.heading
    }

    pub fn update(&mut self, input: &InputFrame, camera: CameraView, dt: Seconds) {
        let dt = dt as f32;
        self.translate(input, camera, dt);
        self.rotate(input, dt);
        self.shift(input);
    }

    fn translate(&mut self, input: &InputFrame, camera: CameraView, dt: f32) {
        let stick = input.left_stick_1;
        let mix = (stick.x.abs() + stick.y.abs()) / 2.0;
        self.speed = lerp(self.speed, self.config.max_speed * mix, self.config.pos_lerp);

        let forward = stick.x * self.speed * self.speed_scalar * dt;
        let right = stick.y * self.speed * self.speed_scalar * dt;
        let (dx, dz) = match camera {
            CameraView::TopDown => (right, -forward),
            _ => {
                let (sin, cos) = self.heading.to_radians().sin_cos();
                (forward * cos + right * sin, right * cos - forward * sin)
            }
        };
        self.position[0] += dx;
        self.position[1] += dz;
    }

    fn rotate(&mut self, input: &InputFrame, dt: f32) {
        let x = input.right_stick_1.x;
        self.rotation_speed = lerp(
            self.rotation_speed,
            self.config.max_rotation_speed * x.abs(),
            self.config.rot_lerp,
        );
        self.heading = (self.heading + x * self.rotation_speed * dt).rem_euclid(360.0);
    }

    /// One gear step per bumper press; both bumpers must be released before the next step.
    fn shift(&mut self, input: &InputFrame) {
        let jump = self.config.scalar_jumps;
        if pressed(input.right_bumper_1) {
            if self.can_shift && self.speed_scalar + jump <= 1.0 {
                self.speed_scalar += jump;
                self.can_shift = false;
                debug!(gear = self.speed_scalar, "shifted up");
            }
        } else if pressed(input.left_bumper_1) {
            if self.can_shift && self.speed_scalar - jump > 0.0 {
                self.speed_scalar -= jump;
                self.can_shift = false;
                debug!(gear = self.speed_scalar, "shifted down");
            }
        } else {
            self.can_shift = true;
        }
    }

    pub fn stop(&mut self) {
        self.speed = 0.0;
        self.rotation_speed = 0.0;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmLift {
    config: ArmConfig,
    angle: f32,
}

impl ArmLift {
    pub fn new(config: ArmConfig) -> ArmLift {
        ArmLift {
            config,
            angle: config.bottom,
        }
    }
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Right trigger lowers the arm, left trigger raises it.
    pub fn update(&mut self, input: &InputFrame, dt: Seconds) {
        let step = self.config.speed * dt as f32;
        if pressed(input.right_trigger_2) {
            self.angle = (self.angle - step).max(self.config.bottom);
        } else if pressed(input.left_trigger_2) {
            self.angle = (self.angle + step).min(self.config.top);
        }
    }
}

/// Telescoping bar measured in encoder ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extension {
    config: ExtensionConfig,
    ticks: f32,
    offset: f32,
}

impl Extension {
    pub fn new(config: ExtensionConfig) -> Extension {
        Extension {
            config,
            ticks: config.bottom,
            offset: 0.0,
        }
    }
    pub fn ticks(&self) -> f32 {
        self.ticks
    }
    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn update(&mut self, input: &InputFrame, dt: Seconds) {
        let dt = dt as f32;
        let y = input.right_stick_2.y;
        let tick_step = self.config.ticks_per_second * dt;
        if y > INPUT_THRESHOLD && self.ticks < self.config.top {
            self.ticks = (self.ticks + tick_step).min(self.config.top);
            self.offset += self.config.speed * dt;
        } else if y < -INPUT_THRESHOLD && self.ticks > self.config.bottom {
            self.ticks = (self.ticks - tick_step).max(self.config.bottom);
            self.offset -= self.config.speed * dt;
        }
    }
}

/// Everything on the robot apart from the claw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Robot {
    pub drivetrain: Drivetrain,
    pub arm: ArmLift,
    pub extension: Extension,
}

impl Robot {
    pub fn new(drivetrain: DrivetrainConfig, arm: ArmConfig, extension: ExtensionConfig) -> Robot {
        Robot {
            drivetrain: Drivetrain::new(drivetrain),
            arm: ArmLift::new(arm),
            extension: Extension::new(extension),
        }
    }

    pub fn update(&mut self, input: &InputFrame, camera: CameraView, dt: Seconds) {
        self.drivetrain.update(input, camera, dt);
        self.arm.update(input, dt);
        self.extension.update(input, dt);
    }

    pub fn stop(&mut self) {
        self.drivetrain.stop();
    }
}

#[cfg(test)]
mod robot_tests {
    use super::*;
    use crate::core::input::Axis2;

    fn drive(x: f32, y: f32) -> InputFrame {
        InputFrame {
            left_stick_1: Axis2::new(x, y),
            ..Default::default()
        }
    }

    #[test]
    fn speed_lerps_toward_target() {
        let mut dt = Drivetrain::new(DrivetrainConfig::default());
        dt.update(&drive(1.0, 0.0), CameraView::Driver, 0.02);
        // target is max_speed * 0.5, one lerp step of 0.1
        assert!((dt.speed() - 0.2).abs() < 1e-6);
        assert!(dt.position()[0] > 0.0);
        assert_eq!(dt.position()[1], 0.0);
    }

    #[test]
    fn top_down_is_field_centric() {
        let mut robot_centric = Drivetrain::new(DrivetrainConfig::default());
        robot_centric.heading = 90.0;
        robot_centric.update(&drive(1.0, 0.0), CameraView::Driver, 0.1);
        assert!(robot_centric.position()[1] < 0.0);
        assert!(robot_centric.position()[0].abs() < 1e-6);

        let mut field_centric = Drivetrain::new(DrivetrainConfig::default());
        field_centric.heading = 90.0;
        field_centric.update(&drive(1.0, 0.0), CameraView::TopDown, 0.1);
        assert_eq!(field_centric.position()[0], 0.0);
        assert!(field_centric.position()[1] < 0.0);

        let mut strafe = Drivetrain::new(DrivetrainConfig::default());
        strafe.update(&drive(0.0, 1.0), CameraView::TopDown, 0.1);
        assert!(strafe.position()[0] > 0.0);
    }

    #[test]
    fn shifting_is_edge_triggered_and_bounded() {
        let mut dt = Drivetrain::new(DrivetrainConfig::default());
        let up = InputFrame {
            right_bumper_1: 1.0,
            ..Default::default()
        };
        let down = InputFrame {
            left_bumper_1: 1.0,
            ..Default::default()
        };
        dt.update(&up, CameraView::Driver, 0.02);
        dt.update(&up, CameraView::Driver, 0.02);
        assert_eq!(dt.speed_scalar(), 0.75);

        dt.update(&InputFrame::idle(), CameraView::Driver, 0.02);
        dt.update(&up, CameraView::Driver, 0.02);
        dt.update(&InputFrame::idle(), CameraView::Driver, 0.02);
        dt.update(&up, CameraView::Driver, 0.02);
        assert_eq!(dt.speed_scalar(), 1.0);

        for _ in 0..5 {
            dt.update(&down, CameraView::Driver, 0.02);
            dt.update(&InputFrame::idle(), CameraView::Driver, 0.02);
        }
        assert_eq!(dt.speed_scalar(), 0.25);
    }

    #[test]
    fn heading_turns_with_right_stick() {
        let mut dt = Drivetrain::new(DrivetrainConfig::default());
        let turn = InputFrame {
            right_stick_1: Axis2::new(-1.0, 0.0),
            ..Default::default()
        };
        dt.update(&turn, CameraView::Driver, 0.1);
        assert!(dt.heading() > 350.0);
        dt.stop();
        assert_eq!(dt.rotation_speed(), 0.0);
    }

    #[test]
    fn arm_stays_in_bounds() {
        let mut arm = ArmLift::new(ArmConfig::default());
        let lower = InputFrame {
            right_trigger_2: 1.0,
            ..Default::default()
        };
        let raise = InputFrame {
            left_trigger_2: 1.0,
            ..Default::default()
        };
        arm.update(&lower, 1.0);
        assert_eq!(arm.angle(), 0.0);
        arm.update(&raise, 1.0);
        assert_eq!(arm.angle(), 60.0);
        arm.update(&raise, 1.0);
        assert_eq!(arm.angle(), 90.0);
        arm.update(&lower, 0.5);
        assert_eq!(arm.angle(), 60.0);
    }

    #[test]
    fn extension_counts_ticks() {
        let mut extension = Extension::new(ExtensionConfig::default());
        let out = InputFrame {
            right_stick_2: Axis2::new(0.0, 1.0),
            ..Default::default()
        };
        extension.update(&out, 1.0);
        assert_eq!(extension.ticks(), 100.0);
        extension.update(&out, 5.0);
        assert_eq!(extension.ticks(), 300.0);
        extension.update(&out, 1.0);
        assert_eq!(extension.ticks(), 300.0);

        let back = InputFrame {
            right_stick_2: Axis2::new(0.0, -1.0),
            ..Default::default()
        };
        extension.update(&back, 10.0);
        assert_eq!(extension.ticks(), 0.0);
    }
}
