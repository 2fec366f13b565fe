use serde::{Deserialize, Serialize};
use std::path::Path;

use super::model::{Seconds, GRAB_WINDOW, REGISTRY_CAPACITY};
use super::sim_errors::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClawConfig {
    pub claw_delay: Seconds,
    pub max_rot: f32,
    pub grab_window: Seconds,
    pub starts_open: bool,
}
impl Default for ClawConfig {
    fn default() -> Self {
        ClawConfig {
            claw_delay: 0.5,
            max_rot: 30.0,
            grab_window: GRAB_WINDOW,
            starts_open: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchClockConfig {
    pub match_length: Seconds,
    pub teleop_start: Seconds,
    pub between_length: Seconds,
}
impl Default for MatchClockConfig {
    fn default() -> Self {
        MatchClockConfig {
            match_length: 150.0,
            teleop_start: 120.0,
            between_length: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrivetrainConfig {
    pub max_speed: f32,
    pub pos_lerp: f32,
    pub max_rotation_speed: f32,
    pub rot_lerp: f32,
    pub scalar_jumps: f32,
    pub initial_speed_scalar: f32,
}
impl Default for DrivetrainConfig {
    fn default() -> Self {
        DrivetrainConfig {
            max_speed: 4.0,
            pos_lerp: 0.1,
            max_rotation_speed: 180.0,
            rot_lerp: 0.1,
            scalar_jumps: 0.25,
            initial_speed_scalar: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmConfig {
    pub speed: f32,
    pub top: f32,
    pub bottom: f32,
}
impl Default for ArmConfig {
    fn default() -> Self {
        ArmConfig {
            speed: 60.0,
            top: 90.0,
            bottom: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionConfig {
    pub speed: f32,
    pub top: f32,
    pub bottom: f32,
    pub ticks_per_second: f32,
}
impl Default for ExtensionConfig {
    fn default() -> Self {
        ExtensionConfig {
            speed: 0.5,
            top: 300.0,
            bottom: 0.0,
            ticks_per_second: 100.0,
        }
    }
}

/// Every tunable of a simulation, loadable from JSON. Missing keys fall back to defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub registry_capacity: usize,
    pub conversion_time: Seconds,
    pub claw: ClawConfig,
    pub match_clock: MatchClockConfig,
    pub drivetrain: DrivetrainConfig,
    pub arm: ArmConfig,
    pub extension: ExtensionConfig,
}
impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            registry_capacity: REGISTRY_CAPACITY,
            conversion_time: 3.0,
            claw: Default::default(),
            match_clock: Default::default(),
            drivetrain: Default::default(),
            arm: Default::default(),
            extension: Default::default(),
        }
    }
}
impl SimConfig {
    pub fn from_json(json_str: &str) -> Result<SimConfig, StorageError> {
        Ok(serde_json::from_str(json_str)?)
    }
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<SimConfig, StorageError> {
        let json_str = std::fs::read_to_string(path)?;
        SimConfig::from_json(&json_str)
    }
}
