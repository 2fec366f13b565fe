//! Scoring and object-role core of a robotics competition field simulator.
//!
//! [`FieldState::tick`] advances the field in a fixed order:
//!
//! 1. the match clock and phase machine;
//! 2. outside of a running match nothing else happens;
//! 3. due scheduled tasks fire (claw cooldowns, sample conversions);
//! 4. camera, claw and robot read the controllers;
//! 5. contact events are applied to elements and the scoring registry;
//! 6. grabs are released while the claw is open and hanging specimens are held still;
//! 7. the score is recomputed.
#![allow(clippy::new_ret_no_self)]
use crate::core::config::SimConfig;
use crate::core::fieldstate::{FieldState, FieldStateBuilder};
use crate::core::model::Pose;

pub mod core;
pub mod drivers;

/// Six samples on the spike marks and two preloaded specimens, match started.
pub fn standard_field(config: SimConfig) -> FieldState {
    let mut builder = FieldStateBuilder::new();
    builder.set_config(config);
    for i in 0..3 {
        let x = 1.2 + 0.25 * i as f32;
        builder.add_sample(Pose::at(x, 0.02, -1.2));
        builder.add_sample(Pose::at(-x, 0.02, -1.2));
    }
    builder
        .add_specimen(Pose::at(1.5, 0.02, 1.5))
        .add_specimen(Pose::at(1.6, 0.02, 1.5))
        .build()
}
