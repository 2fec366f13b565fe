use std::collections::VecDeque;

use itertools::Itertools;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::core::fieldstate::FieldState;
use crate::core::input::{Axis2, InputFrame};
use crate::core::model::{ContactEvent, ContactKind, Region};

/// What the outside world reports for one tick: controller readings and contact events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverFrame {
    pub input: InputFrame,
    pub contacts: Vec<ContactEvent>,
}

impl DriverFrame {
    pub fn new(input: InputFrame) -> DriverFrame {
        DriverFrame {
            input,
            contacts: Vec::new(),
        }
    }
    pub fn with_contacts(mut self, contacts: &[ContactEvent]) -> DriverFrame {
        self.contacts.extend_from_slice(contacts);
        self
    }
}

pub trait Driver {
    fn next_frame(&mut self, state: &FieldState) -> DriverFrame;
}

/// Mashes the controllers and throws elements at random regions.
pub struct RandomDriver {
    rng: ChaCha8Rng,
    contact_chance: f64,
}

impl RandomDriver {
    pub fn new() -> RandomDriver {
        Self {
            rng: ChaCha8Rng::from_entropy(),
            contact_chance: 0.2,
        }
    }
    pub fn with_seed(seed: u64) -> RandomDriver {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            contact_chance: 0.2,
        }
    }
    pub fn set_seed(&mut self, rng: ChaCha8Rng) {
        self.rng = rng;
    }
    pub fn set_contact_chance(&mut self, chance: f64) {
        self.contact_chance = chance.clamp(0.0, 1.0);
    }

    fn axis(&mut self) -> Axis2 {
        Axis2::new(self.rng.gen_range(-1.0..=1.0), self.rng.gen_range(-1.0..=1.0))
    }
    fn button(&mut self, chance: f64) -> f32 {
        if self.rng.gen_bool(chance) {
            1.0
        } else {
            0.0
        }
    }
    fn region(&mut self) -> Region {
        match self.rng.gen_range(0..4) {
            0 => Region::basket(self.rng.gen_range(0..2)),
            1 => Region::rung(self.rng.gen_range(0..2)),
            2 => Region::observation(0),
            _ => Region::claw(),
        }
    }
}

impl Default for RandomDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver for RandomDriver {
    fn next_frame(&mut self, state: &FieldState) -> DriverFrame {
        let input = InputFrame {
            left_stick_1: self.axis(),
            right_stick_1: self.axis(),
            left_bumper_1: self.button(0.05),
            right_bumper_1: self.button(0.05),
            dpad_1: Axis2::default(),
            left_stick_2: self.axis(),
            right_stick_2: self.axis(),
            x_button_2: self.button(0.1),
            a_button_2: self.button(0.1),
            left_trigger_2: self.button(0.2),
            right_trigger_2: self.button(0.2),
        };
        let mut frame = DriverFrame::new(input);

        let ids = state.elements().map(|e| e.id).collect_vec();
        if !ids.is_empty() && self.rng.gen_bool(self.contact_chance) {
            let object = ids[self.rng.gen_range(0..ids.len())];
            let region = self.region();
            let kind = if self.rng.gen_bool(0.5) {
                ContactKind::Enter
            } else {
                ContactKind::Exit
            };
            frame.contacts.push(ContactEvent {
                object,
                region,
                kind,
            });
        }
        frame
    }
}

/// Replays a fixed list of frames, then idles.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDriver {
    frames: VecDeque<DriverFrame>,
}

impl ScriptedDriver {
    pub fn new(frames: Vec<DriverFrame>) -> ScriptedDriver {
        ScriptedDriver {
            frames: frames.into(),
        }
    }
    pub fn push(&mut self, frame: DriverFrame) {
        self.frames.push_back(frame);
    }
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl Driver for ScriptedDriver {
    fn next_frame(&mut self, _state: &FieldState) -> DriverFrame {
        self.frames.pop_front().unwrap_or_default()
    }
}
