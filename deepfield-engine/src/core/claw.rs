use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::ClawConfig;
use super::input::InputFrame;
use super::model::{ObjectId, PhysicsCommand, Seconds};
use super::scheduler::{Scheduler, TaskHandle, TaskKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClawToggle {
    Opened,
    Closed,
}

/// Open/closed state of the claw and the objects it currently holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claw {
    config: ClawConfig,
    is_open: bool,
    can_toggle: bool,
    last_close: Option<Seconds>,
    cooldown: Option<TaskHandle>,
    grabbed: Vec<ObjectId>,
}

impl Claw {
    pub fn new(config: ClawConfig) -> Claw {
        Claw {
            is_open: config.starts_open,
            config,
            can_toggle: true,
            last_close: None,
            cooldown: None,
            grabbed: Vec::new(),
        }
    }
    pub fn is_open(&self) -> bool {
        self.is_open
    }
    pub fn can_toggle(&self) -> bool {
        self.can_toggle
    }
    pub fn last_close(&self) -> Option<Seconds> {
        self.last_close
    }
    pub fn grabbed(&self) -> &[ObjectId] {
        &self.grabbed
    }
    pub fn is_holding(&self, object: ObjectId) -> bool {
        self.grabbed.contains(&object)
    }

    /// Reads the operator buttons and toggles the claw when allowed.
    pub fn update(
        &mut self,
        input: &InputFrame,
        scheduler: &mut Scheduler,
    ) -> Option<(ClawToggle, PhysicsCommand)> {
        if self.is_open && input.close_claw() {
            self.request_close(scheduler)
                .map(|command| (ClawToggle::Closed, command))
        } else if !self.is_open && input.open_claw() {
            self.request_open(scheduler)
                .map(|command| (ClawToggle::Opened, command))
        } else {
            None
        }
    }

    /// Closes the claw and stamps the close time. Ignored while the cooldown runs or when the
    /// claw is already closed.
    pub fn request_close(&mut self, scheduler: &mut Scheduler) -> Option<PhysicsCommand> {
        if !self.is_open || !self.can_toggle {
            return None;
        }
        self.start_cooldown(scheduler);
        self.is_open = false;
        self.last_close = Some(scheduler.now());
        debug!(at = scheduler.now(), "claw closed");
        Some(PhysicsCommand::RotateClawHeads {
            servo: self.config.max_rot,
            bearing: -self.config.max_rot,
        })
    }

    pub fn request_open(&mut self, scheduler: &mut Scheduler) -> Option<PhysicsCommand> {
        if self.is_open || !self.can_toggle {
            return None;
        }
        self.start_cooldown(scheduler);
        self.is_open = true;
        debug!(at = scheduler.now(), "claw opened");
        Some(PhysicsCommand::RotateClawHeads {
            servo: -self.config.max_rot,
            bearing: self.config.max_rot,
        })
    }

    fn start_cooldown(&mut self, scheduler: &mut Scheduler) {
        self.can_toggle = false;
        self.cooldown = Some(scheduler.schedule(self.config.claw_delay, TaskKind::ClawCooldown));
    }

    /// Runs when the cooldown task fires.
    pub fn finish_cooldown(&mut self) {
        self.cooldown = None;
        self.can_toggle = true;
    }

    /// Drops a pending cooldown. The claw accepts the next toggle right away.
    pub fn cancel_cooldown(&mut self, scheduler: &mut Scheduler) -> bool {
        let Some(handle) = self.cooldown.take() else {
            return false;
        };
        self.can_toggle = true;
        scheduler.cancel(handle)
    }

    /// A grab only forms while closed and within the grab window after the close.
    pub fn can_grab(&self, now: Seconds) -> bool {
        match self.last_close {
            Some(closed_at) if !self.is_open => now - closed_at < self.config.grab_window,
            _ => false,
        }
    }

    pub fn try_grab(&mut self, object: ObjectId, now: Seconds) -> bool {
        if !self.can_grab(now) {
            return false;
        }
        if !self.grabbed.contains(&object) {
            self.grabbed.push(object);
        }
        true
    }

    /// Empties the grab set while the claw is open.
    pub fn release_all(&mut self) -> Vec<ObjectId> {
        if !self.is_open {
            return Vec::new();
        }
        std::mem::take(&mut self.grabbed)
    }

    pub fn forget(&mut self, object: ObjectId) {
        self.grabbed.retain(|id| *id != object);
    }
}
