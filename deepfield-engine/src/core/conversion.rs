use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use super::model::{ObjectId, Seconds};
use super::scheduler::{Scheduler, TaskHandle, TaskKind};

/// Delayed sample-to-specimen conversions inside the observation zone, one per object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionController {
    conversion_time: Seconds,
    pending: BTreeMap<ObjectId, TaskHandle>,
}

impl ConversionController {
    pub fn new(conversion_time: Seconds) -> ConversionController {
        ConversionController {
            conversion_time,
            pending: BTreeMap::new(),
        }
    }
    pub fn conversion_time(&self) -> Seconds {
        self.conversion_time
    }

    /// Starts the countdown for `object`. A second call while pending returns the running
    /// countdown.
    pub fn begin(&mut self, object: ObjectId, scheduler: &mut Scheduler) -> TaskHandle {
        if let Some(handle) = self.pending.get(&object) {
            return *handle;
        }
        let handle = scheduler.schedule(self.conversion_time, TaskKind::ConvertToSpecimen(object));
        debug!(object, deadline = scheduler.now() + self.conversion_time, "conversion started");
        self.pending.insert(object, handle);
        handle
    }

    /// Stops the countdown of `object` only. Returns false when nothing was pending.
    pub fn cancel(&mut self, object: ObjectId, scheduler: &mut Scheduler) -> bool {
        match self.pending.remove(&object) {
            Some(handle) => {
                debug!(object, "conversion cancelled");
                scheduler.cancel(handle)
            }
            None => false,
        }
    }

    /// Called when the countdown task of `object` fires. Returns false for a stale task.
    pub fn complete(&mut self, object: ObjectId, handle: TaskHandle) -> bool {
        match self.pending.get(&object) {
            Some(pending) if *pending == handle => {
                self.pending.remove(&object);
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self, object: ObjectId) -> bool {
        self.pending.contains_key(&object)
    }
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
    pub fn time_left(&self, object: ObjectId, scheduler: &Scheduler) -> Option<Seconds> {
        let handle = self.pending.get(&object)?;
        scheduler
            .get(*handle)
            .map(|task| (task.deadline - scheduler.now()).max(0.0))
    }
}
