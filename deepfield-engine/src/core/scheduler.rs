use serde::{Deserialize, Serialize};

use super::model::{ObjectId, Seconds};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskHandle(u64);

/// Deferred work the field state knows how to run when its deadline passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskKind {
    ClawCooldown,
    ConvertToSpecimen(ObjectId),
}
impl TaskKind {
    pub fn object(&self) -> Option<ObjectId> {
        match self {
            TaskKind::ClawCooldown => None,
            TaskKind::ConvertToSpecimen(id) => Some(*id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub handle: TaskHandle,
    pub deadline: Seconds,
    pub kind: TaskKind,
}

/// Time-ordered queue of cancellable tasks, advanced once per tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scheduler {
    now: Seconds,
    next_handle: u64,
    pending: Vec<ScheduledTask>,
}

impl Scheduler {
    pub fn new() -> Scheduler {
        Scheduler::default()
    }
    pub fn now(&self) -> Seconds {
        self.now
    }
    pub fn schedule(&mut self, delay: Seconds, kind: TaskKind) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle += 1;
        self.pending.push(ScheduledTask {
            handle,
            deadline: self.now + delay.max(0.0),
            kind,
        });
        handle
    }
    /// Removes the task. Returns false if it already ran or was never scheduled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|task| task.handle != handle);
        self.pending.len() != before
    }
    pub fn cancel_for_object(&mut self, object: ObjectId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|task| task.kind.object() != Some(object));
        before - self.pending.len()
    }
    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.pending.iter().any(|task| task.handle == handle)
    }
    pub fn get(&self, handle: TaskHandle) -> Option<&ScheduledTask> {
        self.pending.iter().find(|task| task.handle == handle)
    }
    pub fn pending(&self) -> impl Iterator<Item = &ScheduledTask> {
        self.pending.iter()
    }

    /// Moves time forward by `dt` and hands back every task whose deadline passed, earliest
    /// first. Tasks with equal deadlines keep scheduling order.
    pub fn advance(&mut self, dt: Seconds) -> Vec<ScheduledTask> {
        self.now += dt.max(0.0);
        let now = self.now;
        let (mut due, pending): (Vec<ScheduledTask>, Vec<ScheduledTask>) = self
            .pending
            .drain(..)
            .partition(|task| task.deadline <= now);
        self.pending = pending;
        due.sort_by(|a, b| {
            a.deadline
                .total_cmp(&b.deadline)
                .then_with(|| a.handle.cmp(&b.handle))
        });
        due
    }
}

#[cfg(test)]
mod scheduler_tests {
    use super::*;

    #[test]
    fn tasks_fire_at_deadline_in_order() {
        let mut scheduler = Scheduler::new();
        let late = scheduler.schedule(2.0, TaskKind::ConvertToSpecimen(1));
        let early = scheduler.schedule(0.5, TaskKind::ClawCooldown);

        assert!(scheduler.advance(0.4).is_empty());
        let due = scheduler.advance(0.1);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].handle, early);

        let due = scheduler.advance(5.0);
        assert_eq!(due.iter().map(|t| t.handle).collect::<Vec<_>>(), vec![late]);
        assert_eq!(scheduler.pending().count(), 0);
    }

    #[test]
    fn same_deadline_keeps_schedule_order() {
        let mut scheduler = Scheduler::new();
        let first = scheduler.schedule(1.0, TaskKind::ConvertToSpecimen(3));
        let second = scheduler.schedule(1.0, TaskKind::ConvertToSpecimen(2));
        let due = scheduler.advance(1.0);
        assert_eq!(due[0].handle, first);
        assert_eq!(due[1].handle, second);
    }

    #[test]
    fn cancel_leaves_nothing_behind() {
        let mut scheduler = Scheduler::new();
        let handle = scheduler.schedule(1.0, TaskKind::ClawCooldown);
        assert!(scheduler.is_pending(handle));
        assert!(scheduler.cancel(handle));
        assert!(!scheduler.cancel(handle));
        assert!(scheduler.advance(10.0).is_empty());
    }

    #[test]
    fn cancel_is_scoped_to_object() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(1.0, TaskKind::ConvertToSpecimen(1));
        let other = scheduler.schedule(1.0, TaskKind::ConvertToSpecimen(2));
        assert_eq!(scheduler.cancel_for_object(1), 1);
        assert!(scheduler.is_pending(other));
    }
}
