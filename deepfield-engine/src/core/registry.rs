use serde::{Deserialize, Serialize};
use smallvec::smallvec;
use tracing::debug;

use super::model::{
    Attachment, ObjectId, PhysicsCommand, PhysicsCommands, RegionId, Role, SlotIndex,
    REGISTRY_CAPACITY,
};
use super::sim_errors::{Result, SimError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Slot {
    #[default]
    Empty,
    Occupied(ObjectId),
}
impl Slot {
    pub fn occupant(&self) -> Option<ObjectId> {
        match self {
            Slot::Empty => None,
            Slot::Occupied(id) => Some(*id),
        }
    }
    pub fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }
}

/// Fixed-capacity set of objects currently counting toward the score. The registry is the
/// source of truth for which object holds which slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringRegistry {
    slots: Vec<Slot>,
}

impl ScoringRegistry {
    pub fn new() -> ScoringRegistry {
        ScoringRegistry::with_capacity(REGISTRY_CAPACITY)
    }
    pub fn with_capacity(capacity: usize) -> ScoringRegistry {
        ScoringRegistry {
            slots: vec![Slot::Empty; capacity],
        }
    }
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }
    pub fn slot_of(&self, object: ObjectId) -> Option<SlotIndex> {
        self.slots
            .iter()
            .position(|slot| *slot == Slot::Occupied(object))
    }
    pub fn occupants(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.slots.iter().filter_map(|slot| slot.occupant())
    }
    pub fn occupied_count(&self) -> usize {
        self.occupants().count()
    }
    pub fn is_full(&self) -> bool {
        self.slots.iter().all(|slot| !slot.is_empty())
    }

    /// Puts `object` in the lowest-indexed empty slot.
    pub fn claim(&mut self, object: ObjectId) -> Result<SlotIndex> {
        if let Some(slot) = self.slot_of(object) {
            return Err(SimError::AlreadyClaimed { object, slot });
        }
        let index = self
            .slots
            .iter()
            .position(Slot::is_empty)
            .ok_or(SimError::CapacityExceeded {
                object,
                capacity: self.capacity(),
            })?;
        self.slots[index] = Slot::Occupied(object);
        debug!(object, slot = index, "claimed scoring slot");
        Ok(index)
    }

    /// Claims a slot for a specimen hooked on `rung`. The returned commands park the specimen
    /// on the rung at rest under zero gravity.
    pub fn claim_hanging(
        &mut self,
        object: ObjectId,
        rung: RegionId,
    ) -> Result<(SlotIndex, PhysicsCommands)> {
        let index = self.claim(object)?;
        let commands = smallvec![
            PhysicsCommand::Reparent {
                object,
                parent: Attachment::Rung(rung),
            },
            PhysicsCommand::SetGravity {
                object,
                enabled: false,
            },
            PhysicsCommand::ZeroVelocity { object },
        ];
        Ok((index, commands))
    }

    /// Empties the slot held by `object`. Returns `None` when the object held no slot, which
    /// happens when a symmetric exit already released it.
    pub fn release(&mut self, object: ObjectId) -> Option<SlotIndex> {
        let index = self.slot_of(object);
        match index {
            Some(index) => {
                self.slots[index] = Slot::Empty;
                debug!(object, slot = index, "released scoring slot");
            }
            None => debug!(object, "release of object without a slot ignored"),
        }
        index
    }

    /// Sums the point value of every occupant. Occupants `role_of` can't resolve count 0.
    pub fn compute_score<F>(&self, role_of: F) -> u32
    where
        F: Fn(ObjectId) -> Option<Role>,
    {
        self.occupants()
            .filter_map(role_of)
            .map(|role| role.points())
            .sum()
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = Slot::Empty);
    }
}

impl Default for ScoringRegistry {
    fn default() -> Self {
        Self::new()
    }
}
