use serde::{Deserialize, Serialize};
use tracing::debug;

use super::model::{
    Attachment, ObjectId, PhysicsCommands, Pose, Region, RegionTag, Role, SlotIndex,
};
use super::registry::ScoringRegistry;
use super::sim_errors::{Result, SimError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementState {
    SampleFree,
    SampleClaimed,
    SpecimenFree,
    SpecimenHanging,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    pub object: ObjectId,
    pub from: ElementState,
    pub to: ElementState,
}

/// A sample or specimen on the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringElement {
    pub id: ObjectId,
    pub role: Role,
    pub pose: Pose,
    can_score: bool,
    is_hanging: bool,
    can_convert: bool,
    // mirrors the registry, which stays the source of truth
    owner_slot: Option<SlotIndex>,
    scoring_region: Option<Region>,
    attachment: Attachment,
    kinematic: bool,
    gravity: bool,
}

impl ScoringElement {
    pub fn new(id: ObjectId, role: Role, pose: Pose) -> ScoringElement {
        ScoringElement {
            id,
            role,
            pose,
            can_score: true,
            is_hanging: false,
            can_convert: role == Role::Sample,
            owner_slot: None,
            scoring_region: None,
            attachment: Attachment::Free,
            kinematic: false,
            gravity: true,
        }
    }
    pub fn new_sample(id: ObjectId, pose: Pose) -> ScoringElement {
        ScoringElement::new(id, Role::Sample, pose)
    }
    pub fn new_specimen(id: ObjectId, pose: Pose) -> ScoringElement {
        ScoringElement::new(id, Role::Specimen, pose)
    }

    pub fn state(&self) -> ElementState {
        match (self.role, self.can_score, self.is_hanging) {
            (Role::Specimen, _, true) => ElementState::SpecimenHanging,
            (Role::Specimen, _, false) => ElementState::SpecimenFree,
            (Role::Sample, false, _) => ElementState::SampleClaimed,
            (Role::Sample, true, _) => ElementState::SampleFree,
        }
    }
    pub fn can_score(&self) -> bool {
        self.can_score
    }
    pub fn is_hanging(&self) -> bool {
        self.is_hanging
    }
    pub fn can_convert(&self) -> bool {
        self.can_convert
    }
    pub fn owner_slot(&self) -> Option<SlotIndex> {
        self.owner_slot
    }
    pub fn attachment(&self) -> Attachment {
        self.attachment
    }
    pub fn is_kinematic(&self) -> bool {
        self.kinematic
    }
    pub fn has_gravity(&self) -> bool {
        self.gravity
    }
    pub fn is_grabbed(&self) -> bool {
        self.attachment == Attachment::Claw
    }

    /// Sample-Free -> Sample-Claimed on first contact with a basket.
    pub fn enter_basket(
        &mut self,
        basket: Region,
        registry: &mut ScoringRegistry,
    ) -> Result<Option<StateChange>> {
        debug_assert_eq!(basket.tag, RegionTag::Basket);
        if self.role != Role::Sample || !self.can_score {
            return Ok(None);
        }
        let from = self.state();
        let slot = registry.claim(self.id)?;
        self.can_score = false;
        self.owner_slot = Some(slot);
        self.scoring_region = Some(basket);
        Ok(Some(self.change_from(from)))
    }

    /// Sample-Claimed -> Sample-Free when contact with the claiming basket ends.
    pub fn leave_basket(
        &mut self,
        basket: Region,
        registry: &mut ScoringRegistry,
    ) -> Option<StateChange> {
        if self.state() != ElementState::SampleClaimed || self.scoring_region != Some(basket) {
            return None;
        }
        let from = self.state();
        self.drop_claim(registry);
        Some(self.change_from(from))
    }

    /// Specimen-Free -> Specimen-Hanging on first contact with a rung. Physics commands for
    /// parking the specimen are appended to `commands`.
    pub fn enter_rung(
        &mut self,
        rung: Region,
        registry: &mut ScoringRegistry,
        commands: &mut PhysicsCommands,
    ) -> Result<Option<StateChange>> {
        debug_assert_eq!(rung.tag, RegionTag::Rung);
        if self.role != Role::Specimen || !self.can_score {
            return Ok(None);
        }
        let from = self.state();
        let (slot, parking) = registry.claim_hanging(self.id, rung.id)?;
        self.can_score = false;
        self.is_hanging = true;
        self.owner_slot = Some(slot);
        self.scoring_region = Some(rung);
        self.attachment = Attachment::Rung(rung.id);
        self.gravity = false;
        commands.extend(parking);
        Ok(Some(self.change_from(from)))
    }

    /// Specimen-Hanging -> Specimen-Free when contact with the rung ends.
    pub fn leave_rung(
        &mut self,
        rung: Region,
        registry: &mut ScoringRegistry,
    ) -> Option<StateChange> {
        if !self.is_hanging || self.scoring_region != Some(rung) {
            return None;
        }
        let from = self.state();
        self.is_hanging = false;
        self.drop_claim(registry);
        Some(self.change_from(from))
    }

    /// Marks the start of a conversion. Returns false when the element can't convert.
    pub fn start_conversion(&mut self) -> bool {
        if self.role != Role::Sample || !self.can_convert {
            return false;
        }
        self.can_convert = false;
        true
    }
    pub fn reset_conversion(&mut self) {
        if self.role == Role::Sample {
            self.can_convert = true;
        }
    }

    pub(crate) fn set_grabbed(&mut self) {
        self.attachment = Attachment::Claw;
        self.kinematic = true;
    }
    pub(crate) fn set_released(&mut self) {
        self.attachment = Attachment::Free;
        self.kinematic = false;
    }

    /// Ensures the element can still react to `tag`, otherwise reports an invalid transition.
    pub fn expect_reacts_to(&self, tag: RegionTag) -> Result<()> {
        let ok = match tag {
            RegionTag::Basket => self.role == Role::Sample,
            RegionTag::Rung => self.role == Role::Specimen,
            RegionTag::Observation => self.role == Role::Sample,
            RegionTag::Claw => true,
        };
        if ok {
            Ok(())
        } else {
            Err(SimError::InvalidTransition {
                object: self.id,
                state: self.state(),
                region: tag,
            })
        }
    }

    fn drop_claim(&mut self, registry: &mut ScoringRegistry) {
        registry.release(self.id);
        self.can_score = true;
        self.owner_slot = None;
        self.scoring_region = None;
    }

    fn change_from(&self, from: ElementState) -> StateChange {
        let change = StateChange {
            object: self.id,
            from,
            to: self.state(),
        };
        debug!(object = self.id, from = ?change.from, to = ?change.to, "element state changed");
        change
    }
}
