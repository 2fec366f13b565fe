use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

pub use super::sim_errors::Result;

pub type ObjectId = usize;
pub type RegionId = usize;
pub type SlotIndex = usize;
pub type Seconds = f64;

pub const REGISTRY_CAPACITY: usize = 20;
pub const SAMPLE_POINTS: u32 = 4;
pub const SPECIMEN_POINTS: u32 = 10;
pub const GRAB_WINDOW: Seconds = 0.2;
pub const INPUT_THRESHOLD: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Sample,
    Specimen,
}
impl Role {
    pub fn points(&self) -> u32 {
        match self {
            Role::Sample => SAMPLE_POINTS,
            Role::Specimen => SPECIMEN_POINTS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionTag {
    Basket,
    Rung,
    Observation,
    Claw,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub tag: RegionTag,
    pub id: RegionId,
}
impl Region {
    pub fn new(tag: RegionTag, id: RegionId) -> Region {
        Region { tag, id }
    }
    pub fn basket(id: RegionId) -> Region {
        Region::new(RegionTag::Basket, id)
    }
    pub fn rung(id: RegionId) -> Region {
        Region::new(RegionTag::Rung, id)
    }
    pub fn observation(id: RegionId) -> Region {
        Region::new(RegionTag::Observation, id)
    }
    pub fn claw() -> Region {
        Region::new(RegionTag::Claw, 0)
    }
}
impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}#{}", self.tag, self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactKind {
    Enter,
    Exit,
}

/// A discrete contact report from the physics collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactEvent {
    pub object: ObjectId,
    pub region: Region,
    pub kind: ContactKind,
}
impl ContactEvent {
    pub fn enter(object: ObjectId, region: Region) -> ContactEvent {
        ContactEvent {
            object,
            region,
            kind: ContactKind::Enter,
        }
    }
    pub fn exit(object: ObjectId, region: Region) -> ContactEvent {
        ContactEvent {
            object,
            region,
            kind: ContactKind::Exit,
        }
    }
}

/// Parent an element is attached to. `Free` is whatever parent the element had before it was
/// grabbed or hung.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Attachment {
    #[default]
    Free,
    Claw,
    Rung(RegionId),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: [f32; 3],
    pub rotation: [f32; 4],
}
impl Pose {
    pub fn at(x: f32, y: f32, z: f32) -> Pose {
        Pose {
            position: [x, y, z],
            rotation: [0.0, 0.0, 0.0, 1.0],
        }
    }
}
impl Default for Pose {
    fn default() -> Self {
        Pose::at(0.0, 0.0, 0.0)
    }
}

/// Commands the core issues back to the physics and rendering collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PhysicsCommand {
    SetKinematic { object: ObjectId, kinematic: bool },
    Reparent { object: ObjectId, parent: Attachment },
    SetGravity { object: ObjectId, enabled: bool },
    ZeroVelocity { object: ObjectId },
    ZeroLinearVelocity { object: ObjectId },
    Spawn { object: ObjectId, role: Role, pose: Pose },
    Destroy { object: ObjectId },
    RotateClawHeads { servo: f32, bearing: f32 },
    StopRobot,
}

pub type PhysicsCommands = SmallVec<[PhysicsCommand; 4]>;
