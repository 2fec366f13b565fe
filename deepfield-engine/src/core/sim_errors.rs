use thiserror::Error;

use super::elements::ElementState;
use super::match_state::ProjectPhase;
use super::model::{ObjectId, RegionTag, SlotIndex};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimError {
    #[error("Scoring registry is full ({capacity} slots), object {object} was not claimed")]
    CapacityExceeded { object: ObjectId, capacity: usize },

    #[error("Object {object} in state {state:?} can't react to {region:?}")]
    InvalidTransition {
        object: ObjectId,
        state: ElementState,
        region: RegionTag,
    },

    #[error("Object {object} already occupies slot {slot}")]
    AlreadyClaimed { object: ObjectId, slot: SlotIndex },

    #[error("Not a valid object id: {0}")]
    UnknownObject(ObjectId),

    #[error("No match is running (phase {0:?})")]
    MatchInactive(ProjectPhase),
}

pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Patch Error: {0}")]
    Patch(#[from] json_patch::PatchError),

    #[error("Recording has no initial state")]
    Empty,
}
